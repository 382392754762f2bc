//! Windowed interferometric coherence.
//!
//! Every estimator maps an interferogram and its norms matrix to a coherence map
//! of shape `(rows - window_azimuth + 1, cols - window_range + 1)`. Cell `[r, c]`
//! describes the window whose top-left corner is `(r, c)`:
//!
//! ```text
//!              | sum ifg |
//! gamma = ---------------------------
//!         sqrt(sum P_master * sum P_slave)
//! ```
//!
//! A non-positive denominator gives 0, and values are clamped to at most 1.
//! Samples whose interferogram value or powers are NaN or infinite are kept out
//! of every sum; a window holding one of them has coherence 0, and windows that
//! do not hold it are unaffected.
//!
//! Three estimators share this contract:
//!
//! * [`SlidingWindowEstimator`]: full window sum at the start of every output row,
//!   then incremental column updates.
//! * [`SummedAreaEstimator`]: integral images, constant cost per window.
//! * [`RampCompensatedEstimator`]: removes a least-squares linear phase ramp from
//!   each window before summing, so deterministic fringes are not mistaken for
//!   decorrelation.

use crate::core::parallel::RowSchedule;
use crate::core::radar_utils::{coherence_output_shape, phase, wrap_phase};
use crate::types::{
    ensure_same_shape, ComplexMatrix, InsarError, InsarResult, NormsMatrix, PowerPair, RealMatrix,
    SarComplex,
};
use ndarray::Array2;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Available coherence estimators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoherenceMethod {
    /// Sliding window sums
    SlidingWindow,
    /// Summed-area tables (integral images)
    SummedArea,
    /// Linear phase ramp removed per window before summing
    RampCompensated,
}

impl Default for CoherenceMethod {
    fn default() -> Self {
        CoherenceMethod::SummedArea
    }
}

impl CoherenceMethod {
    /// Build the estimator implementing this method
    pub fn estimator(self, schedule: RowSchedule) -> Box<dyn CoherenceEstimator> {
        match self {
            CoherenceMethod::SlidingWindow => Box::new(SlidingWindowEstimator::new(schedule)),
            CoherenceMethod::SummedArea => Box::new(SummedAreaEstimator::new(schedule)),
            CoherenceMethod::RampCompensated => Box::new(RampCompensatedEstimator::new(schedule)),
        }
    }
}

/// Coherence estimation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoherenceParams {
    /// Window size along azimuth (rows); odd values keep the window centred
    pub window_azimuth: usize,
    /// Window size along range (columns)
    pub window_range: usize,
    /// Estimator to use
    pub method: CoherenceMethod,
    /// Output rows per parallel work item
    pub chunk_size: usize,
    /// Enable parallel processing
    pub enable_parallel: bool,
}

impl Default for CoherenceParams {
    fn default() -> Self {
        Self {
            window_azimuth: 3,
            window_range: 9,
            method: CoherenceMethod::default(),
            chunk_size: 32,
            enable_parallel: true,
        }
    }
}

impl CoherenceParams {
    pub fn schedule(&self) -> RowSchedule {
        RowSchedule {
            chunk_size: self.chunk_size,
            enable_parallel: self.enable_parallel,
            cancel: None,
        }
    }
}

/// Common interface of the coherence estimators
pub trait CoherenceEstimator: Send + Sync {
    fn method(&self) -> CoherenceMethod;

    /// Coherence map of `ifg` normalised by `norms`.
    ///
    /// Fails with `ShapeMismatch` when the inputs differ in shape, and with
    /// `InvalidParameter` / `WindowTooLarge` for unusable windows.
    fn estimate(
        &self,
        ifg: &ComplexMatrix,
        norms: &NormsMatrix,
        window_azimuth: usize,
        window_range: usize,
    ) -> InsarResult<RealMatrix>;
}

/// Estimate coherence with the method and execution settings in `params`
pub fn estimate_coherence(
    ifg: &ComplexMatrix,
    norms: &NormsMatrix,
    params: &CoherenceParams,
) -> InsarResult<RealMatrix> {
    params
        .method
        .estimator(params.schedule())
        .estimate(ifg, norms, params.window_azimuth, params.window_range)
}

/// Coherence of one window from its complex sum and accumulated powers
#[inline]
pub(crate) fn window_coherence(sum: SarComplex, powers: PowerPair) -> f64 {
    let product = powers.master_power * powers.slave_power;
    if product > 0.0 {
        let coherence = sum.norm() / product.sqrt();
        if coherence > 1.0 {
            1.0
        } else {
            coherence
        }
    } else {
        0.0
    }
}

/// Whether a sample may enter a window sum
#[inline]
fn is_valid_sample(ifg: SarComplex, powers: PowerPair) -> bool {
    ifg.is_finite() && powers.is_finite()
}

/// Sums accumulated over one coherence window.
///
/// Non-finite samples are counted in `invalid` instead of being summed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WindowSums {
    pub ifg: SarComplex,
    pub powers: PowerPair,
    pub invalid: usize,
}

impl WindowSums {
    #[inline]
    pub fn add(&mut self, ifg: SarComplex, powers: PowerPair) {
        if is_valid_sample(ifg, powers) {
            self.ifg += ifg;
            self.powers = self.powers + powers;
        } else {
            self.invalid += 1;
        }
    }

    /// Take back a sample previously passed to [`WindowSums::add`]
    #[inline]
    pub fn remove(&mut self, ifg: SarComplex, powers: PowerPair) {
        if is_valid_sample(ifg, powers) {
            self.ifg -= ifg;
            self.powers = self.powers - powers;
        } else {
            self.invalid = self.invalid.saturating_sub(1);
        }
    }

    pub fn coherence(&self) -> f64 {
        if self.invalid > 0 {
            0.0
        } else {
            window_coherence(self.ifg, self.powers)
        }
    }
}

/// Validate inputs once and allocate the output map
fn prepare_output(
    name: &str,
    ifg: &ComplexMatrix,
    norms: &NormsMatrix,
    window_azimuth: usize,
    window_range: usize,
) -> InsarResult<RealMatrix> {
    ensure_same_shape(ifg.dim(), norms.dim())?;
    let (rows, cols) = ifg.dim();
    let shape = coherence_output_shape(rows, cols, window_azimuth, window_range)?;

    log::info!(
        "Estimating coherence ({}) over {}x{} windows on {}x{} interferogram",
        name,
        window_azimuth,
        window_range,
        rows,
        cols
    );

    Ok(Array2::zeros(shape))
}

/// Sliding-window estimator.
///
/// The window sum is computed in full at the first column of each output row and
/// updated by one leaving and one entering column per step.
pub struct SlidingWindowEstimator {
    schedule: RowSchedule,
}

impl SlidingWindowEstimator {
    pub fn new(schedule: RowSchedule) -> Self {
        Self { schedule }
    }
}

impl CoherenceEstimator for SlidingWindowEstimator {
    fn method(&self) -> CoherenceMethod {
        CoherenceMethod::SlidingWindow
    }

    fn estimate(
        &self,
        ifg: &ComplexMatrix,
        norms: &NormsMatrix,
        window_azimuth: usize,
        window_range: usize,
    ) -> InsarResult<RealMatrix> {
        let mut output =
            prepare_output("sliding window", ifg, norms, window_azimuth, window_range)?;
        let out_cols = output.ncols();

        self.schedule.fill_rows(&mut output, |i, mut row| {
            let mut sums = WindowSums::default();
            for k in 0..window_azimuth {
                for l in 0..window_range {
                    sums.add(ifg[[i + k, l]], norms[[i + k, l]]);
                }
            }
            row[0] = sums.coherence();

            for j in 1..out_cols {
                let leaving = j - 1;
                let entering = j + window_range - 1;
                for k in 0..window_azimuth {
                    let r = i + k;
                    sums.remove(ifg[[r, leaving]], norms[[r, leaving]]);
                    sums.add(ifg[[r, entering]], norms[[r, entering]]);
                }
                row[j] = sums.coherence();
            }
        })?;

        Ok(output)
    }
}

/// Integral images of the interferogram, both power channels and the count of
/// non-finite samples.
///
/// Tables carry one extra leading row and column of zeros, so entry `[r, c]` is
/// the sum over the input rectangle `[0, r) x [0, c)`. Non-finite samples enter
/// the value tables as zero.
pub struct SummedAreaTable {
    ifg: Array2<SarComplex>,
    powers: Array2<PowerPair>,
    invalid: Array2<usize>,
}

impl SummedAreaTable {
    pub fn build(ifg: &ComplexMatrix, norms: &NormsMatrix) -> InsarResult<Self> {
        ensure_same_shape(ifg.dim(), norms.dim())?;
        let (rows, cols) = ifg.dim();

        let shape = (rows + 1, cols + 1);
        let mut ifg_table = Array2::<SarComplex>::zeros(shape);
        let mut power_table = Array2::from_elem(shape, PowerPair::default());
        let mut invalid_table = Array2::<usize>::zeros(shape);

        for r in 0..rows {
            for c in 0..cols {
                let (value, powers, invalid) = if is_valid_sample(ifg[[r, c]], norms[[r, c]]) {
                    (ifg[[r, c]], norms[[r, c]], 0)
                } else {
                    (SarComplex::zero(), PowerPair::default(), 1)
                };

                ifg_table[[r + 1, c + 1]] = value + ifg_table[[r, c + 1]] + ifg_table[[r + 1, c]]
                    - ifg_table[[r, c]];
                power_table[[r + 1, c + 1]] = powers
                    + power_table[[r, c + 1]]
                    + power_table[[r + 1, c]]
                    - power_table[[r, c]];
                invalid_table[[r + 1, c + 1]] = invalid
                    + invalid_table[[r, c + 1]]
                    + invalid_table[[r + 1, c]]
                    - invalid_table[[r, c]];
            }
        }

        Ok(Self {
            ifg: ifg_table,
            powers: power_table,
            invalid: invalid_table,
        })
    }

    /// Sums over the `height x width` window with top-left corner `(row, col)`,
    /// or `None` when the window reaches past the input.
    #[inline]
    pub fn window_sum(
        &self,
        row: usize,
        col: usize,
        height: usize,
        width: usize,
    ) -> Option<WindowSums> {
        let (r1, c1) = (row + height, col + width);
        if r1 >= self.ifg.nrows() || c1 >= self.ifg.ncols() {
            return None;
        }

        let ifg = self.ifg[[r1, c1]] - self.ifg[[row, c1]] - self.ifg[[r1, col]]
            + self.ifg[[row, col]];
        let powers = self.powers[[r1, c1]] - self.powers[[row, c1]] - self.powers[[r1, col]]
            + self.powers[[row, col]];
        let invalid = self.invalid[[r1, c1]] + self.invalid[[row, col]]
            - self.invalid[[row, c1]]
            - self.invalid[[r1, col]];

        Some(WindowSums {
            ifg,
            powers,
            invalid,
        })
    }
}

/// Summed-area-table estimator: linear preprocessing, four lookups per channel
/// and window.
pub struct SummedAreaEstimator {
    schedule: RowSchedule,
}

impl SummedAreaEstimator {
    pub fn new(schedule: RowSchedule) -> Self {
        Self { schedule }
    }
}

impl CoherenceEstimator for SummedAreaEstimator {
    fn method(&self) -> CoherenceMethod {
        CoherenceMethod::SummedArea
    }

    fn estimate(
        &self,
        ifg: &ComplexMatrix,
        norms: &NormsMatrix,
        window_azimuth: usize,
        window_range: usize,
    ) -> InsarResult<RealMatrix> {
        let mut output = prepare_output("summed area", ifg, norms, window_azimuth, window_range)?;
        let table = SummedAreaTable::build(ifg, norms)?;

        self.schedule.fill_rows(&mut output, |i, mut row| {
            for (j, value) in row.iter_mut().enumerate() {
                *value = table
                    .window_sum(i, j, window_azimuth, window_range)
                    .map_or(0.0, |sums| sums.coherence());
            }
        })?;

        Ok(output)
    }
}

/// Normal equations `A^T A x = A^T b` of a two-parameter least-squares fit
#[derive(Debug, Clone, Default)]
pub struct NormalEquations {
    ata: [[f64; 2]; 2],
    atb: [f64; 2],
}

impl NormalEquations {
    /// Accumulate one observation row `a . x = b`
    #[inline]
    pub fn add_row(&mut self, a: [f64; 2], b: f64) {
        for i in 0..2 {
            for j in 0..2 {
                self.ata[i][j] += a[i] * a[j];
            }
            self.atb[i] += a[i] * b;
        }
    }

    /// Solve for `x`; fails with `SingularSystem` when `A^T A` is not invertible
    pub fn solve(&self) -> InsarResult<[f64; 2]> {
        let [[a, b], [c, d]] = self.ata;
        let determinant = a * d - b * c;
        if determinant.abs() < 1e-12 || !determinant.is_finite() {
            return Err(InsarError::SingularSystem { determinant });
        }
        let [u, v] = self.atb;
        Ok([(d * u - b * v) / determinant, (a * v - c * u) / determinant])
    }
}

/// Ramp-compensated estimator.
///
/// Within each window the wrapped phase differences between vertically and
/// horizontally adjacent pixels are fitted by an azimuth and a range phase rate.
/// Samples are derotated by that ramp before summing. The same window serves for
/// the ramp fit and for the summation. A window whose fit is singular (for
/// instance a single row or column) is summed without derotation.
pub struct RampCompensatedEstimator {
    schedule: RowSchedule,
}

impl RampCompensatedEstimator {
    pub fn new(schedule: RowSchedule) -> Self {
        Self { schedule }
    }

    /// Least-squares (azimuth, range) phase rates in radians per pixel
    pub fn estimate_ramp(
        phases: &RealMatrix,
        row: usize,
        col: usize,
        window_azimuth: usize,
        window_range: usize,
    ) -> InsarResult<[f64; 2]> {
        let mut system = NormalEquations::default();
        for k in 0..window_azimuth {
            for l in 0..window_range {
                let here = phases[[row + k, col + l]];
                if k + 1 < window_azimuth {
                    let below = phases[[row + k + 1, col + l]];
                    system.add_row([1.0, 0.0], wrap_phase(below - here));
                }
                if l + 1 < window_range {
                    let right = phases[[row + k, col + l + 1]];
                    system.add_row([0.0, 1.0], wrap_phase(right - here));
                }
            }
        }
        system.solve()
    }
}

impl CoherenceEstimator for RampCompensatedEstimator {
    fn method(&self) -> CoherenceMethod {
        CoherenceMethod::RampCompensated
    }

    fn estimate(
        &self,
        ifg: &ComplexMatrix,
        norms: &NormsMatrix,
        window_azimuth: usize,
        window_range: usize,
    ) -> InsarResult<RealMatrix> {
        let mut output =
            prepare_output("ramp compensated", ifg, norms, window_azimuth, window_range)?;
        let phases = ifg.mapv(phase);
        let fallbacks = AtomicUsize::new(0);

        self.schedule.fill_rows(&mut output, |i, mut row| {
            for (j, value) in row.iter_mut().enumerate() {
                let [rate_azimuth, rate_range] =
                    Self::estimate_ramp(&phases, i, j, window_azimuth, window_range)
                        .unwrap_or_else(|_| {
                            fallbacks.fetch_add(1, Ordering::Relaxed);
                            [0.0, 0.0]
                        });

                let mut sums = WindowSums::default();
                for k in 0..window_azimuth {
                    for l in 0..window_range {
                        let ramp = rate_azimuth * k as f64 + rate_range * l as f64;
                        let derotated = ifg[[i + k, j + l]] * SarComplex::from_polar(1.0, -ramp);
                        sums.add(derotated, norms[[i + k, j + l]]);
                    }
                }
                *value = sums.coherence();
            }
        })?;

        let fallbacks = fallbacks.into_inner();
        if fallbacks > 0 {
            log::debug!("{} windows had a singular ramp fit, used zero ramp", fallbacks);
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::interferogram::{compute_interferogram, compute_norms};
    use approx::assert_abs_diff_eq;

    fn ramp_ifg(
        rows: usize,
        cols: usize,
        rate_az: f64,
        rate_rg: f64,
    ) -> (ComplexMatrix, NormsMatrix) {
        let ifg = Array2::from_shape_fn((rows, cols), |(r, c)| {
            SarComplex::from_polar(1.0, rate_az * r as f64 + rate_rg * c as f64)
        });
        let norms = Array2::from_elem((rows, cols), PowerPair::new(1.0, 1.0));
        (ifg, norms)
    }

    fn all_estimators() -> Vec<Box<dyn CoherenceEstimator>> {
        vec![
            CoherenceMethod::SlidingWindow.estimator(RowSchedule::sequential()),
            CoherenceMethod::SummedArea.estimator(RowSchedule::sequential()),
            CoherenceMethod::RampCompensated.estimator(RowSchedule::sequential()),
        ]
    }

    #[test]
    fn test_window_coherence_guards() {
        assert_eq!(window_coherence(SarComplex::new(1.0, 0.0), PowerPair::new(0.0, 1.0)), 0.0);
        assert_eq!(window_coherence(SarComplex::new(1.0, 0.0), PowerPair::new(-1.0, 1.0)), 0.0);
        assert_eq!(window_coherence(SarComplex::new(2.0, 0.0), PowerPair::new(1.0, 1.0)), 1.0);
        assert_abs_diff_eq!(
            window_coherence(SarComplex::new(0.0, 1.0), PowerPair::new(4.0, 1.0)),
            0.5,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_output_shape_and_identical_images() {
        let master =
            Array2::from_shape_fn((7, 9), |(r, c)| SarComplex::new(1.0 + r as f64, c as f64 - 4.0));
        let ifg = compute_interferogram(&master, &master).unwrap();
        let norms = compute_norms(&master, &master).unwrap();

        for estimator in all_estimators() {
            let coherence = estimator.estimate(&ifg, &norms, 3, 5).unwrap();
            assert_eq!(coherence.dim(), (5, 5));
            for v in coherence.iter() {
                assert_abs_diff_eq!(*v, 1.0, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_zero_power_is_zero_coherence() {
        let ifg = Array2::<SarComplex>::zeros((4, 4));
        let norms = Array2::from_elem((4, 4), PowerPair::default());

        for estimator in all_estimators() {
            let coherence = estimator.estimate(&ifg, &norms, 2, 2).unwrap();
            assert!(coherence.iter().all(|&v| v == 0.0), "{:?}", estimator.method());
        }
    }

    #[test]
    fn test_sliding_matches_summed_area() {
        let master = Array2::from_shape_fn((12, 17), |(r, c)| {
            SarComplex::from_polar(1.0 + ((r * 7 + c * 3) % 5) as f64, (r * c) as f64 * 0.37)
        });
        let slave = Array2::from_shape_fn((12, 17), |(r, c)| {
            SarComplex::from_polar(0.5 + ((r + c * 2) % 3) as f64, (r + c) as f64 * 1.1)
        });
        let ifg = compute_interferogram(&master, &slave).unwrap();
        let norms = compute_norms(&master, &slave).unwrap();

        let a = SlidingWindowEstimator::new(RowSchedule::sequential())
            .estimate(&ifg, &norms, 3, 4)
            .unwrap();
        let b = SummedAreaEstimator::new(RowSchedule::sequential())
            .estimate(&ifg, &norms, 3, 4)
            .unwrap();

        for (x, y) in a.iter().zip(b.iter()) {
            assert_abs_diff_eq!(*x, *y, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_ramp_compensation() {
        let (ifg, norms) = ramp_ifg(16, 16, 0.4, -0.7);

        let compensated = RampCompensatedEstimator::new(RowSchedule::sequential())
            .estimate(&ifg, &norms, 5, 5)
            .unwrap();
        let plain = SummedAreaEstimator::new(RowSchedule::sequential())
            .estimate(&ifg, &norms, 5, 5)
            .unwrap();

        for v in compensated.iter() {
            assert_abs_diff_eq!(*v, 1.0, epsilon = 1e-9);
        }
        for v in plain.iter() {
            assert!(*v < 0.9, "uncompensated coherence {}", v);
        }
    }

    #[test]
    fn test_estimate_ramp_recovers_rates() {
        let (ifg, _) = ramp_ifg(9, 9, 2.5, -3.0);
        let phases = ifg.mapv(phase);

        let [az, rg] = RampCompensatedEstimator::estimate_ramp(&phases, 1, 2, 5, 7).unwrap();
        assert_abs_diff_eq!(az, 2.5, epsilon = 1e-9);
        assert_abs_diff_eq!(rg, -3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_single_row_window_falls_back() {
        let (ifg, norms) = ramp_ifg(4, 8, 0.0, 0.5);
        let phases = ifg.mapv(phase);

        assert!(matches!(
            RampCompensatedEstimator::estimate_ramp(&phases, 0, 0, 1, 4),
            Err(InsarError::SingularSystem { .. })
        ));

        let compensated = RampCompensatedEstimator::new(RowSchedule::sequential())
            .estimate(&ifg, &norms, 1, 4)
            .unwrap();
        let plain = SlidingWindowEstimator::new(RowSchedule::sequential())
            .estimate(&ifg, &norms, 1, 4)
            .unwrap();
        for (x, y) in compensated.iter().zip(plain.iter()) {
            assert_abs_diff_eq!(*x, *y, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_normal_equations() {
        let mut system = NormalEquations::default();
        system.add_row([1.0, 0.0], 2.0);
        system.add_row([0.0, 1.0], -1.0);
        system.add_row([1.0, 1.0], 1.0);
        let [x, y] = system.solve().unwrap();
        assert_abs_diff_eq!(x, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(y, -1.0, epsilon = 1e-12);

        let mut singular = NormalEquations::default();
        singular.add_row([1.0, 0.0], 3.0);
        assert!(singular.solve().is_err());
    }

    #[test]
    fn test_entry_validation() {
        let ifg = Array2::<SarComplex>::zeros((4, 4));
        let norms = Array2::from_elem((4, 5), PowerPair::default());
        let square_norms = Array2::from_elem((4, 4), PowerPair::default());

        for estimator in all_estimators() {
            assert!(matches!(
                estimator.estimate(&ifg, &norms, 2, 2),
                Err(InsarError::ShapeMismatch { .. })
            ));
            assert!(matches!(
                estimator.estimate(&ifg, &square_norms, 5, 2),
                Err(InsarError::WindowTooLarge { .. })
            ));
            assert!(matches!(
                estimator.estimate(&ifg, &square_norms, 0, 2),
                Err(InsarError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let (ifg, norms) = ramp_ifg(70, 20, 0.1, 0.2);
        let parallel = RowSchedule {
            chunk_size: 8,
            ..RowSchedule::default()
        };

        for method in [
            CoherenceMethod::SlidingWindow,
            CoherenceMethod::SummedArea,
            CoherenceMethod::RampCompensated,
        ] {
            let seq = method
                .estimator(RowSchedule::sequential())
                .estimate(&ifg, &norms, 3, 3)
                .unwrap();
            let par = method
                .estimator(parallel.clone())
                .estimate(&ifg, &norms, 3, 3)
                .unwrap();
            assert_eq!(seq, par, "{:?}", method);
        }
    }

    fn speckled_pair(rows: usize, cols: usize) -> (ComplexMatrix, ComplexMatrix) {
        let master = Array2::from_shape_fn((rows, cols), |(r, c)| {
            SarComplex::from_polar(1.0 + ((r * 5 + c * 3) % 4) as f64, (r * c) as f64 * 0.41)
        });
        let slave = Array2::from_shape_fn((rows, cols), |(r, c)| {
            SarComplex::from_polar(0.5 + ((r + c * 2) % 3) as f64, (r + 2 * c) as f64 * 0.9)
        });
        (master, slave)
    }

    #[test]
    fn test_nan_sample_only_affects_windows_holding_it() {
        let (master, slave) = speckled_pair(8, 8);
        let clean_ifg = compute_interferogram(&master, &slave).unwrap();
        let clean_norms = compute_norms(&master, &slave).unwrap();

        let mut corrupted = master.clone();
        corrupted[[1, 1]] = SarComplex::new(f64::NAN, 0.0);
        let ifg = compute_interferogram(&corrupted, &slave).unwrap();
        let norms = compute_norms(&corrupted, &slave).unwrap();

        for estimator in all_estimators() {
            let clean = estimator.estimate(&clean_ifg, &clean_norms, 2, 2).unwrap();
            let coherence = estimator.estimate(&ifg, &norms, 2, 2).unwrap();
            for ((r, c), v) in coherence.indexed_iter() {
                if r <= 1 && c <= 1 {
                    assert_eq!(*v, 0.0, "{:?} window ({}, {})", estimator.method(), r, c);
                } else {
                    assert_abs_diff_eq!(*v, clean[[r, c]], epsilon = 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_infinite_power_leaves_later_windows_intact() {
        let (ifg, mut norms) = ramp_ifg(6, 10, 0.0, 0.0);
        norms[[2, 0]] = PowerPair::new(f64::INFINITY, 1.0);

        let sliding = SlidingWindowEstimator::new(RowSchedule::sequential())
            .estimate(&ifg, &norms, 3, 3)
            .unwrap();
        let summed = SummedAreaEstimator::new(RowSchedule::sequential())
            .estimate(&ifg, &norms, 3, 3)
            .unwrap();

        for coherence in [&sliding, &summed] {
            assert_eq!(coherence[[0, 0]], 0.0);
            assert_eq!(coherence[[2, 0]], 0.0);
            assert_abs_diff_eq!(coherence[[0, 1]], 1.0, epsilon = 1e-12);
            assert_abs_diff_eq!(coherence[[3, 7]], 1.0, epsilon = 1e-12);
        }
        assert_eq!(sliding, summed);
    }

    #[test]
    fn test_window_sums_counts_invalid_samples() {
        let mut sums = WindowSums::default();
        sums.add(SarComplex::new(1.0, 0.0), PowerPair::new(1.0, 1.0));
        sums.add(SarComplex::new(f64::NAN, 0.0), PowerPair::new(1.0, 1.0));
        assert_eq!(sums.invalid, 1);
        assert_eq!(sums.coherence(), 0.0);

        sums.remove(SarComplex::new(f64::NAN, 0.0), PowerPair::new(1.0, 1.0));
        assert_eq!(sums.invalid, 0);
        assert_abs_diff_eq!(sums.coherence(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_summed_area_window_bounds() {
        let (ifg, norms) = ramp_ifg(4, 5, 0.0, 0.0);
        let table = SummedAreaTable::build(&ifg, &norms).unwrap();

        let whole = table.window_sum(0, 0, 4, 5).unwrap();
        assert_abs_diff_eq!(whole.ifg.re, 20.0, epsilon = 1e-12);
        assert_eq!(whole.powers, PowerPair::new(20.0, 20.0));
        assert!(table.window_sum(1, 0, 4, 5).is_none());
        assert!(table.window_sum(0, 3, 1, 3).is_none());
    }
}
