use crate::core::radar_utils::{check_factors, is_power_of_two};
use crate::types::{ComplexMatrix, InsarError, InsarResult, SarComplex, Window};
use ndarray::{s, Array2, ArrayViewMut1, Axis, Zip};
use rustfft::{Fft, FftDirection, FftPlanner};
use serde::{Deserialize, Serialize};

/// Spectral oversampling parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OversampleParams {
    /// Oversampling factor along azimuth (rows)
    pub azimuth_factor: usize,
    /// Oversampling factor along range (columns)
    pub range_factor: usize,
    /// Run the per-lane FFTs in parallel
    pub enable_parallel: bool,
}

impl Default for OversampleParams {
    fn default() -> Self {
        Self {
            azimuth_factor: 1,
            range_factor: 2,
            enable_parallel: true,
        }
    }
}

/// Band-limited interpolation by zero padding in the frequency domain
pub struct SpectralOversampler {
    params: OversampleParams,
}

impl SpectralOversampler {
    pub fn new(params: OversampleParams) -> Self {
        Self { params }
    }

    /// Oversampler with the same factor on both axes
    pub fn uniform(factor: usize) -> Self {
        Self::new(OversampleParams {
            azimuth_factor: factor,
            range_factor: factor,
            ..OversampleParams::default()
        })
    }

    pub fn params(&self) -> &OversampleParams {
        &self.params
    }

    /// Oversample `data` to `(rows * azimuth_factor, cols * range_factor)`.
    ///
    /// Padded axes must have power-of-two extents; vectors (1xN, Nx1) are rejected.
    /// The input is never modified.
    pub fn oversample(&self, data: &ComplexMatrix) -> InsarResult<ComplexMatrix> {
        let factor_row = self.params.azimuth_factor;
        let factor_col = self.params.range_factor;
        check_factors("oversampling", factor_row, factor_col)?;

        let (rows, cols) = data.dim();
        if rows <= 1 || cols <= 1 {
            return Err(InsarError::InvalidShape {
                rows,
                cols,
                reason: "oversampling needs a 2D matrix, not a vector".to_string(),
            });
        }
        if factor_row > 1 && !is_power_of_two(rows) {
            return Err(InsarError::NonPowerOfTwoExtent {
                axis: "azimuth",
                extent: rows,
                factor: factor_row,
            });
        }
        if factor_col > 1 && !is_power_of_two(cols) {
            return Err(InsarError::NonPowerOfTwoExtent {
                axis: "range",
                extent: cols,
                factor: factor_col,
            });
        }

        if factor_row == 1 && factor_col == 1 {
            return Ok(data.clone());
        }

        log::info!(
            "Oversampling {}x{} matrix by {}x{}",
            rows,
            cols,
            factor_row,
            factor_col
        );

        let padded_axes: Vec<Axis> = [(Axis(0), factor_row), (Axis(1), factor_col)]
            .iter()
            .filter(|(_, factor)| *factor > 1)
            .map(|(axis, _)| *axis)
            .collect();
        log::debug!("Zero padding along axes {:?}", padded_axes);

        // Forward transform along every padded axis, then halve its Nyquist bin
        // so the energy splits evenly between the two band copies.
        let mut spectrum = data.clone();
        for &axis in &padded_axes {
            fft_along_axis(&mut spectrum, axis, FftDirection::Forward, self.params.enable_parallel);
            let nyquist = spectrum.len_of(axis) / 2;
            spectrum
                .index_axis_mut(axis, nyquist)
                .mapv_inplace(|z| z * 0.5);
        }

        let mut padded = Array2::<SarComplex>::zeros((rows * factor_row, cols * factor_col));
        for (src, dst) in band_windows(rows, cols, factor_row, factor_col) {
            set_block(&mut padded, &dst, &spectrum, &src);
        }

        for &axis in &padded_axes {
            fft_along_axis(&mut padded, axis, FftDirection::Inverse, self.params.enable_parallel);
        }

        let scale = (factor_row * factor_col) as f64;
        padded.mapv_inplace(|z| z * scale);

        log::debug!("Oversampled output: {}x{}", padded.nrows(), padded.ncols());
        Ok(padded)
    }
}

/// Oversample with default execution settings
pub fn oversample(
    data: &ComplexMatrix,
    factor_row: usize,
    factor_col: usize,
) -> InsarResult<ComplexMatrix> {
    SpectralOversampler::new(OversampleParams {
        azimuth_factor: factor_row,
        range_factor: factor_col,
        ..OversampleParams::default()
    })
    .oversample(data)
}

/// Source/destination index bands along one axis, as
/// `(src_min, src_max, dst_min, dst_max)` inclusive.
///
/// An unpadded axis maps onto itself. A padded axis keeps the low band
/// `[0, n/2]` at the start and moves the high band `[n/2, n-1]` to the end of the
/// padded axis, leaving zeros in the middle.
fn axis_bands(n: usize, factor: usize) -> Vec<(usize, usize, usize, usize)> {
    if factor == 1 {
        return vec![(0, n - 1, 0, n - 1)];
    }
    let half = n / 2;
    let padded = n * factor;
    vec![(0, half, 0, half), (half, n - 1, padded - half, padded - 1)]
}

/// Spectrum blocks to copy into the zero padded output: one block when a single
/// axis is padded, four quadrants when both are.
fn band_windows(
    rows: usize,
    cols: usize,
    factor_row: usize,
    factor_col: usize,
) -> Vec<(Window, Window)> {
    let row_bands = axis_bands(rows, factor_row);
    let col_bands = axis_bands(cols, factor_col);

    let mut windows = Vec::with_capacity(row_bands.len() * col_bands.len());
    for &(src_r0, src_r1, dst_r0, dst_r1) in &row_bands {
        for &(src_c0, src_c1, dst_c0, dst_c1) in &col_bands {
            windows.push((
                Window::new(src_r0, src_r1, src_c0, src_c1),
                Window::new(dst_r0, dst_r1, dst_c0, dst_c1),
            ));
        }
    }
    windows
}

/// Copy `src[src_window]` into `dst[dst_window]`; both windows have equal extents
fn set_block(
    dst: &mut ComplexMatrix,
    dst_window: &Window,
    src: &ComplexMatrix,
    src_window: &Window,
) {
    debug_assert_eq!(dst_window.rows(), src_window.rows());
    debug_assert_eq!(dst_window.cols(), src_window.cols());

    dst.slice_mut(s![
        dst_window.row_min..=dst_window.row_max,
        dst_window.col_min..=dst_window.col_max
    ])
    .assign(&src.slice(s![
        src_window.row_min..=src_window.row_max,
        src_window.col_min..=src_window.col_max
    ]));
}

/// 1D FFT of every lane along `axis`, in place. Inverse transforms are
/// normalised by the lane length.
pub(crate) fn fft_along_axis(
    data: &mut ComplexMatrix,
    axis: Axis,
    direction: FftDirection,
    parallel: bool,
) {
    let n = data.len_of(axis);
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft(n, direction);
    let scale = match direction {
        FftDirection::Forward => 1.0,
        FftDirection::Inverse => 1.0 / n as f64,
    };

    #[cfg(feature = "parallel")]
    {
        if parallel {
            Zip::from(data.lanes_mut(axis)).par_for_each(|lane| transform_lane(&*fft, scale, lane));
            return;
        }
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;

    Zip::from(data.lanes_mut(axis)).for_each(|lane| transform_lane(&*fft, scale, lane));
}

fn transform_lane(fft: &dyn Fft<f64>, scale: f64, mut lane: ArrayViewMut1<SarComplex>) {
    let mut buffer: Vec<SarComplex> = lane.to_vec();
    fft.process(&mut buffer);
    for (dst, value) in lane.iter_mut().zip(buffer) {
        *dst = value * scale;
    }
}
