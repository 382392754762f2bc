use crate::core::radar_utils::check_factors;
use crate::types::{ComplexMatrix, InsarResult, RealMatrix};
use ndarray::{s, Array2};
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Div};

/// Multilooking parameters for speckle reduction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultilookParams {
    /// Number of looks in range direction
    pub range_looks: usize,
    /// Number of looks in azimuth direction
    pub azimuth_looks: usize,
}

impl Default for MultilookParams {
    fn default() -> Self {
        Self {
            range_looks: 4,
            azimuth_looks: 1,
        }
    }
}

/// Multilook processor: block averaging of complex or real rasters
pub struct MultilookProcessor {
    params: MultilookParams,
}

impl MultilookProcessor {
    /// Create a new multilook processor
    pub fn new(params: MultilookParams) -> Self {
        Self { params }
    }

    /// Create processor with standard parameters
    pub fn standard() -> Self {
        Self::new(MultilookParams::default())
    }

    /// Average complex samples over non-overlapping `azimuth_looks x range_looks` blocks
    pub fn apply_multilook(&self, data: &ComplexMatrix) -> InsarResult<ComplexMatrix> {
        multilook(data, self.params.azimuth_looks, self.params.range_looks)
    }

    /// Average real samples (intensity, coherence, ...) over the same blocks
    pub fn apply_multilook_real(&self, data: &RealMatrix) -> InsarResult<RealMatrix> {
        multilook(data, self.params.azimuth_looks, self.params.range_looks)
    }

    /// Calculate equivalent number of looks (ENL) estimate
    ///
    /// This provides a quality metric for the multilooking
    pub fn estimate_enl(&self, intensity: &RealMatrix) -> f64 {
        let mean = intensity.mean().unwrap_or(0.0);
        let variance = intensity.mapv(|x| (x - mean).powi(2)).mean().unwrap_or(0.0);

        if variance > 1e-12 {
            mean * mean / variance
        } else {
            f64::MAX // Uniform data: infinite ENL
        }
    }

    /// Get the theoretical number of looks
    pub fn theoretical_looks(&self) -> usize {
        self.params.range_looks * self.params.azimuth_looks
    }
}

/// Block-average `data` into `(rows / factor_row, cols / factor_col)`.
///
/// Remainder rows and columns are dropped. Factors of (1, 1), or a block larger
/// than the matrix, return the input unchanged.
pub fn multilook<T>(
    data: &Array2<T>,
    factor_row: usize,
    factor_col: usize,
) -> InsarResult<Array2<T>>
where
    T: Copy + Zero + Add<Output = T> + Div<f64, Output = T>,
{
    check_factors("multilook", factor_row, factor_col)?;

    if factor_row == 1 && factor_col == 1 {
        return Ok(data.clone());
    }

    let (rows, cols) = data.dim();
    let out_rows = rows / factor_row;
    let out_cols = cols / factor_col;

    if out_rows == 0 || out_cols == 0 {
        log::warn!(
            "Multilook block {}x{} exceeds {}x{} image, returning input unchanged",
            factor_row,
            factor_col,
            rows,
            cols
        );
        return Ok(data.clone());
    }

    log::info!(
        "Applying multilook: {}x{} looks to {}x{} image -> {}x{}",
        factor_row,
        factor_col,
        rows,
        cols,
        out_rows,
        out_cols
    );

    let area = (factor_row * factor_col) as f64;
    let output = Array2::from_shape_fn((out_rows, out_cols), |(out_row, out_col)| {
        let start_row = out_row * factor_row;
        let start_col = out_col * factor_col;
        let block = data.slice(s![
            start_row..start_row + factor_row,
            start_col..start_col + factor_col
        ]);
        block.iter().fold(T::zero(), |acc, &v| acc + v) / area
    });

    Ok(output)
}
