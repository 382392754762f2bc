use ndarray::Array2;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Complex SLC / interferogram sample (I + jQ)
pub type SarComplex = Complex64;

/// 2D complex matrix, row-major: axis 0 is azimuth (lines), axis 1 is range (pixels)
pub type ComplexMatrix = Array2<SarComplex>;

/// 2D real matrix (coherence, intensity, magnitude, phase)
pub type RealMatrix = Array2<f64>;

/// Per-pixel power of the master and slave images.
///
/// Coherence normalisation needs both powers side by side; they are kept as two
/// named real channels rather than packed into the parts of a complex number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PowerPair {
    pub master_power: f64,
    pub slave_power: f64,
}

impl PowerPair {
    pub fn new(master_power: f64, slave_power: f64) -> Self {
        Self {
            master_power,
            slave_power,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.master_power.is_finite() && self.slave_power.is_finite()
    }
}

impl std::ops::Add for PowerPair {
    type Output = PowerPair;

    fn add(self, rhs: PowerPair) -> PowerPair {
        PowerPair::new(
            self.master_power + rhs.master_power,
            self.slave_power + rhs.slave_power,
        )
    }
}

impl std::ops::Sub for PowerPair {
    type Output = PowerPair;

    fn sub(self, rhs: PowerPair) -> PowerPair {
        PowerPair::new(
            self.master_power - rhs.master_power,
            self.slave_power - rhs.slave_power,
        )
    }
}

/// Norms matrix: master and slave power for every pixel of an interferogram
pub type NormsMatrix = Array2<PowerPair>;

/// Inclusive rectangular index range over a matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub row_min: usize,
    pub row_max: usize,
    pub col_min: usize,
    pub col_max: usize,
}

impl Window {
    pub fn new(row_min: usize, row_max: usize, col_min: usize, col_max: usize) -> Self {
        debug_assert!(row_min <= row_max && col_min <= col_max);
        Self {
            row_min,
            row_max,
            col_min,
            col_max,
        }
    }

    /// Number of rows covered (inclusive bounds)
    pub fn rows(&self) -> usize {
        self.row_max - self.row_min + 1
    }

    /// Number of columns covered (inclusive bounds)
    pub fn cols(&self) -> usize {
        self.col_max - self.col_min + 1
    }
}

/// Error types for InSAR processing
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InsarError {
    #[error("Invalid matrix shape {rows}x{cols}: {reason}")]
    InvalidShape {
        rows: usize,
        cols: usize,
        reason: String,
    },

    #[error("Extent {extent} along {axis} is not a power of two (oversampling factor {factor})")]
    NonPowerOfTwoExtent {
        axis: &'static str,
        extent: usize,
        factor: usize,
    },

    #[error("Shape mismatch: {left:?} vs {right:?}")]
    ShapeMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error("Singular least-squares system (determinant {determinant:e})")]
    SingularSystem { determinant: f64 },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Window {window:?} does not fit a {rows}x{cols} matrix")]
    WindowTooLarge {
        window: (usize, usize),
        rows: usize,
        cols: usize,
    },

    #[error("Processing cancelled")]
    Cancelled,
}

/// Result type for InSAR operations
pub type InsarResult<T> = Result<T, InsarError>;

/// Build a complex matrix from interleaved `re, im` doubles (row-major).
///
/// The buffer is copied; the caller keeps ownership of it.
pub fn complex_matrix_from_interleaved(
    rows: usize,
    cols: usize,
    buffer: &[f64],
) -> InsarResult<ComplexMatrix> {
    check_buffer(rows, cols, buffer.len(), 2)?;

    let samples: Vec<SarComplex> = buffer
        .chunks_exact(2)
        .map(|pair| SarComplex::new(pair[0], pair[1]))
        .collect();

    Array2::from_shape_vec((rows, cols), samples).map_err(|e| InsarError::InvalidShape {
        rows,
        cols,
        reason: e.to_string(),
    })
}

/// Build a complex matrix from separate I and Q channels (row-major), as stored
/// in two-band SLC rasters.
pub fn complex_matrix_from_iq(
    rows: usize,
    cols: usize,
    i_data: &[f32],
    q_data: &[f32],
) -> InsarResult<ComplexMatrix> {
    check_buffer(rows, cols, i_data.len(), 1)?;
    check_buffer(rows, cols, q_data.len(), 1)?;

    let samples: Vec<SarComplex> = i_data
        .iter()
        .zip(q_data)
        .map(|(&i, &q)| SarComplex::new(i as f64, q as f64))
        .collect();

    Array2::from_shape_vec((rows, cols), samples).map_err(|e| InsarError::InvalidShape {
        rows,
        cols,
        reason: e.to_string(),
    })
}

fn check_buffer(rows: usize, cols: usize, len: usize, values_per_sample: usize) -> InsarResult<()> {
    if rows == 0 || cols == 0 {
        return Err(InsarError::InvalidShape {
            rows,
            cols,
            reason: "matrix extents must be positive".to_string(),
        });
    }
    let expected = rows * cols * values_per_sample;
    if len != expected {
        return Err(InsarError::InvalidShape {
            rows,
            cols,
            reason: format!("buffer holds {} values, expected {}", len, expected),
        });
    }
    Ok(())
}

/// Fail with `ShapeMismatch` unless both shapes are equal
pub(crate) fn ensure_same_shape(left: (usize, usize), right: (usize, usize)) -> InsarResult<()> {
    if left != right {
        return Err(InsarError::ShapeMismatch { left, right });
    }
    Ok(())
}
