//! Elementwise radiometric quantities of complex matrices.
//!
//! NaN and infinity propagate following IEEE-754; nothing is special-cased.

use crate::core::radar_utils;
use crate::types::{ComplexMatrix, RealMatrix};

/// Intensity |z|^2 = re^2 + im^2
pub fn intensity(m: &ComplexMatrix) -> RealMatrix {
    m.mapv(|z| z.norm_sqr())
}

/// Magnitude |z|
pub fn magnitude(m: &ComplexMatrix) -> RealMatrix {
    m.mapv(radar_utils::magnitude)
}

/// Phase angle atan2(im, re) in (-pi, pi]
pub fn phase(m: &ComplexMatrix) -> RealMatrix {
    m.mapv(radar_utils::phase)
}

/// Convert linear power to dB, flooring non-positive values
pub fn to_db(linear: &RealMatrix) -> RealMatrix {
    log::debug!("Converting to dB scale");

    linear.mapv(|x| {
        if x > 0.0 {
            10.0 * x.log10()
        } else {
            -50.0 // Minimum dB value for zero/negative values
        }
    })
}
