use crate::types::{InsarError, InsarResult, SarComplex};
use std::f64::consts::PI;

/// True for 1, 2, 4, 8, ...
pub fn is_power_of_two(n: usize) -> bool {
    n != 0 && (n & (n - 1)) == 0
}

/// Wrap a phase value into (-pi, pi]
pub fn wrap_phase(phase: f64) -> f64 {
    let wrapped = phase.sin().atan2(phase.cos());
    // atan2 returns -pi for a negative-zero sine; fold it onto +pi
    if wrapped <= -PI {
        PI
    } else {
        wrapped
    }
}

/// Magnitude of a complex sample
#[inline]
pub fn magnitude(value: SarComplex) -> f64 {
    value.norm()
}

/// Phase of a complex sample in (-pi, pi]
#[inline]
pub fn phase(value: SarComplex) -> f64 {
    value.im.atan2(value.re)
}

/// Shape of a windowed coherence map for a `rows x cols` input.
///
/// Windows must be at least 1x1 and no larger than the input.
pub fn coherence_output_shape(
    rows: usize,
    cols: usize,
    window_azimuth: usize,
    window_range: usize,
) -> InsarResult<(usize, usize)> {
    if window_azimuth == 0 || window_range == 0 {
        return Err(InsarError::InvalidParameter(format!(
            "coherence window must be at least 1x1, got {}x{}",
            window_azimuth, window_range
        )));
    }
    if window_azimuth > rows || window_range > cols {
        return Err(InsarError::WindowTooLarge {
            window: (window_azimuth, window_range),
            rows,
            cols,
        });
    }
    Ok((rows - window_azimuth + 1, cols - window_range + 1))
}

/// Reject zero factors for oversampling / multilooking
pub(crate) fn check_factors(name: &str, factor_row: usize, factor_col: usize) -> InsarResult<()> {
    if factor_row == 0 || factor_col == 0 {
        return Err(InsarError::InvalidParameter(format!(
            "{} factors must be >= 1, got {}x{}",
            name, factor_row, factor_col
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_power_of_two() {
        assert!(is_power_of_two(1));
        assert!(is_power_of_two(2));
        assert!(is_power_of_two(1024));
        assert!(!is_power_of_two(0));
        assert!(!is_power_of_two(6));
        assert!(!is_power_of_two(1023));
    }

    #[test]
    fn test_wrap_phase() {
        assert_abs_diff_eq!(wrap_phase(0.5), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(wrap_phase(2.0 * PI + 0.25), 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(wrap_phase(-2.0 * PI - 0.25), -0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(wrap_phase(1.5 * PI), -0.5 * PI, epsilon = 1e-12);

        let w = wrap_phase(PI);
        assert!(w > 0.0 && w <= PI);
    }

    #[test]
    fn test_output_shape() {
        assert_eq!(coherence_output_shape(10, 20, 3, 5).unwrap(), (8, 16));
        assert_eq!(coherence_output_shape(3, 5, 3, 5).unwrap(), (1, 1));
        assert!(matches!(
            coherence_output_shape(3, 5, 4, 1),
            Err(InsarError::WindowTooLarge { .. })
        ));
        assert!(matches!(
            coherence_output_shape(3, 5, 0, 1),
            Err(InsarError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_sample_helpers() {
        let z = SarComplex::new(0.0, 2.0);
        assert_abs_diff_eq!(magnitude(z), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(phase(z), PI / 2.0, epsilon = 1e-12);
    }
}
