use crate::core::oversample::oversample;
use crate::types::{ensure_same_shape, ComplexMatrix, InsarResult, NormsMatrix, PowerPair};
use ndarray::Zip;

/// Interferogram `master * conj(slave)`, elementwise.
pub fn compute_interferogram(
    master: &ComplexMatrix,
    slave: &ComplexMatrix,
) -> InsarResult<ComplexMatrix> {
    ensure_same_shape(master.dim(), slave.dim())?;

    log::debug!("Computing {}x{} interferogram", master.nrows(), master.ncols());

    Ok(Zip::from(master)
        .and(slave)
        .map_collect(|m, s| m * s.conj()))
}

/// Interferogram of both inputs oversampled by the same factors.
///
/// Factors of (1, 1) skip oversampling.
pub fn compute_interferogram_oversampled(
    master: &ComplexMatrix,
    slave: &ComplexMatrix,
    factor_azimuth: usize,
    factor_range: usize,
) -> InsarResult<ComplexMatrix> {
    ensure_same_shape(master.dim(), slave.dim())?;

    if factor_azimuth == 1 && factor_range == 1 {
        return compute_interferogram(master, slave);
    }

    let master = oversample(master, factor_azimuth, factor_range)?;
    let slave = oversample(slave, factor_azimuth, factor_range)?;
    compute_interferogram(&master, &slave)
}

/// Per-pixel master and slave power, the normalisation input of coherence estimation
pub fn compute_norms(master: &ComplexMatrix, slave: &ComplexMatrix) -> InsarResult<NormsMatrix> {
    ensure_same_shape(master.dim(), slave.dim())?;

    Ok(Zip::from(master)
        .and(slave)
        .map_collect(|m, s| PowerPair::new(m.norm_sqr(), s.norm_sqr())))
}

/// Norms of both inputs oversampled by the same factors, matching
/// [`compute_interferogram_oversampled`].
pub fn compute_norms_oversampled(
    master: &ComplexMatrix,
    slave: &ComplexMatrix,
    factor_azimuth: usize,
    factor_range: usize,
) -> InsarResult<NormsMatrix> {
    ensure_same_shape(master.dim(), slave.dim())?;

    if factor_azimuth == 1 && factor_range == 1 {
        return compute_norms(master, slave);
    }

    let master = oversample(master, factor_azimuth, factor_range)?;
    let slave = oversample(slave, factor_azimuth, factor_range)?;
    compute_norms(&master, &slave)
}
