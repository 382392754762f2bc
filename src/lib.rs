//! insar_core: interferometric SAR kernels
//!
//! Pure in-memory kernels over co-registered single-look-complex tiles:
//! spectral oversampling, interferogram formation, windowed coherence (three
//! interchangeable estimators) and multilooking. Matrices are row-major with
//! azimuth along axis 0 and range along axis 1.

pub mod types;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    complex_matrix_from_interleaved, complex_matrix_from_iq, ComplexMatrix, InsarError,
    InsarResult, NormsMatrix, PowerPair, RealMatrix, SarComplex, Window,
};

pub use crate::core::{
    compute_interferogram, compute_norms, estimate_coherence, multilook, oversample,
    CoherenceEstimator, CoherenceMethod, CoherenceParams, InsarConfig, InsarProcessor,
};

#[cfg(feature = "python")]
mod python {
    use crate::core::parallel::RowSchedule;
    use crate::core::{self as kernels, CoherenceMethod};
    use crate::types::InsarError;
    use num_complex::Complex64;
    use numpy::{IntoPyArray, PyArray2, PyReadonlyArray2};
    use pyo3::prelude::*;

    fn to_py_err(e: InsarError) -> PyErr {
        PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("{}", e))
    }

    fn parse_method(method: &str) -> PyResult<CoherenceMethod> {
        match method.to_lowercase().as_str() {
            "sliding" | "sliding_window" => Ok(CoherenceMethod::SlidingWindow),
            "summed_area" | "sat" => Ok(CoherenceMethod::SummedArea),
            "ramp" | "ramp_compensated" => Ok(CoherenceMethod::RampCompensated),
            _ => Err(PyErr::new::<pyo3::exceptions::PyValueError, _>(format!(
                "Invalid coherence method: {}",
                method
            ))),
        }
    }

    #[pyfunction]
    #[pyo3(name = "oversample")]
    fn py_oversample<'py>(
        py: Python<'py>,
        data: PyReadonlyArray2<'py, Complex64>,
        factor_azimuth: usize,
        factor_range: usize,
    ) -> PyResult<&'py PyArray2<Complex64>> {
        let result = kernels::oversample(&data.as_array().to_owned(), factor_azimuth, factor_range)
            .map_err(to_py_err)?;
        Ok(result.into_pyarray(py))
    }

    #[pyfunction]
    #[pyo3(name = "multilook")]
    fn py_multilook<'py>(
        py: Python<'py>,
        data: PyReadonlyArray2<'py, Complex64>,
        factor_azimuth: usize,
        factor_range: usize,
    ) -> PyResult<&'py PyArray2<Complex64>> {
        let result = kernels::multilook(&data.as_array().to_owned(), factor_azimuth, factor_range)
            .map_err(to_py_err)?;
        Ok(result.into_pyarray(py))
    }

    #[pyfunction]
    #[pyo3(name = "interferogram")]
    fn py_interferogram<'py>(
        py: Python<'py>,
        master: PyReadonlyArray2<'py, Complex64>,
        slave: PyReadonlyArray2<'py, Complex64>,
    ) -> PyResult<&'py PyArray2<Complex64>> {
        let master = master.as_array().to_owned();
        let slave = slave.as_array().to_owned();
        let ifg = kernels::compute_interferogram(&master, &slave).map_err(to_py_err)?;
        Ok(ifg.into_pyarray(py))
    }

    #[pyfunction]
    #[pyo3(name = "intensity")]
    fn py_intensity<'py>(
        py: Python<'py>,
        data: PyReadonlyArray2<'py, Complex64>,
    ) -> &'py PyArray2<f64> {
        kernels::intensity(&data.as_array().to_owned()).into_pyarray(py)
    }

    #[pyfunction]
    #[pyo3(name = "magnitude")]
    fn py_magnitude<'py>(
        py: Python<'py>,
        data: PyReadonlyArray2<'py, Complex64>,
    ) -> &'py PyArray2<f64> {
        kernels::magnitude(&data.as_array().to_owned()).into_pyarray(py)
    }

    #[pyfunction]
    #[pyo3(name = "phase")]
    fn py_phase<'py>(
        py: Python<'py>,
        data: PyReadonlyArray2<'py, Complex64>,
    ) -> &'py PyArray2<f64> {
        kernels::phase(&data.as_array().to_owned()).into_pyarray(py)
    }

    #[pyfunction]
    #[pyo3(
        name = "coherence",
        signature = (master, slave, window_azimuth, window_range, method = "summed_area")
    )]
    fn py_coherence<'py>(
        py: Python<'py>,
        master: PyReadonlyArray2<'py, Complex64>,
        slave: PyReadonlyArray2<'py, Complex64>,
        window_azimuth: usize,
        window_range: usize,
        method: &str,
    ) -> PyResult<&'py PyArray2<f64>> {
        let method = parse_method(method)?;
        let master = master.as_array().to_owned();
        let slave = slave.as_array().to_owned();

        // Release the GIL while the estimator runs on the rayon pool
        let coherence = py
            .allow_threads(|| {
                let ifg = kernels::compute_interferogram(&master, &slave)?;
                let norms = kernels::compute_norms(&master, &slave)?;
                method
                    .estimator(RowSchedule::default())
                    .estimate(&ifg, &norms, window_azimuth, window_range)
            })
            .map_err(to_py_err)?;
        Ok(coherence.into_pyarray(py))
    }

    /// Python module definition
    #[pymodule]
    fn _core(_py: Python, m: &PyModule) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(py_oversample, m)?)?;
        m.add_function(wrap_pyfunction!(py_multilook, m)?)?;
        m.add_function(wrap_pyfunction!(py_interferogram, m)?)?;
        m.add_function(wrap_pyfunction!(py_intensity, m)?)?;
        m.add_function(wrap_pyfunction!(py_magnitude, m)?)?;
        m.add_function(wrap_pyfunction!(py_phase, m)?)?;
        m.add_function(wrap_pyfunction!(py_coherence, m)?)?;
        Ok(())
    }
}
