use crate::core::coherence::CoherenceParams;
use crate::core::interferogram::{compute_interferogram, compute_norms};
use crate::core::multilook::{MultilookParams, MultilookProcessor};
use crate::core::oversample::{OversampleParams, SpectralOversampler};
use crate::core::parallel::{CancelFlag, RowSchedule};
use crate::core::radar_utils::is_power_of_two;
use crate::core::radiometric;
use crate::types::{
    ensure_same_shape, ComplexMatrix, InsarError, InsarResult, NormsMatrix, RealMatrix,
};
use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Processing configuration surfaced to the host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsarConfig {
    /// Largest FFT length the host carves tiles for; padded axes may not exceed it
    pub fft_window_length: usize,
    /// Spectral oversampling applied to both images before forming the interferogram
    pub oversample: OversampleParams,
    /// Coherence window and estimator
    pub coherence: CoherenceParams,
    /// Optional multilooking of the products
    pub multilook: Option<MultilookParams>,
}

impl Default for InsarConfig {
    fn default() -> Self {
        Self {
            fft_window_length: 1024,
            oversample: OversampleParams {
                azimuth_factor: 1,
                range_factor: 1,
                enable_parallel: true,
            },
            coherence: CoherenceParams::default(),
            multilook: None,
        }
    }
}

impl InsarConfig {
    /// Check every parameter before any data is touched
    pub fn validate(&self) -> InsarResult<()> {
        if !is_power_of_two(self.fft_window_length) {
            return Err(InsarError::InvalidParameter(format!(
                "FFT window length {} is not a power of two",
                self.fft_window_length
            )));
        }
        if self.oversample.azimuth_factor == 0 || self.oversample.range_factor == 0 {
            return Err(InsarError::InvalidParameter(
                "oversampling factors must be >= 1".to_string(),
            ));
        }
        if self.coherence.window_azimuth == 0 || self.coherence.window_range == 0 {
            return Err(InsarError::InvalidParameter(
                "coherence window must be at least 1x1".to_string(),
            ));
        }
        if self.coherence.chunk_size == 0 {
            return Err(InsarError::InvalidParameter("chunk size must be >= 1".to_string()));
        }
        if let Some(ml) = &self.multilook {
            if ml.azimuth_looks == 0 || ml.range_looks == 0 {
                return Err(InsarError::InvalidParameter(
                    "multilook factors must be >= 1".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Products of one interferometric pair, all on the same grid
#[derive(Debug, Clone)]
pub struct InterferometricProducts {
    pub interferogram: ComplexMatrix,
    pub phase: RealMatrix,
    pub coherence: RealMatrix,
}

/// Interferogram and coherence pipeline for a co-registered master/slave pair
pub struct InsarProcessor {
    config: InsarConfig,
    cancel: Option<CancelFlag>,
}

impl InsarProcessor {
    /// Create a processor, validating the configuration
    pub fn new(config: InsarConfig) -> InsarResult<Self> {
        config.validate()?;
        Ok(Self { config, cancel: None })
    }

    /// Attach a cancellation flag checked between row blocks of coherence estimation
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn config(&self) -> &InsarConfig {
        &self.config
    }

    fn check_inputs(&self, master: &ComplexMatrix, slave: &ComplexMatrix) -> InsarResult<()> {
        ensure_same_shape(master.dim(), slave.dim())?;

        let (rows, cols) = master.dim();
        let limit = self.config.fft_window_length;
        let padded = [
            (rows, self.config.oversample.azimuth_factor),
            (cols, self.config.oversample.range_factor),
        ];
        for (extent, factor) in padded {
            if factor > 1 && extent > limit {
                return Err(InsarError::InvalidParameter(format!(
                    "extent {} exceeds FFT window length {}",
                    extent, limit
                )));
            }
        }
        Ok(())
    }

    fn schedule(&self) -> RowSchedule {
        let mut schedule = self.config.coherence.schedule();
        schedule.cancel = self.cancel.clone();
        schedule
    }

    /// Both inputs on the processing grid; each is oversampled at most once
    fn resampled_pair<'a>(
        &self,
        master: &'a ComplexMatrix,
        slave: &'a ComplexMatrix,
    ) -> InsarResult<(Cow<'a, ComplexMatrix>, Cow<'a, ComplexMatrix>)> {
        self.check_inputs(master, slave)?;

        let params = &self.config.oversample;
        if params.azimuth_factor == 1 && params.range_factor == 1 {
            return Ok((Cow::Borrowed(master), Cow::Borrowed(slave)));
        }

        let oversampler = SpectralOversampler::new(params.clone());
        Ok((
            Cow::Owned(oversampler.oversample(master)?),
            Cow::Owned(oversampler.oversample(slave)?),
        ))
    }

    /// Interferogram on the (optionally oversampled) grid
    pub fn interferogram(
        &self,
        master: &ComplexMatrix,
        slave: &ComplexMatrix,
    ) -> InsarResult<ComplexMatrix> {
        let (master, slave) = self.resampled_pair(master, slave)?;
        compute_interferogram(&master, &slave)
    }

    /// Norms on the same grid as [`InsarProcessor::interferogram`]
    pub fn norms(&self, master: &ComplexMatrix, slave: &ComplexMatrix) -> InsarResult<NormsMatrix> {
        let (master, slave) = self.resampled_pair(master, slave)?;
        compute_norms(&master, &slave)
    }

    /// Interferogram and norms from a single oversampling pass over each input
    pub fn interferogram_and_norms(
        &self,
        master: &ComplexMatrix,
        slave: &ComplexMatrix,
    ) -> InsarResult<(ComplexMatrix, NormsMatrix)> {
        let (master, slave) = self.resampled_pair(master, slave)?;
        Ok((
            compute_interferogram(&master, &slave)?,
            compute_norms(&master, &slave)?,
        ))
    }

    /// Coherence map, one value per window position (smaller than the input grid)
    pub fn coherence(
        &self,
        master: &ComplexMatrix,
        slave: &ComplexMatrix,
    ) -> InsarResult<RealMatrix> {
        let (ifg, norms) = self.interferogram_and_norms(master, slave)?;
        self.coherence_from(&ifg, &norms)
    }

    fn coherence_from(&self, ifg: &ComplexMatrix, norms: &NormsMatrix) -> InsarResult<RealMatrix> {
        let params = &self.config.coherence;
        params.method.estimator(self.schedule()).estimate(
            ifg,
            norms,
            params.window_azimuth,
            params.window_range,
        )
    }

    /// Coherence on the interferogram grid.
    ///
    /// Each window's value is written at its centre pixel
    /// `(r + window_azimuth / 2, c + window_range / 2)`; border pixels that no
    /// window is centred on are 0.
    pub fn coherence_full_frame(
        &self,
        master: &ComplexMatrix,
        slave: &ComplexMatrix,
    ) -> InsarResult<RealMatrix> {
        let (ifg, norms) = self.interferogram_and_norms(master, slave)?;
        let coherence = self.coherence_from(&ifg, &norms)?;
        Ok(self.centre_on_grid(&coherence, ifg.dim()))
    }

    fn centre_on_grid(&self, coherence: &RealMatrix, grid: (usize, usize)) -> RealMatrix {
        let row_offset = self.config.coherence.window_azimuth / 2;
        let col_offset = self.config.coherence.window_range / 2;
        let (rows, cols) = coherence.dim();

        let mut full = Array2::<f64>::zeros(grid);
        full.slice_mut(s![row_offset..row_offset + rows, col_offset..col_offset + cols])
            .assign(coherence);
        full
    }

    /// Interferogram, phase and coherence of a pair, multilooked if configured
    pub fn process(
        &self,
        master: &ComplexMatrix,
        slave: &ComplexMatrix,
    ) -> InsarResult<InterferometricProducts> {
        log::info!(
            "Processing {}x{} interferometric pair",
            master.nrows(),
            master.ncols()
        );

        let (ifg, norms) = self.interferogram_and_norms(master, slave)?;
        let coherence = self.coherence_from(&ifg, &norms)?;
        let coherence = self.centre_on_grid(&coherence, ifg.dim());

        let (interferogram, coherence) = match &self.config.multilook {
            Some(params) => {
                let multilooker = MultilookProcessor::new(params.clone());
                (
                    multilooker.apply_multilook(&ifg)?,
                    multilooker.apply_multilook_real(&coherence)?,
                )
            }
            None => (ifg, coherence),
        };

        let phase = radiometric::phase(&interferogram);

        log::info!(
            "Interferometric products ready: {}x{}",
            interferogram.nrows(),
            interferogram.ncols()
        );

        Ok(InterferometricProducts {
            interferogram,
            phase,
            coherence,
        })
    }
}
