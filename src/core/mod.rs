//! Core InSAR processing modules

pub mod radar_utils;
pub mod parallel;
pub mod radiometric;
pub mod oversample;
pub mod multilook;
pub mod interferogram;
pub mod coherence;
pub mod processor;

// Re-export main types
pub use parallel::{CancelFlag, RowSchedule};
pub use radiometric::{intensity, magnitude, phase, to_db};
pub use oversample::{oversample, OversampleParams, SpectralOversampler};
pub use multilook::{multilook, MultilookParams, MultilookProcessor};
pub use interferogram::{
    compute_interferogram, compute_interferogram_oversampled, compute_norms,
    compute_norms_oversampled,
};
pub use coherence::{
    estimate_coherence, CoherenceEstimator, CoherenceMethod, CoherenceParams, NormalEquations,
    RampCompensatedEstimator, SlidingWindowEstimator, SummedAreaEstimator, SummedAreaTable,
    WindowSums,
};
pub use processor::{InsarConfig, InsarProcessor, InterferometricProducts};
