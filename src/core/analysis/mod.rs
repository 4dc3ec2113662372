//! Estimators that fuse low-level features into final values
//!
//! Each estimator is a total function over a waveform: per-method
//! feature failures become missing candidates and an empty candidate set
//! maps to a fixed default.

mod candidates;
mod frequency;
mod key;
mod tempo;

pub use candidates::{admit_positive, iqr_filter, isolate};
pub use frequency::{FrequencyEstimate, FrequencyEstimator};
pub use key::{dot, normalize, rotate, ChromaVector, KeyCorrelation, KeyEstimator, MAJOR_PROFILE, MINOR_PROFILE};
pub use tempo::TempoEstimator;
