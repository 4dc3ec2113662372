//! Core analysis: waveform loading, feature extraction and estimators

pub mod analysis;
pub mod analyzer;
pub mod decoder;
pub mod dsp;
pub mod features;
pub mod resample;
pub mod waveform;

pub use analysis::{FrequencyEstimate, FrequencyEstimator, KeyEstimator, TempoEstimator};
pub use analyzer::{Analyzer, AnalyzerBuilder};
pub use decoder::{decode_audio, load_waveform, AudioData, LoadOptions};
pub use features::{FeatureError, FeatureExtractor, SpectralEngine};
pub use waveform::Waveform;
