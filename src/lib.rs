//! beatkey - tempo, key and frequency estimation for audio files
//!
//! Each estimate is fused from several independent measurements of the
//! same signal. Measurements come from a [`FeatureExtractor`]; the crate
//! ships [`SpectralEngine`], an FFT-based implementation, and any other
//! engine can be plugged in through [`AnalyzerBuilder::extractor`].
//!
//! ## Module Structure
//!
//! - `core` - waveform loading, feature extraction and the estimators
//! - `config` - estimator settings and config-file loading
//! - `detection` - key types and result records
//! - `cli` - command-line interface
//! - `testgen` - synthetic click tracks, tones and chords
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use beatkey::{Analyzer, LoadOptions};
//!
//! let analyzer = Analyzer::new();
//! let result = analyzer.analyze_file(path, &LoadOptions::default())?;
//! println!("{} BPM in {}", result.bpm, result.key);
//! ```
//!
//! ## Estimators
//!
//! | Estimator | Inputs                                  | Fallback        |
//! |-----------|-----------------------------------------|-----------------|
//! | Tempo     | three onset envelopes, two tempo methods | 120 BPM         |
//! | Key       | three weighted chroma variants          | harmonic triad  |
//! | Frequency | pitch track, zero crossings, spectrum   | `None`          |

pub mod cli;
pub mod config;
pub mod core;
pub mod detection;
pub mod testgen;

pub use config::EstimatorConfig;
pub use core::{
    Analyzer, AnalyzerBuilder, FeatureError, FeatureExtractor, FrequencyEstimate,
    FrequencyEstimator, KeyEstimator, LoadOptions, SpectralEngine, TempoEstimator, Waveform,
};
pub use detection::{EstimationResult, KeyEstimate, Mode, PitchClass};
