// src/config/settings.rs
//
// Tunable constants for the tempo, key and frequency estimators.
// Every field has a default, so a configuration file only needs to
// mention what it changes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::features::{ChromaVariant, FrequencyRange, TempoAggregate, TempoRange};
use crate::detection::KeyEstimate;

/// Rejected configuration value
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{field} must lie in [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("{field} range is inverted or not finite: {min}..{max}")]
    BadRange { field: &'static str, min: f64, max: f64 },
}

/// Source of one tempo onset envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnsetMethod {
    /// Spectral flux of the full signal
    Plain,
    /// Spectral flux of the percussive component
    Percussive,
    /// Rise of the spectral centroid
    CentroidWeighted,
}

impl OnsetMethod {
    pub fn name(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Percussive => "percussive",
            Self::CentroidWeighted => "centroid",
        }
    }
}

/// One onset envelope and how its direct tempo estimate is searched
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OnsetMethodConfig {
    pub method: OnsetMethod,
    pub search_range: TempoRange,
    pub aggregate: TempoAggregate,
}

impl OnsetMethodConfig {
    pub const fn new(method: OnsetMethod, search_range: TempoRange, aggregate: TempoAggregate) -> Self {
        Self {
            method,
            search_range,
            aggregate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TempoConfig {
    /// Hop size (samples) of the onset envelopes
    pub hop_size: usize,
    /// Onset envelopes to request, in order
    pub onset_methods: Vec<OnsetMethodConfig>,
    /// Octave-folded candidates must land inside this window
    pub bpm_window: TempoRange,
    /// Width of a histogram bucket in BPM
    pub bucket_width: f64,
    /// Candidates within this distance of the winning bucket centre are averaged
    pub bucket_tolerance: f64,
    /// Tukey fence multiplier for the outlier filter
    pub iqr_multiplier: f64,
    /// Result when no candidate survives
    pub default_bpm: f64,
    /// Tie-break target between equally populated buckets
    pub preferred_bpm: f64,
}

impl Default for TempoConfig {
    fn default() -> Self {
        Self {
            hop_size: 512,
            onset_methods: vec![
                OnsetMethodConfig::new(OnsetMethod::Plain, TempoRange::new(60.0, 200.0), TempoAggregate::Mean),
                OnsetMethodConfig::new(
                    OnsetMethod::CentroidWeighted,
                    TempoRange::new(80.0, 180.0),
                    TempoAggregate::HarmonicMean,
                ),
                OnsetMethodConfig::new(OnsetMethod::Percussive, TempoRange::new(60.0, 200.0), TempoAggregate::Mean),
            ],
            bpm_window: TempoRange::new(60.0, 200.0),
            bucket_width: 5.0,
            bucket_tolerance: 7.0,
            iqr_multiplier: 1.5,
            default_bpm: 120.0,
            preferred_bpm: 120.0,
        }
    }
}

/// One chroma extraction and its weight in the fused vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChromaMethodConfig {
    pub variant: ChromaVariant,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    /// Chroma extractions to fuse, in order
    pub chroma_methods: Vec<ChromaMethodConfig>,
    /// Gate = mean + factor * stddev of all 24 correlations
    pub gate_stddev_factor: f64,
    /// Harmonic fallback zeroes chroma bins at or below this percentile
    pub fallback_percentile: f64,
    /// Fifth-to-tonic energy ratio at which the fallback calls major
    pub fifth_ratio: f64,
    /// Added to norms before dividing
    pub epsilon: f64,
    /// Chroma sums at or below this are treated as silence
    pub silence_tolerance: f64,
    /// Result when the harmonic fallback cannot decide
    pub default_key: KeyEstimate,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            chroma_methods: vec![
                ChromaMethodConfig {
                    variant: ChromaVariant::ConstantQ,
                    weight: 0.5,
                },
                ChromaMethodConfig {
                    variant: ChromaVariant::ShortTime,
                    weight: 0.3,
                },
                ChromaMethodConfig {
                    variant: ChromaVariant::ConstantQCoarse,
                    weight: 0.2,
                },
            ],
            gate_stddev_factor: 0.5,
            fallback_percentile: 75.0,
            fifth_ratio: 0.6,
            epsilon: 1e-12,
            silence_tolerance: 1e-8,
            default_key: KeyEstimate::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrequencyConfig {
    /// Plausible fundamental range; candidates outside are dropped
    pub fundamental_range: FrequencyRange,
    /// Pitch-tracker peak threshold relative to the frame maximum
    pub pitch_threshold: f32,
    /// Only this many leading seconds feed the zero-crossing estimate
    pub zcr_max_seconds: f64,
    /// Pre-emphasis coefficient applied before counting zero crossings
    pub pre_emphasis: Option<f32>,
    /// Tukey fence multiplier for the outlier filter
    pub iqr_multiplier: f64,
}

impl Default for FrequencyConfig {
    fn default() -> Self {
        Self {
            fundamental_range: FrequencyRange::new(80.0, 400.0),
            pitch_threshold: 0.1,
            zcr_max_seconds: 30.0,
            pre_emphasis: Some(0.97),
            iqr_multiplier: 1.5,
        }
    }
}

/// All estimator settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    pub tempo: TempoConfig,
    pub key: KeyConfig,
    pub frequency: FrequencyConfig,
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn within(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, value, min, max })
    }
}

fn tempo_range(field: &'static str, range: &TempoRange) -> Result<(), ConfigError> {
    if range.is_valid() {
        Ok(())
    } else {
        Err(ConfigError::BadRange {
            field,
            min: range.min_bpm,
            max: range.max_bpm,
        })
    }
}

impl TempoConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("tempo.hop_size", self.hop_size as f64)?;
        if self.onset_methods.is_empty() {
            return Err(ConfigError::Empty("tempo.onset_methods"));
        }
        for m in &self.onset_methods {
            tempo_range("tempo.onset_methods.search_range", &m.search_range)?;
        }
        tempo_range("tempo.bpm_window", &self.bpm_window)?;
        positive("tempo.bucket_width", self.bucket_width)?;
        positive("tempo.bucket_tolerance", self.bucket_tolerance)?;
        positive("tempo.iqr_multiplier", self.iqr_multiplier)?;
        positive("tempo.default_bpm", self.default_bpm)?;
        positive("tempo.preferred_bpm", self.preferred_bpm)?;
        Ok(())
    }
}

impl KeyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chroma_methods.is_empty() {
            return Err(ConfigError::Empty("key.chroma_methods"));
        }
        for m in &self.chroma_methods {
            positive("key.chroma_methods.weight", m.weight)?;
        }
        within("key.gate_stddev_factor", self.gate_stddev_factor, 0.0, f64::MAX)?;
        within("key.fallback_percentile", self.fallback_percentile, 0.0, 100.0)?;
        positive("key.fifth_ratio", self.fifth_ratio)?;
        positive("key.epsilon", self.epsilon)?;
        within("key.silence_tolerance", self.silence_tolerance, 0.0, f64::MAX)?;
        Ok(())
    }
}

impl FrequencyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.fundamental_range;
        if !r.is_valid() {
            return Err(ConfigError::BadRange {
                field: "frequency.fundamental_range",
                min: r.min_hz,
                max: r.max_hz,
            });
        }
        within("frequency.pitch_threshold", self.pitch_threshold as f64, 0.0, 1.0)?;
        positive("frequency.zcr_max_seconds", self.zcr_max_seconds)?;
        if let Some(c) = self.pre_emphasis {
            within("frequency.pre_emphasis", c as f64, 0.0, 1.0)?;
        }
        positive("frequency.iqr_multiplier", self.iqr_multiplier)?;
        Ok(())
    }
}

impl EstimatorConfig {
    /// Check every section, reporting the first bad value
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tempo.validate()?;
        self.key.validate()?;
        self.frequency.validate()
    }
}
