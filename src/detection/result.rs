//! Estimation result records and their JSON shapes

use serde::{Deserialize, Serialize};

use super::key::KeyEstimate;
use crate::core::analysis::FrequencyEstimate;

/// Round to one decimal place
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Everything the analyzer measures for one waveform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimationResult {
    pub bpm: f64,
    pub key: KeyEstimate,
    pub fundamental_frequency: Option<f64>,
    pub peak_frequency: Option<f64>,
    pub spectral_centroid: Option<f64>,
}

impl EstimationResult {
    pub fn new(bpm: f64, key: KeyEstimate, frequency: FrequencyEstimate) -> Self {
        Self {
            bpm,
            key,
            fundamental_frequency: frequency.fundamental_frequency,
            peak_frequency: frequency.peak_frequency,
            spectral_centroid: frequency.spectral_centroid,
        }
    }

    /// Copy with every number rounded to one decimal
    pub fn rounded(&self) -> Self {
        Self {
            bpm: round1(self.bpm),
            key: self.key,
            fundamental_frequency: self.fundamental_frequency.map(round1),
            peak_frequency: self.peak_frequency.map(round1),
            spectral_centroid: self.spectral_centroid.map(round1),
        }
    }

    pub fn tempo_key(&self) -> TempoKeyReport {
        TempoKeyReport {
            bpm: round1(self.bpm),
            key: self.key,
        }
    }

    pub fn frequency(&self) -> FrequencyReport {
        FrequencyReport::from(FrequencyEstimate {
            fundamental_frequency: self.fundamental_frequency,
            peak_frequency: self.peak_frequency,
            spectral_centroid: self.spectral_centroid,
        })
    }
}

/// `{"bpm": .., "key": ..}` line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoKeyReport {
    pub bpm: f64,
    pub key: KeyEstimate,
}

impl TempoKeyReport {
    pub fn new(bpm: f64, key: KeyEstimate) -> Self {
        Self { bpm: round1(bpm), key }
    }
}

/// `{"fundamental_frequency": .., "peak_frequency": .., "spectral_centroid": ..}` line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyReport {
    pub fundamental_frequency: Option<f64>,
    pub peak_frequency: Option<f64>,
    pub spectral_centroid: Option<f64>,
}

impl From<FrequencyEstimate> for FrequencyReport {
    fn from(estimate: FrequencyEstimate) -> Self {
        Self {
            fundamental_frequency: estimate.fundamental_frequency.map(round1),
            peak_frequency: estimate.peak_frequency.map(round1),
            spectral_centroid: estimate.spectral_centroid.map(round1),
        }
    }
}

/// One line of batch output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRecord {
    pub file: String,
    #[serde(flatten)]
    pub result: EstimationResult,
}
