// src/core/analyzer.rs
//
// High-level analysis API with builder pattern.

use anyhow::Result;
use std::path::Path;

use super::analysis::{FrequencyEstimate, FrequencyEstimator, KeyEstimator, TempoEstimator};
use super::decoder::{load_waveform, LoadOptions};
use super::features::{FeatureExtractor, SpectralEngine};
use super::waveform::Waveform;
use crate::config::EstimatorConfig;
use crate::detection::{EstimationResult, KeyEstimate};

/// Builder for Analyzer configuration
pub struct AnalyzerBuilder {
    config: EstimatorConfig,
    extractor: Box<dyn FeatureExtractor>,
}

impl AnalyzerBuilder {
    pub fn new() -> Self {
        Self {
            config: EstimatorConfig::default(),
            extractor: Box::new(SpectralEngine::new()),
        }
    }

    pub fn config(mut self, config: EstimatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the feature extraction engine
    pub fn extractor(mut self, extractor: Box<dyn FeatureExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn build(self) -> Analyzer {
        Analyzer {
            tempo: TempoEstimator::new(self.config.tempo),
            key: KeyEstimator::new(self.config.key),
            frequency: FrequencyEstimator::new(self.config.frequency),
            extractor: self.extractor,
        }
    }
}

impl Default for AnalyzerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs the tempo, key and frequency estimators against one extractor
pub struct Analyzer {
    tempo: TempoEstimator,
    key: KeyEstimator,
    frequency: FrequencyEstimator,
    extractor: Box<dyn FeatureExtractor>,
}

impl Default for Analyzer {
    fn default() -> Self {
        AnalyzerBuilder::new().build()
    }
}

impl Analyzer {
    /// Create analyzer with default configuration and engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Create analyzer with custom configuration
    pub fn with_config(config: EstimatorConfig) -> Self {
        AnalyzerBuilder::new().config(config).build()
    }

    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    pub fn extractor(&self) -> &dyn FeatureExtractor {
        self.extractor.as_ref()
    }

    pub fn tempo(&self, waveform: &Waveform) -> f64 {
        self.tempo.estimate(self.extractor(), waveform)
    }

    pub fn key(&self, waveform: &Waveform) -> KeyEstimate {
        self.key.estimate(self.extractor(), waveform)
    }

    /// Tempo and key only
    pub fn tempo_and_key(&self, waveform: &Waveform) -> (f64, KeyEstimate) {
        (self.tempo(waveform), self.key(waveform))
    }

    pub fn frequencies(&self, waveform: &Waveform) -> FrequencyEstimate {
        self.frequency.estimate(self.extractor(), waveform)
    }

    /// Run every estimator
    pub fn analyze(&self, waveform: &Waveform) -> EstimationResult {
        let (bpm, key) = self.tempo_and_key(waveform);
        EstimationResult::new(bpm, key, self.frequencies(waveform))
    }

    /// Decode a file and run every estimator on it
    pub fn analyze_file(&self, path: &Path, options: &LoadOptions) -> Result<EstimationResult> {
        let waveform = load_waveform(path, options)?;
        Ok(self.analyze(&waveform))
    }
}
