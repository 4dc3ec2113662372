// src/core/analysis/tempo.rs
//
// Tempo estimation by ensemble voting.
//
// Several onset envelopes each yield two tempo candidates (beat tracker
// and direct periodicity estimate). Outliers are removed, every survivor
// is folded into its half/double-tempo octaves, and a 5 BPM histogram
// picks the dominant region. The result is the median of the candidates
// around the winning bucket.

use log::debug;

use super::candidates::{admit_positive, iqr_filter, isolate};
use crate::config::{OnsetMethod, OnsetMethodConfig, TempoConfig};
use crate::core::dsp::median;
use crate::core::features::{FeatureExtractor, OnsetEnvelope, OnsetFeature};
use crate::core::waveform::Waveform;

/// Fuses tempo candidates from several onset envelopes into one BPM value
#[derive(Debug, Clone, Default)]
pub struct TempoEstimator {
    config: TempoConfig,
}

impl TempoEstimator {
    pub fn new(config: TempoConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TempoConfig {
        &self.config
    }

    /// Estimate the tempo of a waveform in BPM
    ///
    /// Always returns a finite positive value; `default_bpm` when no
    /// method produces a usable candidate.
    pub fn estimate(&self, extractor: &dyn FeatureExtractor, waveform: &Waveform) -> f64 {
        let candidates = self.collect_candidates(extractor, waveform);
        self.resolve(&candidates)
    }

    /// Run every configured onset method and gather admissible candidates
    pub fn collect_candidates(&self, extractor: &dyn FeatureExtractor, waveform: &Waveform) -> Vec<f64> {
        let mut candidates = Vec::new();

        for method in &self.config.onset_methods {
            let name = method.method.name();
            let Some(envelope) = isolate(name, self.envelope(extractor, waveform, method.method)) else {
                continue;
            };

            candidates.extend(self.envelope_candidates(extractor, &envelope, method));
        }

        debug!("tempo candidates: {:?}", candidates);
        candidates
    }

    fn envelope(
        &self,
        extractor: &dyn FeatureExtractor,
        waveform: &Waveform,
        method: OnsetMethod,
    ) -> Result<OnsetEnvelope, crate::core::features::FeatureError> {
        let hop = self.config.hop_size;
        match method {
            OnsetMethod::Plain => extractor.onset_strength(waveform, OnsetFeature::SpectralFlux, hop),
            OnsetMethod::CentroidWeighted => extractor.onset_strength(waveform, OnsetFeature::SpectralCentroid, hop),
            OnsetMethod::Percussive => {
                let percussive = extractor.percussive_component(waveform)?;
                extractor.onset_strength(&percussive, OnsetFeature::SpectralFlux, hop)
            }
        }
    }

    fn envelope_candidates(
        &self,
        extractor: &dyn FeatureExtractor,
        envelope: &OnsetEnvelope,
        method: &OnsetMethodConfig,
    ) -> Vec<f64> {
        let name = method.method.name();
        let tracked = isolate(name, extractor.beat_track(envelope)).map(|beats| beats.tempo);
        let direct = isolate(name, extractor.tempo_estimate(envelope, method.search_range, method.aggregate));

        debug!("{name}: beat tracker {:?}, direct {:?}", tracked, direct);

        [tracked, direct]
            .into_iter()
            .flatten()
            .filter_map(admit_positive)
            .collect()
    }

    /// Reduce a candidate set to one BPM value
    ///
    /// Non-finite and non-positive entries are ignored; an empty set gives
    /// `default_bpm`.
    pub fn resolve(&self, candidates: &[f64]) -> f64 {
        let admitted: Vec<f64> = candidates.iter().copied().filter_map(admit_positive).collect();
        if admitted.is_empty() {
            return self.config.default_bpm;
        }

        let filtered = iqr_filter(&admitted, self.config.iqr_multiplier);
        let expanded = self.expand_octaves(&filtered);
        debug!("tempo after IQR: {:?}, octave-expanded: {:?}", filtered, expanded);

        if expanded.is_empty() {
            return median(&filtered).unwrap_or(self.config.default_bpm);
        }

        let bucket = self.select_bucket(&expanded);
        let centre = self.bucket_centre(bucket);

        let near: Vec<f64> = expanded
            .iter()
            .copied()
            .filter(|v| (v - centre).abs() <= self.config.bucket_tolerance)
            .collect();
        if near.is_empty() {
            return median(&filtered).unwrap_or(self.config.default_bpm);
        }

        median(&near).unwrap_or(self.config.default_bpm)
    }

    /// Each value with its half and double, restricted to the BPM window
    pub fn expand_octaves(&self, values: &[f64]) -> Vec<f64> {
        let window = &self.config.bpm_window;
        values
            .iter()
            .flat_map(|&t| [t / 2.0, t, t * 2.0])
            .filter(|&t| window.contains(t))
            .collect()
    }

    fn bucket_count(&self) -> usize {
        let span = self.config.bpm_window.max_bpm - self.config.bpm_window.min_bpm;
        ((span / self.config.bucket_width).ceil() as usize).max(1)
    }

    /// Histogram bucket of a value inside the window; the upper edge joins the last bucket
    pub fn bucket_index(&self, bpm: f64) -> usize {
        let offset = (bpm - self.config.bpm_window.min_bpm) / self.config.bucket_width;
        (offset.floor().max(0.0) as usize).min(self.bucket_count() - 1)
    }

    pub fn bucket_centre(&self, index: usize) -> f64 {
        self.config.bpm_window.min_bpm + (index as f64 + 0.5) * self.config.bucket_width
    }

    /// Most populated bucket; ties go to the centre nearest the preferred tempo in octaves, then the lower bucket
    fn select_bucket(&self, values: &[f64]) -> usize {
        let mut counts = vec![0usize; self.bucket_count()];
        for &v in values {
            counts[self.bucket_index(v)] += 1;
        }

        let distance = |i: usize| (self.bucket_centre(i) / self.config.preferred_bpm).log2().abs();

        let mut best = 0;
        for i in 1..counts.len() {
            if counts[i] > counts[best] || (counts[i] == counts[best] && distance(i) < distance(best)) {
                best = i;
            }
        }

        debug!(
            "winning bucket {:.1} BPM with {} votes",
            self.bucket_centre(best),
            counts[best]
        );
        best
    }
}
