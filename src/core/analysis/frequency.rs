// src/core/analysis/frequency.rs
//
// Fundamental frequency from an outlier-filtered median of three
// independent estimates, plus single-pass spectral peak and centroid.

use log::debug;

use super::candidates::{iqr_filter, isolate};
use crate::config::FrequencyConfig;
use crate::core::dsp::{mean, median, pre_emphasis};
use crate::core::features::{FeatureError, FeatureExtractor, FeatureResult, PitchTrack, Spectrum};
use crate::core::waveform::Waveform;

/// Frequency measurements of one waveform
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrequencyEstimate {
    pub fundamental_frequency: Option<f64>,
    pub peak_frequency: Option<f64>,
    pub spectral_centroid: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct FrequencyEstimator {
    config: FrequencyConfig,
}

impl FrequencyEstimator {
    pub fn new(config: FrequencyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FrequencyConfig {
        &self.config
    }

    /// All three measurements
    pub fn estimate(&self, extractor: &dyn FeatureExtractor, waveform: &Waveform) -> FrequencyEstimate {
        FrequencyEstimate {
            fundamental_frequency: self.fundamental_frequency(extractor, waveform),
            peak_frequency: self.peak_frequency(extractor, waveform),
            spectral_centroid: self.spectral_centroid(extractor, waveform),
        }
    }

    /// Median of the fundamental candidates that survive range and outlier checks
    pub fn fundamental_frequency(&self, extractor: &dyn FeatureExtractor, waveform: &Waveform) -> Option<f64> {
        let candidates = self.collect_candidates(extractor, waveform);
        self.resolve(&candidates)
    }

    /// Candidates from pitch tracking, zero crossings and the spectrum peak
    pub fn collect_candidates(&self, extractor: &dyn FeatureExtractor, waveform: &Waveform) -> Vec<f64> {
        let range = self.config.fundamental_range;

        let pitch = isolate(
            "pitch track",
            extractor
                .pitch_track(waveform, range, self.config.pitch_threshold)
                .and_then(|track| dominant_pitch(&track)),
        );
        let zcr = isolate("zero crossings", self.zero_crossing_frequency(extractor, waveform));
        let peak = isolate(
            "band peak",
            extractor
                .magnitude_spectrum(waveform)
                .and_then(|spectrum| self.band_peak(&spectrum)),
        );

        debug!("fundamental candidates: pitch {:?}, zcr {:?}, peak {:?}", pitch, zcr, peak);

        [pitch, zcr, peak]
            .into_iter()
            .flatten()
            .filter(|&f| f.is_finite() && range.contains(f))
            .collect()
    }

    /// Outlier-filtered median of fundamental candidates
    pub fn resolve(&self, candidates: &[f64]) -> Option<f64> {
        let range = self.config.fundamental_range;
        let admitted: Vec<f64> = candidates
            .iter()
            .copied()
            .filter(|&f| f.is_finite() && range.contains(f))
            .collect();
        median(&iqr_filter(&admitted, self.config.iqr_multiplier))
    }

    fn zero_crossing_frequency(&self, extractor: &dyn FeatureExtractor, waveform: &Waveform) -> FeatureResult<f64> {
        let head = waveform.head(self.config.zcr_max_seconds);
        let samples = match self.config.pre_emphasis {
            Some(coefficient) => pre_emphasis(head, coefficient),
            None => head.to_vec(),
        };
        let excerpt = Waveform::new(samples, waveform.sample_rate);

        let rates: Vec<f64> = extractor
            .zero_crossing_rate(&excerpt)?
            .into_iter()
            .map(f64::from)
            .collect();
        let zcr = mean(&rates).ok_or_else(|| FeatureError::Degenerate("no zero-crossing frames".into()))?;

        Ok(zcr * waveform.sample_rate as f64 / 2.0)
    }

    /// Loudest spectrum bin inside the fundamental range
    fn band_peak(&self, spectrum: &Spectrum) -> FeatureResult<f64> {
        let range = self.config.fundamental_range;
        let (bin, magnitude) = spectrum
            .magnitudes
            .iter()
            .enumerate()
            .filter(|(i, _)| range.contains(spectrum.frequency(*i)))
            .fold(None::<(usize, f32)>, |best, (i, &m)| match best {
                Some((_, bm)) if bm >= m => best,
                _ => Some((i, m)),
            })
            .ok_or_else(|| FeatureError::InvalidParameter("spectrum does not cover the fundamental range".into()))?;

        if !(magnitude > 0.0 && magnitude.is_finite()) {
            return Err(FeatureError::Degenerate("no energy in the fundamental range".into()));
        }
        Ok(spectrum.frequency(bin))
    }

    /// Frequency of the strongest bin of the whole-signal spectrum
    ///
    /// `None` for silence or when the strongest bin is DC.
    pub fn peak_frequency(&self, extractor: &dyn FeatureExtractor, waveform: &Waveform) -> Option<f64> {
        let spectrum = isolate("peak frequency", extractor.magnitude_spectrum(waveform))?;
        let (bin, magnitude) = spectrum
            .magnitudes
            .iter()
            .enumerate()
            .fold(None::<(usize, f32)>, |best, (i, &m)| match best {
                Some((_, bm)) if bm >= m => best,
                _ => Some((i, m)),
            })?;

        if bin == 0 || !(magnitude > 0.0 && magnitude.is_finite()) {
            return None;
        }
        Some(spectrum.frequency(bin))
    }

    /// Mean per-frame spectral centroid
    pub fn spectral_centroid(&self, extractor: &dyn FeatureExtractor, waveform: &Waveform) -> Option<f64> {
        let frames: Vec<f64> = isolate("spectral centroid", extractor.spectral_centroid(waveform))?
            .into_iter()
            .map(f64::from)
            .collect();
        mean(&frames).filter(|c| c.is_finite() && *c > 0.0)
    }
}

/// Median over frames of the pitch at each frame's loudest peak
fn dominant_pitch(track: &PitchTrack) -> FeatureResult<f64> {
    let per_frame: Vec<f64> = track
        .pitches
        .iter()
        .zip(track.magnitudes.iter())
        .filter_map(|(pitches, magnitudes)| {
            let (idx, _) = magnitudes
                .iter()
                .enumerate()
                .fold(None::<(usize, f32)>, |best, (i, &m)| match best {
                    Some((_, bm)) if bm >= m => best,
                    _ => Some((i, m)),
                })?;
            let pitch = pitches[idx] as f64;
            (pitch > 0.0).then_some(pitch)
        })
        .collect();

    median(&per_frame).ok_or_else(|| FeatureError::Degenerate("no voiced frames".into()))
}
