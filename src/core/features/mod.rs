//! Low-level feature extraction
//!
//! Estimators never compute spectra themselves. They ask a
//! [`FeatureExtractor`] for onset envelopes, chroma, pitch tracks and
//! spectra, and treat every `Err` as "no candidate from this method".
//! [`SpectralEngine`] is the bundled implementation; tests substitute
//! deterministic stubs.

mod chroma;
mod engine;
mod hpss;
mod onset;
mod pitch;
mod tempo;

pub use engine::SpectralEngine;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::waveform::Waveform;

/// Failure of a single feature computation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    /// Input carries no usable information (silence, flat envelope, NaN)
    #[error("degenerate input: {0}")]
    Degenerate(String),

    /// Input shorter than the analysis needs
    #[error("input too short: need {needed} samples, got {got}")]
    TooShort { needed: usize, got: usize },

    /// Parameter outside the range the computation supports
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type FeatureResult<T> = Result<T, FeatureError>;

/// Which spectral feature drives an onset envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnsetFeature {
    /// Positive log-magnitude change summed over all bins
    SpectralFlux,
    /// Positive change of the per-frame spectral centroid
    SpectralCentroid,
}

/// Inclusive BPM search range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoRange {
    pub min_bpm: f64,
    pub max_bpm: f64,
}

impl TempoRange {
    pub const fn new(min_bpm: f64, max_bpm: f64) -> Self {
        Self { min_bpm, max_bpm }
    }

    pub fn contains(&self, bpm: f64) -> bool {
        bpm >= self.min_bpm && bpm <= self.max_bpm
    }

    pub fn is_valid(&self) -> bool {
        self.min_bpm.is_finite() && self.max_bpm.is_finite() && self.min_bpm > 0.0 && self.min_bpm < self.max_bpm
    }
}

/// How per-window tempo estimates are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TempoAggregate {
    Mean,
    HarmonicMean,
}

/// Chroma extraction flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChromaVariant {
    /// Log-frequency spectrum from C1, fine hop
    ConstantQ,
    /// Linear STFT bins folded onto pitch classes
    ShortTime,
    /// Log-frequency spectrum from C2, coarse hop
    ConstantQCoarse,
}

/// Inclusive frequency range in Hz
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyRange {
    pub min_hz: f64,
    pub max_hz: f64,
}

impl FrequencyRange {
    pub const fn new(min_hz: f64, max_hz: f64) -> Self {
        Self { min_hz, max_hz }
    }

    pub fn contains(&self, hz: f64) -> bool {
        hz >= self.min_hz && hz <= self.max_hz
    }

    pub fn is_valid(&self) -> bool {
        self.min_hz.is_finite() && self.max_hz.is_finite() && self.min_hz > 0.0 && self.min_hz < self.max_hz
    }
}

/// Onset strength per analysis frame
#[derive(Debug, Clone, PartialEq)]
pub struct OnsetEnvelope {
    /// Non-negative onset strength, one value per frame
    pub values: Vec<f32>,
    /// Frames per second (sample rate / hop)
    pub frame_rate: f64,
}

/// Output of beat tracking
#[derive(Debug, Clone, PartialEq)]
pub struct BeatTrack {
    /// Global tempo in BPM
    pub tempo: f64,
    /// Envelope frame index of every detected beat
    pub beat_frames: Vec<usize>,
}

/// Pitch-class energy over time
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Chromagram {
    /// One 12-element vector per frame, index 0 = C
    pub frames: Vec<[f32; 12]>,
}

impl Chromagram {
    /// Time-averaged chroma vector (zeros for an empty chromagram)
    pub fn mean_vector(&self) -> [f64; 12] {
        let mut out = [0.0f64; 12];
        if self.frames.is_empty() {
            return out;
        }
        for frame in &self.frames {
            for (acc, &v) in out.iter_mut().zip(frame.iter()) {
                *acc += v as f64;
            }
        }
        let n = self.frames.len() as f64;
        out.iter_mut().for_each(|v| *v /= n);
        out
    }
}

/// Per-frame pitch candidates
///
/// Row `t` holds one entry per spectral bin inside the requested range;
/// `pitches[t][i]` is 0 where bin `i` is not a peak.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PitchTrack {
    pub pitches: Vec<Vec<f32>>,
    pub magnitudes: Vec<Vec<f32>>,
}

/// Magnitude spectrum of a whole waveform
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    /// Hz between adjacent bins
    pub bin_hz: f64,
    /// Magnitude of bins `0..=N/2`
    pub magnitudes: Vec<f32>,
}

impl Spectrum {
    pub fn frequency(&self, bin: usize) -> f64 {
        bin as f64 * self.bin_hz
    }
}

/// Provider of every low-level feature the estimators consume
pub trait FeatureExtractor: Send + Sync {
    /// Onset strength envelope computed with `hop`-sample frames
    fn onset_strength(&self, waveform: &Waveform, feature: OnsetFeature, hop: usize) -> FeatureResult<OnsetEnvelope>;

    /// Dominant tempo and beat positions of an onset envelope
    fn beat_track(&self, envelope: &OnsetEnvelope) -> FeatureResult<BeatTrack>;

    /// Direct periodicity-based tempo estimate restricted to `range`
    fn tempo_estimate(&self, envelope: &OnsetEnvelope, range: TempoRange, aggregate: TempoAggregate) -> FeatureResult<f64>;

    fn chroma(&self, waveform: &Waveform, variant: ChromaVariant) -> FeatureResult<Chromagram>;

    /// Spectral peaks inside `range` louder than `threshold` times the frame maximum
    fn pitch_track(&self, waveform: &Waveform, range: FrequencyRange, threshold: f32) -> FeatureResult<PitchTrack>;

    fn percussive_component(&self, waveform: &Waveform) -> FeatureResult<Waveform>;

    fn harmonic_component(&self, waveform: &Waveform) -> FeatureResult<Waveform>;

    /// Per-frame zero-crossing rate (crossings per sample)
    fn zero_crossing_rate(&self, waveform: &Waveform) -> FeatureResult<Vec<f32>>;

    /// Per-frame spectral centroid in Hz
    fn spectral_centroid(&self, waveform: &Waveform) -> FeatureResult<Vec<f32>>;

    fn magnitude_spectrum(&self, waveform: &Waveform) -> FeatureResult<Spectrum>;

    /// Short identifier used in log messages
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chromagram_mean_vector() {
        let mut a = [0.0f32; 12];
        let mut b = [0.0f32; 12];
        a[0] = 1.0;
        b[0] = 3.0;
        b[7] = 2.0;
        let chroma = Chromagram { frames: vec![a, b] };
        let mean = chroma.mean_vector();
        assert_eq!(mean[0], 2.0);
        assert_eq!(mean[7], 1.0);
        assert_eq!(Chromagram::default().mean_vector(), [0.0; 12]);
    }

    #[test]
    fn test_ranges() {
        let r = TempoRange::new(60.0, 200.0);
        assert!(r.contains(60.0) && r.contains(200.0) && !r.contains(201.0));
        assert!(!TempoRange::new(200.0, 60.0).is_valid());
        assert!(FrequencyRange::new(80.0, 400.0).is_valid());
    }

    #[test]
    fn test_error_display() {
        let err = FeatureError::TooShort { needed: 2048, got: 10 };
        assert_eq!(err.to_string(), "input too short: need 2048 samples, got 10");
    }
}
