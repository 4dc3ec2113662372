// src/core/features/engine.rs
//
// FFT-based implementation of the feature extraction port.

use super::chroma::{self, C1_HZ, C2_HZ};
use super::hpss::{self, Component};
use super::{
    onset, pitch, tempo, BeatTrack, ChromaVariant, Chromagram, FeatureError, FeatureExtractor,
    FeatureResult, FrequencyRange, OnsetEnvelope, OnsetFeature, PitchTrack, Spectrum,
    TempoAggregate, TempoRange,
};
use crate::core::dsp::{full_magnitude_spectrum, spectral_centroid, zero_crossing_rate, Stft};
use crate::core::waveform::Waveform;

/// Frame length for onset, pitch, centroid, ZCR and separation
const FRAME_SIZE: usize = 2048;
/// Default hop between frames
const HOP_SIZE: usize = 512;

/// STFT parameters and frequency floor of one chroma variant
struct ChromaParams {
    frame_size: usize,
    hop_size: usize,
    /// Lowest C of the log-frequency band layout, `None` for bin folding
    fmin: Option<f32>,
    octaves: usize,
}

fn chroma_params(variant: ChromaVariant) -> ChromaParams {
    match variant {
        ChromaVariant::ConstantQ => ChromaParams {
            frame_size: 4096,
            hop_size: 512,
            fmin: Some(C1_HZ),
            octaves: 7,
        },
        ChromaVariant::ShortTime => ChromaParams {
            frame_size: 2048,
            hop_size: 512,
            fmin: None,
            octaves: 0,
        },
        ChromaVariant::ConstantQCoarse => ChromaParams {
            frame_size: 4096,
            hop_size: 1024,
            fmin: Some(C2_HZ),
            octaves: 6,
        },
    }
}

/// Reference feature extractor built on `rustfft` and `realfft`
#[derive(Debug, Clone, Copy)]
pub struct SpectralEngine {
    frame_size: usize,
    hop_size: usize,
}

impl Default for SpectralEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectralEngine {
    pub fn new() -> Self {
        Self {
            frame_size: FRAME_SIZE,
            hop_size: HOP_SIZE,
        }
    }

    fn check(&self, waveform: &Waveform) -> FeatureResult<()> {
        if waveform.sample_rate == 0 {
            return Err(FeatureError::InvalidParameter("sample rate is zero".into()));
        }
        if waveform.is_empty() {
            return Err(FeatureError::TooShort { needed: 1, got: 0 });
        }
        if waveform.samples.iter().any(|s| !s.is_finite()) {
            return Err(FeatureError::Degenerate("waveform contains non-finite samples".into()));
        }
        Ok(())
    }

    fn bin_hz(frame_size: usize, sample_rate: u32) -> f32 {
        sample_rate as f32 / frame_size as f32
    }

    fn separate(&self, waveform: &Waveform, component: Component) -> FeatureResult<Waveform> {
        self.check(waveform)?;
        let stft = Stft::new(self.frame_size, self.hop_size);
        let samples = hpss::separate(&stft, &waveform.samples, component);
        Ok(Waveform::new(samples, waveform.sample_rate))
    }
}

impl FeatureExtractor for SpectralEngine {
    fn onset_strength(&self, waveform: &Waveform, feature: OnsetFeature, hop: usize) -> FeatureResult<OnsetEnvelope> {
        self.check(waveform)?;
        if hop == 0 {
            return Err(FeatureError::InvalidParameter("hop size is zero".into()));
        }

        let needed = self.frame_size + hop;
        if waveform.len() < needed {
            return Err(FeatureError::TooShort {
                needed,
                got: waveform.len(),
            });
        }

        let stft = Stft::new(self.frame_size, hop);
        let spectrogram = stft.magnitudes(&waveform.samples);

        let values = match feature {
            OnsetFeature::SpectralFlux => onset::spectral_flux(&spectrogram)?,
            OnsetFeature::SpectralCentroid => {
                onset::centroid_flux(&spectrogram, Self::bin_hz(self.frame_size, waveform.sample_rate))?
            }
        };

        Ok(OnsetEnvelope {
            values,
            frame_rate: waveform.sample_rate as f64 / hop as f64,
        })
    }

    fn beat_track(&self, envelope: &OnsetEnvelope) -> FeatureResult<BeatTrack> {
        tempo::track(envelope)
    }

    fn tempo_estimate(&self, envelope: &OnsetEnvelope, range: TempoRange, aggregate: TempoAggregate) -> FeatureResult<f64> {
        tempo::estimate(envelope, range, aggregate)
    }

    fn chroma(&self, waveform: &Waveform, variant: ChromaVariant) -> FeatureResult<Chromagram> {
        self.check(waveform)?;

        let params = chroma_params(variant);
        let stft = Stft::new(params.frame_size, params.hop_size);
        let spectrogram = stft.magnitudes(&waveform.samples);
        let bin_hz = Self::bin_hz(params.frame_size, waveform.sample_rate);

        Ok(match params.fmin {
            Some(fmin) => chroma::log_frequency(&spectrogram, bin_hz, fmin, params.octaves * 12),
            None => chroma::folded(&spectrogram, bin_hz),
        })
    }

    fn pitch_track(&self, waveform: &Waveform, range: FrequencyRange, threshold: f32) -> FeatureResult<PitchTrack> {
        self.check(waveform)?;
        if !range.is_valid() {
            return Err(FeatureError::InvalidParameter(format!(
                "frequency range {}-{} Hz",
                range.min_hz, range.max_hz
            )));
        }
        if !(0.0..=1.0).contains(&threshold) {
            return Err(FeatureError::InvalidParameter(format!("pitch threshold {threshold}")));
        }

        let stft = Stft::new(self.frame_size, self.hop_size);
        let spectrogram = stft.magnitudes(&waveform.samples);
        let bin_hz = Self::bin_hz(self.frame_size, waveform.sample_rate);

        Ok(pitch::track(&spectrogram, bin_hz, range, threshold))
    }

    fn percussive_component(&self, waveform: &Waveform) -> FeatureResult<Waveform> {
        self.separate(waveform, Component::Percussive)
    }

    fn harmonic_component(&self, waveform: &Waveform) -> FeatureResult<Waveform> {
        self.separate(waveform, Component::Harmonic)
    }

    fn zero_crossing_rate(&self, waveform: &Waveform) -> FeatureResult<Vec<f32>> {
        self.check(waveform)?;

        let samples = &waveform.samples;
        if samples.len() <= self.frame_size {
            return Ok(vec![zero_crossing_rate(samples)]);
        }

        Ok((0..=(samples.len() - self.frame_size) / self.hop_size)
            .map(|i| {
                let start = i * self.hop_size;
                zero_crossing_rate(&samples[start..start + self.frame_size])
            })
            .collect())
    }

    fn spectral_centroid(&self, waveform: &Waveform) -> FeatureResult<Vec<f32>> {
        self.check(waveform)?;

        let stft = Stft::new(self.frame_size, self.hop_size);
        let bin_hz = Self::bin_hz(self.frame_size, waveform.sample_rate);

        Ok(stft
            .magnitudes(&waveform.samples)
            .iter()
            .map(|frame| spectral_centroid(frame, bin_hz))
            .collect())
    }

    fn magnitude_spectrum(&self, waveform: &Waveform) -> FeatureResult<Spectrum> {
        self.check(waveform)?;

        let magnitudes = full_magnitude_spectrum(&waveform.samples)
            .map_err(|e| FeatureError::Degenerate(format!("FFT failed: {e}")))?;

        Ok(Spectrum {
            bin_hz: waveform.sample_rate as f64 / waveform.len() as f64,
            magnitudes,
        })
    }

    fn name(&self) -> &'static str {
        "spectral"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine(freq: f32, sample_rate: u32, seconds: f32) -> Waveform {
        let n = (sample_rate as f32 * seconds) as usize;
        let samples = (0..n)
            .map(|i| 0.5 * (2.0 * PI * freq * i as f32 / sample_rate as f32).sin())
            .collect();
        Waveform::new(samples, sample_rate)
    }

    #[test]
    fn test_onset_too_short() {
        let engine = SpectralEngine::new();
        let w = Waveform::new(vec![0.1; 1000], 22050);
        assert!(matches!(
            engine.onset_strength(&w, OnsetFeature::SpectralFlux, 512),
            Err(FeatureError::TooShort { needed: 2560, got: 1000 })
        ));
    }

    #[test]
    fn test_onset_silence_is_degenerate() {
        let engine = SpectralEngine::new();
        let w = Waveform::new(vec![0.0; 22050], 22050);
        assert!(engine.onset_strength(&w, OnsetFeature::SpectralFlux, 512).is_err());
        assert!(engine.onset_strength(&w, OnsetFeature::SpectralCentroid, 512).is_err());
    }

    #[test]
    fn test_onset_frame_rate() {
        let engine = SpectralEngine::new();
        let env = engine
            .onset_strength(&sine(440.0, 22050, 2.0), OnsetFeature::SpectralFlux, 512)
            .unwrap();
        assert!((env.frame_rate - 22050.0 / 512.0).abs() < 1e-9);
        assert!(env.values.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_zero_crossing_rate_of_sine() {
        let engine = SpectralEngine::new();
        let zcr = engine.zero_crossing_rate(&sine(220.0, 22050, 1.0)).unwrap();
        let mean = zcr.iter().sum::<f32>() / zcr.len() as f32;
        let hz = mean * 22050.0 / 2.0;
        assert!((hz - 220.0).abs() < 5.0, "got {hz}");
    }

    #[test]
    fn test_magnitude_spectrum_resolution() {
        let engine = SpectralEngine::new();
        let spectrum = engine.magnitude_spectrum(&sine(220.0, 22050, 2.0)).unwrap();
        assert!((spectrum.bin_hz - 0.5).abs() < 1e-12);
        assert_eq!(spectrum.magnitudes.len(), 22050 + 1);
    }

    #[test]
    fn test_chroma_of_a_tone() {
        let engine = SpectralEngine::new();
        let w = sine(220.0, 22050, 2.0);
        for variant in [ChromaVariant::ConstantQ, ChromaVariant::ShortTime, ChromaVariant::ConstantQCoarse] {
            let mean = engine.chroma(&w, variant).unwrap().mean_vector();
            let best = mean
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
                .map(|(i, _)| i)
                .unwrap();
            assert_eq!(best, 9, "{variant:?} picked class {best}");
        }
    }

    #[test]
    fn test_pitch_track_of_a_tone() {
        let engine = SpectralEngine::new();
        let track = engine
            .pitch_track(&sine(220.0, 22050, 1.0), FrequencyRange::new(80.0, 400.0), 0.1)
            .unwrap();
        let frame = &track.pitches[5];
        let (i, _) = track.magnitudes[5]
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap();
        assert!((frame[i] - 220.0).abs() < 5.0, "got {}", frame[i]);
    }

    #[test]
    fn test_rejects_zero_sample_rate() {
        let engine = SpectralEngine::new();
        let w = Waveform::new(vec![0.1; 4096], 0);
        assert!(matches!(engine.spectral_centroid(&w), Err(FeatureError::InvalidParameter(_))));
    }
}
