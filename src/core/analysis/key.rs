// src/core/analysis/key.rs
//
// Key estimation: weighted fusion of several chroma extractions,
// correlation against all 24 rotated Krumhansl-Schmuckler profiles,
// a confidence gate, and a harmonic-content fallback when the best
// correlation does not stand out.

use log::debug;

use super::candidates::isolate;
use crate::config::KeyConfig;
use crate::core::dsp::{mean, percentile, std_dev};
use crate::core::features::{ChromaVariant, FeatureExtractor};
use crate::core::waveform::Waveform;
use crate::detection::{KeyEstimate, Mode, PitchClass};

/// A 12-element pitch-class vector, index 0 = C
pub type ChromaVector = [f64; 12];

/// Krumhansl-Schmuckler major key profile, tonic first
pub const MAJOR_PROFILE: ChromaVector = [6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88];

/// Krumhansl-Schmuckler minor key profile, tonic first
pub const MINOR_PROFILE: ChromaVector = [6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17];

/// Semitones from a tonic to its perfect fifth
const FIFTH: usize = 7;

/// Zero-mean copy of `v` divided by the L2 norm of `v` plus `epsilon`
pub fn normalize(v: &ChromaVector, epsilon: f64) -> ChromaVector {
    let m = v.iter().sum::<f64>() / 12.0;
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    let mut out = [0.0; 12];
    for (o, x) in out.iter_mut().zip(v.iter()) {
        *o = (x - m) / (norm + epsilon);
    }
    out
}

/// Rotate a profile so its tonic lands on `root`
pub fn rotate(profile: &ChromaVector, root: usize) -> ChromaVector {
    let mut out = [0.0; 12];
    for (i, &x) in profile.iter().enumerate() {
        out[(i + root) % 12] = x;
    }
    out
}

pub fn dot(a: &ChromaVector, b: &ChromaVector) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Correlation of a fused chroma vector with one key
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyCorrelation {
    pub key: KeyEstimate,
    pub correlation: f64,
}

/// Combines chroma evidence into a key label
#[derive(Debug, Clone, Default)]
pub struct KeyEstimator {
    config: KeyConfig,
}

impl KeyEstimator {
    pub fn new(config: KeyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &KeyConfig {
        &self.config
    }

    /// Estimate the key of a waveform
    pub fn estimate(&self, extractor: &dyn FeatureExtractor, waveform: &Waveform) -> KeyEstimate {
        let chromas = self.collect_chroma(extractor, waveform);
        let Some(fused) = self.fuse(&chromas) else {
            debug!("no chroma energy, key unknown");
            return KeyEstimate::Unknown;
        };

        let correlations = self.correlate(&fused);
        match self.select(&correlations) {
            Some(key) => key,
            None => self.harmonic_fallback(extractor, waveform),
        }
    }

    /// Time-averaged chroma and weight of every method that succeeded
    pub fn collect_chroma(&self, extractor: &dyn FeatureExtractor, waveform: &Waveform) -> Vec<(ChromaVector, f64)> {
        self.config
            .chroma_methods
            .iter()
            .filter_map(|m| {
                let name = variant_name(m.variant);
                isolate(name, extractor.chroma(waveform, m.variant)).map(|c| (c.mean_vector(), m.weight))
            })
            .collect()
    }

    fn is_silent(&self, v: &ChromaVector) -> bool {
        v.iter().sum::<f64>().abs() <= self.config.silence_tolerance
    }

    /// Weighted fusion of normalized chroma vectors
    ///
    /// Vectors without energy are skipped along with their weight.
    /// `None` when nothing is left.
    pub fn fuse(&self, chromas: &[(ChromaVector, f64)]) -> Option<ChromaVector> {
        let eps = self.config.epsilon;
        let mut sum = [0.0; 12];
        let mut total_weight = 0.0;

        for (v, weight) in chromas.iter().filter(|(v, _)| !self.is_silent(v)) {
            let n = normalize(v, eps);
            for (s, x) in sum.iter_mut().zip(n.iter()) {
                *s += x * weight;
            }
            total_weight += weight;
        }

        if total_weight <= 0.0 {
            return None;
        }

        sum.iter_mut().for_each(|s| *s /= total_weight);
        Some(normalize(&sum, eps))
    }

    /// Correlations with all 24 keys in the order C major, C minor, C# major, ...
    pub fn correlate(&self, fused: &ChromaVector) -> Vec<KeyCorrelation> {
        let eps = self.config.epsilon;
        let mut out = Vec::with_capacity(24);

        for root in PitchClass::ALL {
            for (mode, profile) in [(Mode::Major, &MAJOR_PROFILE), (Mode::Minor, &MINOR_PROFILE)] {
                let reference = normalize(&rotate(profile, root.index()), eps);
                out.push(KeyCorrelation {
                    key: KeyEstimate::new(root, mode),
                    correlation: dot(fused, &reference),
                });
            }
        }

        out
    }

    /// Best-correlated key if it clears the confidence gate
    pub fn select(&self, correlations: &[KeyCorrelation]) -> Option<KeyEstimate> {
        let best = correlations
            .iter()
            .fold(None::<&KeyCorrelation>, |best, c| match best {
                Some(b) if b.correlation >= c.correlation => Some(b),
                _ => Some(c),
            })?;

        let values: Vec<f64> = correlations.iter().map(|c| c.correlation).collect();
        let threshold = mean(&values)? + self.config.gate_stddev_factor * std_dev(&values)?;

        debug!(
            "best key {} (r = {:.4}), gate {:.4}",
            best.key, best.correlation, threshold
        );

        (best.correlation >= threshold).then_some(best.key)
    }

    /// Tonic from the strongest harmonic pitch class, mode from its fifth
    pub fn harmonic_fallback(&self, extractor: &dyn FeatureExtractor, waveform: &Waveform) -> KeyEstimate {
        let chroma = isolate("harmonic", extractor.harmonic_component(waveform))
            .and_then(|h| isolate("harmonic chroma", extractor.chroma(&h, ChromaVariant::ConstantQ)))
            .map(|c| c.mean_vector());

        match chroma.and_then(|v| self.classify_harmonic(&v)) {
            Some(key) => {
                debug!("harmonic fallback chose {key}");
                key
            }
            None => self.config.default_key,
        }
    }

    /// Fallback classification of one chroma vector
    pub fn classify_harmonic(&self, chroma: &ChromaVector) -> Option<KeyEstimate> {
        let cutoff = percentile(chroma, self.config.fallback_percentile)?;
        let mut strong = *chroma;
        strong.iter_mut().filter(|v| **v <= cutoff).for_each(|v| *v = 0.0);

        if self.is_silent(&strong) {
            return None;
        }

        let tonic = strong
            .iter()
            .enumerate()
            .fold(0, |best, (i, &v)| if v > strong[best] { i } else { best });
        let fifth = (tonic + FIFTH) % 12;

        let mode = if strong[fifth] >= self.config.fifth_ratio * strong[tonic] {
            Mode::Major
        } else {
            Mode::Minor
        };

        Some(KeyEstimate::new(PitchClass::from_index(tonic), mode))
    }
}

fn variant_name(variant: ChromaVariant) -> &'static str {
    match variant {
        ChromaVariant::ConstantQ => "chroma constant-Q",
        ChromaVariant::ShortTime => "chroma short-time",
        ChromaVariant::ConstantQCoarse => "chroma constant-Q coarse",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimator() -> KeyEstimator {
        KeyEstimator::default()
    }

    fn profile_key(profile: &ChromaVector, root: usize) -> ChromaVector {
        rotate(profile, root)
    }

    #[test]
    fn test_normalize_is_zero_mean_and_scale_free() {
        let v = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0];
        let n = normalize(&v, 1e-12);
        assert!(n.iter().sum::<f64>().abs() < 1e-12);

        let scaled: ChromaVector = v.map(|x| x * 37.0);
        let m = normalize(&scaled, 1e-12);
        for (a, b) in n.iter().zip(m.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_normalize_zero_vector() {
        assert_eq!(normalize(&[0.0; 12], 1e-12), [0.0; 12]);
    }

    #[test]
    fn test_rotate_moves_tonic() {
        let r = rotate(&MAJOR_PROFILE, 9);
        assert_eq!(r[9], MAJOR_PROFILE[0]);
        assert_eq!(r[4], MAJOR_PROFILE[7]);
    }

    #[test]
    fn test_correlation_order_and_count() {
        let est = estimator();
        let fused = normalize(&MAJOR_PROFILE, 1e-12);
        let corr = est.correlate(&fused);
        assert_eq!(corr.len(), 24);
        assert_eq!(corr[0].key.to_string(), "C major");
        assert_eq!(corr[1].key.to_string(), "C minor");
        assert_eq!(corr[2].key.to_string(), "C# major");
        assert_eq!(corr[23].key.to_string(), "B minor");
    }

    #[test]
    fn test_profiles_identify_every_key() {
        let est = estimator();
        for root in 0..12 {
            for (profile, mode) in [(&MAJOR_PROFILE, Mode::Major), (&MINOR_PROFILE, Mode::Minor)] {
                let chroma = profile_key(profile, root);
                let fused = est.fuse(&[(chroma, 1.0)]).unwrap();
                let key = est.select(&est.correlate(&fused)).unwrap();
                assert_eq!(key, KeyEstimate::new(PitchClass::from_index(root), mode));
            }
        }
    }

    #[test]
    fn test_fuse_skips_silent_vectors() {
        let est = estimator();
        assert!(est.fuse(&[([0.0; 12], 0.5), ([0.0; 12], 0.3)]).is_none());

        let a = profile_key(&MAJOR_PROFILE, 2);
        let alone = est.fuse(&[(a, 0.3)]).unwrap();
        let with_silence = est.fuse(&[([0.0; 12], 0.5), (a, 0.3)]).unwrap();
        for (x, y) in alone.iter().zip(with_silence.iter()) {
            assert!((x - y).abs() < 1e-12);
        }
    }

    #[test]
    fn test_first_maximum_wins_ties() {
        let est = estimator();
        let corr: Vec<KeyCorrelation> = PitchClass::ALL
            .iter()
            .flat_map(|&pc| [KeyEstimate::Major(pc), KeyEstimate::Minor(pc)])
            .enumerate()
            .map(|(i, key)| KeyCorrelation {
                key,
                correlation: if i == 5 || i == 9 { 1.0 } else { 0.0 },
            })
            .collect();
        assert_eq!(est.select(&corr), Some(KeyEstimate::Minor(PitchClass::D)));
    }

    #[test]
    fn test_gate_rejects_flat_correlations() {
        let est = estimator();
        // One low outlier drags the mean down less than the spread pushes the gate up
        let corr: Vec<KeyCorrelation> = PitchClass::ALL
            .iter()
            .flat_map(|&pc| [KeyEstimate::Major(pc), KeyEstimate::Minor(pc)])
            .enumerate()
            .map(|(i, key)| KeyCorrelation {
                key,
                correlation: if i == 0 { -10.0 } else { 1.0 },
            })
            .collect();
        assert_eq!(est.select(&corr), None);
    }

    #[test]
    fn test_harmonic_major_when_fifth_strong() {
        let est = estimator();
        let mut chroma = [0.1; 12];
        chroma[9] = 1.0; // A
        chroma[4] = 0.7; // E
        chroma[0] = 0.5; // C
        assert_eq!(est.classify_harmonic(&chroma), Some(KeyEstimate::Major(PitchClass::A)));
    }

    #[test]
    fn test_harmonic_minor_when_fifth_weak() {
        let est = estimator();
        let mut chroma = [0.1; 12];
        chroma[9] = 1.0;
        chroma[4] = 0.5;
        chroma[0] = 0.8;
        assert_eq!(est.classify_harmonic(&chroma), Some(KeyEstimate::Minor(PitchClass::A)));
    }

    #[test]
    fn test_harmonic_flat_chroma_undecided() {
        let est = estimator();
        assert_eq!(est.classify_harmonic(&[0.4; 12]), None);
        assert_eq!(est.classify_harmonic(&[0.0; 12]), None);
    }

    use crate::core::features::{
        BeatTrack, Chromagram, FeatureError, FeatureResult, FrequencyRange, OnsetEnvelope, OnsetFeature,
        PitchTrack, Spectrum, TempoAggregate, TempoRange,
    };

    /// Serves one fixed chroma vector; separation can be made to fail
    struct ChromaStub {
        chroma: [f32; 12],
        harmonic_fails: bool,
    }

    fn unsupported<T>() -> FeatureResult<T> {
        Err(FeatureError::InvalidParameter("not served by this stub".into()))
    }

    impl FeatureExtractor for ChromaStub {
        fn onset_strength(&self, _: &Waveform, _: OnsetFeature, _: usize) -> FeatureResult<OnsetEnvelope> {
            unsupported()
        }
        fn beat_track(&self, _: &OnsetEnvelope) -> FeatureResult<BeatTrack> {
            unsupported()
        }
        fn tempo_estimate(&self, _: &OnsetEnvelope, _: TempoRange, _: TempoAggregate) -> FeatureResult<f64> {
            unsupported()
        }
        fn chroma(&self, _: &Waveform, _: ChromaVariant) -> FeatureResult<Chromagram> {
            Ok(Chromagram {
                frames: vec![self.chroma; 3],
            })
        }
        fn pitch_track(&self, _: &Waveform, _: FrequencyRange, _: f32) -> FeatureResult<PitchTrack> {
            unsupported()
        }
        fn percussive_component(&self, _: &Waveform) -> FeatureResult<Waveform> {
            unsupported()
        }
        fn harmonic_component(&self, waveform: &Waveform) -> FeatureResult<Waveform> {
            if self.harmonic_fails {
                return Err(FeatureError::Degenerate("separation failed".into()));
            }
            Ok(waveform.clone())
        }
        fn zero_crossing_rate(&self, _: &Waveform) -> FeatureResult<Vec<f32>> {
            unsupported()
        }
        fn spectral_centroid(&self, _: &Waveform) -> FeatureResult<Vec<f32>> {
            unsupported()
        }
        fn magnitude_spectrum(&self, _: &Waveform) -> FeatureResult<Spectrum> {
            unsupported()
        }
        fn name(&self) -> &'static str {
            "chroma-stub"
        }
    }

    /// A with a strong fifth (E) over a flat floor
    fn a_major_chroma() -> [f32; 12] {
        let mut chroma = [0.1; 12];
        chroma[9] = 1.0;
        chroma[4] = 0.7;
        chroma
    }

    fn clip() -> Waveform {
        Waveform::new(vec![0.0; 64], 22050)
    }

    /// Gate so strict that no correlation can pass it
    fn gate_never_passes(default_key: KeyEstimate) -> KeyEstimator {
        KeyEstimator::new(KeyConfig {
            gate_stddev_factor: 1e6,
            default_key,
            ..KeyConfig::default()
        })
    }

    #[test]
    fn test_harmonic_fallback_classifies_harmonic_chroma() {
        let stub = ChromaStub {
            chroma: a_major_chroma(),
            harmonic_fails: false,
        };
        assert_eq!(estimator().harmonic_fallback(&stub, &clip()), KeyEstimate::Major(PitchClass::A));
    }

    #[test]
    fn test_harmonic_fallback_failure_gives_default_key() {
        let stub = ChromaStub {
            chroma: a_major_chroma(),
            harmonic_fails: true,
        };
        assert_eq!(estimator().harmonic_fallback(&stub, &clip()), KeyEstimate::Major(PitchClass::C));

        let est = gate_never_passes(KeyEstimate::Minor(PitchClass::F));
        assert_eq!(est.harmonic_fallback(&stub, &clip()), KeyEstimate::Minor(PitchClass::F));
    }

    #[test]
    fn test_gate_failure_routes_estimate_through_fallback() {
        let working = ChromaStub {
            chroma: a_major_chroma(),
            harmonic_fails: false,
        };
        let est = gate_never_passes(KeyEstimate::Minor(PitchClass::F));
        assert_eq!(est.estimate(&working, &clip()), KeyEstimate::Major(PitchClass::A));

        let broken = ChromaStub {
            chroma: a_major_chroma(),
            harmonic_fails: true,
        };
        assert_eq!(est.estimate(&broken, &clip()), KeyEstimate::Minor(PitchClass::F));
    }
}
