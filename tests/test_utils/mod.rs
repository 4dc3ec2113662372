#![allow(dead_code)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use beatkey::core::features::{
    BeatTrack, ChromaVariant, Chromagram, FeatureError, FeatureExtractor, FeatureResult,
    FrequencyRange, OnsetEnvelope, OnsetFeature, PitchTrack, Spectrum, TempoAggregate, TempoRange,
};
use beatkey::core::Waveform;

pub fn get_binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_beatkey"))
}

pub fn run_beatkey(args: &[&str], file: &Path) -> Output {
    Command::new(get_binary_path())
        .args(args)
        .arg(file)
        // Keep a user config from leaking into the run
        .env_remove("BEATKEY_CONFIG")
        .env("XDG_CONFIG_HOME", file.parent().unwrap_or(Path::new("/")))
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute beatkey")
}

/// Last non-empty stdout line parsed as JSON
pub fn json_stdout(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or_else(|| panic!("no output; stderr: {}", String::from_utf8_lossy(&output.stderr)));
    serde_json::from_str(line).unwrap_or_else(|e| panic!("bad JSON {line:?}: {e}"))
}

/// Extractor returning fixed features, with selectable failures
///
/// Operation names accepted by `failing`: onset, beat, tempo, chroma,
/// pitch, percussive, harmonic, zcr, centroid, spectrum.
pub struct StubExtractor {
    pub bpm: f64,
    pub chroma: [f32; 12],
    pub pitch_hz: f32,
    pub centroid_hz: f32,
    failing: HashSet<&'static str>,
}

impl StubExtractor {
    pub fn new(bpm: f64, chroma: [f32; 12], pitch_hz: f32) -> Self {
        Self {
            bpm,
            chroma,
            pitch_hz,
            centroid_hz: 1500.0,
            failing: HashSet::new(),
        }
    }

    pub fn failing(mut self, ops: &[&'static str]) -> Self {
        self.failing.extend(ops.iter().copied());
        self
    }

    fn check(&self, op: &'static str) -> FeatureResult<()> {
        if self.failing.contains(op) {
            Err(FeatureError::Degenerate(format!("stub {op} failure")))
        } else {
            Ok(())
        }
    }
}

impl FeatureExtractor for StubExtractor {
    fn onset_strength(&self, waveform: &Waveform, _feature: OnsetFeature, hop: usize) -> FeatureResult<OnsetEnvelope> {
        self.check("onset")?;
        Ok(OnsetEnvelope {
            values: vec![0.5; 128],
            frame_rate: waveform.sample_rate as f64 / hop as f64,
        })
    }

    fn beat_track(&self, _envelope: &OnsetEnvelope) -> FeatureResult<BeatTrack> {
        self.check("beat")?;
        Ok(BeatTrack {
            tempo: self.bpm,
            beat_frames: Vec::new(),
        })
    }

    fn tempo_estimate(&self, _envelope: &OnsetEnvelope, _range: TempoRange, _aggregate: TempoAggregate) -> FeatureResult<f64> {
        self.check("tempo")?;
        Ok(self.bpm)
    }

    fn chroma(&self, _waveform: &Waveform, _variant: ChromaVariant) -> FeatureResult<Chromagram> {
        self.check("chroma")?;
        Ok(Chromagram {
            frames: vec![self.chroma; 4],
        })
    }

    fn pitch_track(&self, _waveform: &Waveform, _range: FrequencyRange, _threshold: f32) -> FeatureResult<PitchTrack> {
        self.check("pitch")?;
        Ok(PitchTrack {
            pitches: vec![vec![0.0, self.pitch_hz]; 4],
            magnitudes: vec![vec![0.1, 1.0]; 4],
        })
    }

    fn percussive_component(&self, waveform: &Waveform) -> FeatureResult<Waveform> {
        self.check("percussive")?;
        Ok(waveform.clone())
    }

    fn harmonic_component(&self, waveform: &Waveform) -> FeatureResult<Waveform> {
        self.check("harmonic")?;
        Ok(waveform.clone())
    }

    fn zero_crossing_rate(&self, waveform: &Waveform) -> FeatureResult<Vec<f32>> {
        self.check("zcr")?;
        Ok(vec![2.0 * self.pitch_hz / waveform.sample_rate as f32; 4])
    }

    fn spectral_centroid(&self, _waveform: &Waveform) -> FeatureResult<Vec<f32>> {
        self.check("centroid")?;
        Ok(vec![self.centroid_hz; 4])
    }

    fn magnitude_spectrum(&self, _waveform: &Waveform) -> FeatureResult<Spectrum> {
        self.check("spectrum")?;
        let mut magnitudes = vec![0.01f32; 2000];
        magnitudes[self.pitch_hz.round() as usize] = 1.0;
        Ok(Spectrum {
            bin_hz: 1.0,
            magnitudes,
        })
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// Krumhansl major profile rotated to `tonic` (0 = C)
pub fn major_chroma(tonic: usize) -> [f32; 12] {
    const MAJOR: [f32; 12] = [6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88];
    let mut out = [0.0; 12];
    for (i, &v) in MAJOR.iter().enumerate() {
        out[(i + tonic) % 12] = v;
    }
    out
}
