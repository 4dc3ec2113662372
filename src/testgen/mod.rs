// src/testgen/mod.rs
//
// Synthetic test signals with known tempo, pitch and key, plus a WAV
// writer, for exercising the estimators end to end.

use anyhow::{Context, Result};
use std::f32::consts::PI;
use std::path::Path;

use crate::core::waveform::Waveform;

/// Frequency of a note given as semitones relative to A4 (440 Hz)
pub fn note_hz(semitones_from_a4: i32) -> f32 {
    440.0 * 2f32.powf(semitones_from_a4 as f32 / 12.0)
}

/// Click track: 5 ms decaying 1 kHz bursts at every beat
pub fn click_track(bpm: f64, sample_rate: u32, seconds: f64) -> Waveform {
    let total = (sample_rate as f64 * seconds) as usize;
    let mut samples = vec![0.0f32; total];

    let samples_per_beat = 60.0 / bpm * sample_rate as f64;
    let click_len = (sample_rate as f64 * 0.005) as usize;

    let mut position = 0.0f64;
    while (position as usize) < total {
        let start = position as usize;
        for (j, sample) in samples[start..].iter_mut().take(click_len).enumerate() {
            let t = j as f32 / sample_rate as f32;
            *sample = (2.0 * PI * 1000.0 * t).sin() * (-t * 500.0).exp();
        }
        position += samples_per_beat;
    }

    Waveform::new(samples, sample_rate)
}

/// Pure sine tone
pub fn sine_tone(freq: f32, amplitude: f32, sample_rate: u32, seconds: f64) -> Waveform {
    let total = (sample_rate as f64 * seconds) as usize;
    let samples = (0..total)
        .map(|i| amplitude * (2.0 * PI * freq * i as f32 / sample_rate as f32).sin())
        .collect();
    Waveform::new(samples, sample_rate)
}

/// Equal-amplitude sum of sine tones, scaled so the peak stays below `amplitude`
pub fn chord(freqs: &[f32], amplitude: f32, sample_rate: u32, seconds: f64) -> Waveform {
    let total = (sample_rate as f64 * seconds) as usize;
    let gain = amplitude / freqs.len().max(1) as f32;
    let samples = (0..total)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            freqs.iter().map(|f| (2.0 * PI * f * t).sin()).sum::<f32>() * gain
        })
        .collect();
    Waveform::new(samples, sample_rate)
}

/// Repeating I-IV-V-I progression in a major key, one chord per second
///
/// Each chord is a root-position triad voiced around the fourth octave
/// with the tonic doubled an octave below.
pub fn major_progression(tonic_from_a4: i32, sample_rate: u32, seconds: f64) -> Waveform {
    let triads = [[0, 4, 7], [5, 9, 12], [7, 11, 14], [0, 4, 7]];
    let per_chord = sample_rate as usize;
    let total = (sample_rate as f64 * seconds) as usize;
    let bass = note_hz(tonic_from_a4 - 12);

    let mut samples = Vec::with_capacity(total);
    let mut index = 0;
    while samples.len() < total {
        let triad = triads[index % triads.len()];
        let mut freqs: Vec<f32> = triad.iter().map(|&s| note_hz(tonic_from_a4 + s)).collect();
        freqs.push(bass);
        let take = per_chord.min(total - samples.len());
        samples.extend(chord(&freqs, 0.8, sample_rate, 1.0).samples.into_iter().take(take));
        index += 1;
    }

    Waveform::new(samples, sample_rate)
}

pub fn silence(sample_rate: u32, seconds: f64) -> Waveform {
    Waveform::new(vec![0.0; (sample_rate as f64 * seconds) as usize], sample_rate)
}

/// Write a waveform as a 16-bit PCM WAV file with `channels` identical channels
pub fn write_wav(path: &Path, waveform: &Waveform, channels: u16) -> Result<()> {
    let spec = hound::WavSpec {
        channels,
        sample_rate: waveform.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create WAV file: {}", path.display()))?;

    for &s in &waveform.samples {
        let value = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        for _ in 0..channels {
            writer.write_sample(value)?;
        }
    }

    writer
        .finalize()
        .with_context(|| format!("Failed to finalize WAV file: {}", path.display()))
}
