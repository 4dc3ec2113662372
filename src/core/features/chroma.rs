// src/core/features/chroma.rs
//
// Pitch-class profiles from magnitude spectrograms.

use super::Chromagram;

/// Frequency of C1 in equal temperament with A4 = 440 Hz
pub const C1_HZ: f32 = 32.703_197;
/// Frequency of C2
pub const C2_HZ: f32 = 65.406_39;

/// Lowest frequency folded by the short-time variant (A0)
const FOLD_MIN_HZ: f32 = 27.5;

/// Pitch class (0 = C) of a frequency in Hz
pub fn pitch_class(freq: f32) -> usize {
    let semitones_from_a4 = (12.0 * (freq / 440.0).log2()).round() as i64;
    (semitones_from_a4 + 9).rem_euclid(12) as usize
}

/// Scale every frame so its largest pitch class is 1; silent frames stay zero
fn normalize_frames(frames: &mut [[f32; 12]]) {
    for frame in frames.iter_mut() {
        let max = frame.iter().fold(0.0f32, |a, &b| a.max(b));
        if max > 0.0 {
            frame.iter_mut().for_each(|v| *v /= max);
        }
    }
}

/// Mean magnitude of the bins inside one semitone band
fn band_energy(frame: &[f32], bin_hz: f32, centre: f32) -> f32 {
    let lo = centre * 2f32.powf(-1.0 / 24.0);
    let hi = centre * 2f32.powf(1.0 / 24.0);
    let first = (lo / bin_hz).ceil() as usize;
    let last = ((hi / bin_hz).ceil() as usize).min(frame.len());

    if first < last {
        let band = &frame[first..last];
        return band.iter().sum::<f32>() / band.len() as f32;
    }

    // Band narrower than one bin: interpolate at the centre frequency
    let pos = centre / bin_hz;
    let i = pos.floor() as usize;
    if i + 1 >= frame.len() {
        return 0.0;
    }
    let frac = pos - i as f32;
    frame[i] * (1.0 - frac) + frame[i + 1] * frac
}

/// Semitone-band chroma starting at `fmin` (which must be a C)
///
/// Each semitone band averages the linear spectrum bins it covers, so low
/// notes are not drowned out by the wider high-frequency bands.
pub fn log_frequency(spectrogram: &[Vec<f32>], bin_hz: f32, fmin: f32, n_semitones: usize) -> Chromagram {
    let nyquist = bin_hz * spectrogram.first().map_or(0, |f| f.len().saturating_sub(1)) as f32;

    let mut frames: Vec<[f32; 12]> = spectrogram
        .iter()
        .map(|frame| {
            let mut chroma = [0.0f32; 12];
            for n in 0..n_semitones {
                let centre = fmin * 2f32.powf(n as f32 / 12.0);
                if centre >= nyquist {
                    break;
                }
                chroma[n % 12] += band_energy(frame, bin_hz, centre);
            }
            chroma
        })
        .collect();

    normalize_frames(&mut frames);
    Chromagram { frames }
}

/// Chroma from folding every STFT bin's power onto its nearest pitch class
pub fn folded(spectrogram: &[Vec<f32>], bin_hz: f32) -> Chromagram {
    let bins = spectrogram.first().map_or(0, |f| f.len());
    let classes: Vec<Option<usize>> = (0..bins)
        .map(|k| {
            let freq = k as f32 * bin_hz;
            (freq >= FOLD_MIN_HZ).then(|| pitch_class(freq))
        })
        .collect();

    let mut frames: Vec<[f32; 12]> = spectrogram
        .iter()
        .map(|frame| {
            let mut chroma = [0.0f32; 12];
            for (&m, class) in frame.iter().zip(classes.iter()) {
                if let Some(pc) = class {
                    chroma[*pc] += m * m;
                }
            }
            chroma
        })
        .collect();

    normalize_frames(&mut frames);
    Chromagram { frames }
}
