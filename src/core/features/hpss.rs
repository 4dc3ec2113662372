// src/core/features/hpss.rs
//
// Harmonic/percussive source separation by median filtering.
// Harmonic energy is smooth along time, percussive energy is smooth
// along frequency; soft masks built from the two filtered spectrograms
// split the complex STFT, which is then resynthesised.

use rustfft::num_complex::Complex;

use crate::core::dsp::{median_filter, Stft};

/// Median filter length along time, in frames
const HARMONIC_KERNEL: usize = 17;
/// Median filter length along frequency, in bins
const PERCUSSIVE_KERNEL: usize = 17;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Harmonic,
    Percussive,
}

/// Median-filtered magnitude estimates (harmonic, percussive)
fn filtered_magnitudes(magnitudes: &[Vec<f32>]) -> (Vec<Vec<f32>>, Vec<Vec<f32>>) {
    let frames = magnitudes.len();
    let bins = magnitudes.first().map_or(0, |f| f.len());

    let mut harmonic = vec![vec![0.0f32; bins]; frames];
    let mut column = Vec::with_capacity(frames);
    for k in 0..bins {
        column.clear();
        column.extend(magnitudes.iter().map(|frame| frame[k]));
        for (t, v) in median_filter(&column, HARMONIC_KERNEL).into_iter().enumerate() {
            harmonic[t][k] = v;
        }
    }

    let percussive = magnitudes
        .iter()
        .map(|frame| median_filter(frame, PERCUSSIVE_KERNEL))
        .collect();

    (harmonic, percussive)
}

/// Extract one component of `samples` as a time-domain signal
pub fn separate(stft: &Stft, samples: &[f32], component: Component) -> Vec<f32> {
    let spectra = stft.complex(samples);
    let magnitudes: Vec<Vec<f32>> = spectra
        .iter()
        .map(|frame| frame.iter().map(|c| c.norm()).collect())
        .collect();

    let (harmonic, percussive) = filtered_magnitudes(&magnitudes);

    let masked: Vec<Vec<Complex<f32>>> = spectra
        .iter()
        .enumerate()
        .map(|(t, frame)| {
            frame
                .iter()
                .enumerate()
                .map(|(k, &c)| {
                    let h = harmonic[t][k] * harmonic[t][k];
                    let p = percussive[t][k] * percussive[t][k];
                    let total = h + p;
                    if total <= 0.0 {
                        return Complex::new(0.0, 0.0);
                    }
                    let mask = match component {
                        Component::Harmonic => h / total,
                        Component::Percussive => p / total,
                    };
                    c * mask
                })
                .collect()
        })
        .collect();

    stft.inverse(&masked, samples.len())
}
