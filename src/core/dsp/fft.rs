//! FFT processing with windowing

use std::sync::Arc;

use realfft::RealFftPlanner;
use rustfft::{num_complex::Complex, Fft, FftPlanner};

use super::windows::hann_window;

/// Short-time Fourier transform with a Hann window
///
/// Frames start at multiples of `hop_size` and are not centred; the last
/// partial frame is dropped unless the signal is shorter than one frame,
/// in which case a single zero-padded frame is produced.
pub struct Stft {
    frame_size: usize,
    hop_size: usize,
    window: Vec<f32>,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
}

impl Stft {
    pub fn new(frame_size: usize, hop_size: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            frame_size,
            hop_size: hop_size.max(1),
            window: hann_window(frame_size),
            forward: planner.plan_fft_forward(frame_size),
            inverse: planner.plan_fft_inverse(frame_size),
        }
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Number of positive-frequency bins per frame
    pub fn num_bins(&self) -> usize {
        self.frame_size / 2 + 1
    }

    /// Number of frames produced for a signal of `len` samples
    pub fn num_frames(&self, len: usize) -> usize {
        if len == 0 {
            0
        } else {
            len.saturating_sub(self.frame_size) / self.hop_size + 1
        }
    }

    /// Frequency in Hz of FFT bin `bin`
    pub fn bin_frequency(&self, bin: usize, sample_rate: u32) -> f64 {
        bin as f64 * sample_rate as f64 / self.frame_size as f64
    }

    /// Compute complex spectra (positive frequencies only) for every frame
    pub fn complex(&self, samples: &[f32]) -> Vec<Vec<Complex<f32>>> {
        let num_frames = self.num_frames(samples.len());
        let mut frames = Vec::with_capacity(num_frames);
        let mut buffer = vec![Complex::new(0.0, 0.0); self.frame_size];

        for i in 0..num_frames {
            let start = i * self.hop_size;
            let end = (start + self.frame_size).min(samples.len());

            for (j, slot) in buffer.iter_mut().enumerate() {
                let s = if start + j < end { samples[start + j] } else { 0.0 };
                *slot = Complex::new(s * self.window[j], 0.0);
            }

            self.forward.process(&mut buffer);
            frames.push(buffer[..self.num_bins()].to_vec());
        }

        frames
    }

    /// Compute magnitude spectra for every frame
    pub fn magnitudes(&self, samples: &[f32]) -> Vec<Vec<f32>> {
        self.complex(samples)
            .into_iter()
            .map(|frame| frame.iter().map(|c| c.norm()).collect())
            .collect()
    }

    /// Resynthesise a signal of `length` samples by weighted overlap-add
    pub fn inverse(&self, frames: &[Vec<Complex<f32>>], length: usize) -> Vec<f32> {
        let n = self.frame_size;
        let bins = self.num_bins();
        let mut output = vec![0.0f32; length];
        let mut window_sum = vec![0.0f32; length];
        let mut buffer = vec![Complex::new(0.0, 0.0); n];

        for (i, frame) in frames.iter().enumerate() {
            buffer.iter_mut().for_each(|c| *c = Complex::new(0.0, 0.0));
            for k in 0..bins.min(frame.len()) {
                buffer[k] = frame[k];
                if k > 0 && k < n - k {
                    buffer[n - k] = frame[k].conj();
                }
            }

            self.inverse.process(&mut buffer);

            let start = i * self.hop_size;
            for j in 0..n {
                let idx = start + j;
                if idx >= length {
                    break;
                }
                let w = self.window[j];
                output[idx] += buffer[j].re / n as f32 * w;
                window_sum[idx] += w * w;
            }
        }

        for (sample, &w) in output.iter_mut().zip(window_sum.iter()) {
            if w > 1e-8 {
                *sample /= w;
            }
        }

        output
    }
}

/// Magnitude spectrum of the whole signal from a single real FFT
///
/// Returns the magnitudes of bins `0..=len/2`; bin `k` sits at
/// `k * sample_rate / len` Hz.
pub fn full_magnitude_spectrum(samples: &[f32]) -> Result<Vec<f32>, realfft::FftError> {
    let mut planner = RealFftPlanner::<f32>::new();
    let r2c = planner.plan_fft_forward(samples.len());

    let mut input = r2c.make_input_vec();
    input.copy_from_slice(samples);
    let mut spectrum = r2c.make_output_vec();

    r2c.process(&mut input, &mut spectrum)?;

    Ok(spectrum.iter().map(|c| c.norm()).collect())
}
