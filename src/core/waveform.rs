// src/core/waveform.rs
//
// Mono in-memory waveform shared by every estimator.

/// Mono audio samples plus their sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    /// Samples, nominally in [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self { samples, sample_rate }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// True when every sample is exactly zero (or there are none)
    pub fn is_silent(&self) -> bool {
        self.samples.iter().all(|&s| s == 0.0)
    }

    /// Leading slice of at most `seconds` seconds
    pub fn head(&self, seconds: f64) -> &[f32] {
        let n = (seconds.max(0.0) * self.sample_rate as f64) as usize;
        &self.samples[..n.min(self.samples.len())]
    }

    /// Copy of the waveform with every sample multiplied by `gain`
    pub fn scaled(&self, gain: f32) -> Self {
        Self {
            samples: self.samples.iter().map(|s| s * gain).collect(),
            sample_rate: self.sample_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_head_clamps_to_length() {
        let w = Waveform::new(vec![0.1; 100], 10);
        assert_eq!(w.head(3.0).len(), 30);
        assert_eq!(w.head(60.0).len(), 100);
        assert!((w.duration_secs() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_silence_detection() {
        assert!(Waveform::new(vec![0.0; 8], 8000).is_silent());
        assert!(!Waveform::new(vec![0.0, 0.5], 8000).is_silent());
    }
}
