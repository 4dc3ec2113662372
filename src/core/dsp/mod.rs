//! Digital Signal Processing utilities

pub mod fft;
pub mod filters;
pub mod stats;
pub mod windows;

pub use fft::{full_magnitude_spectrum, Stft};
pub use filters::{median_filter, pre_emphasis};
pub use stats::{
    autocorrelation, harmonic_mean, mean, median, parabolic_offset, percentile,
    spectral_centroid, std_dev, zero_crossing_rate,
};
pub use windows::hann_window;
