//! Window function implementations

use std::f32::consts::PI;

/// Periodic Hann window
///
/// Periodic (divide by `n`, not `n - 1`) so that overlapping frames at a
/// hop of `size / 4` sum to a constant, which the inverse STFT relies on.
pub fn hann_window(size: usize) -> Vec<f32> {
    let n = size as f32;
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / n).cos()))
        .collect()
}
