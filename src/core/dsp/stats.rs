//! Statistical and spectral helper functions

use std::cmp::Ordering;

/// Arithmetic mean, `None` for an empty slice
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// Population standard deviation, `None` for an empty slice
pub fn std_dev(data: &[f64]) -> Option<f64> {
    let m = mean(data)?;
    let var = data.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / data.len() as f64;
    Some(var.sqrt())
}

/// Median of a slice (average of the two middle values for even lengths)
pub fn median(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }

    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Percentile with linear interpolation between closest ranks
///
/// `q` is in `[0, 100]`. Rank `q/100 * (n-1)` is interpolated between
/// its neighbouring order statistics.
pub fn percentile(data: &[f64], q: f64) -> Option<f64> {
    if data.is_empty() {
        return None;
    }

    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let rank = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;

    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Harmonic mean of strictly positive values
pub fn harmonic_mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() || data.iter().any(|&x| x <= 0.0) {
        return None;
    }
    let inv_sum: f64 = data.iter().map(|x| 1.0 / x).sum();
    Some(data.len() as f64 / inv_sum)
}

/// Zero-crossing rate: fraction of adjacent sample pairs that change sign
pub fn zero_crossing_rate(samples: &[f32]) -> f32 {
    if samples.len() < 2 {
        return 0.0;
    }

    let crossings: usize = samples
        .windows(2)
        .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
        .count();

    crossings as f32 / (samples.len() - 1) as f32
}

/// Unnormalised autocorrelation for lags `0..=max_lag`
pub fn autocorrelation(samples: &[f32], max_lag: usize) -> Vec<f32> {
    let n = samples.len();
    if n == 0 {
        return Vec::new();
    }
    let max_lag = max_lag.min(n - 1);

    (0..=max_lag)
        .map(|lag| {
            samples[..n - lag]
                .iter()
                .zip(&samples[lag..])
                .map(|(a, b)| a * b)
                .sum()
        })
        .collect()
}

/// Magnitude-weighted mean frequency of one spectrum frame
///
/// `bin_hz` is the spacing between bins. Silent frames yield 0.
pub fn spectral_centroid(magnitudes: &[f32], bin_hz: f32) -> f32 {
    let total_energy: f32 = magnitudes.iter().sum();
    if total_energy < 1e-10 {
        return 0.0;
    }

    let weighted_sum: f32 = magnitudes
        .iter()
        .enumerate()
        .map(|(i, &m)| i as f32 * bin_hz * m)
        .sum();

    weighted_sum / total_energy
}

/// Vertex offset of the parabola through three equally spaced points
///
/// Returns a value in `[-0.5, 0.5]` relative to the centre sample; 0 when
/// the points are collinear.
pub fn parabolic_offset(prev: f32, center: f32, next: f32) -> f32 {
    let denom = prev - 2.0 * center + next;
    if denom.abs() < f32::EPSILON {
        return 0.0;
    }
    (0.5 * (prev - next) / denom).clamp(-0.5, 0.5)
}
