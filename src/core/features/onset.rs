// src/core/features/onset.rs
//
// Onset strength envelopes from the magnitude spectrogram.

use super::{FeatureError, FeatureResult};
use crate::core::dsp::spectral_centroid;

/// Dynamic range kept below the loudest bin when converting to dB
const TOP_DB: f32 = 80.0;

/// Mean positive change of the dB spectrogram between consecutive frames
///
/// The first frame has no predecessor and gets zero strength.
pub fn spectral_flux(spectrogram: &[Vec<f32>]) -> FeatureResult<Vec<f32>> {
    let peak = spectrogram
        .iter()
        .flat_map(|frame| frame.iter())
        .fold(0.0f32, |acc, &m| acc.max(m));

    if peak <= 0.0 || !peak.is_finite() {
        return Err(FeatureError::Degenerate("spectrogram has no energy".into()));
    }

    let floor = -TOP_DB;
    let to_db = |m: f32| -> f32 {
        let db = 20.0 * (m.max(1e-10) / peak).log10();
        db.max(floor)
    };

    let db: Vec<Vec<f32>> = spectrogram
        .iter()
        .map(|frame| frame.iter().map(|&m| to_db(m)).collect())
        .collect();

    let mut envelope = Vec::with_capacity(db.len());
    envelope.push(0.0);

    for pair in db.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        let rise: f32 = curr
            .iter()
            .zip(prev.iter())
            .map(|(c, p)| (c - p).max(0.0))
            .sum();
        envelope.push(rise / curr.len().max(1) as f32);
    }

    Ok(envelope)
}

/// Positive first difference of the per-frame spectral centroid
pub fn centroid_flux(spectrogram: &[Vec<f32>], bin_hz: f32) -> FeatureResult<Vec<f32>> {
    let centroids: Vec<f32> = spectrogram
        .iter()
        .map(|frame| spectral_centroid(frame, bin_hz))
        .collect();

    if centroids.iter().all(|&c| c <= 0.0) {
        return Err(FeatureError::Degenerate("spectral centroid is zero everywhere".into()));
    }

    let mut envelope = Vec::with_capacity(centroids.len());
    envelope.push(0.0);
    envelope.extend(centroids.windows(2).map(|w| (w[1] - w[0]).max(0.0)));

    Ok(envelope)
}
