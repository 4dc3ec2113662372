//! Signal filtering utilities

use std::cmp::Ordering;

/// Apply pre-emphasis filter (boosts high frequencies)
pub fn pre_emphasis(samples: &[f32], coefficient: f32) -> Vec<f32> {
    if samples.is_empty() {
        return vec![];
    }

    let mut output = Vec::with_capacity(samples.len());
    output.push(samples[0]);

    for i in 1..samples.len() {
        output.push(samples[i] - coefficient * samples[i - 1]);
    }

    output
}

/// Running median with an odd-sized centred window
///
/// Edges use a shrunken window so the output has the input's length.
pub fn median_filter(data: &[f32], window: usize) -> Vec<f32> {
    let half = window / 2;
    let mut scratch = Vec::with_capacity(window.max(1));

    (0..data.len())
        .map(|i| {
            let start = i.saturating_sub(half);
            let end = (i + half + 1).min(data.len());
            scratch.clear();
            scratch.extend_from_slice(&data[start..end]);
            scratch.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
            scratch[scratch.len() / 2]
        })
        .collect()
}
