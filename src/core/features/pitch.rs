// src/core/features/pitch.rs
//
// Peak-picking pitch tracker over a magnitude spectrogram.

use super::{FrequencyRange, PitchTrack};
use crate::core::dsp::parabolic_offset;

/// Interpolated spectral peaks inside `range` per frame
///
/// A bin counts as a peak when it exceeds both neighbours and
/// `threshold` times the loudest bin of its frame. Its frequency is
/// refined by fitting a parabola through the neighbouring magnitudes.
pub fn track(spectrogram: &[Vec<f32>], bin_hz: f32, range: FrequencyRange, threshold: f32) -> PitchTrack {
    let bins = spectrogram.first().map_or(0, |f| f.len());
    let first = ((range.min_hz as f32 / bin_hz).ceil() as usize).max(1);
    let last = ((range.max_hz as f32 / bin_hz).floor() as usize).min(bins.saturating_sub(2));

    let mut track = PitchTrack::default();
    if first > last {
        return track;
    }

    for frame in spectrogram {
        let frame_max = frame.iter().fold(0.0f32, |a, &b| a.max(b));
        let floor = threshold * frame_max;

        let mut pitches = vec![0.0f32; last - first + 1];
        let mut magnitudes = vec![0.0f32; last - first + 1];

        if frame_max > 0.0 {
            for k in first..=last {
                let (prev, m, next) = (frame[k - 1], frame[k], frame[k + 1]);
                if m > floor && m > prev && m >= next {
                    let offset = parabolic_offset(prev, m, next);
                    let freq = (k as f32 + offset) * bin_hz;
                    if range.contains(freq as f64) {
                        pitches[k - first] = freq;
                        magnitudes[k - first] = m;
                    }
                }
            }
        }

        track.pitches.push(pitches);
        track.magnitudes.push(magnitudes);
    }

    track
}
