// src/core/features/tempo.rs
//
// Periodicity analysis of onset envelopes: windowed autocorrelation tempo
// estimation and dynamic-programming beat tracking.

use log::trace;

use super::{BeatTrack, FeatureError, FeatureResult, OnsetEnvelope, TempoAggregate, TempoRange};
use crate::core::dsp::{autocorrelation, harmonic_mean, mean, parabolic_offset};

/// Length of one tempo analysis window in seconds
const WINDOW_SECONDS: f64 = 8.0;
/// Hop between tempo analysis windows in seconds
const HOP_SECONDS: f64 = 4.0;
/// Highest multiple of the period re-located during refinement
const MAX_PERIOD_MULTIPLE: usize = 4;

/// Beat-tracker tempo search range
const TRACKER_RANGE: TempoRange = TempoRange::new(30.0, 300.0);
/// Centre of the log-normal tempo prior
const PRIOR_BPM: f64 = 120.0;
/// Width of the tempo prior in octaves
const PRIOR_OCTAVES: f64 = 1.0;
/// Beat-interval regularity weight in the DP cost
const TIGHTNESS: f64 = 100.0;

fn validate(envelope: &OnsetEnvelope) -> FeatureResult<()> {
    if !(envelope.frame_rate.is_finite() && envelope.frame_rate > 0.0) {
        return Err(FeatureError::InvalidParameter(format!(
            "frame rate {} is not positive",
            envelope.frame_rate
        )));
    }
    if envelope.values.len() < 2 {
        return Err(FeatureError::TooShort {
            needed: 2,
            got: envelope.values.len(),
        });
    }
    if envelope.values.iter().any(|v| !v.is_finite()) {
        return Err(FeatureError::Degenerate("envelope contains non-finite values".into()));
    }
    if envelope.values.iter().all(|&v| v <= 0.0) {
        return Err(FeatureError::Degenerate("envelope is flat".into()));
    }
    Ok(())
}

fn remove_mean(values: &[f32]) -> Vec<f32> {
    let m = values.iter().sum::<f32>() / values.len() as f32;
    values.iter().map(|v| v - m).collect()
}

/// Lag bounds (in frames) for a tempo range
fn lag_bounds(range: TempoRange, frame_rate: f64) -> (usize, usize) {
    let min_lag = (60.0 * frame_rate / range.max_bpm).ceil().max(1.0) as usize;
    let max_lag = (60.0 * frame_rate / range.min_bpm).floor() as usize;
    (min_lag, max_lag)
}

/// Sub-frame position of the autocorrelation peak at integer lag `lag`
fn refine(ac: &[f32], lag: usize) -> f64 {
    if lag == 0 || lag + 1 >= ac.len() {
        return lag as f64;
    }
    lag as f64 + parabolic_offset(ac[lag - 1], ac[lag], ac[lag + 1]) as f64
}

/// Average the period with the peaks found near its integer multiples
fn refine_with_multiples(ac: &[f32], period: f64) -> f64 {
    let mut estimates = vec![period];

    for k in 2..=MAX_PERIOD_MULTIPLE {
        let centre = (period * k as f64).round() as usize;
        if centre + 2 >= ac.len() {
            break;
        }
        let best = (centre - 1..=centre + 1)
            .max_by(|&a, &b| ac[a].partial_cmp(&ac[b]).unwrap_or(std::cmp::Ordering::Equal))
            .unwrap_or(centre);
        if ac[best] <= 0.0 {
            break;
        }
        estimates.push(refine(ac, best) / k as f64);
    }

    estimates.iter().sum::<f64>() / estimates.len() as f64
}

/// Positive autocorrelation lag with the highest prior-weighted strength
fn strongest_lag(ac: &[f32], min_lag: usize, max_lag: usize, frame_rate: f64) -> Option<usize> {
    let upper = max_lag.min(ac.len().saturating_sub(2));
    let mut best: Option<(usize, f64)> = None;

    for lag in min_lag..=upper {
        if ac[lag] <= 0.0 {
            continue;
        }
        let bpm = 60.0 * frame_rate / lag as f64;
        let score = ac[lag] as f64 * tempo_prior(bpm);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((lag, score));
        }
    }

    best.map(|(lag, _)| lag)
}

/// Strongest period within the lag bounds of one window, in frames
fn window_period(window: &[f32], min_lag: usize, max_lag: usize, frame_rate: f64) -> Option<f64> {
    let ac = autocorrelation(window, (max_lag + 1) * MAX_PERIOD_MULTIPLE + 2);
    let lag = strongest_lag(&ac, min_lag, max_lag, frame_rate)?;
    Some(refine_with_multiples(&ac, refine(&ac, lag)))
}

/// Windowed autocorrelation tempo estimate, aggregated across windows
pub fn estimate(envelope: &OnsetEnvelope, range: TempoRange, aggregate: TempoAggregate) -> FeatureResult<f64> {
    validate(envelope)?;
    if !range.is_valid() {
        return Err(FeatureError::InvalidParameter(format!(
            "tempo range {}-{} BPM",
            range.min_bpm, range.max_bpm
        )));
    }

    let fr = envelope.frame_rate;
    let values = remove_mean(&envelope.values);
    let (min_lag, max_lag) = lag_bounds(range, fr);

    let window_len = (WINDOW_SECONDS * fr) as usize;
    let hop_len = ((HOP_SECONDS * fr) as usize).max(1);

    let windows: Vec<&[f32]> = if values.len() <= window_len {
        vec![&values[..]]
    } else {
        let mut out = Vec::new();
        let mut start = 0;
        while start + window_len <= values.len() {
            out.push(&values[start..start + window_len]);
            start += hop_len;
        }
        out
    };

    let bpms: Vec<f64> = windows
        .iter()
        .filter_map(|w| window_period(w, min_lag, max_lag, fr))
        .map(|period| 60.0 * fr / period)
        .filter(|bpm| bpm.is_finite() && *bpm > 0.0)
        .collect();

    trace!("per-window tempi: {:?}", bpms);

    let combined = match aggregate {
        TempoAggregate::Mean => mean(&bpms),
        TempoAggregate::HarmonicMean => harmonic_mean(&bpms),
    };

    combined.ok_or_else(|| FeatureError::Degenerate("no periodicity inside the tempo range".into()))
}

/// Log-normal tempo prior centred on `PRIOR_BPM`
fn tempo_prior(bpm: f64) -> f64 {
    let octaves = (bpm / PRIOR_BPM).log2() / PRIOR_OCTAVES;
    (-0.5 * octaves * octaves).exp()
}

/// Global tempo weighted by the prior, in BPM
fn global_tempo(values: &[f32], frame_rate: f64) -> FeatureResult<f64> {
    let (min_lag, max_lag) = lag_bounds(TRACKER_RANGE, frame_rate);
    let ac = autocorrelation(values, max_lag + 1);
    let lag = strongest_lag(&ac, min_lag, max_lag, frame_rate)
        .ok_or_else(|| FeatureError::Degenerate("no periodicity for beat tracking".into()))?;
    Ok(60.0 * frame_rate / refine(&ac, lag))
}

/// Place beats by dynamic programming around a fixed period
fn place_beats(values: &[f32], period: f64) -> Vec<usize> {
    let n = values.len();
    if n == 0 || period < 1.0 {
        return Vec::new();
    }

    let std = {
        let m = values.iter().sum::<f32>() / n as f32;
        (values.iter().map(|v| (v - m) * (v - m)).sum::<f32>() / n as f32).sqrt()
    };
    let strength: Vec<f64> = values.iter().map(|&v| (v / std.max(1e-10)) as f64).collect();

    let mut score = vec![0.0f64; n];
    let mut back: Vec<Option<usize>> = vec![None; n];
    let near = (period / 2.0).round() as usize;
    let far = (period * 2.0).round() as usize;

    for t in 0..n {
        let lo = t.saturating_sub(far);
        let hi = t.saturating_sub(near.max(1));
        let mut best: Option<(usize, f64)> = None;
        if t >= near.max(1) {
            for prev in lo..=hi {
                let interval = (t - prev) as f64;
                let penalty = TIGHTNESS * (interval / period).ln().powi(2);
                let candidate = score[prev] - penalty;
                if best.map_or(true, |(_, s)| candidate > s) {
                    best = Some((prev, candidate));
                }
            }
        }
        match best {
            Some((prev, s)) if s > 0.0 => {
                score[t] = strength[t] + s;
                back[t] = Some(prev);
            }
            _ => score[t] = strength[t],
        }
    }

    let tail = n.saturating_sub(period.ceil() as usize);
    let mut current = (tail..n)
        .max_by(|&a, &b| score[a].partial_cmp(&score[b]).unwrap_or(std::cmp::Ordering::Equal))
        .unwrap_or(n - 1);

    let mut beats = vec![current];
    while let Some(prev) = back[current] {
        beats.push(prev);
        current = prev;
    }
    beats.reverse();
    beats
}

/// Tempo plus beat positions, biased towards moderate tempi
pub fn track(envelope: &OnsetEnvelope) -> FeatureResult<BeatTrack> {
    validate(envelope)?;

    let fr = envelope.frame_rate;
    let values = remove_mean(&envelope.values);
    let tempo = global_tempo(&values, fr)?;
    let beat_frames = place_beats(&envelope.values, 60.0 * fr / tempo);

    Ok(BeatTrack { tempo, beat_frames })
}
