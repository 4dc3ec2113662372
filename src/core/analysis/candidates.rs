// src/core/analysis/candidates.rs
//
// Helpers shared by the candidate ensembles: failure isolation,
// admission checks and the interquartile-range outlier filter.

use log::debug;

use crate::core::dsp::percentile;
use crate::core::features::FeatureError;

/// Turn a failed feature computation into "no candidate", logging why
pub fn isolate<T>(method: &str, result: Result<T, FeatureError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("{method}: no candidate ({e})");
            None
        }
    }
}

/// Keep a value only if it is finite and strictly positive
pub fn admit_positive(value: f64) -> Option<f64> {
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Drop values outside the Tukey fences `[Q1 - k*IQR, Q3 + k*IQR]`
///
/// This is a fixed-point filter, not a single Tukey pass: fences are
/// recomputed on the survivors until a pass removes nothing, so
/// filtering its own output is a no-op. Sets of two or fewer values are
/// returned unchanged. Input order is preserved.
pub fn iqr_filter(values: &[f64], multiplier: f64) -> Vec<f64> {
    let mut kept = values.to_vec();

    while kept.len() > 2 {
        let (Some(q1), Some(q3)) = (percentile(&kept, 25.0), percentile(&kept, 75.0)) else {
            break;
        };
        let iqr = q3 - q1;
        let lo = q1 - multiplier * iqr;
        let hi = q3 + multiplier * iqr;

        let before = kept.len();
        kept.retain(|&v| v >= lo && v <= hi);
        if kept.len() == before {
            break;
        }
    }

    kept
}
