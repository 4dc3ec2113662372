//! Output formatting for CLI results

use anyhow::{Context, Result};
use colorful::Colorful;
use serde::Serialize;

use crate::detection::{BatchRecord, KeyEstimate};

/// Serialize one result as a single JSON line
pub fn json_line<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).context("Failed to serialize result")
}

fn hz(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.1} Hz"),
        None => "n/a".to_string(),
    }
}

/// Format one batch result for terminal output
pub fn format_text(record: &BatchRecord) -> String {
    let result = &record.result;
    let key = match result.key {
        KeyEstimate::Unknown => "unknown".yellow().to_string(),
        key => key.to_string().as_str().green().to_string(),
    };

    let mut output = format!("{}\n", record.file.as_str().cyan().bold());
    output.push_str(&format!("  Tempo: {:.1} BPM\n", result.bpm));
    output.push_str(&format!("  Key: {key}\n"));
    output.push_str(&format!(
        "  Fundamental: {}\n",
        hz(result.fundamental_frequency)
    ));
    output.push_str(&format!("  Peak: {}\n", hz(result.peak_frequency)));
    output.push_str(&format!("  Centroid: {}\n", hz(result.spectral_centroid)));
    output
}

/// Format a file that could not be analyzed
pub fn format_failure(file: &str, error: &anyhow::Error) -> String {
    format!("{} {}: {:#}", "✗".red(), file, error)
}

/// Format a summary for multiple files
pub fn format_summary(analyzed: usize, failed: usize) -> String {
    let mut output = format!("\n{}\n", "Summary:".bold());
    output.push_str(&format!("  {} files analyzed\n", analyzed + failed));
    if analyzed > 0 {
        output.push_str(&format!("  {}\n", format!("✓ {analyzed} ok").as_str().green()));
    }
    if failed > 0 {
        output.push_str(&format!("  {}\n", format!("✗ {failed} failed").as_str().red()));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{EstimationResult, PitchClass, TempoKeyReport};

    fn record() -> BatchRecord {
        BatchRecord {
            file: "set/track01.flac".to_string(),
            result: EstimationResult {
                bpm: 128.0,
                key: KeyEstimate::Minor(PitchClass::A),
                fundamental_frequency: Some(110.0),
                peak_frequency: None,
                spectral_centroid: Some(1523.4),
            },
        }
    }

    #[test]
    fn test_json_line_is_single_line() {
        let line = json_line(&TempoKeyReport::new(120.0, KeyEstimate::Unknown)).unwrap();
        assert_eq!(line, r#"{"bpm":120.0,"key":"Unknown"}"#);
    }

    #[test]
    fn test_batch_record_json() {
        let line = json_line(&record()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["file"], "set/track01.flac");
        assert_eq!(value["key"], "A minor");
        assert!(value["peak_frequency"].is_null());
    }

    #[test]
    fn test_format_text() {
        let text = format_text(&record());
        assert!(text.contains("track01.flac"));
        assert!(text.contains("128.0 BPM"));
        assert!(text.contains("A minor"));
        assert!(text.contains("Peak: n/a"));
        assert!(text.contains("1523.4 Hz"));
    }

    #[test]
    fn test_format_summary() {
        let summary = format_summary(3, 1);
        assert!(summary.contains("4 files analyzed"));
        assert!(summary.contains("3 ok"));
        assert!(summary.contains("1 failed"));
    }
}
