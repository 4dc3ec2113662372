// tests/cli_test.rs
//
// Runs the built binary on generated WAV files.

mod test_utils;

use std::fs;

use beatkey::testgen;
use test_utils::{json_stdout, run_beatkey};

#[test]
fn test_tempo_key_prints_json_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clicks.wav");
    testgen::write_wav(&path, &testgen::click_track(120.0, 22050, 30.0), 2).unwrap();

    let output = run_beatkey(&["tempo-key"], &path);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let json = json_stdout(&output);
    let bpm = json["bpm"].as_f64().expect("bpm");
    assert!((bpm - 120.0).abs() <= 3.0, "got {bpm}");
    assert!(json["key"].is_string());
    assert_eq!(json.as_object().unwrap().len(), 2);
}

#[test]
fn test_frequency_prints_json_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a3.wav");
    testgen::write_wav(&path, &testgen::sine_tone(220.0, 0.5, 22050, 3.0), 1).unwrap();

    let output = run_beatkey(&["frequency", "--sr", "16000"], &path);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let json = json_stdout(&output);
    let f0 = json["fundamental_frequency"].as_f64().expect("fundamental");
    assert!((f0 - 220.0).abs() <= 5.0, "got {f0}");
    assert!(json["peak_frequency"].is_number());
    assert!(json["spectral_centroid"].is_number());
}

#[test]
fn test_silent_file_reports_nulls() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("silence.wav");
    testgen::write_wav(&path, &testgen::silence(22050, 2.0), 1).unwrap();

    let output = run_beatkey(&["frequency"], &path);
    assert!(output.status.success());
    let json = json_stdout(&output);
    assert!(json["fundamental_frequency"].is_null());
    assert!(json["peak_frequency"].is_null());
    assert!(json["spectral_centroid"].is_null());

    let output = run_beatkey(&["tempo-key"], &path);
    assert!(output.status.success());
    let json = json_stdout(&output);
    assert_eq!(json["bpm"], 120.0);
    assert_eq!(json["key"], "Unknown");
}

#[test]
fn test_analyze_directory() {
    let dir = tempfile::tempdir().unwrap();
    testgen::write_wav(&dir.path().join("one.wav"), &testgen::sine_tone(196.0, 0.5, 22050, 2.0), 1).unwrap();
    testgen::write_wav(&dir.path().join("two.wav"), &testgen::click_track(100.0, 22050, 4.0), 1).unwrap();
    fs::write(dir.path().join("notes.txt"), "not audio").unwrap();

    let output = run_beatkey(&["analyze", "--format", "json"], dir.path());
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let records: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(records.len(), 2);
    assert!(records[0]["file"].as_str().unwrap().ends_with("one.wav"));
    assert!(records[1]["file"].as_str().unwrap().ends_with("two.wav"));
    for record in &records {
        assert!(record["bpm"].is_number());
        assert!(record.get("key").is_some());
    }
}

#[test]
fn test_unreadable_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.wav");
    fs::write(&path, b"definitely not a wav file").unwrap();

    let output = run_beatkey(&["tempo-key"], &path);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());

    let output = run_beatkey(&["tempo-key"], &dir.path().join("missing.wav"));
    assert!(!output.status.success());
}

#[test]
fn test_invalid_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("tone.wav");
    testgen::write_wav(&wav, &testgen::sine_tone(440.0, 0.5, 22050, 1.0), 1).unwrap();
    let config = dir.path().join("config.json");
    fs::write(&config, r#"{"key": {"chroma_methods": []}}"#).unwrap();

    let output = run_beatkey(&["tempo-key", "--config", config.to_str().unwrap()], &wav);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("config"));
}
