// src/cli/mod.rs
//
// Command-line interface: argument parsing, dispatch and batch processing.

mod args;
mod output;

pub use args::{BatchArgs, Cli, Command, DecodeArgs, InputArgs, OutputFormat};
pub use output::{format_failure, format_summary, format_text, json_line};

use anyhow::{bail, Result};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use log::info;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config;
use crate::core::{load_waveform, Analyzer};
use crate::detection::{BatchRecord, FrequencyReport, TempoKeyReport};

/// Extensions picked up when walking directories
pub const AUDIO_EXTENSIONS: [&str; 7] = ["wav", "flac", "mp3", "ogg", "oga", "m4a", "aac"];

/// Run a parsed command line
pub fn run(cli: &Cli) -> Result<()> {
    let config = config::load(cli.config.as_deref())?;
    let analyzer = Analyzer::with_config(config);

    match &cli.command {
        Command::TempoKey(args) => tempo_key(&analyzer, args),
        Command::Frequency(args) => frequency(&analyzer, args),
        Command::Analyze(args) => analyze(&analyzer, args),
    }
}

fn tempo_key(analyzer: &Analyzer, args: &InputArgs) -> Result<()> {
    let waveform = load_waveform(&args.path, &args.decode.load_options())?;
    let (bpm, key) = analyzer.tempo_and_key(&waveform);
    let report = TempoKeyReport::new(bpm, key);
    info!("{}: {} BPM, {}", args.path.display(), report.bpm, report.key);
    println!("{}", json_line(&report)?);
    Ok(())
}

fn frequency(analyzer: &Analyzer, args: &InputArgs) -> Result<()> {
    let waveform = load_waveform(&args.path, &args.decode.load_options())?;
    let report = FrequencyReport::from(analyzer.frequencies(&waveform));
    info!("{}: {:?}", args.path.display(), report);
    println!("{}", json_line(&report)?);
    Ok(())
}

fn analyze(analyzer: &Analyzer, args: &BatchArgs) -> Result<()> {
    let files = collect_audio_files(&args.inputs);
    if files.is_empty() {
        bail!("No audio files found");
    }
    info!("Analyzing {} file(s)", files.len());

    let options = args.decode.load_options();
    let pb = ProgressBar::new(files.len() as u64);
    if let Ok(style) =
        ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }

    // Collecting keeps input order regardless of which worker finishes first
    let results: Vec<(String, Result<BatchRecord>)> = files
        .par_iter()
        .progress_with(pb.clone())
        .map(|path| {
            let file = path.display().to_string();
            let record = analyzer
                .analyze_file(path, &options)
                .map(|result| BatchRecord {
                    file: file.clone(),
                    result: result.rounded(),
                });
            (file, record)
        })
        .collect();
    pb.finish_and_clear();

    let mut failed = 0;
    for (file, result) in &results {
        match result {
            Ok(record) => {
                info!("{}: {} BPM, {}", record.file, record.result.bpm, record.result.key);
                match args.format {
                    OutputFormat::Json => println!("{}", json_line(record)?),
                    OutputFormat::Text => print!("{}", format_text(record)),
                }
            }
            Err(e) => {
                failed += 1;
                eprintln!("{}", format_failure(file, e));
            }
        }
    }

    if args.format == OutputFormat::Text {
        print!("{}", format_summary(results.len() - failed, failed));
    }

    if failed > 0 {
        bail!("{} of {} file(s) could not be analyzed", failed, results.len());
    }
    Ok(())
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Expand inputs into a sorted list of audio files
///
/// Files named explicitly are kept whatever their extension, so a bad
/// path surfaces as a decode error instead of disappearing.
pub fn collect_audio_files(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(input)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file() && is_audio_file(e.path()))
                .map(|e| e.into_path())
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(input.clone());
        }
    }

    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_collect_walks_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("disc2");
        fs::create_dir(&nested).unwrap();
        fs::write(dir.path().join("b.wav"), b"").unwrap();
        fs::write(dir.path().join("a.FLAC"), b"").unwrap();
        fs::write(dir.path().join("cover.jpg"), b"").unwrap();
        fs::write(nested.join("c.mp3"), b"").unwrap();

        let files = collect_audio_files(&[dir.path().to_path_buf()]);
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.FLAC", "b.wav", "c.mp3"]);
    }

    #[test]
    fn test_collect_keeps_explicit_files() {
        let files = collect_audio_files(&[PathBuf::from("notes.txt")]);
        assert_eq!(files, vec![PathBuf::from("notes.txt")]);
    }
}
