//! Command-line arguments

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::core::LoadOptions;

/// Estimate tempo, musical key and dominant frequencies of audio files
#[derive(Parser, Debug)]
#[command(name = "beatkey", version, about)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Estimator configuration file (JSON)
    #[arg(long, global = true, env = "BEATKEY_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print {"bpm", "key"} for one file
    TempoKey(InputArgs),
    /// Print fundamental, peak and centroid frequencies for one file
    Frequency(InputArgs),
    /// Analyze files and directories in parallel
    Analyze(BatchArgs),
}

/// How audio is prepared before analysis
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct DecodeArgs {
    /// Resample to this rate before analysis
    #[arg(long = "sr", value_name = "HZ", value_parser = clap::value_parser!(u32).range(1..))]
    pub sample_rate: Option<u32>,

    /// Downmix to mono (always applied to multi-channel input)
    #[arg(long)]
    pub mono: bool,
}

impl DecodeArgs {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            target_sample_rate: self.sample_rate,
            mono: self.mono,
        }
    }
}

#[derive(Args, Debug)]
pub struct InputArgs {
    /// Audio file
    pub path: PathBuf,

    #[command(flatten)]
    pub decode: DecodeArgs,
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Audio files or directories
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    #[command(flatten)]
    pub decode: DecodeArgs,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One JSON object per line
    Json,
    /// Coloured human-readable summary
    Text,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_tempo_key() {
        let cli = Cli::try_parse_from(["beatkey", "tempo-key", "song.wav", "--sr", "22050"]).unwrap();
        match cli.command {
            Command::TempoKey(args) => {
                assert_eq!(args.path, PathBuf::from("song.wav"));
                assert_eq!(args.decode.sample_rate, Some(22050));
                assert!(!args.decode.mono);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "beatkey", "frequency", "a.flac", "--mono", "-vv", "--config", "cfg.json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("cfg.json")));
        match cli.command {
            Command::Frequency(args) => assert!(args.decode.load_options().mono),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_analyze() {
        let cli =
            Cli::try_parse_from(["beatkey", "analyze", "a.wav", "music/", "--format", "text"])
                .unwrap();
        match cli.command {
            Command::Analyze(args) => {
                assert_eq!(args.inputs.len(), 2);
                assert_eq!(args.format, OutputFormat::Text);
                assert_eq!(args.decode.load_options(), LoadOptions::default());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(Cli::try_parse_from(["beatkey", "analyze"]).is_err());
        assert!(Cli::try_parse_from(["beatkey", "tempo-key", "a.wav", "--sr", "0"]).is_err());
        assert!(Cli::try_parse_from(["beatkey", "tempo-key"]).is_err());
    }
}
