//! Musical key labels

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the twelve equal-tempered pitch classes, C = 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PitchClass {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl PitchClass {
    pub const ALL: [PitchClass; 12] = [
        Self::C,
        Self::CSharp,
        Self::D,
        Self::DSharp,
        Self::E,
        Self::F,
        Self::FSharp,
        Self::G,
        Self::GSharp,
        Self::A,
        Self::ASharp,
        Self::B,
    ];

    /// Pitch class for an index, wrapping modulo 12
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 12]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Pitch class `semitones` above this one
    pub fn transpose(self, semitones: usize) -> Self {
        Self::from_index(self.index() + semitones)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::C => "C",
            Self::CSharp => "C#",
            Self::D => "D",
            Self::DSharp => "D#",
            Self::E => "E",
            Self::F => "F",
            Self::FSharp => "F#",
            Self::G => "G",
            Self::GSharp => "G#",
            Self::A => "A",
            Self::ASharp => "A#",
            Self::B => "B",
        }
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Major or minor tonality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Major,
    Minor,
}

impl Mode {
    pub fn name(self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
        }
    }
}

/// Estimated key of a recording
///
/// Renders as `"A minor"`, `"F# major"` or `"Unknown"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum KeyEstimate {
    Major(PitchClass),
    Minor(PitchClass),
    Unknown,
}

impl KeyEstimate {
    pub fn new(tonic: PitchClass, mode: Mode) -> Self {
        match mode {
            Mode::Major => Self::Major(tonic),
            Mode::Minor => Self::Minor(tonic),
        }
    }

    pub fn tonic(&self) -> Option<PitchClass> {
        match self {
            Self::Major(pc) | Self::Minor(pc) => Some(*pc),
            Self::Unknown => None,
        }
    }

    pub fn mode(&self) -> Option<Mode> {
        match self {
            Self::Major(_) => Some(Mode::Major),
            Self::Minor(_) => Some(Mode::Minor),
            Self::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl Default for KeyEstimate {
    fn default() -> Self {
        Self::Major(PitchClass::C)
    }
}

impl fmt::Display for KeyEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Major(pc) => write!(f, "{} major", pc),
            Self::Minor(pc) => write!(f, "{} minor", pc),
            Self::Unknown => f.write_str("Unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognised key label: {0:?}")]
pub struct ParseKeyError(String);

impl FromStr for KeyEstimate {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("unknown") {
            return Ok(Self::Unknown);
        }

        let mut parts = trimmed.split_whitespace();
        let (Some(tonic), Some(mode), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(ParseKeyError(s.to_string()));
        };

        let pc = PitchClass::ALL
            .iter()
            .copied()
            .find(|pc| pc.name().eq_ignore_ascii_case(tonic))
            .ok_or_else(|| ParseKeyError(s.to_string()))?;

        match mode.to_ascii_lowercase().as_str() {
            "major" => Ok(Self::Major(pc)),
            "minor" => Ok(Self::Minor(pc)),
            _ => Err(ParseKeyError(s.to_string())),
        }
    }
}

impl TryFrom<String> for KeyEstimate {
    type Error = ParseKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<KeyEstimate> for String {
    fn from(key: KeyEstimate) -> Self {
        key.to_string()
    }
}
