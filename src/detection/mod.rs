//! Result types: key labels and estimation records

mod key;
mod result;

pub use key::{KeyEstimate, Mode, ParseKeyError, PitchClass};
pub use result::{round1, BatchRecord, EstimationResult, FrequencyReport, TempoKeyReport};
