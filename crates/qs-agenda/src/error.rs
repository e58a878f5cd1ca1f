use thiserror::Error;

use qs_core::SimTime;

#[derive(Debug, Error)]
pub enum AgendaError {
    #[error("invalid shift [{start}, {end}): start must be finite and before end")]
    InvalidShift { start: SimTime, end: SimTime },

    #[error("shift starting at {next} overlaps the shift ending at {previous_end}")]
    Overlap { previous_end: SimTime, next: SimTime },

    #[error("agenda parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AgendaResult<T> = Result<T, AgendaError>;
