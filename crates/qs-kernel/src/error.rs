//! Kernel error and fault types.
//!
//! Two families live here:
//!
//! - [`KernelError`]: misuse of the kernel API, such as firing an event
//!   twice or interrupting a dead process.  Returned as `Err` from the call
//!   that misbehaved; never travels through the simulation.
//! - [`Fault`]: a failure *value* carried by an event to its waiters.  It is
//!   an interruption, a failed process, or a kernel error raised inside a
//!   process body and propagated with `?`.

use thiserror::Error;

use qs_core::{EventId, ProcessId, SimTime};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum KernelError {
    #[error("{event} fired twice")]
    DoubleFire { event: EventId },

    #[error("invalid delay {delay}: delays must be finite and non-negative")]
    InvalidDelay { delay: f64 },

    #[error("deadline {deadline} is before the current time {now}")]
    DeadlineInPast { deadline: SimTime, now: SimTime },

    #[error("{0} does not exist")]
    UnknownProcess(ProcessId),

    #[error("{0} has already finished")]
    ProcessFinished(ProcessId),

    #[error("{0} cannot interrupt itself")]
    SelfInterrupt(ProcessId),

    #[error("store request {request} ({event}) was granted after it stopped waiting")]
    StaleWaiter { request: u64, event: EventId },
}

/// Shorthand result type for kernel calls.
pub type KernelResult<T> = Result<T, KernelError>;

/// Out-of-band signal delivered to an interrupted process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("interrupted: {cause}")]
pub struct Interrupt {
    pub cause: String,
}

/// Failure value carried by an event.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Fault {
    #[error(transparent)]
    Interrupt(#[from] Interrupt),

    #[error("process failed: {0}")]
    Failed(String),

    #[error(transparent)]
    Kernel(#[from] KernelError),
}

impl Fault {
    pub fn failed(msg: impl Into<String>) -> Self {
        Fault::Failed(msg.into())
    }

    pub fn is_interrupt(&self) -> bool {
        matches!(self, Fault::Interrupt(_))
    }

    pub fn as_interrupt(&self) -> Option<&Interrupt> {
        match self {
            Fault::Interrupt(i) => Some(i),
            _ => None,
        }
    }
}

/// What an event delivers to its waiters.
pub type Outcome<T> = Result<T, Fault>;
