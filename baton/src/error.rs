//! Error kinds surfaced by every blocking and administrative call.
//!
//! Simulated failures (`Timeout`, `TransferFailure`, `HostFailure`, ...) are
//! ordinary values that actor logic is expected to branch on. `ProcessKilled`
//! is different: it only tells a blocked call that its own process was killed
//! and must be propagated out of `main` with `?`.

use thiserror::Error;

use crate::ProcessId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("host {0} not found")]
    HostNotFound(String),

    #[error("host {0} is switched off")]
    HostFailure(String),

    #[error("no such process: P{0}")]
    NoSuchProcess(ProcessId),

    #[error("transfer failure")]
    TransferFailure,

    #[error("timeout")]
    Timeout,

    #[error("process killed")]
    ProcessKilled,

    /// The kernel's bookkeeping disagrees with what a process observed.
    #[error("kernel inconsistency: {0}")]
    Internal(String),
}

impl SimError {
    /// Simulated failures may be handled and the actor may go on.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, SimError::ProcessKilled | SimError::Internal(_))
    }
}

pub type SimResult<T> = Result<T, SimError>;
