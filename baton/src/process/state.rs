use std::fmt;

/// Execution state of a process as seen by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecState {
    /// Thread started, waiting for its first schedule.
    New,
    /// Holds the execution token.
    Runnable,
    /// Parked inside a blocking call.
    Blocked,
    /// Parked until someone resumes it.
    Suspended,
    Done,
}

impl fmt::Display for ExecState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecState::New => "NEW",
            ExecState::Runnable => "RUNNABLE",
            ExecState::Blocked => "BLOCKED",
            ExecState::Suspended => "SUSPENDED",
            ExecState::Done => "DONE",
        };
        f.write_str(s)
    }
}
