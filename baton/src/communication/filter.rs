use crate::{ProcessId, communication::Task};

/// Restricts a receive to tasks coming from a given origin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SenderFilter {
    /// Sent by a process located on this host at send time.
    Host(String),
    Process(ProcessId),
}

impl SenderFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            SenderFilter::Host(host) => task.source_host() == Some(host.as_str()),
            SenderFilter::Process(pid) => task.sender() == Some(*pid),
        }
    }
}

pub(crate) fn accepts(filter: Option<&SenderFilter>, task: &Task) -> bool {
    filter.is_none_or(|f| f.matches(task))
}
