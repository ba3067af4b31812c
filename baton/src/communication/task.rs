//! Tasks: the payload actors exchange through mailboxes.
//!
//! A task carries a logical computation cost (flop) used by
//! [`Context::execute`] and a logical communication size (bytes) used to
//! price transfers. The payload itself is any `Send` value, recovered by
//! downcasting on the receiving side.
//!
//! ```rust
//! use baton::Task;
//!
//! let mut task = Task::new("chunk", 5e6, 1e4).with_payload(vec![1u8, 2, 3]);
//! assert!(task.is::<Vec<u8>>());
//! assert_eq!(task.payload::<Vec<u8>>().map(Vec::len), Some(3));
//! assert_eq!(task.take_payload::<Vec<u8>>(), Some(vec![1, 2, 3]));
//! ```
//!
//! [`Context::execute`]: crate::Context::execute

use std::{any::Any, fmt};

use crate::{ProcessId, SimError, SimResult};

pub struct Task {
    name: String,
    compute_cost: f64,
    size: f64,
    payload: Option<Box<dyn Any + Send>>,
    sender: Option<ProcessId>,
    source_host: Option<String>,
    delivered: bool,
}

impl Task {
    pub fn new(name: impl Into<String>, compute_cost: f64, size: f64) -> Self {
        Self {
            name: name.into(),
            compute_cost,
            size,
            payload: None,
            sender: None,
            source_host: None,
            delivered: false,
        }
    }

    pub fn with_payload<T: Any + Send>(mut self, payload: T) -> Self {
        self.payload = Some(Box::new(payload));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Flop.
    pub fn compute_cost(&self) -> f64 {
        self.compute_cost
    }

    /// Bytes.
    pub fn size(&self) -> f64 {
        self.size
    }

    /// Process that sent the task, once it went through a mailbox.
    pub fn sender(&self) -> Option<ProcessId> {
        self.sender
    }

    /// Host the sender was on when it sent the task.
    pub fn source_host(&self) -> Option<&str> {
        self.source_host.as_deref()
    }

    pub fn is_delivered(&self) -> bool {
        self.delivered
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.payload.as_ref().is_some_and(|p| p.is::<T>())
    }

    pub fn payload<T: 'static>(&self) -> Option<&T> {
        self.payload.as_ref()?.downcast_ref::<T>()
    }

    /// Moves the payload out if it has type `T`; leaves it in place otherwise.
    pub fn take_payload<T: 'static>(&mut self) -> Option<T> {
        match self.payload.take()?.downcast::<T>() {
            Ok(payload) => Some(*payload),
            Err(other) => {
                self.payload = Some(other);
                None
            }
        }
    }

    pub(crate) fn validate(&self) -> SimResult<()> {
        let valid = |v: f64| v.is_finite() && v >= 0.0;
        if !valid(self.compute_cost) || !valid(self.size) {
            return Err(SimError::InvalidArgument(format!(
                "task {} has a negative or non-finite cost",
                self.name
            )));
        }
        Ok(())
    }

    pub(crate) fn stamp(&mut self, sender: ProcessId, host: &str) {
        self.sender = Some(sender);
        self.source_host = Some(host.to_string());
    }

    pub(crate) fn mark_delivered(&mut self) {
        self.delivered = true;
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("compute_cost", &self.compute_cost)
            .field("size", &self.size)
            .field("sender", &self.sender)
            .field("source_host", &self.source_host)
            .field("delivered", &self.delivered)
            .finish()
    }
}
