//! Named rendezvous points holding pending sends and waiting receivers.
//!
//! A mailbox never holds both at once for the same filter class: a put is
//! first matched against waiting receivers, a get against pending sends.
//! Pending sends are kept in put order; a filtered get takes the first one
//! its filter accepts, which leaves FIFO order intact for everybody else.

use std::{
    collections::{HashMap, VecDeque},
    fmt,
};

use log::debug;

use crate::{communication::SenderFilter, process::SlotId};

pub(crate) type TransferId = u64;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MailboxKey {
    Alias(String),
    /// Legacy addressing: a numbered channel scoped to a host.
    Channel { host: String, channel: usize },
}

impl fmt::Display for MailboxKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MailboxKey::Alias(alias) => f.write_str(alias),
            MailboxKey::Channel { host, channel } => write!(f, "{host}#{channel}"),
        }
    }
}

/// Canonical default mailbox of a process: `"<hostname>:<processname>"`.
pub fn mailbox_alias(host: &str, process: &str) -> String {
    format!("{host}:{process}")
}

pub(crate) struct Waiter {
    pub(crate) slot: SlotId,
    pub(crate) filter: Option<SenderFilter>,
}

#[derive(Default)]
pub(crate) struct Mailbox {
    pending: VecDeque<TransferId>,
    waiters: VecDeque<Waiter>,
}

impl Mailbox {
    pub(crate) fn push_pending(&mut self, id: TransferId) {
        self.pending.push_back(id);
    }

    pub(crate) fn remove_pending(&mut self, id: TransferId) -> bool {
        match self.pending.iter().position(|p| *p == id) {
            Some(idx) => {
                self.pending.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Removes and returns the oldest pending send accepted by `pred`.
    pub(crate) fn take_pending(&mut self, pred: impl Fn(TransferId) -> bool) -> Option<TransferId> {
        let idx = self.pending.iter().position(|id| pred(*id))?;
        self.pending.remove(idx)
    }

    pub(crate) fn pending(&self) -> impl Iterator<Item = TransferId> + '_ {
        self.pending.iter().copied()
    }

    pub(crate) fn push_waiter(&mut self, waiter: Waiter) {
        self.waiters.push_back(waiter);
    }

    pub(crate) fn remove_waiter(&mut self, slot: SlotId) -> bool {
        match self.waiters.iter().position(|w| w.slot == slot) {
            Some(idx) => {
                self.waiters.remove(idx);
                true
            }
            None => false,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.waiters.is_empty()
    }

    /// Removes and returns the longest-waiting receiver accepted by `pred`.
    pub(crate) fn take_waiter(&mut self, pred: impl Fn(&Waiter) -> bool) -> Option<Waiter> {
        let idx = self.waiters.iter().position(pred)?;
        self.waiters.remove(idx)
    }
}

#[derive(Default)]
pub(crate) struct MailboxRegistry {
    mailboxes: HashMap<MailboxKey, Mailbox>,
}

impl MailboxRegistry {
    pub(crate) fn by_key(&self, key: &MailboxKey) -> Option<&Mailbox> {
        self.mailboxes.get(key)
    }

    pub(crate) fn push_pending(&mut self, key: &MailboxKey, id: TransferId) {
        self.by_key_or_create(key).push_pending(id);
    }

    pub(crate) fn push_waiter(&mut self, key: &MailboxKey, waiter: Waiter) {
        self.by_key_or_create(key).push_waiter(waiter);
    }

    pub(crate) fn take_pending(
        &mut self,
        key: &MailboxKey,
        pred: impl Fn(TransferId) -> bool,
    ) -> Option<TransferId> {
        let taken = self.mailboxes.get_mut(key)?.take_pending(pred);
        self.prune(key);
        taken
    }

    pub(crate) fn take_waiter(
        &mut self,
        key: &MailboxKey,
        pred: impl Fn(&Waiter) -> bool,
    ) -> Option<Waiter> {
        let taken = self.mailboxes.get_mut(key)?.take_waiter(pred);
        self.prune(key);
        taken
    }

    pub(crate) fn remove_pending(&mut self, key: &MailboxKey, id: TransferId) -> bool {
        let removed = self
            .mailboxes
            .get_mut(key)
            .is_some_and(|m| m.remove_pending(id));
        self.prune(key);
        removed
    }

    pub(crate) fn remove_waiter(&mut self, key: &MailboxKey, slot: SlotId) -> bool {
        let removed = self
            .mailboxes
            .get_mut(key)
            .is_some_and(|m| m.remove_waiter(slot));
        self.prune(key);
        removed
    }

    fn by_key_or_create(&mut self, key: &MailboxKey) -> &mut Mailbox {
        self.mailboxes.entry(key.clone()).or_insert_with(|| {
            debug!("Creating mailbox {key}");
            Mailbox::default()
        })
    }

    // Only mailboxes holding someone stay registered.
    fn prune(&mut self, key: &MailboxKey) {
        if self.mailboxes.get(key).is_some_and(Mailbox::is_empty) {
            self.mailboxes.remove(key);
            debug!("Dropping empty mailbox {key}");
        }
    }
}
