//! Hosts and the set of processes currently located on each of them.

use std::collections::{BTreeMap, BTreeSet};

use crate::{SimError, SimResult, process::SlotId};

pub(crate) struct Host {
    speed: f64, // Flop per second
    on: bool,
    processes: BTreeSet<SlotId>,
}

impl Host {
    pub(crate) fn speed(&self) -> f64 {
        self.speed
    }

    pub(crate) fn is_on(&self) -> bool {
        self.on
    }

    pub(crate) fn processes(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.processes.iter().copied()
    }
}

#[derive(Default)]
pub(crate) struct HostRegistry {
    hosts: BTreeMap<String, Host>, // btree for deterministic iterators
}

impl HostRegistry {
    pub(crate) fn add(&mut self, name: &str, speed: f64) {
        self.hosts.insert(
            name.to_string(),
            Host {
                speed,
                on: true,
                processes: BTreeSet::new(),
            },
        );
    }

    pub(crate) fn get(&self, name: &str) -> SimResult<&Host> {
        self.hosts
            .get(name)
            .ok_or_else(|| SimError::HostNotFound(name.to_string()))
    }

    /// Like `get`, but a switched-off host is an error too.
    pub(crate) fn get_on(&self, name: &str) -> SimResult<&Host> {
        let host = self.get(name)?;
        if !host.is_on() {
            return Err(SimError::HostFailure(name.to_string()));
        }
        Ok(host)
    }

    pub(crate) fn attach(&mut self, name: &str, slot: SlotId) {
        if let Some(host) = self.hosts.get_mut(name) {
            host.processes.insert(slot);
        }
    }

    pub(crate) fn detach(&mut self, name: &str, slot: SlotId) {
        if let Some(host) = self.hosts.get_mut(name) {
            host.processes.remove(&slot);
        }
    }

    /// Switches the host off and returns the processes located there.
    pub(crate) fn switch_off(&mut self, name: &str) -> SimResult<Vec<SlotId>> {
        let host = self
            .hosts
            .get_mut(name)
            .ok_or_else(|| SimError::HostNotFound(name.to_string()))?;
        host.on = false;
        Ok(host.processes().collect())
    }
}
