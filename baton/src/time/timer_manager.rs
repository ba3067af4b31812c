//! Time-ordered event storage for the kernel.
//!
//! Events fire in `(time, submission order)` order, so two events scheduled
//! for the same instant are applied first-in first-out and a run is
//! reproducible for a given seed.

use std::{cmp::Reverse, collections::BinaryHeap};

use log::debug;

use crate::time::Jiffies;

struct Timer<E> {
    at: Jiffies,
    seq: u64,
    event: E,
}

impl<E> PartialEq for Timer<E> {
    fn eq(&self, other: &Self) -> bool {
        (self.at, self.seq) == (other.at, other.seq)
    }
}

impl<E> Eq for Timer<E> {}

impl<E> PartialOrd for Timer<E> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Timer<E> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.at, self.seq).cmp(&(other.at, other.seq))
    }
}

pub(crate) struct TimerManager<E> {
    working_timers: BinaryHeap<Reverse<Timer<E>>>,
    next_seq: u64,
}

impl<E> TimerManager<E> {
    pub(crate) fn new() -> Self {
        Self {
            working_timers: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    pub(crate) fn schedule(&mut self, at: Jiffies, event: E) {
        let seq = self.next_seq;
        self.next_seq += 1;
        debug!("Timer #{seq} armed for {at}");
        self.working_timers.push(Reverse(Timer { at, seq, event }));
    }

    pub(crate) fn peek_closest(&self) -> Option<Jiffies> {
        self.working_timers.peek().map(|entry| entry.0.at)
    }

    pub(crate) fn pop(&mut self) -> Option<(Jiffies, E)> {
        self.working_timers
            .pop()
            .map(|Reverse(timer)| (timer.at, timer.event))
    }
}
