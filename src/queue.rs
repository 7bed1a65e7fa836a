//! FIFO hand-off of commands from the message-receipt side to the single
//! command execution thread.
//!
//! One mutex guards the list, one condition variable wakes a blocked
//! consumer. The queue is unbounded; a command flood is not throttled here.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::commands::Command;

#[derive(Debug)]
enum Slot {
    Command(Command),
    Stop,
}

/// Result of [`CommandQueue::pop_non_blocking`].
#[derive(Debug, PartialEq)]
pub enum Polled {
    Command(Command),
    Empty,
    /// The stop marker was reached.
    Stopped,
}

#[derive(Debug, Default)]
pub struct CommandQueue {
    slots: Mutex<VecDeque<Slot>>,
    available: Condvar,
}

impl CommandQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Slot>> {
        // the list is never left half-updated, so a poisoned lock is still consistent
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append to the tail and wake a waiting consumer. Safe from any number
    /// of producers.
    pub fn push(&self, command: Command) {
        let mut slots = self.lock();
        slots.push_back(Slot::Command(command));
        self.available.notify_one();
    }

    /// Append a stop marker. Commands pushed before it are still delivered;
    /// the consumer sees `None` from [`pop_blocking`](Self::pop_blocking) once it reaches the marker.
    pub fn push_stop(&self) {
        let mut slots = self.lock();
        slots.push_back(Slot::Stop);
        self.available.notify_all();
    }

    /// Remove and return the head, waiting while the queue is empty.
    ///
    /// The emptiness check is re-evaluated under the lock after every wake-up,
    /// so spurious wake-ups and lost notifications cannot hand out a command
    /// twice or skip one. Returns `None` when a stop marker is dequeued.
    pub fn pop_blocking(&self) -> Option<Command> {
        let mut slots = self.lock();
        loop {
            match slots.pop_front() {
                Some(Slot::Command(c)) => return Some(c),
                Some(Slot::Stop) => return None,
                None => {
                    slots = self
                        .available
                        .wait(slots)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
    }

    /// Remove and return the head without waiting.
    pub fn pop_non_blocking(&self) -> Polled {
        match self.lock().pop_front() {
            Some(Slot::Command(c)) => Polled::Command(c),
            Some(Slot::Stop) => Polled::Stopped,
            None => Polled::Empty,
        }
    }

    /// Drop everything still queued, stop markers included. Producers must be
    /// stopped first; a concurrent push may or may not survive.
    pub fn clear(&self) -> usize {
        let mut slots = self.lock();
        let n = slots.len();
        slots.clear();
        n
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
