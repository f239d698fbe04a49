//! Per-key load coalescing.
//!
//! The first caller for a key becomes the leader and runs the work; callers
//! arriving while it runs block on the slot and receive a clone of the
//! leader's outcome. The slot is removed when the work completes, so a
//! failed outcome is not remembered and the next caller starts fresh.
//!
//! If the leader unwinds, the slot is still removed and followers receive
//! `None` instead of waiting forever.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

struct Slot<T> {
    /// `Some(None)`: leader unwound without an outcome
    outcome: Mutex<Option<Option<T>>>,
    ready: Condvar,
}

impl<T: Clone> Slot<T> {
    fn new() -> Self {
        Self {
            outcome: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    fn publish(&self, value: Option<T>) {
        *self.outcome.lock() = Some(value);
        self.ready.notify_all();
    }

    fn wait(&self) -> Option<T> {
        let mut outcome = self.outcome.lock();
        loop {
            if let Some(value) = outcome.as_ref() {
                return value.clone();
            }
            self.ready.wait(&mut outcome);
        }
    }
}

/// Releases the leader's slot on every exit path, unwinding included.
struct Completion<'a, T: Clone> {
    flight: &'a SingleFlight<T>,
    key: &'a str,
    slot: Arc<Slot<T>>,
    outcome: Option<T>,
}

impl<T: Clone> Drop for Completion<'_, T> {
    fn drop(&mut self) {
        self.flight.in_flight.lock().remove(self.key);
        self.slot.publish(self.outcome.take());
    }
}

/// Whether the caller ran the work or joined someone else's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Leader,
    Follower,
}

pub struct SingleFlight<T> {
    in_flight: Mutex<HashMap<String, Arc<Slot<T>>>>,
}

impl<T: Clone> Default for SingleFlight<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> SingleFlight<T> {
    pub fn new() -> Self {
        Self {
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Run `work` for `key` unless a run is already in flight, in which case
    /// wait for it. `shortcut` is checked under the table lock before a new
    /// run starts; when it yields a value no work is done.
    ///
    /// `work` runs without the table lock held. Followers get `None` when
    /// the leader panicked.
    pub fn run<S, W>(&self, key: &str, shortcut: S, work: W) -> (Option<T>, Role)
    where
        S: FnOnce() -> Option<T>,
        W: FnOnce() -> T,
    {
        let slot = {
            let mut table = self.in_flight.lock();
            if let Some(existing) = table.get(key) {
                let existing = Arc::clone(existing);
                drop(table);
                return (existing.wait(), Role::Follower);
            }
            if let Some(done) = shortcut() {
                return (Some(done), Role::Follower);
            }
            let slot = Arc::new(Slot::new());
            table.insert(key.to_string(), Arc::clone(&slot));
            slot
        };

        let mut completion = Completion {
            flight: self,
            key,
            slot,
            outcome: None,
        };
        let outcome = work();
        completion.outcome = Some(outcome.clone());
        drop(completion);

        (Some(outcome), Role::Leader)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().len()
    }
}
