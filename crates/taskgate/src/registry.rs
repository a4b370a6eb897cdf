/*
[INPUT]:  State keys claimed by starting runs.
[OUTPUT]: Atomic per-key in-flight registration with RAII release.
[POS]:    Coordination layer - closes the duplicate-run race per key.
[UPDATE]: When in-flight accounting changes.
*/

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::key::StateKey;

/// Set of keys with a run currently executing.
///
/// `try_begin` is the only gate: insert-if-absent under one lock, so two
/// concurrent runs of the same key can never both pass. The returned guard
/// releases the key on drop, early return and unwind included.
#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    keys: Arc<Mutex<HashSet<StateKey>>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `key` as in flight, or `None` if it already is.
    pub fn try_begin(&self, key: &StateKey) -> Option<InFlightGuard> {
        let mut keys = self.keys.lock().expect("in-flight registry lock");
        if !keys.insert(key.clone()) {
            return None;
        }
        Some(InFlightGuard {
            key: key.clone(),
            keys: Arc::clone(&self.keys),
        })
    }

    /// Whether `key` currently has a run in flight.
    pub fn is_in_flight(&self, key: &StateKey) -> bool {
        self.keys
            .lock()
            .expect("in-flight registry lock")
            .contains(key)
    }

    /// Number of keys currently in flight.
    pub fn len(&self) -> usize {
        self.keys.lock().expect("in-flight registry lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Releases its key from the registry when dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    key: StateKey,
    keys: Arc<Mutex<HashSet<StateKey>>>,
}

impl InFlightGuard {
    pub fn key(&self) -> &StateKey {
        &self.key
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Ok(mut keys) = self.keys.lock() {
            keys.remove(&self.key);
        }
    }
}
