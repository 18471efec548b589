//! In-flight registry of messages currently being processed.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// Set of message identifiers with a pipeline run between claim and release.
///
/// Claims are atomic check-and-insert under the lock; the lock is never held
/// across an `.await`.
#[derive(Debug, Default, Clone)]
pub struct InFlightRegistry {
    entries: Arc<Mutex<HashSet<String>>>,
}

impl InFlightRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `message_id`, or return `None` if it is already claimed.
    ///
    /// The entry is released when the returned guard is dropped.
    #[must_use]
    pub fn try_claim(&self, message_id: &str) -> Option<InFlightClaim> {
        let inserted = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(message_id.to_owned());
        inserted.then(|| InFlightClaim {
            entries: Arc::clone(&self.entries),
            message_id: message_id.to_owned(),
        })
    }

    /// Whether `message_id` is currently claimed.
    #[must_use]
    pub fn contains(&self, message_id: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(message_id)
    }

    /// Number of runs in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no runs are in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Ownership of one registry entry; releases it on drop.
#[derive(Debug)]
pub struct InFlightClaim {
    entries: Arc<Mutex<HashSet<String>>>,
    message_id: String,
}

impl Drop for InFlightClaim {
    fn drop(&mut self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.message_id);
    }
}
