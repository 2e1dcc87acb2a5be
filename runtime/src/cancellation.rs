//! Cancellation registry.
//!
//! Maps each [`CancelId`] to the set of in-flight effects registered under it. A key
//! can hold several registrations at once (effects started with
//! `cancel_in_flight: false`), and cancelling the key cancels all of them.
//!
//! Registrations are RAII: dropping a [`Registration`] removes its entry, so keys
//! disappear from the registry as soon as their last effect finishes.

use composable_core::CancelId;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct RegistryInner {
    next_entry: u64,
    entries: HashMap<CancelId, HashMap<u64, CancellationToken>>,
}

/// Shared map from cancellation keys to in-flight effect tokens
#[derive(Clone, Default)]
pub struct CancellationRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl CancellationRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `token` under `id`
    ///
    /// The entry lives until the returned [`Registration`] is dropped or the key is
    /// cancelled.
    #[must_use = "dropping the registration unregisters the effect immediately"]
    pub fn register(&self, id: CancelId, token: CancellationToken) -> Registration {
        let entry = {
            let mut inner = self.lock();
            let entry = inner.next_entry;
            inner.next_entry += 1;
            inner
                .entries
                .entry(id.clone())
                .or_default()
                .insert(entry, token);
            entry
        };

        tracing::trace!(?id, entry, "Registered cancellable effect");

        Registration {
            registry: self.clone(),
            id,
            entry,
        }
    }

    /// Cancel every effect registered under `id`
    ///
    /// Returns how many effects were cancelled. Cancelling a key with nothing
    /// registered is a no-op.
    pub fn cancel(&self, id: &CancelId) -> usize {
        let removed = self.lock().entries.remove(id);

        let Some(tokens) = removed else {
            tracing::trace!(?id, "Cancel requested with nothing in flight");
            return 0;
        };

        let count = tokens.len();
        for token in tokens.into_values() {
            token.cancel();
        }
        tracing::debug!(?id, count, "Cancelled in-flight effects");
        count
    }

    /// Cancel every registered effect
    pub fn cancel_all(&self) -> usize {
        let entries = std::mem::take(&mut self.lock().entries);
        entries
            .into_values()
            .flat_map(HashMap::into_values)
            .map(|token| token.cancel())
            .count()
    }

    /// Whether at least one effect is registered under `id`
    #[must_use]
    pub fn is_registered(&self, id: &CancelId) -> bool {
        self.lock().entries.contains_key(id)
    }

    /// Number of effects registered under `id`
    #[must_use]
    pub fn in_flight(&self, id: &CancelId) -> usize {
        self.lock().entries.get(id).map_or(0, HashMap::len)
    }

    /// Number of keys with at least one registration
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether no key has a registration
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    fn unregister(&self, id: &CancelId, entry: u64) {
        let mut inner = self.lock();
        if let Some(tokens) = inner.entries.get_mut(id) {
            tokens.remove(&entry);
            if tokens.is_empty() {
                inner.entries.remove(id);
            }
        }
    }
}

impl fmt::Debug for CancellationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationRegistry")
            .field("keys", &self.len())
            .finish()
    }
}

/// A live entry in a [`CancellationRegistry`]
///
/// Dropping it removes the entry.
pub struct Registration {
    registry: CancellationRegistry,
    id: CancelId,
    entry: u64,
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.unregister(&self.id, self.entry);
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("entry", &self.entry)
            .finish()
    }
}
