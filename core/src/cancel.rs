//! Cancellation identifiers.
//!
//! A [`CancelId`] groups effects that are mutually exclusive in time, such as "the
//! timer of this feature" or "the in-flight search request". Any hashable value can
//! serve as a key; a feature-local enum keeps keys from colliding across features.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

trait DynKey: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn dyn_eq(&self, other: &dyn DynKey) -> bool;
    fn dyn_hash(&self, state: &mut dyn Hasher);
}

impl<T> DynKey for T
where
    T: Hash + Eq + fmt::Debug + Send + Sync + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn DynKey) -> bool {
        other.as_any().downcast_ref::<T>() == Some(self)
    }

    fn dyn_hash(&self, mut state: &mut dyn Hasher) {
        self.hash(&mut state);
    }
}

/// Opaque identity of a group of cancellable effects
///
/// Two ids are equal only when they wrap values of the same type that compare
/// equal, so `SearchCancel::Search` never matches `TimerCancel::Search`.
///
/// # Example
///
/// ```
/// use composable_core::CancelId;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// enum TimerCancel {
///     Tick,
/// }
///
/// assert_eq!(CancelId::new(TimerCancel::Tick), CancelId::new(TimerCancel::Tick));
/// assert_ne!(CancelId::new(TimerCancel::Tick), CancelId::new("tick"));
/// ```
#[derive(Clone)]
pub struct CancelId(Arc<dyn DynKey>);

impl CancelId {
    /// Wrap a key value
    ///
    /// Passing an existing `CancelId` returns it unchanged rather than nesting it.
    #[must_use]
    pub fn new<K>(key: K) -> Self
    where
        K: Hash + Eq + fmt::Debug + Send + Sync + 'static,
    {
        if let Some(id) = (&key as &dyn Any).downcast_ref::<Self>() {
            return id.clone();
        }
        Self(Arc::new(key))
    }

    /// This key qualified by `scope`
    ///
    /// The result equals another scoped id only when both the scope and the key
    /// are equal.
    #[must_use]
    pub fn scoped(&self, scope: &Self) -> Self {
        Self::new(ScopedKey {
            scope: scope.clone(),
            key: self.clone(),
        })
    }

    /// Borrow the wrapped key if it has type `K`
    #[must_use]
    pub fn downcast_ref<K: 'static>(&self) -> Option<&K> {
        self.0.as_any().downcast_ref::<K>()
    }
}

/// A key qualified by the scope it was registered in
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopedKey {
    /// The scope
    pub scope: CancelId,
    /// The key within the scope
    pub key: CancelId,
}

impl PartialEq for CancelId {
    fn eq(&self, other: &Self) -> bool {
        self.0.dyn_eq(&*other.0)
    }
}

impl Eq for CancelId {}

impl Hash for CancelId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let type_id: TypeId = self.0.as_any().type_id();
        type_id.hash(state);
        self.0.dyn_hash(state);
    }
}

impl fmt::Debug for CancelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CancelId({:?})", self.0)
    }
}
