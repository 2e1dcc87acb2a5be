//! Dependency resolution.
//!
//! Each capability a feature needs (a clock, an id generator, a network client) is
//! named by a [`DependencyKey`] type. The key supplies the default value for every
//! [`DependencyContext`]; a [`Dependencies`] container resolves keys, preferring
//! explicit overrides and memoizing defaults.
//!
//! Because every key must provide [`DependencyKey::live_value`], resolving a key
//! nobody registered is impossible: a missing dependency is a compile error.
//!
//! # Example
//!
//! ```
//! use composable_core::dependencies::{Dependencies, DependencyKey};
//!
//! struct Greeting;
//!
//! impl DependencyKey for Greeting {
//!     type Value = &'static str;
//!
//!     fn live_value() -> Self::Value {
//!         "hello"
//!     }
//!
//!     fn test_value() -> Self::Value {
//!         "test hello"
//!     }
//! }
//!
//! assert_eq!(Dependencies::live().resolve::<Greeting>(), "hello");
//! assert_eq!(Dependencies::test().resolve::<Greeting>(), "test hello");
//!
//! let custom = Dependencies::live().with(|deps| deps.set::<Greeting>("hi"));
//! assert_eq!(custom.resolve::<Greeting>(), "hi");
//! ```

use crate::environment::{Clock, SystemClock};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

type AnyValue = Arc<dyn Any + Send + Sync>;

/// A named dependency and its default values
pub trait DependencyKey: 'static {
    /// The value the key resolves to
    type Value: Clone + Send + Sync + 'static;

    /// Value used when running for real
    fn live_value() -> Self::Value;

    /// Value used under test. Defaults to the live value.
    fn test_value() -> Self::Value {
        Self::live_value()
    }

    /// Value used for previews and demos. Defaults to the live value.
    fn preview_value() -> Self::Value {
        Self::live_value()
    }
}

/// Which default a [`Dependencies`] container falls back to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DependencyContext {
    /// Production defaults
    #[default]
    Live,
    /// Test defaults
    Test,
    /// Preview defaults
    Preview,
}

/// Container resolving [`DependencyKey`]s
///
/// Overrides are per container; defaults are computed once per key and shared by
/// every container cloned from the same root.
#[derive(Clone)]
pub struct Dependencies {
    context: DependencyContext,
    overrides: HashMap<TypeId, AnyValue>,
    defaults: Arc<Mutex<HashMap<TypeId, AnyValue>>>,
}

impl Dependencies {
    /// Container for the given context with no overrides
    #[must_use]
    pub fn new(context: DependencyContext) -> Self {
        Self {
            context,
            overrides: HashMap::new(),
            defaults: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Container resolving live defaults
    #[must_use]
    pub fn live() -> Self {
        Self::new(DependencyContext::Live)
    }

    /// Container resolving test defaults
    #[must_use]
    pub fn test() -> Self {
        Self::new(DependencyContext::Test)
    }

    /// Container resolving preview defaults
    #[must_use]
    pub fn preview() -> Self {
        Self::new(DependencyContext::Preview)
    }

    /// The context defaults are drawn from
    #[must_use]
    pub const fn context(&self) -> DependencyContext {
        self.context
    }

    /// Override the value of `K` in this container
    pub fn set<K: DependencyKey>(&mut self, value: K::Value) -> &mut Self {
        self.overrides.insert(TypeId::of::<K>(), Arc::new(value));
        self
    }

    /// Copy of this container with the overrides applied by `configure`
    ///
    /// The original container is left untouched.
    #[must_use]
    pub fn with<F>(&self, configure: F) -> Self
    where
        F: FnOnce(&mut Self) -> &mut Self,
    {
        let mut scoped = self.clone();
        configure(&mut scoped);
        scoped
    }

    /// Resolve `K`: the override if one is set, else the context default
    #[must_use]
    pub fn resolve<K: DependencyKey>(&self) -> K::Value {
        let key = TypeId::of::<K>();

        if let Some(value) = self
            .overrides
            .get(&key)
            .and_then(|value| value.downcast_ref::<K::Value>())
        {
            return value.clone();
        }

        let mut defaults = self.defaults.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(value) = defaults
            .get(&key)
            .and_then(|value| value.downcast_ref::<K::Value>())
        {
            return value.clone();
        }

        let value = match self.context {
            DependencyContext::Live => K::live_value(),
            DependencyContext::Test => K::test_value(),
            DependencyContext::Preview => K::preview_value(),
        };
        defaults.insert(key, Arc::new(value.clone()));
        value
    }
}

impl Default for Dependencies {
    fn default() -> Self {
        Self::live()
    }
}

impl fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependencies")
            .field("context", &self.context)
            .field("overrides", &self.overrides.len())
            .finish_non_exhaustive()
    }
}

/// The clock effects sleep on
#[derive(Debug)]
pub struct ClockKey;

impl DependencyKey for ClockKey {
    type Value = Arc<dyn Clock>;

    fn live_value() -> Self::Value {
        Arc::new(SystemClock)
    }
}

/// Source of fresh identifiers
#[derive(Clone)]
pub struct UuidGenerator(Arc<dyn Fn() -> Uuid + Send + Sync>);

impl UuidGenerator {
    /// Random v4 identifiers
    #[must_use]
    pub fn random() -> Self {
        Self(Arc::new(Uuid::new_v4))
    }

    /// Sequential identifiers starting from `00000000-0000-0000-0000-000000000000`
    #[must_use]
    pub fn incrementing() -> Self {
        let next = Arc::new(AtomicU64::new(0));
        Self(Arc::new(move || {
            Uuid::from_u128(u128::from(next.fetch_add(1, Ordering::Relaxed)))
        }))
    }

    /// Always the same identifier
    #[must_use]
    pub fn constant(uuid: Uuid) -> Self {
        Self(Arc::new(move || uuid))
    }

    /// Produce the next identifier
    #[must_use]
    pub fn generate(&self) -> Uuid {
        (self.0)()
    }
}

impl fmt::Debug for UuidGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UuidGenerator")
    }
}

/// Identifier generation
#[derive(Debug)]
pub struct UuidKey;

impl DependencyKey for UuidKey {
    type Value = UuidGenerator;

    fn live_value() -> Self::Value {
        UuidGenerator::random()
    }

    fn test_value() -> Self::Value {
        UuidGenerator::incrementing()
    }
}
