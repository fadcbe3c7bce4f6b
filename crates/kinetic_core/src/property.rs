//! Property metadata capability
//!
//! The animation engine never reflects over objects. Instead the host hands it
//! a [`PropertyMetadata`] implementation that answers, for a target type and a
//! property name, whether a writable property exists and how to write it.
//!
//! [`PropertyTable`] is the bundled implementation: properties are registered
//! up front with typed closures.
//!
//! # Example
//!
//! ```
//! use std::sync::atomic::{AtomicI32, Ordering};
//! use kinetic_core::PropertyTable;
//!
//! #[derive(Default)]
//! struct Label {
//!     left: AtomicI32,
//! }
//!
//! let table = PropertyTable::new();
//! table.register("left", |label: &Label, v: i32| label.left.store(v, Ordering::Relaxed));
//! assert!(table.describe::<Label>("left").is_some());
//! ```

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::error::PropertyError;
use crate::value::{AnimValue, Animate, ValueKind};

/// Type-erased animation target as seen by a setter
pub type Target = dyn Any + Send + Sync;

type SetterFn = dyn Fn(&Target, AnimValue) -> Result<(), PropertyError> + Send + Sync;

/// A resolved, callable property assignment
///
/// Cloning is cheap and preserves identity: two clones report the same
/// [`Setter::id`].
#[derive(Clone)]
pub struct Setter {
    inner: Arc<SetterFn>,
}

impl Setter {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Target, AnimValue) -> Result<(), PropertyError> + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Build a setter for a concrete target and value type
    pub fn typed<T, V, F>(f: F) -> Self
    where
        T: Any + Send + Sync,
        V: Animate,
        F: Fn(&T, V) -> Result<(), PropertyError> + Send + Sync + 'static,
    {
        Self::new(move |target, value| {
            let target = target
                .downcast_ref::<T>()
                .ok_or(PropertyError::TargetMismatch {
                    expected: type_name::<T>(),
                })?;
            let value = V::from_value(value).ok_or(PropertyError::ValueMismatch {
                expected: V::KIND,
                actual: value.kind(),
            })?;
            f(target, value)
        })
    }

    /// Write `value` to `target`
    pub fn apply(&self, target: &Target, value: AnimValue) -> Result<(), PropertyError> {
        (self.inner)(target, value)
    }

    /// Stable identity of the underlying callable
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }
}

impl fmt::Debug for Setter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setter").field("id", &self.id()).finish()
    }
}

impl PartialEq for Setter {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Setter {}

/// What the metadata capability knows about one property
#[derive(Clone, Debug)]
pub struct PropertyDescriptor {
    /// Declared value kind
    pub kind: ValueKind,
    /// `None` when the property is read-only
    pub setter: Option<Setter>,
}

impl PropertyDescriptor {
    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }
}

/// Capability answering property questions about target types
///
/// Lookups may be expensive; callers are expected to cache the results.
pub trait PropertyMetadata: Send + Sync {
    /// Describe `property` on targets of type `target`, `None` if absent
    fn lookup(&self, target: TypeId, property: &str) -> Option<PropertyDescriptor>;
}

/// Table of registered properties, keyed by target type then property name
#[derive(Default)]
pub struct PropertyTable {
    types: RwLock<FxHashMap<TypeId, FxHashMap<String, PropertyDescriptor>>>,
}

impl PropertyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a writable property
    pub fn register<T, V, F>(&self, name: &str, f: F)
    where
        T: Any + Send + Sync,
        V: Animate,
        F: Fn(&T, V) + Send + Sync + 'static,
    {
        self.register_fallible(name, move |target: &T, value: V| {
            f(target, value);
            Ok(())
        });
    }

    /// Register a writable property whose writes can be refused
    pub fn register_fallible<T, V, F>(&self, name: &str, f: F)
    where
        T: Any + Send + Sync,
        V: Animate,
        F: Fn(&T, V) -> Result<(), PropertyError> + Send + Sync + 'static,
    {
        self.insert::<T>(
            name,
            PropertyDescriptor {
                kind: V::KIND,
                setter: Some(Setter::typed(f)),
            },
        );
    }

    /// Register a property that exists but cannot be written
    pub fn register_read_only<T, V>(&self, name: &str)
    where
        T: Any + Send + Sync,
        V: Animate,
    {
        self.insert::<T>(
            name,
            PropertyDescriptor {
                kind: V::KIND,
                setter: None,
            },
        );
    }

    /// Typed convenience over [`PropertyMetadata::lookup`]
    pub fn describe<T: Any>(&self, name: &str) -> Option<PropertyDescriptor> {
        self.lookup(TypeId::of::<T>(), name)
    }

    /// Number of registered properties across all types
    pub fn len(&self) -> usize {
        self.types.read().values().map(|props| props.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert<T: Any>(&self, name: &str, descriptor: PropertyDescriptor) {
        tracing::trace!(
            target_type = type_name::<T>(),
            property = name,
            kind = %descriptor.kind,
            "registering property"
        );
        self.types
            .write()
            .entry(TypeId::of::<T>())
            .or_default()
            .insert(name.to_string(), descriptor);
    }
}

impl PropertyMetadata for PropertyTable {
    fn lookup(&self, target: TypeId, property: &str) -> Option<PropertyDescriptor> {
        self.types
            .read()
            .get(&target)
            .and_then(|props| props.get(property))
            .cloned()
    }
}
