//! Setter resolution
//!
//! Turns a (target type, property name) pair into a [`ResolvedProperty`]
//! through the host's [`PropertyMetadata`] capability. Lookups are cached for
//! the lifetime of the resolver and never evicted: the set of animated
//! properties in a UI is small and fixed.

use std::any::{type_name, Any, TypeId};
use std::sync::Arc;

use kinetic_core::{PropertyMetadata, Setter, ValueKind};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::error::{AnimationError, Result};

/// A writable property, ready to animate
#[derive(Clone, Debug)]
pub struct ResolvedProperty {
    pub kind: ValueKind,
    pub setter: Setter,
}

/// Caching front for a [`PropertyMetadata`] capability
///
/// The cache sits behind one mutex that is held across the metadata lookup,
/// so concurrent callers resolving the same pair do the work once.
///
/// Each [`Animator`](crate::Animator) owns one resolver, so the cache is
/// process-wide only when every caller goes through the global animator.
pub struct SetterResolver {
    metadata: Arc<dyn PropertyMetadata>,
    cache: Mutex<FxHashMap<TypeId, FxHashMap<String, ResolvedProperty>>>,
}

impl SetterResolver {
    pub fn new(metadata: Arc<dyn PropertyMetadata>) -> Self {
        Self {
            metadata,
            cache: Mutex::new(FxHashMap::default()),
        }
    }

    /// Resolve `property` on targets of type `T`
    pub fn resolve<T: Any>(&self, property: &str) -> Result<ResolvedProperty> {
        self.resolve_type(TypeId::of::<T>(), type_name::<T>(), property)
    }

    /// Resolve `property` on targets with the given type id
    ///
    /// `target_name` is only used in error messages.
    pub fn resolve_type(
        &self,
        target: TypeId,
        target_name: &'static str,
        property: &str,
    ) -> Result<ResolvedProperty> {
        if property.is_empty() {
            return Err(AnimationError::EmptyPropertyName);
        }

        let mut cache = self.cache.lock();
        if let Some(resolved) = cache.get(&target).and_then(|props| props.get(property)) {
            return Ok(resolved.clone());
        }

        let descriptor =
            self.metadata
                .lookup(target, property)
                .ok_or_else(|| AnimationError::PropertyNotFound {
                    target: target_name,
                    property: property.to_string(),
                })?;
        let setter = descriptor
            .setter
            .ok_or_else(|| AnimationError::PropertyNotWritable {
                target: target_name,
                property: property.to_string(),
            })?;

        let resolved = ResolvedProperty {
            kind: descriptor.kind,
            setter,
        };
        tracing::debug!(
            target_type = target_name,
            property,
            kind = %resolved.kind,
            "resolved animated property"
        );
        cache
            .entry(target)
            .or_default()
            .insert(property.to_string(), resolved.clone());
        Ok(resolved)
    }

    /// Number of cached resolutions
    pub fn cached_len(&self) -> usize {
        self.cache.lock().values().map(|props| props.len()).sum()
    }
}
