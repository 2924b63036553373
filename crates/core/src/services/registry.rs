//! Capability registry handed to running scripts
//!
//! Maps a capability type to a shared instance. A registry is immutable once
//! built; each script application builds fresh ones from the caller's
//! singletons plus its own per-call entries.

use crate::error::{Error, Result};
use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone)]
struct Entry {
    name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

/// Registry of capabilities, keyed by type
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    services: HashMap<TypeId, Entry>,
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.services.values().map(|entry| entry.name).collect();
        names.sort_unstable();
        f.debug_struct("ServiceRegistry")
            .field("services", &names)
            .finish()
    }
}

impl ServiceRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> ServiceRegistryBuilder {
        ServiceRegistryBuilder::new()
    }

    /// Look up a capability. `T` may be a trait object type.
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.value.downcast_ref::<Arc<T>>())
            .cloned()
    }

    /// Look up a capability that must be present
    pub fn require<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        self.get::<T>()
            .ok_or(Error::MissingCapability(type_name::<T>()))
    }

    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<T>())
    }

    /// Names of all registered capability types
    pub fn list_services(&self) -> Vec<&'static str> {
        self.services.values().map(|entry| entry.name).collect()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

/// Builder for creating capability registries
#[derive(Default)]
pub struct ServiceRegistryBuilder {
    services: HashMap<TypeId, Entry>,
}

impl ServiceRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability, replacing any earlier one of the same type
    pub fn with<T: ?Sized + Send + Sync + 'static>(mut self, value: Arc<T>) -> Self {
        self.services.insert(
            TypeId::of::<T>(),
            Entry {
                name: type_name::<T>(),
                value: Arc::new(value),
            },
        );
        self
    }

    /// Copy every capability of `registry` into the builder
    pub fn with_all(mut self, registry: &ServiceRegistry) -> Self {
        for (type_id, entry) in &registry.services {
            self.services.insert(*type_id, entry.clone());
        }
        self
    }

    pub fn build(self) -> ServiceRegistry {
        ServiceRegistry {
            services: self.services,
        }
    }
}
