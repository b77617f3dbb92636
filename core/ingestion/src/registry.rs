use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

use crate::adapters::{BuiltinSource, SourceAdapter};
use crate::error::UnknownSourceType;

/// Zero-argument constructor producing a fresh, unloaded adapter.
pub type AdapterConstructor = Arc<dyn Fn() -> Box<dyn SourceAdapter> + Send + Sync>;

/// Maps source-type identifiers to adapter constructors.
///
/// Registering an identifier twice replaces the earlier binding. Writes are
/// serialized by the lock, so the last completed `register` wins.
#[derive(Default)]
pub struct AdapterRegistry {
    entries: RwLock<HashMap<String, AdapterConstructor>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the contract, price and conversation adapters.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        for builtin in BuiltinSource::ALL {
            registry.register(builtin.type_id(), move || builtin.adapter());
        }
        registry
    }

    /// Bind `type_id` to `constructor`. Returns `true` if an earlier binding was replaced.
    pub fn register<F>(&self, type_id: impl Into<String>, constructor: F) -> bool
    where
        F: Fn() -> Box<dyn SourceAdapter> + Send + Sync + 'static,
    {
        let type_id = type_id.into();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let replaced = entries
            .insert(type_id.clone(), Arc::new(constructor))
            .is_some();

        if replaced {
            warn!("Adapter for source type {:?} overridden", type_id);
        } else {
            debug!("Registered adapter for source type {:?}", type_id);
        }
        replaced
    }

    /// Instantiate a fresh adapter for `type_id`.
    pub fn create(&self, type_id: &str) -> Result<Box<dyn SourceAdapter>, UnknownSourceType> {
        let constructor = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(type_id)
            .cloned()
            .ok_or_else(|| UnknownSourceType(type_id.to_string()))?;

        Ok(constructor())
    }

    pub fn contains(&self, type_id: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(type_id)
    }

    /// Registered identifiers, sorted.
    pub fn type_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }
}
