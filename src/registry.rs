//! Registry of live model handles
//!
//! Guarantees at most one live handle per model name. Installing a handle
//! under a taken name releases the previous one inside the same critical
//! section.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::engine::ModelHandle;

/// Name-keyed set of live handles, shared between regressors
#[derive(Debug, Default)]
pub struct ModelRegistry {
    handles: Mutex<HashMap<String, Arc<ModelHandle>>>,
}

impl ModelRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience for the common `Arc<ModelRegistry>` composition root
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Evict and release any handle registered under the same name, then
    /// install `handle`. Returns the evicted handle.
    pub fn install(&self, handle: Arc<ModelHandle>) -> Option<Arc<ModelHandle>> {
        let mut handles = self.handles.lock();
        let previous = handles.insert(handle.name().to_string(), Arc::clone(&handle))?;
        if Arc::ptr_eq(&previous, &handle) {
            return None;
        }
        previous.release();
        debug!(
            model = %handle.name(),
            evicted = previous.serial(),
            installed = handle.serial(),
            "Evicted previous handle"
        );
        Some(previous)
    }

    /// Drop the entry for `handle` if it is still the registered one
    pub fn remove(&self, handle: &Arc<ModelHandle>) -> bool {
        let mut handles = self.handles.lock();
        match handles.get(handle.name()) {
            Some(current) if Arc::ptr_eq(current, handle) => {
                handles.remove(handle.name());
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<ModelHandle>> {
        self.handles.lock().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handles.lock().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.handles.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.lock().is_empty()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handles.lock().keys().cloned().collect();
        names.sort();
        names
    }
}
