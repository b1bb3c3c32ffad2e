//! In-memory loader for packaged resources and tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use cogtask_core::error::LoadError;
use cogtask_core::traits::ResourceLoader;

/// A resource loader backed by an in-memory table.
///
/// Useful for resources compiled into the application, and doubles as the
/// test loader: it records how many load calls it served and which reference
/// was requested last.
pub struct InMemoryLoader {
    /// Map of reference → payload.
    resources: HashMap<String, Vec<u8>>,
    /// Number of load calls served, hits and misses alike.
    call_count: AtomicU32,
    /// Last reference requested.
    last_reference: Mutex<Option<String>>,
}

impl InMemoryLoader {
    /// Create an empty loader.
    pub fn new() -> Self {
        Self {
            resources: HashMap::new(),
            call_count: AtomicU32::new(0),
            last_reference: Mutex::new(None),
        }
    }

    /// Builder-style insertion, for seeding a loader in one expression.
    pub fn with_resource(mut self, reference: &str, bytes: &[u8]) -> Self {
        self.insert(reference, bytes.to_vec());
        self
    }

    /// Insert or replace a resource.
    pub fn insert(&mut self, reference: &str, bytes: Vec<u8>) {
        self.resources.insert(reference.to_string(), bytes);
    }

    /// Get the number of load calls served by this loader.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the reference most recently requested from this loader.
    pub fn last_reference(&self) -> Option<String> {
        self.last_reference.lock().unwrap().clone()
    }
}

impl Default for InMemoryLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceLoader for InMemoryLoader {
    fn name(&self) -> &str {
        "memory"
    }

    fn load(&self, reference: &str) -> Result<Vec<u8>, LoadError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_reference.lock().unwrap() = Some(reference.to_string());

        self.resources
            .get(reference)
            .cloned()
            .ok_or_else(|| LoadError::NotFound(reference.to_string()))
    }
}
