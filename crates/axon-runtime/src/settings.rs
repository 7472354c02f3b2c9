//! Settings persistence contract.
//!
//! Components keep their durable state behind this trait; the storage
//! format and medium are the embedder's business. Keys are scoped by a
//! namespace so components never collide.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde_json::Value;

/// Namespaced key/value persistence.
///
/// Implementations must be cheap to call from component code paths;
/// writes may flush lazily as long as a later `get` on the same store
/// observes them.
pub trait SettingsStore: Send + Sync {
    /// Reads a value, `None` if never written.
    fn get(&self, namespace: &str, key: &str) -> Option<Value>;

    /// Writes a value, replacing any previous one.
    fn set(&self, namespace: &str, key: &str, value: Value);

    /// Reads a value, falling back to `default` if never written.
    fn get_or(&self, namespace: &str, key: &str, default: Value) -> Value {
        self.get(namespace, key).unwrap_or(default)
    }
}

/// In-memory store for tests and ephemeral embeddings.
#[derive(Default)]
pub struct MemorySettings {
    entries: Mutex<HashMap<(String, String), Value>>,
}

impl MemorySettings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, namespace: &str, key: &str) -> Option<Value> {
        self.entries
            .lock()
            .get(&(namespace.to_string(), key.to_string()))
            .cloned()
    }

    fn set(&self, namespace: &str, key: &str, value: Value) {
        self.entries
            .lock()
            .insert((namespace.to_string(), key.to_string()), value);
    }
}
