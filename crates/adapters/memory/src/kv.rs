//! In-memory key/value persistence.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use serde_json::Value;

use rulehub_app::ports::KeyValueStore;
use rulehub_domain::error::{RuleHubError, StorageError};

/// Per-workspace key/value blobs held in a mutex-guarded map.
///
/// Deleted keys are kept as `null` tombstones, mirroring how the remote
/// store reports them.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    blobs: Mutex<HashMap<String, serde_json::Map<String, Value>>>,
}

impl MemoryKeyValueStore {
    /// Seed one workspace with an initial mapping.
    #[must_use]
    pub fn with(workspace: &str, blob: serde_json::Map<String, Value>) -> Self {
        let mut blobs = HashMap::new();
        blobs.insert(workspace.to_string(), blob);
        Self {
            blobs: Mutex::new(blobs),
        }
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, serde_json::Map<String, Value>>>, RuleHubError>
    {
        self.blobs
            .lock()
            .map_err(|_| StorageError("key/value store mutex poisoned".to_string()).into())
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(
        &self,
        workspace: &str,
    ) -> impl Future<Output = Result<serde_json::Map<String, Value>, RuleHubError>> + Send {
        let result = self
            .lock()
            .map(|blobs| blobs.get(workspace).cloned().unwrap_or_default());
        async { result }
    }

    fn set(
        &self,
        workspace: &str,
        key: &str,
        value: Option<Value>,
    ) -> impl Future<Output = Result<(), RuleHubError>> + Send {
        let result = self.lock().map(|mut blobs| {
            let blob = blobs.entry(workspace.to_string()).or_default();
            // A tombstone ends the key's run in the mapping; moving it to
            // the back makes a later re-create a fresh insertion.
            if value.is_none() {
                blob.shift_remove(key);
            }
            blob.insert(key.to_string(), value.unwrap_or(Value::Null));
        });
        async { result }
    }
}
