//! Persistence port — per-workspace key/value blob storage.

use std::future::Future;

use serde_json::Value;

use rulehub_domain::error::RuleHubError;

/// Generic per-workspace key/value store, as exposed by the host's
/// remote-procedure transport.
///
/// Automation definitions live under `automations.<name>` keys; a `None`
/// value is a tombstone (logical delete).
pub trait KeyValueStore {
    /// Fetch the full key/value mapping for one workspace.
    fn get(
        &self,
        workspace: &str,
    ) -> impl Future<Output = Result<serde_json::Map<String, Value>, RuleHubError>> + Send;

    /// Write or delete exactly one key.
    fn set(
        &self,
        workspace: &str,
        key: &str,
        value: Option<Value>,
    ) -> impl Future<Output = Result<(), RuleHubError>> + Send;
}

impl<T: KeyValueStore + Send + Sync> KeyValueStore for std::sync::Arc<T> {
    fn get(
        &self,
        workspace: &str,
    ) -> impl Future<Output = Result<serde_json::Map<String, Value>, RuleHubError>> + Send {
        (**self).get(workspace)
    }

    fn set(
        &self,
        workspace: &str,
        key: &str,
        value: Option<Value>,
    ) -> impl Future<Output = Result<(), RuleHubError>> + Send {
        (**self).set(workspace, key, value)
    }
}
