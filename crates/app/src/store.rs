//! Automation store — loads and saves the per-workspace automation set.
//!
//! There is deliberately no cache: every caller reloads the full set from
//! the persistence collaborator, trading overhead for always observing
//! concurrent edits. That policy is the [`AutomationSource`] trait — one
//! `reload` per engine invocation — so it is a visible, swappable choice
//! rather than ambient behavior.

use std::future::Future;

use rulehub_domain::automation::AutomationDefinition;
use rulehub_domain::error::{RuleHubError, StorageError};

use crate::ports::KeyValueStore;

/// Persistence key prefix; one key per definition.
pub const KEY_PREFIX: &str = "automations.";

/// Maximum number of definitions per workspace, enforced at create time.
pub const MAX_AUTOMATIONS: usize = 30;

/// Ordered collection of automation definitions owned by one workspace.
///
/// Iteration order is load order, which the trigger matcher relies on for
/// deterministic side-effect ordering across automations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AutomationSet {
    entries: Vec<AutomationDefinition>,
}

impl AutomationSet {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AutomationDefinition> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AutomationDefinition> {
        self.entries.iter()
    }

    /// Append a definition, replacing any existing entry with the same name.
    pub fn insert(&mut self, definition: AutomationDefinition) {
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|entry| entry.name == definition.name)
        {
            *existing = definition;
        } else {
            self.entries.push(definition);
        }
    }
}

impl<'a> IntoIterator for &'a AutomationSet {
    type Item = &'a AutomationDefinition;
    type IntoIter = std::slice::Iter<'a, AutomationDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Something the engine can reload the automation set from.
///
/// The engine calls `reload` once per change event.
pub trait AutomationSource {
    fn reload(
        &self,
        workspace: &str,
    ) -> impl Future<Output = Result<AutomationSet, RuleHubError>> + Send;
}

/// Automation persistence over the [`KeyValueStore`] port.
pub struct AutomationStore<S> {
    store: S,
}

impl<S: KeyValueStore> AutomationStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Access the underlying key/value port.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load every persisted definition for a workspace.
    ///
    /// A malformed entry is skipped with a warning rather than failing the
    /// whole load — availability over strict consistency. Tombstoned
    /// (null) entries are treated as deleted.
    ///
    /// # Errors
    ///
    /// Returns a storage error only when the persistence collaborator
    /// itself fails.
    #[tracing::instrument(skip(self))]
    pub async fn load(&self, workspace: &str) -> Result<AutomationSet, RuleHubError> {
        let blob = self.store.get(workspace).await?;
        let mut set = AutomationSet::default();
        for (key, value) in &blob {
            let Some(name) = key.strip_prefix(KEY_PREFIX) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            match serde_json::from_value::<AutomationDefinition>(value.clone()) {
                Ok(mut definition) => {
                    // The key is authoritative for the name.
                    definition.name = name.to_string();
                    set.insert(definition);
                }
                Err(error) => {
                    tracing::warn!(%key, %error, "skipping malformed persisted automation");
                }
            }
        }
        Ok(set)
    }

    /// Write or tombstone exactly one definition key.
    ///
    /// # Errors
    ///
    /// Returns a storage error from the persistence collaborator, or when
    /// the definition cannot be serialized.
    #[tracing::instrument(skip(self, definition))]
    pub async fn save(
        &self,
        workspace: &str,
        name: &str,
        definition: Option<&AutomationDefinition>,
    ) -> Result<(), RuleHubError> {
        let key = format!("{KEY_PREFIX}{name}");
        let value = definition
            .map(serde_json::to_value)
            .transpose()
            .map_err(|error| StorageError(error.to_string()))?;
        self.store.set(workspace, &key, value).await
    }
}

impl<S: KeyValueStore + Sync> AutomationSource for AutomationStore<S> {
    fn reload(
        &self,
        workspace: &str,
    ) -> impl Future<Output = Result<AutomationSet, RuleHubError>> + Send {
        self.load(workspace)
    }
}
