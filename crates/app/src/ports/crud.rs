//! CRUD port — record operations against the external CRM backend.

use std::collections::BTreeMap;
use std::future::Future;

use serde_json::Value;

use rulehub_domain::error::RuleHubError;
use rulehub_domain::event::Record;
use rulehub_domain::field_op::FieldWrite;

/// Resolved field writes for one create/patch call, keyed by field name.
pub type FieldValues = BTreeMap<String, FieldWrite>;

/// Sort specification for [`RecordStore::query`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySort {
    pub field: String,
    pub descending: bool,
}

impl QuerySort {
    /// Most-recently-first ordering on a timestamp field.
    #[must_use]
    pub fn newest(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}

/// CRUD collaborator for external relational records.
pub trait RecordStore {
    /// Query records by field equality.
    fn query(
        &self,
        table: &str,
        workspace: &str,
        filters: &[(String, Value)],
        sort: Option<&QuerySort>,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Record>, RuleHubError>> + Send;

    /// Create a record, returning its new id.
    fn create(
        &self,
        table: &str,
        workspace: &str,
        fields: &FieldValues,
    ) -> impl Future<Output = Result<String, RuleHubError>> + Send;

    /// Apply field writes to an existing record. Returns `false` when the
    /// record does not exist.
    fn patch(
        &self,
        table: &str,
        workspace: &str,
        id: &str,
        fields: &FieldValues,
    ) -> impl Future<Output = Result<bool, RuleHubError>> + Send;

    /// Delete a record. Returns `false` when the record does not exist.
    fn delete(
        &self,
        table: &str,
        workspace: &str,
        id: &str,
    ) -> impl Future<Output = Result<bool, RuleHubError>> + Send;
}

impl<T: RecordStore + Send + Sync> RecordStore for std::sync::Arc<T> {
    fn query(
        &self,
        table: &str,
        workspace: &str,
        filters: &[(String, Value)],
        sort: Option<&QuerySort>,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Record>, RuleHubError>> + Send {
        (**self).query(table, workspace, filters, sort, limit)
    }

    fn create(
        &self,
        table: &str,
        workspace: &str,
        fields: &FieldValues,
    ) -> impl Future<Output = Result<String, RuleHubError>> + Send {
        (**self).create(table, workspace, fields)
    }

    fn patch(
        &self,
        table: &str,
        workspace: &str,
        id: &str,
        fields: &FieldValues,
    ) -> impl Future<Output = Result<bool, RuleHubError>> + Send {
        (**self).patch(table, workspace, id, fields)
    }

    fn delete(
        &self,
        table: &str,
        workspace: &str,
        id: &str,
    ) -> impl Future<Output = Result<bool, RuleHubError>> + Send {
        (**self).delete(table, workspace, id)
    }
}
