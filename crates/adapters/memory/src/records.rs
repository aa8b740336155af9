//! In-memory CRM record store with atomic field writes.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use serde_json::Value;

use rulehub_app::ports::{FieldValues, QuerySort, RecordStore};
use rulehub_domain::error::{RuleHubError, StorageError};
use rulehub_domain::event::Record;
use rulehub_domain::field_op::FieldWrite;
use rulehub_domain::time::unix_now;

/// Tables of records, keyed by `(workspace, table)`.
///
/// Every record carries a generated `record_id` and an `updated_ts`
/// maintained on create and patch, so `QuerySort::newest("updated_ts")`
/// behaves like the remote backend.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    tables: Mutex<HashMap<(String, String), Vec<Record>>>,
}

impl MemoryRecordStore {
    /// Seed one table with records. Records without a `record_id` get one.
    #[must_use]
    pub fn with(workspace: &str, table: &str, records: Vec<Record>) -> Self {
        let store = Self::default();
        {
            let mut tables = store.tables.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            let rows = tables
                .entry((workspace.to_string(), table.to_string()))
                .or_default();
            for mut record in records {
                record
                    .entry("record_id".to_string())
                    .or_insert_with(|| Value::String(uuid::Uuid::new_v4().to_string()));
                rows.push(record);
            }
        }
        store
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<(String, String), Vec<Record>>>, RuleHubError>
    {
        self.tables
            .lock()
            .map_err(|_| StorageError("record store mutex poisoned".to_string()).into())
    }

    /// Snapshot one table, mainly for test assertions.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the underlying mutex is poisoned.
    pub fn snapshot(&self, workspace: &str, table: &str) -> Result<Vec<Record>, RuleHubError> {
        let tables = self.lock()?;
        Ok(tables
            .get(&(workspace.to_string(), table.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

impl RecordStore for MemoryRecordStore {
    fn query(
        &self,
        table: &str,
        workspace: &str,
        filters: &[(String, Value)],
        sort: Option<&QuerySort>,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Record>, RuleHubError>> + Send {
        let result = self.lock().map(|tables| {
            let mut rows: Vec<Record> = tables
                .get(&(workspace.to_string(), table.to_string()))
                .map(|rows| {
                    rows.iter()
                        .filter(|row| matches_filters(row, filters))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            if let Some(sort) = sort {
                rows.sort_by(|a, b| {
                    let ordering = compare_values(
                        a.get(&sort.field).unwrap_or(&Value::Null),
                        b.get(&sort.field).unwrap_or(&Value::Null),
                    );
                    if sort.descending {
                        ordering.reverse()
                    } else {
                        ordering
                    }
                });
            }
            if limit > 0 {
                rows.truncate(limit);
            }
            rows
        });
        async { result }
    }

    fn create(
        &self,
        table: &str,
        workspace: &str,
        fields: &FieldValues,
    ) -> impl Future<Output = Result<String, RuleHubError>> + Send {
        let result = self.lock().map(|mut tables| {
            let id = uuid::Uuid::new_v4().to_string();
            let mut record = Record::new();
            for (field, write) in fields {
                apply_write(&mut record, field, write);
            }
            record.insert("record_id".to_string(), Value::String(id.clone()));
            record.insert("updated_ts".to_string(), timestamp_value());
            tables
                .entry((workspace.to_string(), table.to_string()))
                .or_default()
                .push(record);
            id
        });
        async { result }
    }

    fn patch(
        &self,
        table: &str,
        workspace: &str,
        id: &str,
        fields: &FieldValues,
    ) -> impl Future<Output = Result<bool, RuleHubError>> + Send {
        let result = self.lock().map(|mut tables| {
            let Some(rows) = tables.get_mut(&(workspace.to_string(), table.to_string())) else {
                return false;
            };
            let Some(record) = rows.iter_mut().find(|row| has_id(row, id)) else {
                return false;
            };
            for (field, write) in fields {
                apply_write(record, field, write);
            }
            record.insert("updated_ts".to_string(), timestamp_value());
            true
        });
        async { result }
    }

    fn delete(
        &self,
        table: &str,
        workspace: &str,
        id: &str,
    ) -> impl Future<Output = Result<bool, RuleHubError>> + Send {
        let result = self.lock().map(|mut tables| {
            let Some(rows) = tables.get_mut(&(workspace.to_string(), table.to_string())) else {
                return false;
            };
            let before = rows.len();
            rows.retain(|row| !has_id(row, id));
            rows.len() < before
        });
        async { result }
    }
}

fn has_id(record: &Record, id: &str) -> bool {
    record.get("record_id").and_then(Value::as_str) == Some(id)
}

fn matches_filters(record: &Record, filters: &[(String, Value)]) -> bool {
    filters
        .iter()
        .all(|(field, expected)| record.get(field) == Some(expected))
}

fn timestamp_value() -> Value {
    serde_json::Number::from_f64(unix_now()).map_or(Value::Null, Value::Number)
}

fn compare_values(a: &Value, b: &Value) -> std::cmp::Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// Apply one atomic field write to a record.
///
/// Append skips values already present and remove drops every equal
/// element, so duplicate delivery of the same instruction converges.
fn apply_write(record: &mut Record, field: &str, write: &FieldWrite) {
    match write {
        FieldWrite::Set { value } => {
            record.insert(field.to_string(), value.clone());
        }
        FieldWrite::Append { values } => {
            let mut items = match record.remove(field) {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            };
            for value in values {
                if !items.contains(value) {
                    items.push(value.clone());
                }
            }
            record.insert(field.to_string(), Value::Array(items));
        }
        FieldWrite::Remove { values } => {
            if let Some(Value::Array(items)) = record.get_mut(field) {
                items.retain(|item| !values.contains(item));
            }
        }
        FieldWrite::Increment { delta } => {
            let current = record.get(field).and_then(Value::as_f64).unwrap_or(0.0);
            record.insert(
                field.to_string(),
                serde_json::Number::from_f64(current + delta).map_or(Value::Null, Value::Number),
            );
        }
    }
}
