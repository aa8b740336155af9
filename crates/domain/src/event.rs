//! Change event — an immutable record of one row changing in an external table.
//!
//! Events carry up to two snapshots of the affected record: `before` (the
//! row as it was) and `after` (the row as it is now). Inserts have no
//! `before`, deletes have no `after`; the host's subscription layer decides
//! what it can provide for updates.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::EventId;

/// A record is a string-keyed mapping to JSON-like values.
///
/// Keeping `serde_json::Map` as the representation preserves the
/// distinction between an *absent* field and a field that is
/// *present but null* — the filter engine depends on it.
pub type Record = serde_json::Map<String, Value>;

/// The kind of change that happened to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Operation {
    Insert,
    Update,
    Delete,
}

impl Operation {
    /// Lowercase wire name of the operation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl std::str::FromStr for Operation {
    type Err = String;

    /// Parse an operation name case-insensitively (`"INSERT"` == `"insert"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "insert" => Ok(Self::Insert),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(format!("unknown operation: {other:?}")),
        }
    }
}

impl TryFrom<String> for Operation {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Operation> for &'static str {
    fn from(op: Operation) -> Self {
        op.as_str()
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification that one record in an external table changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Correlation id for log lines; generated when the host does not set one.
    #[serde(default)]
    pub id: EventId,
    pub table: String,
    pub operation: Operation,
    #[serde(default)]
    pub before: Option<Record>,
    #[serde(default)]
    pub after: Option<Record>,
}

impl ChangeEvent {
    /// Build an event with a fresh [`EventId`].
    #[must_use]
    pub fn new(
        table: impl Into<String>,
        operation: Operation,
        before: Option<Record>,
        after: Option<Record>,
    ) -> Self {
        Self {
            id: EventId::new(),
            table: table.into(),
            operation,
            before,
            after,
        }
    }

    /// The record snapshot that filters should be evaluated against:
    /// `before` for deletes, `after` otherwise.
    #[must_use]
    pub fn filter_record(&self) -> Option<&Record> {
        match self.operation {
            Operation::Delete => self.before.as_ref(),
            Operation::Insert | Operation::Update => self.after.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: Value) -> Record {
        match json {
            Value::Object(map) => map,
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn should_parse_operation_case_insensitively() {
        assert_eq!("INSERT".parse::<Operation>().unwrap(), Operation::Insert);
        assert_eq!("update".parse::<Operation>().unwrap(), Operation::Update);
        assert_eq!("Delete".parse::<Operation>().unwrap(), Operation::Delete);
    }

    #[test]
    fn should_reject_unknown_operation() {
        assert!("upsert".parse::<Operation>().is_err());
    }

    #[test]
    fn should_deserialize_uppercase_operation_from_json() {
        let event: ChangeEvent = serde_json::from_value(serde_json::json!({
            "table": "crm_contact",
            "operation": "INSERT",
            "after": {"contact_id": "c1"}
        }))
        .unwrap();
        assert_eq!(event.operation, Operation::Insert);
        assert!(event.before.is_none());
    }

    #[test]
    fn should_serialize_operation_lowercase() {
        let json = serde_json::to_value(Operation::Delete).unwrap();
        assert_eq!(json, Value::String("delete".to_string()));
    }

    #[test]
    fn should_use_after_snapshot_for_insert_and_update() {
        let after = record(serde_json::json!({"x": 1}));
        let event = ChangeEvent::new("t", Operation::Update, None, Some(after.clone()));
        assert_eq!(event.filter_record(), Some(&after));
    }

    #[test]
    fn should_use_before_snapshot_for_delete() {
        let before = record(serde_json::json!({"x": 1}));
        let event = ChangeEvent::new("t", Operation::Delete, Some(before.clone()), None);
        assert_eq!(event.filter_record(), Some(&before));
    }

    #[test]
    fn should_return_none_when_snapshot_is_missing() {
        let event = ChangeEvent::new("t", Operation::Delete, None, None);
        assert!(event.filter_record().is_none());
    }
}
