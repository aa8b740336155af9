//! Field-operation directives — atomic mutation payloads for one field.
//!
//! A JSON object value carrying an `"op"` key inside an action's `fields`
//! mapping is not a template string: it is an instruction for how to mutate
//! the field. Append, remove, increment, and decrement compose safely under
//! repeated or duplicate delivery; `set` does not, and callers must treat it
//! as non-idempotent.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::event::Record;

/// The structural shape of a directive, before template resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDirective {
    Append { values: Vec<Value> },
    Remove { values: Vec<Value> },
    Increment { value: Value },
    Decrement { value: Value },
    Set { value: Value },
}

impl FieldDirective {
    /// Parse a mapping into a directive.
    ///
    /// Returns `None` when the mapping carries no recognizable `"op"` key —
    /// the caller decides whether that makes it plain data or a config
    /// mistake worth logging.
    #[must_use]
    pub fn parse(map: &Record) -> Option<Self> {
        let op = map.get("op")?.as_str()?;
        let values = || -> Vec<Value> {
            map.get("values")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default()
        };
        let value = || map.get("value").cloned().unwrap_or(Value::Null);
        match op {
            "append" => Some(Self::Append { values: values() }),
            "remove" => Some(Self::Remove { values: values() }),
            "increment" => Some(Self::Increment { value: value() }),
            "decrement" => Some(Self::Decrement { value: value() }),
            "set" => Some(Self::Set { value: value() }),
            _ => None,
        }
    }
}

/// The resolved, atomic payload handed to the CRUD collaborator.
///
/// Serializes in the same `op`-tagged shape the directives use, so an
/// adapter can put it on the wire unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FieldWrite {
    /// Replace the field with a plain value.
    Set { value: Value },
    /// Atomically add entries to a list-valued field.
    Append { values: Vec<Value> },
    /// Atomically drop entries from a list-valued field.
    Remove { values: Vec<Value> },
    /// Atomically add a delta to a numeric field (negative for decrement).
    Increment { delta: f64 },
}

impl FieldWrite {
    /// Whether re-applying this write on duplicate delivery is safe.
    ///
    /// `Set` is the one primitive that is not: two automations racing on the
    /// same field will last-write-win.
    #[must_use]
    pub fn is_idempotent(&self) -> bool {
        !matches!(self, Self::Set { .. })
    }
}

impl std::fmt::Display for FieldWrite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Set { .. } => f.write_str("set"),
            Self::Append { values } => write!(f, "append({} values)", values.len()),
            Self::Remove { values } => write!(f, "remove({} values)", values.len()),
            Self::Increment { delta } => write!(f, "increment({delta})"),
        }
    }
}
