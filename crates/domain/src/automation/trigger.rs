//! Trigger — the matching half of an automation.

use serde::{Deserialize, Serialize};

use crate::event::{ChangeEvent, Operation};
use crate::filter::{self, FilterExpr};

/// Describes which change events should activate an automation.
///
/// The only trigger kind is `table_change`; the serde tag rejects anything
/// else at parse time, so the validator never sees an unknown type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    TableChange {
        table: String,
        operations: Vec<Operation>,
        /// Implicit AND; an empty list matches every event on the table.
        #[serde(default)]
        filters: Vec<FilterExpr>,
    },
}

impl Trigger {
    /// Check whether this trigger matches a change event.
    ///
    /// Filters evaluate against the `before` snapshot for deletes and the
    /// `after` snapshot otherwise; non-empty filters with no snapshot to
    /// evaluate against never match.
    #[must_use]
    pub fn matches_event(&self, event: &ChangeEvent) -> bool {
        let Self::TableChange {
            table,
            operations,
            filters,
        } = self;
        if *table != event.table {
            return false;
        }
        if !operations.contains(&event.operation) {
            return false;
        }
        if filters.is_empty() {
            return true;
        }
        event
            .filter_record()
            .is_some_and(|record| filter::matches_all(filters, record))
    }

    /// The table this trigger watches.
    #[must_use]
    pub fn table(&self) -> &str {
        let Self::TableChange { table, .. } = self;
        table
    }

    /// The operations this trigger reacts to.
    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        let Self::TableChange { operations, .. } = self;
        operations
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Self::TableChange {
            table, operations, ..
        } = self;
        let ops: Vec<&str> = operations.iter().map(|op| op.as_str()).collect();
        write!(f, "table_change({table}, [{}])", ops.join(","))
    }
}
