//! Structural validation of automation definitions.
//!
//! Validation runs before anything is persisted; a definition that fails
//! here is never partially saved. It checks shape, not referential
//! existence — a table that exists nowhere still validates, and the mistake
//! only surfaces when the first matching event executes the action.

use crate::error::ValidationError;
use crate::event::Operation;

use super::{Action, AutomationDefinition, Trigger};

impl AutomationDefinition {
    /// Check structural invariants, reporting the first violation found:
    /// triggers before actions, in list order.
    ///
    /// `allowed_tables`, when provided, restricts which tables triggers may
    /// watch.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] encountered.
    pub fn validate(&self, allowed_tables: Option<&[String]>) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.triggers.is_empty() {
            return Err(ValidationError::NoTriggers);
        }
        for (index, trigger) in self.triggers.iter().enumerate() {
            let Trigger::TableChange {
                table, operations, ..
            } = trigger;
            if table.is_empty() {
                return Err(ValidationError::EmptyTable { index });
            }
            if let Some(allowed) = allowed_tables
                && !allowed.iter().any(|candidate| candidate == table)
            {
                return Err(ValidationError::TableNotAllowed {
                    index,
                    table: table.clone(),
                });
            }
            if operations.is_empty() {
                return Err(ValidationError::NoOperations { index });
            }
        }
        for (index, action) in self.actions.iter().enumerate() {
            validate_action(index, action)?;
        }
        Ok(())
    }

    /// Non-fatal configuration hazards, one message per finding.
    ///
    /// Currently flags triggers reacting to `insert` but not `update`: an
    /// engine instance offline during the insert will only observe the
    /// later update, so the event is silently dropped.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        for (index, trigger) in self.triggers.iter().enumerate() {
            let operations = trigger.operations();
            if operations.contains(&Operation::Insert)
                && !operations.contains(&Operation::Update)
            {
                warnings.push(format!(
                    "trigger {index}: operations include \"insert\" but not \"update\"; \
                     an instance offline during the insert only sees the later update \
                     and would drop this event"
                ));
            }
        }
        warnings
    }
}

/// Required string fields must be non-empty; presence of required fields
/// and the type of `from_stages` are already enforced by deserialization.
fn validate_action(index: usize, action: &Action) -> Result<(), ValidationError> {
    let kind = action.kind();
    let require = |field: &'static str, value: &str| {
        if value.is_empty() {
            Err(ValidationError::EmptyActionField {
                index,
                action: kind,
                field,
            })
        } else {
            Ok(())
        }
    };
    match action {
        Action::PostTask { title, .. } => require("title", title),
        Action::CreateRecord { table, .. } => require("table", table),
        Action::UpdateRecord {
            table, record_id, ..
        }
        | Action::DeleteRecord { table, record_id } => {
            require("table", table)?;
            require("record_id", record_id)
        }
        Action::MovePipelineStage {
            contact_id,
            pipeline_id,
            to_stage_id,
            ..
        } => {
            require("contact_id", contact_id)?;
            require("pipeline_id", pipeline_id)?;
            require("to_stage_id", to_stage_id)
        }
    }
}
