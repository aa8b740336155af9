//! Action — the effect-producing half of an automation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::event::Record;

/// An operation to execute when one of the automation's triggers fires.
///
/// String fields may embed `{{...}}` template placeholders; they are
/// resolved against the execution context at run time. Unknown action
/// types fail deserialization, so dispatch is always exhaustive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Post a follow-up task to the task inbox.
    PostTask {
        title: String,
        #[serde(default)]
        details: Option<Value>,
        #[serde(default)]
        provenance: Option<String>,
        #[serde(default)]
        routing_expert: Option<String>,
        /// Optional future-visibility timestamp; resolved then parsed as
        /// Unix seconds.
        #[serde(default)]
        coming_up_at: Option<String>,
    },
    /// Create one record; the workspace id is injected at execution time.
    CreateRecord { table: String, fields: Record },
    /// Patch one record with resolved field writes.
    UpdateRecord {
        table: String,
        record_id: String,
        fields: Record,
    },
    /// Delete one record.
    DeleteRecord { table: String, record_id: String },
    /// Move a contact's pipeline membership to another stage.
    ///
    /// `from_stages` is literal — never template-resolved — and acts as a
    /// soft precondition: a non-empty list that excludes the current stage
    /// makes the move a logged no-op.
    MovePipelineStage {
        contact_id: String,
        pipeline_id: String,
        from_stages: Vec<String>,
        to_stage_id: String,
    },
}

impl Action {
    /// Wire name of the action type, for validation messages and logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PostTask { .. } => "post_task",
            Self::CreateRecord { .. } => "create_record",
            Self::UpdateRecord { .. } => "update_record",
            Self::DeleteRecord { .. } => "delete_record",
            Self::MovePipelineStage { .. } => "move_pipeline_stage",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PostTask { title, .. } => write!(f, "post_task({title})"),
            Self::CreateRecord { table, .. } => write!(f, "create_record({table})"),
            Self::UpdateRecord {
                table, record_id, ..
            } => write!(f, "update_record({table}, {record_id})"),
            Self::DeleteRecord { table, record_id } => {
                write!(f, "delete_record({table}, {record_id})")
            }
            Self::MovePipelineStage {
                pipeline_id,
                to_stage_id,
                ..
            } => write!(f, "move_pipeline_stage({pipeline_id} -> {to_stage_id})"),
        }
    }
}
