//! Action executor — runs one matched automation's action list.
//!
//! Execution is strictly sequential so a later action can depend on an
//! earlier one's visible effect. Each action runs in isolation: a failure
//! is logged with the automation name, action type, and index, and the
//! remaining actions still run. Nothing here retries — transient failures
//! are the collaborator's responsibility, and re-triggering requires a new
//! matching event.

use serde_json::Value;

use rulehub_domain::automation::Action;
use rulehub_domain::error::{CollaboratorError, RuleHubError};
use rulehub_domain::event::{ChangeEvent, Record};
use rulehub_domain::field_op::FieldWrite;
use rulehub_domain::template;

use crate::ports::{FieldValues, QuerySort, RecordStore, TaskDraft, TaskInbox};

/// Table holding contact↔pipeline membership rows; the stage move patches
/// the `stage_id` of the most recently modified matching row.
const PIPELINE_TABLE: &str = "crm_contact_pipeline";

/// Read-only trigger context, built fresh per matched automation run.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    value: Value,
}

impl ExecutionContext {
    #[must_use]
    pub fn new(event: &ChangeEvent) -> Self {
        let snapshot = |record: &Option<Record>| {
            record
                .clone()
                .map_or(Value::Null, Value::Object)
        };
        let value = serde_json::json!({
            "trigger": {
                "type": "table_change",
                "table": event.table,
                "operation": event.operation.as_str(),
                "new_record": snapshot(&event.after),
                "old_record": snapshot(&event.before),
            }
        });
        Self { value }
    }

    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.value
    }
}

/// Executes action lists against the CRUD and task-inbox collaborators.
pub struct ActionExecutor<C, T> {
    crud: C,
    tasks: T,
    workspace: String,
    persona: String,
}

impl<C, T> ActionExecutor<C, T>
where
    C: RecordStore,
    T: TaskInbox,
{
    pub fn new(crud: C, tasks: T, workspace: impl Into<String>, persona: impl Into<String>) -> Self {
        Self {
            crud,
            tasks,
            workspace: workspace.into(),
            persona: persona.into(),
        }
    }

    /// Access the CRUD collaborator.
    pub fn crud(&self) -> &C {
        &self.crud
    }

    /// Access the task-inbox collaborator.
    pub fn tasks(&self) -> &T {
        &self.tasks
    }

    /// Run all actions in order, isolating per-action failures.
    pub async fn execute(&self, automation: &str, actions: &[Action], ctx: &ExecutionContext) {
        for (index, action) in actions.iter().enumerate() {
            if let Err(error) = self.run_action(action, ctx).await {
                tracing::error!(
                    %automation,
                    action = action.kind(),
                    index,
                    %error,
                    "action failed; continuing with the remaining actions"
                );
            }
        }
    }

    async fn run_action(&self, action: &Action, ctx: &ExecutionContext) -> Result<(), RuleHubError> {
        let ctx = ctx.as_value();
        match action {
            Action::PostTask {
                title,
                details,
                provenance,
                routing_expert,
                coming_up_at,
            } => {
                let task = TaskDraft {
                    title: template::resolve(title, ctx),
                    details: details.as_ref().map(|d| template::resolve_value(d, ctx)),
                    provenance: provenance.as_ref().map(|p| template::resolve(p, ctx)),
                    routing_expert: routing_expert.as_ref().map(|r| template::resolve(r, ctx)),
                    coming_up_at: coming_up_at
                        .as_ref()
                        .and_then(|raw| parse_visibility(raw, ctx)),
                };
                self.tasks
                    .post_task(&self.workspace, &self.persona, task)
                    .await
            }
            Action::CreateRecord { table, fields } => {
                let table = template::resolve(table, ctx);
                let mut fields = resolve_fields(fields, ctx);
                fields.insert(
                    "workspace_id".to_string(),
                    FieldWrite::Set {
                        value: Value::String(self.workspace.clone()),
                    },
                );
                let id = self.crud.create(&table, &self.workspace, &fields).await?;
                tracing::debug!(%table, %id, "created record");
                Ok(())
            }
            Action::UpdateRecord {
                table,
                record_id,
                fields,
            } => {
                let table = template::resolve(table, ctx);
                let record_id = template::resolve(record_id, ctx);
                let fields = resolve_fields(fields, ctx);
                let patched = self
                    .crud
                    .patch(&table, &self.workspace, &record_id, &fields)
                    .await?;
                if !patched {
                    tracing::warn!(%table, %record_id, "update targeted a missing record");
                }
                Ok(())
            }
            Action::DeleteRecord { table, record_id } => {
                let table = template::resolve(table, ctx);
                let record_id = template::resolve(record_id, ctx);
                let deleted = self.crud.delete(&table, &self.workspace, &record_id).await?;
                if !deleted {
                    tracing::warn!(%table, %record_id, "delete targeted a missing record");
                }
                Ok(())
            }
            Action::MovePipelineStage {
                contact_id,
                pipeline_id,
                from_stages,
                to_stage_id,
            } => {
                // from_stages stays literal; only the identifiers resolve.
                let contact_id = template::resolve(contact_id, ctx);
                let pipeline_id = template::resolve(pipeline_id, ctx);
                let to_stage_id = template::resolve(to_stage_id, ctx);
                self.move_stage(&contact_id, &pipeline_id, from_stages, &to_stage_id)
                    .await
            }
        }
    }

    /// Move a contact's pipeline membership to another stage.
    ///
    /// Soft preconditions: races between concurrent automations are
    /// expected here, so a missing membership row or a current stage
    /// outside `from_stages` is a logged no-op, never an error.
    async fn move_stage(
        &self,
        contact_id: &str,
        pipeline_id: &str,
        from_stages: &[String],
        to_stage_id: &str,
    ) -> Result<(), RuleHubError> {
        let filters = [
            ("contact_id".to_string(), Value::String(contact_id.into())),
            ("pipeline_id".to_string(), Value::String(pipeline_id.into())),
        ];
        let sort = QuerySort::newest("updated_ts");
        let rows = self
            .crud
            .query(PIPELINE_TABLE, &self.workspace, &filters, Some(&sort), 1)
            .await?;
        let Some(row) = rows.into_iter().next() else {
            tracing::info!(%contact_id, %pipeline_id, "no pipeline membership record; skipping stage move");
            return Ok(());
        };
        let current = row
            .get("stage_id")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if !from_stages.is_empty() && !from_stages.iter().any(|stage| stage == current) {
            tracing::info!(
                %contact_id,
                %pipeline_id,
                %current,
                "current stage outside from_stages; skipping stage move"
            );
            return Ok(());
        }
        let Some(id) = row.get("record_id").and_then(Value::as_str) else {
            return Err(
                CollaboratorError("pipeline membership record has no record_id".to_string()).into(),
            );
        };
        let mut fields = FieldValues::new();
        fields.insert(
            "stage_id".to_string(),
            FieldWrite::Set {
                value: Value::String(to_stage_id.to_string()),
            },
        );
        self.crud
            .patch(PIPELINE_TABLE, &self.workspace, id, &fields)
            .await?;
        Ok(())
    }
}

fn resolve_fields(fields: &Record, ctx: &Value) -> FieldValues {
    fields
        .iter()
        .map(|(name, value)| (name.clone(), template::resolve_field_value(value, ctx, name)))
        .collect()
}

fn parse_visibility(raw: &str, ctx: &Value) -> Option<f64> {
    let resolved = template::resolve(raw, ctx);
    match resolved.parse() {
        Ok(seconds) => Some(seconds),
        Err(_) => {
            tracing::warn!(value = %resolved, "coming_up_at did not resolve to a timestamp");
            None
        }
    }
}
