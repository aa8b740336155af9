//! Management surface — the operator-facing create/update/delete/list/get
//! API over the automation store.
//!
//! The protocol is deliberately plain: an `op`-keyed request in, one
//! human-readable string out. Failures come back as `"Error: ..."` strings
//! rather than transport errors so an operator (or agent) always gets a
//! message it can show verbatim. Every call reloads the persisted set, so
//! concurrent edits from other instances are always observed.

use serde::Deserialize;
use serde_json::Value;

use rulehub_domain::automation::AutomationDefinition;

use crate::ports::KeyValueStore;
use crate::store::{AutomationStore, MAX_AUTOMATIONS};

/// One management request: `{op, args: {automation_name, automation_config}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ManagementRequest {
    pub op: String,
    #[serde(default)]
    pub args: ManagementArgs,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManagementArgs {
    #[serde(default)]
    pub automation_name: Option<String>,
    #[serde(default)]
    pub automation_config: Option<Value>,
}

impl ManagementRequest {
    #[must_use]
    pub fn new(op: impl Into<String>) -> Self {
        Self {
            op: op.into(),
            args: ManagementArgs::default(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.args.automation_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: Value) -> Self {
        self.args.automation_config = Some(config);
        self
    }
}

/// Operator API over one workspace's automation set.
pub struct ManagementApi<S> {
    store: AutomationStore<S>,
    allowed_tables: Option<Vec<String>>,
}

impl<S: KeyValueStore> ManagementApi<S> {
    pub fn new(store: AutomationStore<S>, allowed_tables: Option<Vec<String>>) -> Self {
        Self {
            store,
            allowed_tables,
        }
    }

    /// Handle one request, always returning a displayable string.
    #[tracing::instrument(skip(self, request), fields(op = %request.op))]
    pub async fn handle(&self, workspace: &str, request: &ManagementRequest) -> String {
        match self.dispatch(workspace, request).await {
            Ok(message) => message,
            Err(message) => format!("Error: {message}"),
        }
    }

    async fn dispatch(
        &self,
        workspace: &str,
        request: &ManagementRequest,
    ) -> Result<String, String> {
        match request.op.as_str() {
            "help" => Ok(help_text()),
            "list" => self.list(workspace).await,
            "get" => self.get(workspace, require_name(request)?).await,
            "create" => {
                let name = require_name(request)?;
                let config = require_config(request)?;
                self.create(workspace, name, config).await
            }
            "update" => {
                let name = require_name(request)?;
                let config = require_config(request)?;
                self.update(workspace, name, config).await
            }
            "delete" => self.delete(workspace, require_name(request)?).await,
            other => Err(format!(
                "unknown op {other:?}; use help to list the available ops"
            )),
        }
    }

    async fn list(&self, workspace: &str) -> Result<String, String> {
        let set = self.load(workspace).await?;
        if set.is_empty() {
            return Ok("No automations configured.".to_string());
        }
        let lines: Vec<String> = set
            .iter()
            .map(|definition| {
                format!(
                    "{} ({}): {} trigger(s), {} action(s)",
                    definition.name,
                    if definition.enabled {
                        "enabled"
                    } else {
                        "disabled"
                    },
                    definition.triggers.len(),
                    definition.actions.len(),
                )
            })
            .collect();
        Ok(lines.join("\n"))
    }

    async fn get(&self, workspace: &str, name: &str) -> Result<String, String> {
        let set = self.load(workspace).await?;
        let definition = set
            .get(name)
            .ok_or_else(|| format!("no automation named {name:?}"))?;
        serde_json::to_string_pretty(definition).map_err(|error| error.to_string())
    }

    async fn create(&self, workspace: &str, name: &str, config: &Value) -> Result<String, String> {
        let definition = parse_config(name, config)?;
        self.validate(&definition)?;
        let set = self.load(workspace).await?;
        if set.contains(name) {
            return Err(format!(
                "automation {name:?} already exists; use update to change it"
            ));
        }
        if set.len() >= MAX_AUTOMATIONS {
            return Err(format!(
                "workspace already holds {MAX_AUTOMATIONS} automations; delete one first"
            ));
        }
        self.store
            .save(workspace, name, Some(&definition))
            .await
            .map_err(|error| error.to_string())?;
        Ok(with_warnings(
            format!("Created automation {name:?}."),
            &definition,
        ))
    }

    async fn update(&self, workspace: &str, name: &str, config: &Value) -> Result<String, String> {
        let definition = parse_config(name, config)?;
        self.validate(&definition)?;
        let set = self.load(workspace).await?;
        if !set.contains(name) {
            return Err(format!(
                "no automation named {name:?}; use create to add it"
            ));
        }
        self.store
            .save(workspace, name, Some(&definition))
            .await
            .map_err(|error| error.to_string())?;
        Ok(with_warnings(
            format!("Updated automation {name:?}."),
            &definition,
        ))
    }

    async fn delete(&self, workspace: &str, name: &str) -> Result<String, String> {
        let set = self.load(workspace).await?;
        if !set.contains(name) {
            return Err(format!("no automation named {name:?}"));
        }
        self.store
            .save(workspace, name, None)
            .await
            .map_err(|error| error.to_string())?;
        Ok(format!("Deleted automation {name:?}."))
    }

    async fn load(&self, workspace: &str) -> Result<crate::store::AutomationSet, String> {
        self.store
            .load(workspace)
            .await
            .map_err(|error| error.to_string())
    }

    fn validate(&self, definition: &AutomationDefinition) -> Result<(), String> {
        definition
            .validate(self.allowed_tables.as_deref())
            .map_err(|error| error.to_string())
    }
}

fn require_name(request: &ManagementRequest) -> Result<&str, String> {
    request
        .args
        .automation_name
        .as_deref()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| "automation_name is required".to_string())
}

fn require_config(request: &ManagementRequest) -> Result<&Value, String> {
    request
        .args
        .automation_config
        .as_ref()
        .ok_or_else(|| "automation_config is required".to_string())
}

/// Build a definition from a raw config, with the request name authoritative.
fn parse_config(name: &str, config: &Value) -> Result<AutomationDefinition, String> {
    let Value::Object(fields) = config else {
        return Err("automation_config must be a JSON object".to_string());
    };
    let mut fields = fields.clone();
    fields.insert("name".to_string(), Value::String(name.to_string()));
    serde_json::from_value(Value::Object(fields))
        .map_err(|error| format!("invalid automation_config: {error}"))
}

fn with_warnings(message: String, definition: &AutomationDefinition) -> String {
    let warnings = definition.warnings();
    if warnings.is_empty() {
        return message;
    }
    let mut out = message;
    for warning in warnings {
        out.push_str("\nWarning: ");
        out.push_str(&warning);
    }
    out
}

fn help_text() -> String {
    [
        "Available ops:",
        "  help   — this message",
        "  list   — list configured automations",
        "  get    — show one automation (args: automation_name)",
        "  create — add an automation (args: automation_name, automation_config)",
        "  update — replace an automation (args: automation_name, automation_config)",
        "  delete — remove an automation (args: automation_name)",
    ]
    .join("\n")
}
