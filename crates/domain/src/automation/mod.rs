//! Automation — trigger → action rules over CRM change events.
//!
//! An automation watches change events on external tables through its
//! [`Trigger`]s and, when one matches, executes its [`Action`]s in order.
//! Definitions are workspace-owned configuration: they arrive as JSON, are
//! validated before persisting, and are reloaded on every event.

mod action;
mod trigger;
mod validate;

pub use action::Action;
pub use trigger::Trigger;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A named rule that reacts to change events by executing actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationDefinition {
    /// Unique per workspace.
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub triggers: Vec<Trigger>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

fn default_enabled() -> bool {
    true
}

impl AutomationDefinition {
    /// Create a builder for constructing an [`AutomationDefinition`].
    #[must_use]
    pub fn builder() -> AutomationBuilder {
        AutomationBuilder::default()
    }
}

/// Step-by-step builder for [`AutomationDefinition`].
#[derive(Debug, Default)]
pub struct AutomationBuilder {
    name: Option<String>,
    enabled: Option<bool>,
    triggers: Vec<Trigger>,
    actions: Vec<Action>,
}

impl AutomationBuilder {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.triggers.push(trigger);
        self
    }

    #[must_use]
    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Consume the builder, validate, and return an [`AutomationDefinition`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if required fields are missing or empty.
    pub fn build(self) -> Result<AutomationDefinition, ValidationError> {
        let definition = AutomationDefinition {
            name: self.name.unwrap_or_default(),
            enabled: self.enabled.unwrap_or(true),
            triggers: self.triggers,
            actions: self.actions,
        };
        definition.validate(None)?;
        Ok(definition)
    }
}
