//! Task-inbox port — posting follow-up tasks for humans or agents.

use std::future::Future;

use serde_json::Value;

use rulehub_domain::error::RuleHubError;

/// A fully resolved task, ready to post.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    /// Free-form JSON payload shown alongside the task.
    pub details: Option<Value>,
    /// Where the task came from, e.g. the automation name.
    pub provenance: Option<String>,
    /// Expert queue the task should be routed to.
    pub routing_expert: Option<String>,
    /// Unix seconds before which the task stays hidden.
    pub coming_up_at: Option<f64>,
}

/// Task-inbox collaborator.
pub trait TaskInbox {
    fn post_task(
        &self,
        workspace: &str,
        persona: &str,
        task: TaskDraft,
    ) -> impl Future<Output = Result<(), RuleHubError>> + Send;
}

impl<T: TaskInbox + Send + Sync> TaskInbox for std::sync::Arc<T> {
    fn post_task(
        &self,
        workspace: &str,
        persona: &str,
        task: TaskDraft,
    ) -> impl Future<Output = Result<(), RuleHubError>> + Send {
        (**self).post_task(workspace, persona, task)
    }
}
