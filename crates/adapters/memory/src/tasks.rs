//! In-memory task inbox.

use std::future::Future;
use std::sync::Mutex;

use rulehub_app::ports::{TaskDraft, TaskInbox};
use rulehub_domain::error::{RuleHubError, StorageError};

/// One task as it was posted.
#[derive(Debug, Clone, PartialEq)]
pub struct PostedTask {
    pub workspace: String,
    pub persona: String,
    pub task: TaskDraft,
}

/// Records every posted task for later inspection.
#[derive(Debug, Default)]
pub struct MemoryTaskInbox {
    posted: Mutex<Vec<PostedTask>>,
}

impl MemoryTaskInbox {
    /// Snapshot the posted tasks.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the underlying mutex is poisoned.
    pub fn posted(&self) -> Result<Vec<PostedTask>, RuleHubError> {
        self.posted
            .lock()
            .map(|tasks| tasks.clone())
            .map_err(|_| StorageError("task inbox mutex poisoned".to_string()).into())
    }
}

impl TaskInbox for MemoryTaskInbox {
    fn post_task(
        &self,
        workspace: &str,
        persona: &str,
        task: TaskDraft,
    ) -> impl Future<Output = Result<(), RuleHubError>> + Send {
        let result = self
            .posted
            .lock()
            .map(|mut tasks| {
                tasks.push(PostedTask {
                    workspace: workspace.to_string(),
                    persona: persona.to_string(),
                    task,
                });
            })
            .map_err(|_| StorageError("task inbox mutex poisoned".to_string()).into());
        async { result }
    }
}
