//! Automation engine — reacts to change events by matching and executing
//! automations.
//!
//! For each incoming event the engine reloads the workspace's automation
//! set from persistence (no cache, so concurrent edits are always
//! observed), finds the matching enabled automations, and runs each one's
//! action list through the executor. Action failures are logged and
//! swallowed inside the executor; only a failed reload surfaces here.

use tokio::sync::{broadcast, watch};

use rulehub_domain::error::RuleHubError;
use rulehub_domain::event::ChangeEvent;

use crate::executor::{ActionExecutor, ExecutionContext};
use crate::matcher::find_matches;
use crate::ports::{RecordStore, TaskInbox};
use crate::store::AutomationSource;

/// Reactive engine driving one workspace's automations.
pub struct AutomationEngine<A, C, T> {
    source: A,
    executor: ActionExecutor<C, T>,
    workspace: String,
}

impl<A, C, T> AutomationEngine<A, C, T>
where
    A: AutomationSource,
    C: RecordStore,
    T: TaskInbox,
{
    pub fn new(source: A, executor: ActionExecutor<C, T>, workspace: impl Into<String>) -> Self {
        Self {
            source,
            executor,
            workspace: workspace.into(),
        }
    }

    /// Process a single change event against the freshly reloaded set.
    ///
    /// Returns the names of the automations that ran.
    ///
    /// # Errors
    ///
    /// Returns a storage error if reloading the automation set fails.
    /// Action failures never propagate — the executor logs and continues.
    #[tracing::instrument(skip(self, event), fields(table = %event.table, operation = %event.operation))]
    pub async fn process_event(&self, event: &ChangeEvent) -> Result<Vec<String>, RuleHubError> {
        let set = self.source.reload(&self.workspace).await?;
        let matches = find_matches(event, &set);
        let mut executed = Vec::with_capacity(matches.len());

        for matched in matches {
            tracing::debug!(automation = matched.name, trigger = %matched.trigger, "trigger matched");
            let ctx = ExecutionContext::new(event);
            self.executor
                .execute(matched.name, &matched.definition.actions, &ctx)
                .await;
            executed.push(matched.name.to_string());
        }

        Ok(executed)
    }

    /// Consume events until the bus closes or `shutdown` flips to `true`.
    ///
    /// The shutdown flag is checked between top-level events only: an
    /// in-flight action list always runs to completion once started.
    pub async fn run(
        &self,
        mut events: broadcast::Receiver<ChangeEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            if *shutdown.borrow() {
                tracing::info!("shutdown requested; stopping event loop");
                return;
            }
            let event = tokio::select! {
                changed = shutdown.changed() => {
                    // A dropped sender can never flip the flag.
                    if changed.is_err() {
                        tracing::info!("shutdown channel closed; stopping event loop");
                        return;
                    }
                    continue;
                }
                received = events.recv() => match received {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "event consumer lagged; events were dropped");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("event bus closed; stopping event loop");
                        return;
                    }
                },
            };
            if let Err(error) = self.process_event(&event).await {
                tracing::error!(%error, table = %event.table, "failed to process change event");
            }
        }
    }
}
