//! # rulehubd — rule engine daemon
//!
//! Composition root that wires the collaborators together and runs the
//! engine over a newline-delimited JSON change-event stream on stdin.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Construct the in-memory collaborator adapters
//! - Load automation definitions through the management surface, so they
//!   are validated on the way in
//! - Stream stdin change events onto the in-process bus
//! - Handle graceful shutdown (ctrl-c or end of input)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use anyhow::Context;
use tokio::io::AsyncBufReadExt;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use rulehub_adapter_memory::{MemoryKeyValueStore, MemoryRecordStore, MemoryTaskInbox};
use rulehub_app::engine::AutomationEngine;
use rulehub_app::event_bus::InProcessEventBus;
use rulehub_app::executor::ActionExecutor;
use rulehub_app::management::{ManagementApi, ManagementRequest};
use rulehub_app::ports::{EventPublisher, KeyValueStore};
use rulehub_app::store::AutomationStore;
use rulehub_domain::event::ChangeEvent;

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    // Collaborators
    let kv = Arc::new(MemoryKeyValueStore::default());
    let records = Arc::new(MemoryRecordStore::default());
    let tasks = Arc::new(MemoryTaskInbox::default());

    // Management surface, used here to load the automations file
    let management = ManagementApi::new(
        AutomationStore::new(Arc::clone(&kv)),
        config.engine.allowed_tables.clone(),
    );
    if let Some(path) = &config.engine.automations_file {
        load_automations(&management, &config.engine.workspace, path).await?;
    }

    // Engine
    let executor = ActionExecutor::new(
        Arc::clone(&records),
        Arc::clone(&tasks),
        config.engine.workspace.clone(),
        config.engine.persona.clone(),
    );
    let engine = AutomationEngine::new(
        AutomationStore::new(Arc::clone(&kv)),
        executor,
        config.engine.workspace.clone(),
    );

    // Event bus and shutdown flag
    let bus = InProcessEventBus::new(config.engine.bus_capacity);
    let events = bus.subscribe();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let engine_task = tokio::spawn(async move { engine.run(events, shutdown_rx).await });

    tracing::info!(workspace = %config.engine.workspace, "rulehubd reading change events from stdin");
    stream_stdin_events(&bus).await?;

    let _ = shutdown_tx.send(true);
    engine_task.await.context("engine task panicked")?;
    Ok(())
}

/// Feed stdin NDJSON change events onto the bus until EOF or ctrl-c.
async fn stream_stdin_events(bus: &InProcessEventBus) -> anyhow::Result<()> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                tracing::info!("ctrl-c received; shutting down");
                return Ok(());
            }
            line = lines.next_line() => match line.context("failed to read stdin")? {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => match serde_json::from_str::<ChangeEvent>(&line) {
                    Ok(event) => bus.publish(event).await?,
                    Err(error) => tracing::warn!(%error, "skipping malformed change event line"),
                },
                None => {
                    tracing::info!("end of input; shutting down");
                    return Ok(());
                }
            },
        }
    }
}

/// Load a JSON file of `{name: config}` automation definitions through the
/// management surface.
async fn load_automations<S: KeyValueStore>(
    management: &ManagementApi<S>,
    workspace: &str,
    path: &str,
) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read automations file {path}"))?;
    let definitions: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(&content).context("automations file must be a JSON object")?;

    for (name, definition) in definitions {
        let request = ManagementRequest::new("create")
            .with_name(&name)
            .with_config(definition);
        let response = management.handle(workspace, &request).await;
        if let Some(message) = response.strip_prefix("Error: ") {
            anyhow::bail!("automation {name:?} rejected: {message}");
        }
        for line in response.lines().skip(1) {
            tracing::warn!(automation = %name, "{line}");
        }
        tracing::info!(automation = %name, "loaded automation");
    }
    Ok(())
}
