//! # rulehub-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `KeyValueStore` — per-workspace key/value persistence for automation definitions
//!   - `RecordStore` — CRUD collaborator for external CRM records
//!   - `TaskInbox` — follow-up task collaborator
//! - Provide **use-cases** built on those ports:
//!   - `AutomationStore` — load/save the per-workspace automation set (no cache, by design)
//!   - `find_matches` — trigger matching for one change event
//!   - `ActionExecutor` — partial-failure-tolerant sequential action execution
//!   - `ManagementApi` — operator-facing create/update/delete/list/get surface
//!   - `AutomationEngine` — the reload → match → execute loop
//! - Provide **in-process infrastructure** (change-event bus) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `rulehub-domain` only (plus `tokio::sync` for channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod engine;
pub mod event_bus;
pub mod executor;
pub mod management;
pub mod matcher;
pub mod ports;
pub mod store;
