//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside
//! world. Timeout and retry policy lives behind them, with the collaborator
//! — the engine itself never retries.

pub mod crud;
pub mod events;
pub mod persistence;
pub mod task_inbox;

pub use crud::{FieldValues, QuerySort, RecordStore};
pub use events::EventPublisher;
pub use persistence::KeyValueStore;
pub use task_inbox::{TaskDraft, TaskInbox};
