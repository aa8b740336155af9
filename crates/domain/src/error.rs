//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into the base
//! [`RuleHubError`] via `#[from]` — no stringly-typed variants at the seams.
//! Configuration problems surface as [`ValidationError`] *before* anything is
//! persisted; collaborator failures surface as [`StorageError`] or
//! [`CollaboratorError`] and are handled at the call site (the action
//! executor logs and swallows them, the management surface renders them).

/// Base error for the whole workspace.
#[derive(Debug, thiserror::Error)]
pub enum RuleHubError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

/// An automation definition violated a structural invariant.
///
/// The validator reports the *first* violation it finds, triggers before
/// actions, in list order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("automation name must not be empty")]
    EmptyName,

    #[error("automation must define at least one trigger")]
    NoTriggers,

    #[error("trigger {index}: table must not be empty")]
    EmptyTable { index: usize },

    #[error("trigger {index}: table {table:?} is not in the allowed set")]
    TableNotAllowed { index: usize, table: String },

    #[error("trigger {index}: operations must not be empty")]
    NoOperations { index: usize },

    #[error("action {index} ({action}): required field {field:?} must not be empty")]
    EmptyActionField {
        index: usize,
        action: &'static str,
        field: &'static str,
    },
}

/// A referenced object does not exist.
#[derive(Debug, thiserror::Error)]
#[error("{entity} not found: {id}")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// The persistence collaborator failed.
#[derive(Debug, thiserror::Error)]
#[error("storage error: {0}")]
pub struct StorageError(pub String);

/// An external collaborator (CRUD backend, task inbox) failed.
#[derive(Debug, thiserror::Error)]
#[error("collaborator error: {0}")]
pub struct CollaboratorError(pub String);
