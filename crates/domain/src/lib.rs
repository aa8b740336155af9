//! # rulehub-domain
//!
//! Pure domain model for the rulehub CRM automation rule engine.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **change events** (insert/update/delete snapshots of external records)
//! - Define the **filter expression language** and its evaluator
//! - Define the **template resolver** (`{{path}}` substitution + sandboxed arithmetic)
//! - Define **field-operation directives** (atomic append/remove/increment/set payloads)
//! - Define **automation definitions** (triggers + actions) and their validation
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod automation;
pub mod event;
pub mod field_op;
pub mod filter;
pub mod template;
