//! Event publishing port — how change events reach the engine.

use std::future::Future;

use rulehub_domain::error::RuleHubError;
use rulehub_domain::event::ChangeEvent;

/// Publishes change events for the engine to consume.
///
/// The host's subscription layer is the usual publisher; tests and the
/// local harness publish directly.
pub trait EventPublisher {
    fn publish(&self, event: ChangeEvent) -> impl Future<Output = Result<(), RuleHubError>> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(&self, event: ChangeEvent) -> impl Future<Output = Result<(), RuleHubError>> + Send {
        (**self).publish(event)
    }
}
