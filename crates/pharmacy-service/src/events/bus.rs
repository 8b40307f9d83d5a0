//! Synchronous dispatch of domain events to their handlers.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use super::registry::{EventHandler, EventRegistry};
use super::{DomainEvent, EventKind};
use crate::alerting::AlertOutcome;

/// Aggregated result of one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub event: EventKind,
    /// Handlers that ran.
    pub handlers: usize,
    pub outcome: AlertOutcome,
}

/// Runs every handler subscribed to an event, in registration order.
///
/// Publishing happens after the triggering write committed; nothing a
/// handler does can undo it.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    registry: Arc<EventRegistry>,
}

impl EventBus {
    pub fn new(registry: Arc<EventRegistry>) -> Self {
        Self { registry }
    }

    pub async fn subscribe(&self, handler: Arc<dyn EventHandler>) {
        self.registry.register(handler).await;
    }

    pub async fn publish(&self, event: DomainEvent) -> DispatchReport {
        let kind = event.kind();
        let handlers = self.registry.handlers_for(kind).await;
        let mut outcome = AlertOutcome::default();

        debug!(
            event = %kind,
            subject = ?event.subject(),
            handler_count = handlers.len(),
            "Dispatching event"
        );

        for handler in &handlers {
            let result = handler.handle(&event).await;
            if result.has_failures() {
                warn!(
                    event = %kind,
                    handler = handler.name(),
                    failed = result.failed,
                    "Event handler reported failed alert checks"
                );
            }
            outcome.merge(result);
        }

        DispatchReport {
            event: kind,
            handlers: handlers.len(),
            outcome,
        }
    }

    pub fn registry(&self) -> &Arc<EventRegistry> {
        &self.registry
    }
}
