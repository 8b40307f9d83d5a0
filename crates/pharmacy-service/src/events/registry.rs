//! Handler registry: observers subscribe to event kinds.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use super::{DomainEvent, EventKind};
use crate::alerting::AlertOutcome;

/// An observer of domain events.
///
/// Handlers never fail: alert errors are logged and counted in the
/// returned outcome.
#[async_trait]
pub trait EventHandler: Send + Sync + Debug {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Event kinds this handler reacts to.
    fn subscriptions(&self) -> &'static [EventKind];

    async fn handle(&self, event: &DomainEvent) -> AlertOutcome;
}

/// Event kind → handlers, in registration order.
#[derive(Debug, Default)]
pub struct EventRegistry {
    handlers: RwLock<HashMap<EventKind, Vec<Arc<dyn EventHandler>>>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `handler` to every kind it declares.
    pub async fn register(&self, handler: Arc<dyn EventHandler>) {
        let mut handlers = self.handlers.write().await;
        for kind in handler.subscriptions() {
            handlers.entry(*kind).or_default().push(handler.clone());
        }

        info!(
            handler = handler.name(),
            events = handler.subscriptions().len(),
            "Event handler registered"
        );
    }

    pub async fn handlers_for(&self, kind: EventKind) -> Vec<Arc<dyn EventHandler>> {
        let handlers = self.handlers.read().await;
        handlers.get(&kind).cloned().unwrap_or_default()
    }

    pub async fn handler_count(&self, kind: EventKind) -> usize {
        let handlers = self.handlers.read().await;
        handlers.get(&kind).map(Vec::len).unwrap_or(0)
    }
}
