//! Entity name to handler map
//!
//! Built once at startup and handed to the dispatcher; lookups are pure.

use crate::handlers::EntityHandler;
use opsdesk_store::Database;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    handlers: BTreeMap<String, Arc<EntityHandler>>,
}

impl CommandRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry serving `users`, `system_config` and `audit_logs`
    pub fn with_default_handlers(db: Database) -> Self {
        let mut registry = Self::new();
        for handler in [
            EntityHandler::users(db.clone()),
            EntityHandler::system_config(db.clone()),
            EntityHandler::audit_logs(db),
        ] {
            registry.register(handler.entity(), handler);
        }
        registry
    }

    /// Register a handler; the last registration for a name wins
    ///
    /// Returns the handler that was replaced, if any.
    pub fn register(
        &mut self,
        entity: impl Into<String>,
        handler: EntityHandler,
    ) -> Option<Arc<EntityHandler>> {
        let entity = entity.into();
        let previous = self.handlers.insert(entity.clone(), Arc::new(handler));
        if previous.is_some() {
            tracing::warn!(entity = %entity, "handler registration replaced an existing handler");
        } else {
            tracing::debug!(entity = %entity, "handler registered");
        }
        previous
    }

    pub fn get_handler(&self, entity: &str) -> Option<Arc<EntityHandler>> {
        self.handlers.get(entity).cloned()
    }

    /// Registered entity names in sorted order
    pub fn list_entities(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    /// Registered (name, handler) pairs in sorted order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &EntityHandler)> {
        self.handlers.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
