//! TypedRegistry - event type → Handler の対応表
//!
//! 起動時に一度だけ組み立て、以降は読み取り専用（lock 不要）。
//!
//! # 学習ポイント
//! - HashMap での型消去された trait object の管理
//! - Generic methods での登録と重複検出

use std::collections::HashMap;
use std::sync::Arc;

use super::handler::{DynHandler, Handler, TypedHandler};
use super::task::Task;
use crate::domain::EventType;

/// Registers typed handlers under `<namespace>.<task>.triggered`.
///
/// # Example
/// ```ignore
/// let mut registry = TypedRegistry::new("sh.keptn.event");
/// registry.register::<ActionTriggered, _>(ActionHandler::new(waiter))?;
///
/// let handler = registry.get("sh.keptn.event.action.triggered");
/// ```
pub struct TypedRegistry {
    namespace: String,
    handlers: HashMap<String, Arc<dyn DynHandler>>,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Handler for event type '{0}' is already registered")]
    AlreadyRegistered(String),
}

impl TypedRegistry {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            handlers: HashMap::new(),
        }
    }

    pub fn register<T: Task, H: Handler<T> + 'static>(
        &mut self,
        handler: H,
    ) -> Result<(), RegistryError> {
        let event_type = EventType::triggered(self.namespace.as_str(), T::TASK).to_string();
        if self.handlers.contains_key(&event_type) {
            return Err(RegistryError::AlreadyRegistered(event_type));
        }
        self.handlers
            .insert(event_type, Arc::new(TypedHandler::new(handler)));
        Ok(())
    }

    /// Exact match on the full event type string.
    pub fn get(&self, event_type: &str) -> Option<Arc<dyn DynHandler>> {
        self.handlers.get(event_type).cloned()
    }

    /// Registered triggered types, sorted.
    pub fn registered_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.handlers.keys().cloned().collect();
        types.sort();
        types
    }

    /// Registered task names, sorted.
    pub fn registered_tasks(&self) -> Vec<&'static str> {
        let mut tasks: Vec<&'static str> = self.handlers.values().map(|h| h.task()).collect();
        tasks.sort_unstable();
        tasks
    }

    pub fn event_types(&self) -> Vec<EventType> {
        let mut types: Vec<EventType> = self
            .handlers
            .values()
            .map(|h| EventType::triggered(self.namespace.as_str(), h.task()))
            .collect();
        types.sort_by_key(|t| t.to_string());
        types
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
