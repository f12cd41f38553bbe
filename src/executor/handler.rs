// ABOUTME: Implements the HandlerRegistry - a thread-safe container for
// ABOUTME: discovering and managing per-action handlers at runtime.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::abort::AbortToken;
use super::step::ActionStep;

/// A handler for one action name.
///
/// Handlers are the external collaborators that actually manipulate the
/// environment (movement, construction, gathering). They receive the abort
/// token so a long-running external operation can bail out cooperatively
/// when the plan is cancelled.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// The action name this handler serves.
    fn action(&self) -> &str;

    /// Execute one step. An `Err` is retried by the executor up to its
    /// configured attempt limit.
    async fn execute(&self, step: &ActionStep, abort: &AbortToken) -> Result<(), anyhow::Error>;
}

/// A thread-safe registry of action handlers.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Arc<RwLock<HashMap<String, Arc<dyn ActionHandler>>>>,
}

impl HandlerRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler.
    pub async fn register<H: ActionHandler + 'static>(&self, handler: H) {
        self.register_arc(Arc::new(handler)).await;
    }

    /// Register a handler from an Arc.
    pub async fn register_arc(&self, handler: Arc<dyn ActionHandler>) {
        let mut handlers = self.handlers.write().await;
        handlers.insert(handler.action().to_string(), handler);
    }

    /// Unregister a handler by action name.
    pub async fn unregister(&self, action: &str) {
        let mut handlers = self.handlers.write().await;
        handlers.remove(action);
    }

    /// Get a handler by action name.
    pub async fn get(&self, action: &str) -> Option<Arc<dyn ActionHandler>> {
        let handlers = self.handlers.read().await;
        handlers.get(action).cloned()
    }

    /// List all action names, sorted alphabetically.
    pub async fn list(&self) -> Vec<String> {
        let handlers = self.handlers.read().await;
        let mut names: Vec<_> = handlers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Get the number of registered handlers.
    pub async fn count(&self) -> usize {
        let handlers = self.handlers.read().await;
        handlers.len()
    }
}

impl Clone for HandlerRegistry {
    fn clone(&self) -> Self {
        Self {
            handlers: Arc::clone(&self.handlers),
        }
    }
}
