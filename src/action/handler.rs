use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

use crate::risk::Detection;

/// Consumes an emitted detection. Implemented by the hosting service for
/// whatever sinks it wires up (persistence, paging, defense hooks);
/// delivery itself is outside the engine.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn handle(&self, detection: &Detection) -> Result<()>;
}

/// Fans one detection out to every registered handler. A failing handler
/// is logged and skipped so it cannot starve the others.
pub struct ActionPipeline {
    handlers: Vec<Box<dyn ActionHandler>>,
}

impl ActionPipeline {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn add_handler<H: ActionHandler + 'static>(mut self, handler: H) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    pub async fn run(&self, detection: &Detection) {
        for handler in &self.handlers {
            if let Err(error) = handler.handle(detection).await {
                warn!(detection_id = %detection.id, %error, "action handler failed");
            }
        }
    }
}

impl Default for ActionPipeline {
    fn default() -> Self {
        Self::new()
    }
}
