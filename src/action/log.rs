use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use crate::action::ActionHandler;
use crate::risk::{Detection, Severity};

/// Writes every emitted detection to the tracing log, level by severity.
pub struct LogAction;

impl LogAction {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ActionHandler for LogAction {
    async fn handle(&self, detection: &Detection) -> Result<()> {
        match detection.severity {
            Severity::Critical | Severity::High => warn!(
                id = %detection.id,
                detection_type = detection.detection_type.as_str(),
                severity = detection.severity.as_str(),
                confidence = detection.confidence,
                feeds = ?detection.affected_feeds,
                "{}",
                detection.details.description
            ),
            _ => info!(
                id = %detection.id,
                detection_type = detection.detection_type.as_str(),
                severity = detection.severity.as_str(),
                confidence = detection.confidence,
                feeds = ?detection.affected_feeds,
                "{}",
                detection.details.description
            ),
        }

        Ok(())
    }
}

impl Default for LogAction {
    fn default() -> Self {
        Self::new()
    }
}
