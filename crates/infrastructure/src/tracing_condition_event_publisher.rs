//! Development condition notifier. Logs events to tracing output.

use async_trait::async_trait;
use runlist_application::{ConditionEvent, ConditionEventPublisher};
use runlist_core::{AppError, AppResult};
use tracing::info;

/// Development event publisher that logs condition events.
#[derive(Clone)]
pub struct TracingConditionEventPublisher;

impl TracingConditionEventPublisher {
    /// Creates a new tracing publisher.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for TracingConditionEventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConditionEventPublisher for TracingConditionEventPublisher {
    async fn publish(&self, event: ConditionEvent) -> AppResult<()> {
        let payload = serde_json::to_string(&event.condition).map_err(|error| {
            AppError::Internal(format!(
                "failed to encode condition '{}' for event '{}': {error}",
                event.condition.id,
                event.kind.as_str()
            ))
        })?;

        info!(
            event = event.kind.as_str(),
            team_id = %event.team_id,
            condition_id = %event.condition.id,
            playbook_id = %event.condition.playbook_id,
            "{payload}"
        );

        Ok(())
    }
}
