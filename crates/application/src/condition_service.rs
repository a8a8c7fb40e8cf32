use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use runlist_core::{AppError, AppResult};
use runlist_domain::{
    CURRENT_CONDITION_VERSION, Condition, ConditionEvaluationResult, ConditionOutcome,
    PlaybookRun, PropertyField,
};
use tracing::{debug, info, warn};

use crate::condition_ports::{
    ConditionEvent, ConditionEventKind, ConditionEventPublisher, ConditionPage,
    ConditionRepository, PropertyFieldProvider,
};

mod config;
mod copy;
mod evaluation;
mod listing;
mod playbook;

pub use config::{
    ConditionServiceConfig, DEFAULT_COPY_PAGE_SIZE, DEFAULT_MAX_CONDITIONS_PER_PLAYBOOK,
};

/// Application service orchestrating condition CRUD, run copies and evaluation.
#[derive(Clone)]
pub struct ConditionService {
    repository: Arc<dyn ConditionRepository>,
    property_fields: Arc<dyn PropertyFieldProvider>,
    event_publisher: Arc<dyn ConditionEventPublisher>,
    config: ConditionServiceConfig,
}

impl ConditionService {
    /// Creates a condition service with default limits.
    #[must_use]
    pub fn new(
        repository: Arc<dyn ConditionRepository>,
        property_fields: Arc<dyn PropertyFieldProvider>,
        event_publisher: Arc<dyn ConditionEventPublisher>,
    ) -> Self {
        Self {
            repository,
            property_fields,
            event_publisher,
            config: ConditionServiceConfig::default(),
        }
    }

    /// Replaces the service limits.
    #[must_use]
    pub fn with_config(mut self, config: ConditionServiceConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the active limits.
    #[must_use]
    pub fn config(&self) -> &ConditionServiceConfig {
        &self.config
    }

    async fn property_fields_for(&self, playbook_id: &str) -> AppResult<Vec<PropertyField>> {
        self.property_fields
            .list_property_fields(playbook_id)
            .await
            .map_err(|error| {
                with_context(
                    error,
                    format!("failed to get property fields for playbook '{playbook_id}'"),
                )
            })
    }

    async fn require_condition(&self, playbook_id: &str, condition_id: &str) -> AppResult<Condition> {
        self.repository
            .find_condition(playbook_id, condition_id)
            .await
            .map_err(|error| {
                with_context(error, format!("failed to get condition '{condition_id}'"))
            })?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "condition '{condition_id}' does not exist in playbook '{playbook_id}'"
                ))
            })
    }

    async fn notify(&self, kind: ConditionEventKind, condition: &Condition, team_id: &str) {
        let event = ConditionEvent {
            kind,
            team_id: team_id.to_owned(),
            condition: condition.clone(),
        };

        if let Err(error) = self.event_publisher.publish(event).await {
            warn!(
                event = kind.as_str(),
                condition_id = %condition.id,
                playbook_id = %condition.playbook_id,
                error = %error,
                "failed to publish condition event"
            );
        }
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Prefixes backend failures with operation context; other categories pass through.
fn with_context(error: AppError, context: String) -> AppError {
    match error {
        AppError::Internal(message) => AppError::Internal(format!("{context}: {message}")),
        other => other,
    }
}

fn validate_paging(per_page: usize) -> AppResult<()> {
    if per_page == 0 {
        return Err(AppError::Validation(
            "per_page must be greater than zero".to_owned(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests;
