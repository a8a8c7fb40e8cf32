use runlist_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::condition_expr::ConditionExpr;
use crate::property::{PropertyField, PropertyValue};

/// Schema version stamped on newly written conditions.
pub const CURRENT_CONDITION_VERSION: u32 = 1;

/// Persisted, versioned condition scoped to a playbook or a run.
///
/// Playbook conditions (`run_id` empty) are user-editable templates. Run
/// conditions are copies made when a run starts and are read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Store-assigned identifier, empty until created.
    #[serde(default)]
    pub id: String,
    /// Boolean expression; absent means the condition always holds.
    #[serde(default)]
    pub condition_expr: Option<ConditionExpr>,
    /// Expression schema version.
    #[serde(default = "current_version")]
    pub version: u32,
    /// Owning playbook.
    pub playbook_id: String,
    /// Owning run for system-created copies, empty for playbook conditions.
    #[serde(default)]
    pub run_id: String,
    /// Creation timestamp in milliseconds.
    #[serde(default)]
    pub create_at: i64,
    /// Last update timestamp in milliseconds.
    #[serde(default)]
    pub update_at: i64,
    /// Soft-delete timestamp in milliseconds, zero while live.
    #[serde(default)]
    pub delete_at: i64,
}

fn current_version() -> u32 {
    CURRENT_CONDITION_VERSION
}

impl Condition {
    /// Creates an unsaved playbook condition.
    #[must_use]
    pub fn for_playbook(playbook_id: impl Into<String>, condition_expr: ConditionExpr) -> Self {
        Self {
            id: String::new(),
            condition_expr: Some(condition_expr),
            version: CURRENT_CONDITION_VERSION,
            playbook_id: playbook_id.into(),
            run_id: String::new(),
            create_at: 0,
            update_at: 0,
            delete_at: 0,
        }
    }

    /// Returns whether the condition belongs to a run.
    #[must_use]
    pub fn is_run_condition(&self) -> bool {
        !self.run_id.is_empty()
    }

    /// Returns whether the condition has been soft-deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.delete_at != 0
    }

    /// Validates the record for a create or update request.
    ///
    /// Checks run in a fixed order so the first violation is reported.
    pub fn is_valid(
        &self,
        is_creation: bool,
        fields: &[PropertyField],
        max_depth: usize,
    ) -> AppResult<()> {
        if is_creation && !self.id.is_empty() {
            return Err(AppError::Validation(
                "condition ID should not be specified for creation".to_owned(),
            ));
        }

        if !is_creation && self.id.is_empty() {
            return Err(AppError::Validation(
                "condition ID is required for updates".to_owned(),
            ));
        }

        if self.playbook_id.is_empty() {
            return Err(AppError::Validation("playbook ID is required".to_owned()));
        }

        if self.is_run_condition() {
            let message = if is_creation {
                "run conditions cannot be created directly - run conditions are system managed"
            } else {
                "run conditions cannot be modified - run conditions are read-only"
            };
            return Err(AppError::Forbidden(message.to_owned()));
        }

        let Some(condition_expr) = &self.condition_expr else {
            return Err(AppError::Validation(
                "condition expression is required".to_owned(),
            ));
        };

        condition_expr
            .validate(fields, max_depth)
            .map_err(|error| {
                AppError::Validation(format!("invalid condition expression: {}", error.message()))
            })
    }

    /// Evaluates the condition against run property fields and values.
    #[must_use]
    pub fn evaluate(&self, fields: &[PropertyField], values: &[PropertyValue]) -> bool {
        self.condition_expr
            .as_ref()
            .is_none_or(|condition_expr| condition_expr.evaluate(fields, values))
    }

    /// Renders the expression for display next to governed checklist items.
    #[must_use]
    pub fn describe(&self, fields: &[PropertyField]) -> String {
        self.condition_expr
            .as_ref()
            .map(|condition_expr| condition_expr.describe(fields))
            .unwrap_or_default()
    }
}
