use super::*;

impl ConditionService {
    /// Creates a playbook condition after validation and the per-playbook cap check.
    pub async fn create_playbook_condition(
        &self,
        user_id: &str,
        condition: Condition,
        team_id: &str,
    ) -> AppResult<Condition> {
        let mut condition = condition;
        let fields = self.property_fields_for(&condition.playbook_id).await?;

        let now = now_millis();
        condition.create_at = now;
        condition.update_at = now;
        condition.version = CURRENT_CONDITION_VERSION;
        condition.is_valid(true, &fields, self.config.max_condition_depth)?;

        let existing = self
            .repository
            .count_playbook_conditions(&condition.playbook_id)
            .await
            .map_err(|error| {
                with_context(
                    error,
                    format!(
                        "failed to count conditions for playbook '{}'",
                        condition.playbook_id
                    ),
                )
            })?;
        let limit = self.config.max_conditions_per_playbook;
        if existing >= limit {
            return Err(AppError::LimitExceeded(format!(
                "cannot create condition: playbook already has the maximum allowed number of conditions ({limit})"
            )));
        }

        if let Some(condition_expr) = condition.condition_expr.as_mut() {
            condition_expr.sanitize();
        }

        let playbook_id = condition.playbook_id.clone();
        let created = self
            .repository
            .create_condition(&playbook_id, condition)
            .await
            .map_err(|error| {
                with_context(
                    error,
                    format!("failed to create condition for playbook '{playbook_id}'"),
                )
            })?;

        info!(
            user_id,
            playbook_id = %created.playbook_id,
            condition_id = %created.id,
            "created playbook condition"
        );
        self.notify(ConditionEventKind::Created, &created, team_id)
            .await;

        Ok(created)
    }

    /// Replaces a playbook condition, keeping its original creation time.
    pub async fn update_playbook_condition(
        &self,
        user_id: &str,
        condition: Condition,
        team_id: &str,
    ) -> AppResult<Condition> {
        let mut condition = condition;
        let existing = self
            .require_condition(&condition.playbook_id, &condition.id)
            .await?;

        if existing.is_run_condition() {
            return Err(AppError::Forbidden(
                "cannot modify conditions associated with a run - run conditions are read-only"
                    .to_owned(),
            ));
        }

        if condition.is_run_condition() {
            return Err(AppError::Forbidden(
                "cannot associate existing condition with a run - run conditions are system managed"
                    .to_owned(),
            ));
        }

        let fields = self.property_fields_for(&condition.playbook_id).await?;

        condition.create_at = existing.create_at;
        condition.update_at = now_millis();
        condition.version = CURRENT_CONDITION_VERSION;
        condition.is_valid(false, &fields, self.config.max_condition_depth)?;

        if let Some(condition_expr) = condition.condition_expr.as_mut() {
            condition_expr.sanitize();
        }

        let playbook_id = condition.playbook_id.clone();
        let condition_id = condition.id.clone();
        let updated = self
            .repository
            .update_condition(&playbook_id, condition)
            .await
            .map_err(|error| {
                with_context(error, format!("failed to update condition '{condition_id}'"))
            })?;

        info!(
            user_id,
            playbook_id = %updated.playbook_id,
            condition_id = %updated.id,
            "updated playbook condition"
        );
        self.notify(ConditionEventKind::Updated, &updated, team_id)
            .await;

        Ok(updated)
    }

    /// Soft-deletes a playbook condition. Listeners are notified before removal.
    pub async fn delete_playbook_condition(
        &self,
        user_id: &str,
        playbook_id: &str,
        condition_id: &str,
        team_id: &str,
    ) -> AppResult<()> {
        let existing = self.require_condition(playbook_id, condition_id).await?;

        if existing.is_run_condition() {
            return Err(AppError::Forbidden(
                "cannot delete conditions associated with a run - run conditions are read-only"
                    .to_owned(),
            ));
        }

        self.notify(ConditionEventKind::Deleted, &existing, team_id)
            .await;

        self.repository
            .delete_condition(playbook_id, condition_id)
            .await
            .map_err(|error| {
                with_context(error, format!("failed to delete condition '{condition_id}'"))
            })?;

        info!(user_id, playbook_id, condition_id, "deleted playbook condition");

        Ok(())
    }
}
