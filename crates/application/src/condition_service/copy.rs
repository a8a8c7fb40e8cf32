use super::*;

impl ConditionService {
    /// Copies every playbook condition into a freshly started run.
    ///
    /// Field references are rewritten through `field_mapping`. Conditions that
    /// cannot be rewritten or stored are logged and skipped. Returns the stored
    /// copies keyed by the ID of the playbook condition they came from.
    pub async fn copy_playbook_conditions_to_run(
        &self,
        playbook_id: &str,
        run_id: &str,
        field_mapping: &HashMap<String, String>,
        option_mapping: &HashMap<String, String>,
    ) -> AppResult<HashMap<String, Condition>> {
        let playbook_conditions = self
            .repository
            .list_playbook_conditions(playbook_id, 0, self.config.copy_page_size)
            .await
            .map_err(|error| {
                with_context(
                    error,
                    format!("failed to get playbook conditions for playbook '{playbook_id}'"),
                )
            })?;

        let mut copies = HashMap::with_capacity(playbook_conditions.len());
        for playbook_condition in playbook_conditions {
            let original_id = playbook_condition.id.clone();
            let now = now_millis();
            let mut run_condition = Condition {
                id: String::new(),
                version: CURRENT_CONDITION_VERSION,
                run_id: run_id.to_owned(),
                create_at: now,
                update_at: now,
                delete_at: 0,
                ..playbook_condition
            };

            if let Some(condition_expr) = run_condition.condition_expr.as_mut()
                && let Err(error) = condition_expr.swap_property_ids(field_mapping, option_mapping)
            {
                warn!(
                    playbook_id,
                    run_id,
                    condition_id = %original_id,
                    error = %error,
                    "skipping condition with unmapped property field"
                );
                continue;
            }

            match self
                .repository
                .create_condition(playbook_id, run_condition)
                .await
            {
                Ok(created) => {
                    copies.insert(original_id, created);
                }
                Err(error) => {
                    warn!(
                        playbook_id,
                        run_id,
                        condition_id = %original_id,
                        error = %error,
                        "failed to copy condition to run"
                    );
                }
            }
        }

        debug!(playbook_id, run_id, copied = copies.len(), "copied conditions to run");

        Ok(copies)
    }
}
