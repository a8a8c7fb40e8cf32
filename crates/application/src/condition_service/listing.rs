use super::*;

impl ConditionService {
    /// Returns one live condition of a playbook.
    pub async fn get_playbook_condition(
        &self,
        user_id: &str,
        playbook_id: &str,
        condition_id: &str,
    ) -> AppResult<Condition> {
        debug!(user_id, playbook_id, condition_id, "reading condition");
        self.require_condition(playbook_id, condition_id).await
    }

    /// Lists one page of playbook-scoped conditions.
    pub async fn get_playbook_conditions(
        &self,
        user_id: &str,
        playbook_id: &str,
        page: usize,
        per_page: usize,
    ) -> AppResult<ConditionPage> {
        validate_paging(per_page)?;
        debug!(user_id, playbook_id, page, per_page, "listing playbook conditions");

        let items = self
            .repository
            .list_playbook_conditions(playbook_id, page, per_page)
            .await
            .map_err(|error| {
                with_context(
                    error,
                    format!("failed to get conditions for playbook '{playbook_id}'"),
                )
            })?;
        let total_count = self
            .repository
            .count_playbook_conditions(playbook_id)
            .await
            .map_err(|error| {
                with_context(
                    error,
                    format!("failed to count conditions for playbook '{playbook_id}'"),
                )
            })?;

        Ok(ConditionPage::new(items, total_count, page, per_page))
    }

    /// Lists one page of conditions copied into a run.
    pub async fn get_run_conditions(
        &self,
        user_id: &str,
        playbook_id: &str,
        run_id: &str,
        page: usize,
        per_page: usize,
    ) -> AppResult<ConditionPage> {
        validate_paging(per_page)?;
        debug!(user_id, playbook_id, run_id, page, per_page, "listing run conditions");

        let items = self
            .repository
            .list_run_conditions(playbook_id, run_id, page, per_page)
            .await
            .map_err(|error| {
                with_context(error, format!("failed to get conditions for run '{run_id}'"))
            })?;
        let total_count = self
            .repository
            .count_run_conditions(playbook_id, run_id)
            .await
            .map_err(|error| {
                with_context(error, format!("failed to count conditions for run '{run_id}'"))
            })?;

        Ok(ConditionPage::new(items, total_count, page, per_page))
    }
}
