use super::*;

impl ConditionService {
    /// Re-evaluates run conditions that reference `changed_field_id` and
    /// updates governed checklist items of `run` in place.
    ///
    /// The caller persists the mutated run.
    pub async fn evaluate_conditions_for_playbook_run(
        &self,
        run: &mut PlaybookRun,
        changed_field_id: &str,
    ) -> AppResult<ConditionEvaluationResult> {
        let conditions = self
            .repository
            .list_run_conditions_for_field(&run.id, changed_field_id)
            .await
            .map_err(|error| {
                with_context(
                    error,
                    format!(
                        "failed to get conditions for run '{}' and field '{changed_field_id}'",
                        run.id
                    ),
                )
            })?;

        if conditions.is_empty() {
            return Ok(ConditionEvaluationResult::default());
        }

        let outcomes: HashMap<String, ConditionOutcome> = conditions
            .iter()
            .map(|condition| {
                (
                    condition.id.clone(),
                    ConditionOutcome {
                        met: condition.evaluate(&run.property_fields, &run.property_values),
                        reason: condition.describe(&run.property_fields),
                    },
                )
            })
            .collect();

        let result = run.apply_condition_outcomes(&outcomes);

        debug!(
            run_id = %run.id,
            changed_field_id,
            conditions = outcomes.len(),
            anything_changed = result.anything_changed(),
            anything_added = result.anything_added(),
            "evaluated run conditions"
        );

        Ok(result)
    }
}
