use async_trait::async_trait;
use runlist_core::AppResult;
use runlist_domain::Condition;

/// Repository port for playbook and run conditions.
///
/// Soft-deleted conditions are invisible to every read method.
#[async_trait]
pub trait ConditionRepository: Send + Sync {
    /// Persists a new condition and returns it with its assigned ID.
    async fn create_condition(&self, playbook_id: &str, condition: Condition)
    -> AppResult<Condition>;

    /// Returns one live condition by ID.
    async fn find_condition(
        &self,
        playbook_id: &str,
        condition_id: &str,
    ) -> AppResult<Option<Condition>>;

    /// Replaces one stored condition.
    async fn update_condition(&self, playbook_id: &str, condition: Condition)
    -> AppResult<Condition>;

    /// Soft-deletes one condition.
    async fn delete_condition(&self, playbook_id: &str, condition_id: &str) -> AppResult<()>;

    /// Lists playbook-scoped conditions, oldest first.
    async fn list_playbook_conditions(
        &self,
        playbook_id: &str,
        page: usize,
        per_page: usize,
    ) -> AppResult<Vec<Condition>>;

    /// Lists conditions copied into one run, oldest first.
    async fn list_run_conditions(
        &self,
        playbook_id: &str,
        run_id: &str,
        page: usize,
        per_page: usize,
    ) -> AppResult<Vec<Condition>>;

    /// Counts playbook-scoped conditions.
    async fn count_playbook_conditions(&self, playbook_id: &str) -> AppResult<usize>;

    /// Counts conditions copied into one run.
    async fn count_run_conditions(&self, playbook_id: &str, run_id: &str) -> AppResult<usize>;

    /// Lists run conditions whose expression references `field_id`.
    async fn list_run_conditions_for_field(
        &self,
        run_id: &str,
        field_id: &str,
    ) -> AppResult<Vec<Condition>>;
}
