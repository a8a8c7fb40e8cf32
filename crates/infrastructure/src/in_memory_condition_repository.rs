use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use runlist_application::ConditionRepository;
use runlist_core::{AppError, AppResult};
use runlist_domain::Condition;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Conditions plus a `(run_id, field_id)` index kept under one lock.
///
/// Only run conditions are indexed.
#[derive(Debug, Default)]
struct ConditionTables {
    conditions: HashMap<String, Condition>,
    field_index: HashMap<(String, String), BTreeSet<String>>,
}

impl ConditionTables {
    fn index(&mut self, condition: &Condition) {
        if !condition.is_run_condition() {
            return;
        }

        for field_id in referenced_fields(condition) {
            self.field_index
                .entry((condition.run_id.clone(), field_id))
                .or_default()
                .insert(condition.id.clone());
        }
    }

    fn unindex(&mut self, condition: &Condition) {
        if !condition.is_run_condition() {
            return;
        }

        for field_id in referenced_fields(condition) {
            let key = (condition.run_id.clone(), field_id);
            if let Some(condition_ids) = self.field_index.get_mut(&key) {
                condition_ids.remove(&condition.id);
                if condition_ids.is_empty() {
                    self.field_index.remove(&key);
                }
            }
        }
    }

    fn live(&self, playbook_id: &str, condition_id: &str) -> Option<&Condition> {
        self.conditions.get(condition_id).filter(|condition| {
            condition.playbook_id == playbook_id && !condition.is_deleted()
        })
    }

    fn select(&self, predicate: impl Fn(&Condition) -> bool) -> Vec<Condition> {
        let mut selected: Vec<Condition> = self
            .conditions
            .values()
            .filter(|condition| !condition.is_deleted() && predicate(condition))
            .cloned()
            .collect();
        selected.sort_by(|left, right| {
            left.create_at
                .cmp(&right.create_at)
                .then_with(|| left.id.cmp(&right.id))
        });
        selected
    }
}

fn referenced_fields(condition: &Condition) -> BTreeSet<String> {
    condition
        .condition_expr
        .as_ref()
        .map(|condition_expr| condition_expr.extract_property_ids().0)
        .unwrap_or_default()
}

fn paginate(conditions: Vec<Condition>, page: usize, per_page: usize) -> Vec<Condition> {
    conditions
        .into_iter()
        .skip(page.saturating_mul(per_page))
        .take(per_page)
        .collect()
}

fn not_found(playbook_id: &str, condition_id: &str) -> AppError {
    AppError::NotFound(format!(
        "condition '{condition_id}' does not exist in playbook '{playbook_id}'"
    ))
}

/// In-memory condition repository implementation.
#[derive(Debug, Default)]
pub struct InMemoryConditionRepository {
    tables: RwLock<ConditionTables>,
}

impl InMemoryConditionRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConditionRepository for InMemoryConditionRepository {
    async fn create_condition(
        &self,
        playbook_id: &str,
        condition: Condition,
    ) -> AppResult<Condition> {
        let mut condition = condition;
        if condition.id.is_empty() {
            condition.id = Uuid::new_v4().to_string();
        }
        playbook_id.clone_into(&mut condition.playbook_id);

        let mut tables = self.tables.write().await;
        if tables.conditions.contains_key(&condition.id) {
            return Err(AppError::Conflict(format!(
                "condition '{}' already exists",
                condition.id
            )));
        }

        tables.index(&condition);
        tables
            .conditions
            .insert(condition.id.clone(), condition.clone());

        Ok(condition)
    }

    async fn find_condition(
        &self,
        playbook_id: &str,
        condition_id: &str,
    ) -> AppResult<Option<Condition>> {
        Ok(self
            .tables
            .read()
            .await
            .live(playbook_id, condition_id)
            .cloned())
    }

    async fn update_condition(
        &self,
        playbook_id: &str,
        condition: Condition,
    ) -> AppResult<Condition> {
        let mut tables = self.tables.write().await;
        let Some(previous) = tables.live(playbook_id, &condition.id).cloned() else {
            return Err(not_found(playbook_id, &condition.id));
        };

        tables.unindex(&previous);
        tables.index(&condition);
        tables
            .conditions
            .insert(condition.id.clone(), condition.clone());

        Ok(condition)
    }

    async fn delete_condition(&self, playbook_id: &str, condition_id: &str) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        let Some(mut deleted) = tables.live(playbook_id, condition_id).cloned() else {
            return Err(not_found(playbook_id, condition_id));
        };

        let now = Utc::now().timestamp_millis();
        deleted.delete_at = now;
        deleted.update_at = now;

        tables.unindex(&deleted);
        tables.conditions.insert(condition_id.to_owned(), deleted);

        Ok(())
    }

    async fn list_playbook_conditions(
        &self,
        playbook_id: &str,
        page: usize,
        per_page: usize,
    ) -> AppResult<Vec<Condition>> {
        let selected = self.tables.read().await.select(|condition| {
            condition.playbook_id == playbook_id && !condition.is_run_condition()
        });

        Ok(paginate(selected, page, per_page))
    }

    async fn list_run_conditions(
        &self,
        playbook_id: &str,
        run_id: &str,
        page: usize,
        per_page: usize,
    ) -> AppResult<Vec<Condition>> {
        let selected = self.tables.read().await.select(|condition| {
            condition.playbook_id == playbook_id && condition.run_id == run_id
        });

        Ok(paginate(selected, page, per_page))
    }

    async fn count_playbook_conditions(&self, playbook_id: &str) -> AppResult<usize> {
        Ok(self
            .tables
            .read()
            .await
            .conditions
            .values()
            .filter(|condition| {
                condition.playbook_id == playbook_id
                    && !condition.is_run_condition()
                    && !condition.is_deleted()
            })
            .count())
    }

    async fn count_run_conditions(&self, playbook_id: &str, run_id: &str) -> AppResult<usize> {
        Ok(self
            .tables
            .read()
            .await
            .conditions
            .values()
            .filter(|condition| {
                condition.playbook_id == playbook_id
                    && condition.run_id == run_id
                    && !condition.is_deleted()
            })
            .count())
    }

    async fn list_run_conditions_for_field(
        &self,
        run_id: &str,
        field_id: &str,
    ) -> AppResult<Vec<Condition>> {
        if run_id.is_empty() {
            return Ok(Vec::new());
        }

        let tables = self.tables.read().await;
        let Some(condition_ids) = tables
            .field_index
            .get(&(run_id.to_owned(), field_id.to_owned()))
        else {
            return Ok(Vec::new());
        };

        Ok(tables.select(|condition| condition_ids.contains(&condition.id)))
    }
}
