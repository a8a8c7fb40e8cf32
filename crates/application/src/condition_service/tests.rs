use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;

use runlist_core::{AppError, AppResult};
use runlist_domain::{
    Checklist, ChecklistItem, Condition, ConditionAction, ConditionExpr, PlaybookRun,
    PropertyField, PropertyOption, PropertyValue,
};

use crate::condition_ports::{
    ConditionEvent, ConditionEventKind, ConditionEventPublisher, ConditionRepository,
    PropertyFieldProvider,
};

use super::{ConditionService, ConditionServiceConfig};

#[derive(Default)]
struct FakeConditionRepository {
    conditions: Mutex<Vec<Condition>>,
    next_id: Mutex<u32>,
    failing_create_field: Option<String>,
    fail_reads: bool,
}

impl FakeConditionRepository {
    async fn stored(&self) -> Vec<Condition> {
        self.conditions.lock().await.clone()
    }

    async fn insert(&self, condition: Condition) {
        self.conditions.lock().await.push(condition);
    }

    fn read_guard(&self) -> AppResult<()> {
        if self.fail_reads {
            return Err(AppError::Internal("connection reset".to_owned()));
        }

        Ok(())
    }
}

fn live_page(
    mut conditions: Vec<Condition>,
    page: usize,
    per_page: usize,
) -> Vec<Condition> {
    conditions.sort_by(|left, right| {
        left.create_at
            .cmp(&right.create_at)
            .then_with(|| left.id.cmp(&right.id))
    });
    conditions
        .into_iter()
        .skip(page * per_page)
        .take(per_page)
        .collect()
}

#[async_trait]
impl ConditionRepository for FakeConditionRepository {
    async fn create_condition(
        &self,
        playbook_id: &str,
        condition: Condition,
    ) -> AppResult<Condition> {
        if let (Some(field_id), Some(condition_expr)) =
            (&self.failing_create_field, &condition.condition_expr)
            && condition_expr.references_field(field_id)
        {
            return Err(AppError::Internal("insert failed".to_owned()));
        }

        let mut next_id = self.next_id.lock().await;
        *next_id += 1;

        let mut created = condition;
        created.id = format!("condition-{}", *next_id);
        playbook_id.clone_into(&mut created.playbook_id);
        self.conditions.lock().await.push(created.clone());
        Ok(created)
    }

    async fn find_condition(
        &self,
        playbook_id: &str,
        condition_id: &str,
    ) -> AppResult<Option<Condition>> {
        self.read_guard()?;
        Ok(self
            .conditions
            .lock()
            .await
            .iter()
            .find(|condition| {
                condition.id == condition_id
                    && condition.playbook_id == playbook_id
                    && !condition.is_deleted()
            })
            .cloned())
    }

    async fn update_condition(
        &self,
        _playbook_id: &str,
        condition: Condition,
    ) -> AppResult<Condition> {
        let mut conditions = self.conditions.lock().await;
        let Some(stored) = conditions
            .iter_mut()
            .find(|stored| stored.id == condition.id)
        else {
            return Err(AppError::NotFound(condition.id));
        };

        *stored = condition.clone();
        Ok(condition)
    }

    async fn delete_condition(&self, _playbook_id: &str, condition_id: &str) -> AppResult<()> {
        let mut conditions = self.conditions.lock().await;
        if let Some(stored) = conditions
            .iter_mut()
            .find(|stored| stored.id == condition_id)
        {
            stored.delete_at = 1;
        }

        Ok(())
    }

    async fn list_playbook_conditions(
        &self,
        playbook_id: &str,
        page: usize,
        per_page: usize,
    ) -> AppResult<Vec<Condition>> {
        self.read_guard()?;
        let conditions = self
            .stored()
            .await
            .into_iter()
            .filter(|condition| {
                condition.playbook_id == playbook_id
                    && !condition.is_run_condition()
                    && !condition.is_deleted()
            })
            .collect();
        Ok(live_page(conditions, page, per_page))
    }

    async fn list_run_conditions(
        &self,
        playbook_id: &str,
        run_id: &str,
        page: usize,
        per_page: usize,
    ) -> AppResult<Vec<Condition>> {
        self.read_guard()?;
        let conditions = self
            .stored()
            .await
            .into_iter()
            .filter(|condition| {
                condition.playbook_id == playbook_id
                    && condition.run_id == run_id
                    && !condition.is_deleted()
            })
            .collect();
        Ok(live_page(conditions, page, per_page))
    }

    async fn count_playbook_conditions(&self, playbook_id: &str) -> AppResult<usize> {
        self.read_guard()?;
        Ok(self
            .stored()
            .await
            .iter()
            .filter(|condition| {
                condition.playbook_id == playbook_id
                    && !condition.is_run_condition()
                    && !condition.is_deleted()
            })
            .count())
    }

    async fn count_run_conditions(&self, playbook_id: &str, run_id: &str) -> AppResult<usize> {
        self.read_guard()?;
        Ok(self
            .stored()
            .await
            .iter()
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
        self.read_guard()?;
        Ok(self
            .stored()
            .await
            .into_iter()
            .filter(|condition| {
                condition.run_id == run_id
                    && !condition.is_deleted()
                    && condition
                        .condition_expr
                        .as_ref()
                        .is_some_and(|condition_expr| condition_expr.references_field(field_id))
            })
            .collect())
    }
}

struct FakePropertyFieldProvider {
    fields: Vec<PropertyField>,
}

#[async_trait]
impl PropertyFieldProvider for FakePropertyFieldProvider {
    async fn list_property_fields(&self, _playbook_id: &str) -> AppResult<Vec<PropertyField>> {
        Ok(self.fields.clone())
    }
}

#[derive(Default)]
struct RecordingEventPublisher {
    events: Mutex<Vec<ConditionEvent>>,
    fail: bool,
}

#[async_trait]
impl ConditionEventPublisher for RecordingEventPublisher {
    async fn publish(&self, event: ConditionEvent) -> AppResult<()> {
        if self.fail {
            return Err(AppError::Internal("websocket hub unavailable".to_owned()));
        }

        self.events.lock().await.push(event);
        Ok(())
    }
}

fn playbook_fields() -> Vec<PropertyField> {
    vec![
        PropertyField::text("summary", "Summary"),
        PropertyField::select(
            "severity",
            "Severity",
            vec![
                PropertyOption::new("sev-critical", "Critical"),
                PropertyOption::new("sev-low", "Low"),
            ],
        ),
    ]
}

fn critical_condition() -> Condition {
    Condition::for_playbook(
        "playbook-1",
        ConditionExpr::is("severity", json!(["sev-critical"])),
    )
}

struct Harness {
    service: ConditionService,
    repository: Arc<FakeConditionRepository>,
    publisher: Arc<RecordingEventPublisher>,
}

fn harness_with(
    repository: FakeConditionRepository,
    publisher: RecordingEventPublisher,
    config: ConditionServiceConfig,
) -> Harness {
    let repository = Arc::new(repository);
    let publisher = Arc::new(publisher);
    let service = ConditionService::new(
        repository.clone(),
        Arc::new(FakePropertyFieldProvider {
            fields: playbook_fields(),
        }),
        publisher.clone(),
    )
    .with_config(config);

    Harness {
        service,
        repository,
        publisher,
    }
}

fn harness() -> Harness {
    harness_with(
        FakeConditionRepository::default(),
        RecordingEventPublisher::default(),
        ConditionServiceConfig::default(),
    )
}

async fn create(harness: &Harness, condition: Condition) -> Condition {
    let created = harness
        .service
        .create_playbook_condition("user-1", condition, "team-1")
        .await;
    assert!(created.is_ok());
    created.unwrap_or_else(|_| unreachable!())
}

#[tokio::test]
async fn create_stamps_record_and_notifies_team() {
    let harness = harness();

    let created = create(&harness, critical_condition()).await;

    assert_eq!(created.id, "condition-1");
    assert!(created.create_at > 0);
    assert_eq!(created.create_at, created.update_at);
    assert_eq!(created.version, 1);

    let events = harness.publisher.events.lock().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, ConditionEventKind::Created);
    assert_eq!(events[0].kind.as_str(), "condition_created");
    assert_eq!(events[0].team_id, "team-1");
    assert_eq!(events[0].condition.id, "condition-1");
}

#[tokio::test]
async fn create_trims_text_literals() {
    let harness = harness();

    let created = create(
        &harness,
        Condition::for_playbook(
            "playbook-1",
            ConditionExpr::is("summary", json!("  database outage  ")),
        ),
    )
    .await;

    assert_eq!(
        created.condition_expr,
        Some(ConditionExpr::is("summary", json!("database outage")))
    );
}

#[tokio::test]
async fn create_rejects_invalid_records_without_storing() {
    let harness = harness();

    let unknown_option = harness
        .service
        .create_playbook_condition(
            "user-1",
            Condition::for_playbook(
                "playbook-1",
                ConditionExpr::is("severity", json!(["sev-unknown"])),
            ),
            "team-1",
        )
        .await;
    assert!(matches!(
        unknown_option,
        Err(AppError::Validation(message)) if message.contains("invalid condition expression")
    ));

    let mut run_condition = critical_condition();
    run_condition.run_id = "run-1".to_owned();
    let run_result = harness
        .service
        .create_playbook_condition("user-1", run_condition, "team-1")
        .await;
    assert!(matches!(run_result, Err(AppError::Forbidden(_))));

    assert!(harness.repository.stored().await.is_empty());
    assert!(harness.publisher.events.lock().await.is_empty());
}

#[tokio::test]
async fn create_enforces_per_playbook_limit() {
    let harness = harness_with(
        FakeConditionRepository::default(),
        RecordingEventPublisher::default(),
        ConditionServiceConfig {
            max_conditions_per_playbook: 2,
            ..ConditionServiceConfig::default()
        },
    );

    create(&harness, critical_condition()).await;
    create(&harness, critical_condition()).await;

    let over_limit = harness
        .service
        .create_playbook_condition("user-1", critical_condition(), "team-1")
        .await;

    match over_limit {
        Err(AppError::LimitExceeded(message)) => {
            assert!(message.contains("maximum allowed number of conditions"));
            assert!(message.contains('2'));
        }
        other => panic!("expected limit error, got {other:?}"),
    }

    let mut other_playbook = critical_condition();
    other_playbook.playbook_id = "playbook-2".to_owned();
    create(&harness, other_playbook).await;
}

#[tokio::test]
async fn run_copies_do_not_count_towards_limit() {
    let harness = harness_with(
        FakeConditionRepository::default(),
        RecordingEventPublisher::default(),
        ConditionServiceConfig {
            max_conditions_per_playbook: 1,
            ..ConditionServiceConfig::default()
        },
    );
    let mut run_copy = critical_condition();
    run_copy.id = "condition-run".to_owned();
    run_copy.run_id = "run-1".to_owned();
    harness.repository.insert(run_copy).await;

    create(&harness, critical_condition()).await;
}

#[tokio::test]
async fn update_preserves_creation_time() {
    let harness = harness();
    let created = create(&harness, critical_condition()).await;

    let mut changed = created.clone();
    changed.create_at = 42;
    changed.condition_expr = Some(ConditionExpr::is_not("severity", json!(["sev-low"])));

    let updated = harness
        .service
        .update_playbook_condition("user-1", changed, "team-1")
        .await;
    assert!(updated.is_ok());
    let updated = updated.unwrap_or_else(|_| unreachable!());

    assert_eq!(updated.create_at, created.create_at);
    assert!(updated.update_at >= created.update_at);
    assert_eq!(
        updated.condition_expr,
        Some(ConditionExpr::is_not("severity", json!(["sev-low"])))
    );

    let events = harness.publisher.events.lock().await;
    assert_eq!(
        events.iter().map(|event| event.kind).collect::<Vec<_>>(),
        vec![ConditionEventKind::Created, ConditionEventKind::Updated]
    );
}

#[tokio::test]
async fn update_rejects_missing_and_run_conditions() {
    let harness = harness();

    let mut missing = critical_condition();
    missing.id = "condition-404".to_owned();
    let missing_result = harness
        .service
        .update_playbook_condition("user-1", missing, "team-1")
        .await;
    assert!(matches!(missing_result, Err(AppError::NotFound(_))));

    let mut stored_run_condition = critical_condition();
    stored_run_condition.id = "condition-run".to_owned();
    stored_run_condition.run_id = "run-1".to_owned();
    harness.repository.insert(stored_run_condition.clone()).await;

    let run_result = harness
        .service
        .update_playbook_condition("user-1", stored_run_condition, "team-1")
        .await;
    assert!(matches!(
        run_result,
        Err(AppError::Forbidden(message)) if message.contains("read-only")
    ));

    let created = create(&harness, critical_condition()).await;
    let mut moved_to_run = created;
    moved_to_run.run_id = "run-1".to_owned();
    let moved_result = harness
        .service
        .update_playbook_condition("user-1", moved_to_run, "team-1")
        .await;
    assert!(matches!(
        moved_result,
        Err(AppError::Forbidden(message)) if message.contains("system managed")
    ));
}

#[tokio::test]
async fn delete_notifies_then_hides_condition() {
    let harness = harness();
    let created = create(&harness, critical_condition()).await;

    let deleted = harness
        .service
        .delete_playbook_condition("user-1", "playbook-1", &created.id, "team-1")
        .await;
    assert!(deleted.is_ok());

    let fetched = harness
        .service
        .get_playbook_condition("user-1", "playbook-1", &created.id)
        .await;
    assert!(matches!(fetched, Err(AppError::NotFound(_))));

    let events = harness.publisher.events.lock().await;
    assert_eq!(events.last().map(|event| event.kind), Some(ConditionEventKind::Deleted));
    assert_eq!(events.last().map(|event| event.condition.delete_at), Some(0));
}

#[tokio::test]
async fn delete_rejects_run_conditions() {
    let harness = harness();
    let mut run_condition = critical_condition();
    run_condition.id = "condition-run".to_owned();
    run_condition.run_id = "run-1".to_owned();
    harness.repository.insert(run_condition).await;

    let result = harness
        .service
        .delete_playbook_condition("user-1", "playbook-1", "condition-run", "team-1")
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
    assert!(harness.publisher.events.lock().await.is_empty());
}

#[tokio::test]
async fn notification_failures_do_not_fail_mutations() {
    let harness = harness_with(
        FakeConditionRepository::default(),
        RecordingEventPublisher {
            fail: true,
            ..RecordingEventPublisher::default()
        },
        ConditionServiceConfig::default(),
    );

    let created = create(&harness, critical_condition()).await;
    let deleted = harness
        .service
        .delete_playbook_condition("user-1", "playbook-1", &created.id, "team-1")
        .await;

    assert!(deleted.is_ok());
}

#[tokio::test]
async fn listing_reports_page_metadata() {
    let harness = harness();
    for _ in 0..5 {
        create(&harness, critical_condition()).await;
    }

    let first = harness
        .service
        .get_playbook_conditions("user-1", "playbook-1", 0, 2)
        .await;
    assert!(first.is_ok());
    let first = first.unwrap_or_else(|_| unreachable!());
    assert_eq!(first.items.len(), 2);
    assert_eq!(first.total_count, 5);
    assert_eq!(first.page_count, 3);
    assert!(first.has_more);

    let last = harness
        .service
        .get_playbook_conditions("user-1", "playbook-1", 2, 2)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(last.items.len(), 1);
    assert!(!last.has_more);

    let empty_runs = harness
        .service
        .get_run_conditions("user-1", "playbook-1", "run-1", 0, 10)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(empty_runs.total_count, 0);
    assert_eq!(empty_runs.page_count, 1);
    assert!(empty_runs.items.is_empty());

    let zero_page_size = harness
        .service
        .get_playbook_conditions("user-1", "playbook-1", 0, 0)
        .await;
    assert!(matches!(zero_page_size, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn store_failures_carry_operation_context() {
    let harness = harness_with(
        FakeConditionRepository {
            fail_reads: true,
            ..FakeConditionRepository::default()
        },
        RecordingEventPublisher::default(),
        ConditionServiceConfig::default(),
    );

    let copied = harness
        .service
        .copy_playbook_conditions_to_run("playbook-1", "run-1", &HashMap::new(), &HashMap::new())
        .await;

    match copied {
        Err(AppError::Internal(message)) => {
            assert!(message.contains("failed to get playbook conditions"));
            assert!(message.contains("connection reset"));
        }
        other => panic!("expected internal error, got {other:?}"),
    }
}

#[tokio::test]
async fn copy_rewrites_fields_and_skips_unmappable_conditions() {
    let harness = harness_with(
        FakeConditionRepository {
            failing_create_field: Some("run-summary".to_owned()),
            ..FakeConditionRepository::default()
        },
        RecordingEventPublisher::default(),
        ConditionServiceConfig::default(),
    );
    let severity = create(&harness, critical_condition()).await;
    let summary = create(
        &harness,
        Condition::for_playbook("playbook-1", ConditionExpr::is("summary", json!("outage"))),
    )
    .await;

    let mut unmapped_expr = critical_condition();
    unmapped_expr.condition_expr = Some(ConditionExpr::is("retired-field", json!("x")));
    let unmapped = create(&harness, unmapped_expr).await;

    let field_mapping = HashMap::from([
        ("severity".to_owned(), "run-severity".to_owned()),
        ("summary".to_owned(), "run-summary".to_owned()),
    ]);
    let copies = harness
        .service
        .copy_playbook_conditions_to_run("playbook-1", "run-1", &field_mapping, &HashMap::new())
        .await;
    assert!(copies.is_ok());
    let copies = copies.unwrap_or_else(|_| unreachable!());

    assert_eq!(copies.len(), 1);
    assert!(!copies.contains_key(&summary.id));
    assert!(!copies.contains_key(&unmapped.id));

    let copy = copies.get(&severity.id).cloned().unwrap_or_else(|| unreachable!());
    assert_ne!(copy.id, severity.id);
    assert_eq!(copy.run_id, "run-1");
    assert_eq!(copy.playbook_id, "playbook-1");
    assert_eq!(
        copy.condition_expr,
        Some(ConditionExpr::is("run-severity", json!(["sev-critical"])))
    );

    let original = harness
        .service
        .get_playbook_condition("user-1", "playbook-1", &severity.id)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(original.condition_expr, severity.condition_expr);
    assert!(original.run_id.is_empty());
}

fn run_with_item(action: ConditionAction, severity_option: &str) -> PlaybookRun {
    let mut item = ChecklistItem::with_condition("Page incident commander", "condition-run");
    item.condition_action = action;

    PlaybookRun {
        id: "run-1".to_owned(),
        playbook_id: "playbook-1".to_owned(),
        property_fields: vec![PropertyField::select(
            "run-severity",
            "Severity",
            vec![
                PropertyOption::new("sev-critical", "Critical"),
                PropertyOption::new("sev-low", "Low"),
            ],
        )],
        property_values: vec![PropertyValue::new(
            "run-severity",
            Some(json!(severity_option)),
        )],
        checklists: vec![Checklist::new("Escalation", vec![item])],
    }
}

async fn harness_with_run_condition() -> Harness {
    let harness = harness();
    let mut run_condition = Condition::for_playbook(
        "playbook-1",
        ConditionExpr::is("run-severity", json!(["sev-critical"])),
    );
    run_condition.id = "condition-run".to_owned();
    run_condition.run_id = "run-1".to_owned();
    harness.repository.insert(run_condition).await;
    harness
}

#[tokio::test]
async fn evaluation_hides_and_reveals_items() {
    let harness = harness_with_run_condition().await;

    let mut run = run_with_item(ConditionAction::None, "sev-low");
    let hidden = harness
        .service
        .evaluate_conditions_for_playbook_run(&mut run, "run-severity")
        .await;
    assert!(hidden.is_ok());
    let hidden = hidden.unwrap_or_else(|_| unreachable!());
    assert_eq!(hidden.checklist_changes.get("Escalation").map(|c| c.hidden), Some(1));
    assert!(hidden.anything_changed());
    assert!(!hidden.anything_added());

    let item = &run.checklists[0].items[0];
    assert_eq!(item.condition_action, ConditionAction::Hidden);
    assert_eq!(item.condition_reason, "\"Severity\" is Critical");

    let repeated = harness
        .service
        .evaluate_conditions_for_playbook_run(&mut run, "run-severity")
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(!repeated.anything_changed());

    run.property_values = vec![PropertyValue::new("run-severity", Some(json!("sev-critical")))];
    let revealed = harness
        .service
        .evaluate_conditions_for_playbook_run(&mut run, "run-severity")
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(revealed.checklist_changes.get("Escalation").map(|c| c.added), Some(1));
    assert_eq!(run.checklists[0].items[0].condition_action, ConditionAction::None);
}

#[tokio::test]
async fn evaluation_keeps_modified_items_visible() {
    let harness = harness_with_run_condition().await;

    let mut run = run_with_item(ConditionAction::None, "sev-low");
    run.checklists[0].items[0].assignee_modified = 1_700_000_000_000;

    let result = harness
        .service
        .evaluate_conditions_for_playbook_run(&mut run, "run-severity")
        .await
        .unwrap_or_else(|_| unreachable!());

    assert!(!result.anything_changed());
    assert_eq!(
        run.checklists[0].items[0].condition_action,
        ConditionAction::ShownBecauseModified
    );
}

#[tokio::test]
async fn evaluation_for_unreferenced_field_changes_nothing() {
    let harness = harness_with_run_condition().await;

    let mut run = run_with_item(ConditionAction::None, "sev-low");
    let before = run.clone();

    let result = harness
        .service
        .evaluate_conditions_for_playbook_run(&mut run, "run-owner")
        .await
        .unwrap_or_else(|_| unreachable!());

    assert!(result.checklist_changes.is_empty());
    assert_eq!(run, before);
}
