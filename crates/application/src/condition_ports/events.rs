use async_trait::async_trait;
use runlist_core::AppResult;
use runlist_domain::Condition;

/// Condition lifecycle event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionEventKind {
    /// A playbook condition was created.
    Created,
    /// A playbook condition was updated.
    Updated,
    /// A playbook condition is about to be deleted.
    Deleted,
}

impl ConditionEventKind {
    /// Returns stable event name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "condition_created",
            Self::Updated => "condition_updated",
            Self::Deleted => "condition_deleted",
        }
    }
}

/// Event broadcast to listeners of one team.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionEvent {
    /// Event kind.
    pub kind: ConditionEventKind,
    /// Team whose members receive the event.
    pub team_id: String,
    /// Condition payload.
    pub condition: Condition,
}

/// Fire-and-forget notifier for condition changes.
#[async_trait]
pub trait ConditionEventPublisher: Send + Sync {
    /// Publishes one event. Callers log failures instead of propagating them.
    async fn publish(&self, event: ConditionEvent) -> AppResult<()>;
}
