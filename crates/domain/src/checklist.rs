use serde::{Deserialize, Serialize};

/// Visibility flag a condition places on a checklist item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionAction {
    /// Item is visible; its condition holds or it has none.
    #[default]
    #[serde(rename = "")]
    None,
    /// Item is hidden because its condition does not hold.
    #[serde(rename = "hidden")]
    Hidden,
    /// Item stays visible despite an unmet condition because it was touched.
    #[serde(rename = "shown_because_modified")]
    ShownBecauseModified,
}

impl ConditionAction {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Hidden => "hidden",
            Self::ShownBecauseModified => "shown_because_modified",
        }
    }
}

/// Effect of one evaluation on one checklist item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityTransition {
    /// State did not change.
    Unchanged,
    /// Item became visible again.
    Revealed,
    /// Item became hidden.
    Hidden,
}

/// One checklist item with its condition bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    /// Item identifier.
    #[serde(default)]
    pub id: String,
    /// Item title.
    pub title: String,
    /// Governing run condition, empty when the item is unconditional.
    #[serde(default)]
    pub condition_id: String,
    /// Current visibility flag.
    #[serde(default)]
    pub condition_action: ConditionAction,
    /// Last rendering of the governing condition.
    #[serde(default)]
    pub condition_reason: String,
    /// Millisecond timestamp of the last assignee change, zero if never.
    #[serde(default)]
    pub assignee_modified: i64,
    /// Millisecond timestamp of the last state change, zero if never.
    #[serde(default)]
    pub state_modified: i64,
}

impl ChecklistItem {
    /// Creates an item governed by `condition_id`.
    #[must_use]
    pub fn with_condition(title: impl Into<String>, condition_id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            condition_id: condition_id.into(),
            ..Self::default()
        }
    }

    /// Returns whether a user has touched the item.
    #[must_use]
    pub fn was_modified(&self) -> bool {
        self.assignee_modified > 0 || self.state_modified > 0
    }

    /// Applies one condition outcome and records `reason`.
    ///
    /// | current | met | unmet, modified | unmet, untouched |
    /// |---|---|---|---|
    /// | hidden | none (revealed) | hidden | hidden |
    /// | shown_because_modified | none (revealed) | shown_because_modified | hidden |
    /// | none | none | shown_because_modified | hidden |
    pub fn apply_condition_result(&mut self, met: bool, reason: &str) -> VisibilityTransition {
        reason.clone_into(&mut self.condition_reason);

        let modified = self.was_modified();
        let (next, transition) = match (self.condition_action, met) {
            (ConditionAction::Hidden | ConditionAction::ShownBecauseModified, true) => {
                (ConditionAction::None, VisibilityTransition::Revealed)
            }
            (ConditionAction::None, true) => (ConditionAction::None, VisibilityTransition::Unchanged),
            (ConditionAction::Hidden, false) => {
                (ConditionAction::Hidden, VisibilityTransition::Unchanged)
            }
            (ConditionAction::ShownBecauseModified | ConditionAction::None, false) if modified => (
                ConditionAction::ShownBecauseModified,
                VisibilityTransition::Unchanged,
            ),
            (ConditionAction::ShownBecauseModified | ConditionAction::None, false) => {
                (ConditionAction::Hidden, VisibilityTransition::Hidden)
            }
        };

        self.condition_action = next;
        transition
    }
}

/// Ordered group of checklist items within a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checklist {
    /// Checklist identifier.
    #[serde(default)]
    pub id: String,
    /// Checklist title; also keys evaluation summaries.
    pub title: String,
    /// Items in display order.
    #[serde(default)]
    pub items: Vec<ChecklistItem>,
}

impl Checklist {
    /// Creates a checklist.
    #[must_use]
    pub fn new(title: impl Into<String>, items: Vec<ChecklistItem>) -> Self {
        Self {
            id: String::new(),
            title: title.into(),
            items,
        }
    }
}
