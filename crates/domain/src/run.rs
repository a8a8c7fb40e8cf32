use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::checklist::{Checklist, VisibilityTransition};
use crate::property::{PropertyField, PropertyValue};

/// Run aggregate fields consumed by condition evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaybookRun {
    /// Run identifier.
    pub id: String,
    /// Playbook the run was started from.
    pub playbook_id: String,
    /// Property fields defined on the run.
    #[serde(default)]
    pub property_fields: Vec<PropertyField>,
    /// Current property values of the run.
    #[serde(default)]
    pub property_values: Vec<PropertyValue>,
    /// Checklists in display order.
    #[serde(default)]
    pub checklists: Vec<Checklist>,
}

/// Evaluated state of one run condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionOutcome {
    /// Whether the condition holds.
    pub met: bool,
    /// Rendered condition shown on governed items.
    pub reason: String,
}

/// Visibility changes counted for one checklist title.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistConditionChanges {
    /// Items revealed by the evaluation.
    pub added: u32,
    /// Items hidden by the evaluation.
    pub hidden: u32,
}

impl ChecklistConditionChanges {
    /// Returns whether anything changed in this checklist.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.added > 0 || self.hidden > 0
    }
}

/// Summary of one evaluation keyed by checklist title.
///
/// Checklists sharing a title share a bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionEvaluationResult {
    /// Per-checklist change counters.
    pub checklist_changes: HashMap<String, ChecklistConditionChanges>,
}

impl ConditionEvaluationResult {
    /// Returns whether any item was revealed or hidden.
    #[must_use]
    pub fn anything_changed(&self) -> bool {
        self.checklist_changes
            .values()
            .any(ChecklistConditionChanges::has_changes)
    }

    /// Returns whether any item was revealed.
    #[must_use]
    pub fn anything_added(&self) -> bool {
        self.checklist_changes
            .values()
            .any(|changes| changes.added > 0)
    }
}

impl PlaybookRun {
    /// Applies condition outcomes to every governed checklist item in place.
    ///
    /// Items are visited in stored order; items whose condition is not in
    /// `outcomes` are left untouched.
    pub fn apply_condition_outcomes(
        &mut self,
        outcomes: &HashMap<String, ConditionOutcome>,
    ) -> ConditionEvaluationResult {
        let mut result = ConditionEvaluationResult::default();

        for checklist in &mut self.checklists {
            for item in &mut checklist.items {
                if item.condition_id.is_empty() {
                    continue;
                }

                let Some(outcome) = outcomes.get(&item.condition_id) else {
                    continue;
                };

                let changes = result
                    .checklist_changes
                    .entry(checklist.title.clone())
                    .or_default();
                match item.apply_condition_result(outcome.met, &outcome.reason) {
                    VisibilityTransition::Revealed => changes.added += 1,
                    VisibilityTransition::Hidden => changes.hidden += 1,
                    VisibilityTransition::Unchanged => {}
                }
            }
        }

        result
    }
}
