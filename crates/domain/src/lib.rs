//! Domain entities and invariants for checklist conditions.

#![forbid(unsafe_code)]

mod checklist;
mod condition;
mod condition_expr;
mod property;
mod run;

pub use checklist::{Checklist, ChecklistItem, ConditionAction, VisibilityTransition};
pub use condition::{CURRENT_CONDITION_VERSION, Condition};
pub use condition_expr::{ComparisonCondition, ConditionExpr, DEFAULT_MAX_CONDITION_DEPTH};
pub use property::{PropertyField, PropertyFieldType, PropertyOption, PropertyValue};
pub use run::{
    ChecklistConditionChanges, ConditionEvaluationResult, ConditionOutcome, PlaybookRun,
};
