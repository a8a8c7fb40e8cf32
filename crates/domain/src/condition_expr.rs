use std::collections::{BTreeSet, HashMap};

use runlist_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::property::{PropertyField, PropertyFieldType, PropertyValue};

/// Default nesting depth allowed for `and`/`or` groups.
pub const DEFAULT_MAX_CONDITION_DEPTH: usize = 1;

/// Leaf comparison of one property field against a literal JSON value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonCondition {
    /// Referenced property field identifier.
    pub field_id: String,
    /// Literal shaped by the field type: a string for text fields, an
    /// array of option IDs for select and multiselect fields.
    pub value: Value,
}

impl ComparisonCondition {
    /// Creates a comparison leaf.
    #[must_use]
    pub fn new(field_id: impl Into<String>, value: Value) -> Self {
        Self {
            field_id: field_id.into(),
            value,
        }
    }

    fn validate(&self, fields: &[PropertyField]) -> AppResult<()> {
        if self.field_id.is_empty() {
            return Err(AppError::Validation("field_id cannot be empty".to_owned()));
        }

        // Leaves on fields that are not (or no longer) defined are accepted.
        match fields.iter().find(|field| field.id == self.field_id) {
            Some(field) => self.validate_value_for_field(field),
            None => Ok(()),
        }
    }

    fn validate_value_for_field(&self, field: &PropertyField) -> AppResult<()> {
        match field.field_type {
            PropertyFieldType::Text => {
                if decode_string(&self.value).is_none() {
                    return Err(AppError::Validation(format!(
                        "text field condition value must be a string for field '{}'",
                        field.name
                    )));
                }

                Ok(())
            }
            PropertyFieldType::Select | PropertyFieldType::Multiselect => {
                let kind = field.field_type.as_str();
                let Some(option_ids) = decode_string_array(&self.value) else {
                    return Err(AppError::Validation(format!(
                        "{kind} field condition value must be an array for field '{}'",
                        field.name
                    )));
                };

                if option_ids.is_empty() {
                    return Err(AppError::Validation(format!(
                        "{kind} field condition value array cannot be empty for field '{}'",
                        field.name
                    )));
                }

                if field.options.is_empty() {
                    return Err(AppError::Validation(format!(
                        "condition value does not match any valid option for {kind} field '{}'",
                        field.name
                    )));
                }

                if let Some(unknown) = option_ids
                    .iter()
                    .find(|option_id| field.find_option(option_id).is_none())
                {
                    return Err(AppError::Validation(format!(
                        "condition value '{unknown}' does not match any valid option for {kind} field '{}'",
                        field.name
                    )));
                }

                Ok(())
            }
            PropertyFieldType::Unsupported => Err(AppError::Validation(format!(
                "unsupported field type for condition on field '{}'",
                field.name
            ))),
        }
    }

    fn sanitize(&mut self) {
        if self.value.is_null() {
            self.value = Value::String(String::new());
        } else if let Value::String(content) = &mut self.value {
            let trimmed = content.trim();
            if trimmed.len() != content.len() {
                *content = trimmed.to_owned();
            }
        }
    }

    fn matches(&self, field: &PropertyField, property_value: Option<&Value>) -> bool {
        let Some(property_value) = property_value else {
            return false;
        };

        match field.field_type {
            PropertyFieldType::Text => {
                match (decode_string(property_value), decode_string(&self.value)) {
                    (Some(actual), Some(expected)) => equal_fold(actual, expected),
                    _ => false,
                }
            }
            PropertyFieldType::Select => {
                match (decode_string(property_value), decode_string_array(&self.value)) {
                    (Some(actual), Some(expected)) => expected.contains(&actual),
                    _ => false,
                }
            }
            PropertyFieldType::Multiselect => {
                match (
                    decode_string_array(property_value),
                    decode_string_array(&self.value),
                ) {
                    (Some(actual), Some(expected)) => {
                        expected.iter().any(|option_id| actual.contains(option_id))
                    }
                    _ => false,
                }
            }
            PropertyFieldType::Unsupported => false,
        }
    }

    fn describe(&self, fields: &HashMap<&str, &PropertyField>, negated: bool) -> String {
        let field = fields.get(self.field_id.as_str()).copied();
        let label = field.map_or(self.field_id.as_str(), |field| field.name.as_str());
        let operator = if negated { "is not" } else { "is" };

        format!(
            "\"{label}\" {operator} {}",
            describe_value(field, &self.value)
        )
    }
}

/// Boolean condition tree over run property values.
///
/// Each node carries exactly one operation. On the wire a node is an object
/// with one of the `and`, `or`, `is` or `isNot` keys; objects with none or
/// several of them are rejected while decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ConditionExprWire", into = "ConditionExprWire")]
pub enum ConditionExpr {
    /// True when every child is true.
    And(Vec<ConditionExpr>),
    /// True when any child is true.
    Or(Vec<ConditionExpr>),
    /// True when the field value matches the literal.
    Is(ComparisonCondition),
    /// True when the field value does not match the literal.
    IsNot(ComparisonCondition),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ConditionExprWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    and: Option<Vec<ConditionExpr>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    or: Option<Vec<ConditionExpr>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    is: Option<ComparisonCondition>,
    #[serde(default, rename = "isNot", skip_serializing_if = "Option::is_none")]
    is_not: Option<ComparisonCondition>,
}

impl TryFrom<ConditionExprWire> for ConditionExpr {
    type Error = String;

    fn try_from(wire: ConditionExprWire) -> Result<Self, Self::Error> {
        let ConditionExprWire {
            and,
            or,
            is,
            is_not,
        } = wire;

        let mut operations = [
            and.map(Self::And),
            or.map(Self::Or),
            is.map(Self::Is),
            is_not.map(Self::IsNot),
        ]
        .into_iter()
        .flatten();

        match (operations.next(), operations.next()) {
            (Some(expr), None) => Ok(expr),
            (None, _) => {
                Err("condition must have at least one operation (and, or, is, isNot)".to_owned())
            }
            (Some(_), Some(_)) => {
                Err("condition can only have one operation (and, or, is, isNot)".to_owned())
            }
        }
    }
}

impl From<ConditionExpr> for ConditionExprWire {
    fn from(expr: ConditionExpr) -> Self {
        match expr {
            ConditionExpr::And(children) => Self {
                and: Some(children),
                ..Self::default()
            },
            ConditionExpr::Or(children) => Self {
                or: Some(children),
                ..Self::default()
            },
            ConditionExpr::Is(comparison) => Self {
                is: Some(comparison),
                ..Self::default()
            },
            ConditionExpr::IsNot(comparison) => Self {
                is_not: Some(comparison),
                ..Self::default()
            },
        }
    }
}

impl ConditionExpr {
    /// Creates an `is` leaf.
    #[must_use]
    pub fn is(field_id: impl Into<String>, value: Value) -> Self {
        Self::Is(ComparisonCondition::new(field_id, value))
    }

    /// Creates an `isNot` leaf.
    #[must_use]
    pub fn is_not(field_id: impl Into<String>, value: Value) -> Self {
        Self::IsNot(ComparisonCondition::new(field_id, value))
    }

    /// Decodes an expression from its JSON object form.
    pub fn from_json(value: Value) -> AppResult<Self> {
        serde_json::from_value(value).map_err(|error| {
            AppError::Validation(format!("invalid condition expression: {error}"))
        })
    }

    /// Evaluates the expression against run property fields and values.
    ///
    /// A leaf whose field or value is missing never matches, so `is` yields
    /// `false` and `isNot` yields `true`. Duplicate IDs resolve to the last entry.
    #[must_use]
    pub fn evaluate(&self, fields: &[PropertyField], values: &[PropertyValue]) -> bool {
        let fields_by_id: HashMap<&str, &PropertyField> = fields
            .iter()
            .map(|field| (field.id.as_str(), field))
            .collect();
        let values_by_field_id: HashMap<&str, &PropertyValue> = values
            .iter()
            .map(|value| (value.field_id.as_str(), value))
            .collect();

        self.evaluate_with(&fields_by_id, &values_by_field_id)
    }

    fn evaluate_with(
        &self,
        fields: &HashMap<&str, &PropertyField>,
        values: &HashMap<&str, &PropertyValue>,
    ) -> bool {
        match self {
            Self::And(children) => children
                .iter()
                .all(|child| child.evaluate_with(fields, values)),
            Self::Or(children) => children
                .iter()
                .any(|child| child.evaluate_with(fields, values)),
            Self::Is(comparison) => {
                Self::leaf_matches(comparison, fields, values).unwrap_or(false)
            }
            Self::IsNot(comparison) => {
                Self::leaf_matches(comparison, fields, values).is_none_or(|matched| !matched)
            }
        }
    }

    fn leaf_matches(
        comparison: &ComparisonCondition,
        fields: &HashMap<&str, &PropertyField>,
        values: &HashMap<&str, &PropertyValue>,
    ) -> Option<bool> {
        let field = fields.get(comparison.field_id.as_str())?;
        let value = values.get(comparison.field_id.as_str())?;
        Some(comparison.matches(field, value.value.as_ref()))
    }

    /// Validates structure, nesting depth and leaf value shapes.
    pub fn validate(&self, fields: &[PropertyField], max_depth: usize) -> AppResult<()> {
        self.validate_at(0, fields, max_depth)
    }

    fn validate_at(
        &self,
        current_depth: usize,
        fields: &[PropertyField],
        max_depth: usize,
    ) -> AppResult<()> {
        match self {
            Self::And(children) | Self::Or(children) => {
                if children.is_empty() {
                    return Err(AppError::Validation(format!(
                        "{} condition must have at least one nested condition",
                        self.operation_name()
                    )));
                }

                if current_depth >= max_depth {
                    return Err(AppError::Validation(format!(
                        "condition nesting depth exceeds maximum allowed ({max_depth})"
                    )));
                }

                children
                    .iter()
                    .try_for_each(|child| child.validate_at(current_depth + 1, fields, max_depth))
            }
            Self::Is(comparison) | Self::IsNot(comparison) => comparison.validate(fields),
        }
    }

    fn operation_name(&self) -> &'static str {
        match self {
            Self::And(_) => "and",
            Self::Or(_) => "or",
            Self::Is(_) => "is",
            Self::IsNot(_) => "isNot",
        }
    }

    /// Trims surrounding whitespace from string literals in every leaf.
    ///
    /// A `null` literal is stored as the empty string.
    pub fn sanitize(&mut self) {
        match self {
            Self::And(children) | Self::Or(children) => {
                children.iter_mut().for_each(Self::sanitize);
            }
            Self::Is(comparison) | Self::IsNot(comparison) => comparison.sanitize(),
        }
    }

    /// Renders a human-readable form, resolving field and option names.
    #[must_use]
    pub fn describe(&self, fields: &[PropertyField]) -> String {
        let fields_by_id: HashMap<&str, &PropertyField> = fields
            .iter()
            .map(|field| (field.id.as_str(), field))
            .collect();

        self.describe_with(&fields_by_id, false)
    }

    fn describe_with(&self, fields: &HashMap<&str, &PropertyField>, nested: bool) -> String {
        match self {
            Self::And(children) => Self::describe_group(children, " AND ", fields, nested),
            Self::Or(children) => Self::describe_group(children, " OR ", fields, nested),
            Self::Is(comparison) => comparison.describe(fields, false),
            Self::IsNot(comparison) => comparison.describe(fields, true),
        }
    }

    fn describe_group(
        children: &[ConditionExpr],
        separator: &str,
        fields: &HashMap<&str, &PropertyField>,
        nested: bool,
    ) -> String {
        let parts: Vec<String> = children
            .iter()
            .map(|child| child.describe_with(fields, true))
            .filter(|part| !part.is_empty())
            .collect();

        let joined = parts.join(separator);
        if nested && parts.len() > 1 {
            format!("({joined})")
        } else {
            joined
        }
    }

    /// Collects referenced field IDs and every string inside array literals.
    ///
    /// Option IDs are gathered on a best-effort basis: text leaves carry a bare
    /// string and contribute nothing.
    #[must_use]
    pub fn extract_property_ids(&self) -> (BTreeSet<String>, BTreeSet<String>) {
        let mut field_ids = BTreeSet::new();
        let mut option_ids = BTreeSet::new();

        self.for_each_comparison(&mut |comparison| {
            field_ids.insert(comparison.field_id.clone());
            if let Some(values) = decode_string_array(&comparison.value) {
                option_ids.extend(values.into_iter().map(str::to_owned));
            }
        });

        (field_ids, option_ids)
    }

    /// Rewrites every leaf field ID through `field_mapping`.
    ///
    /// Option IDs inside literals are left as they are; `_option_mapping` is
    /// accepted for call-site symmetry with the property copy result. Fails on
    /// the first unmapped field, possibly after earlier leaves were rewritten.
    pub fn swap_property_ids(
        &mut self,
        field_mapping: &HashMap<String, String>,
        _option_mapping: &HashMap<String, String>,
    ) -> AppResult<()> {
        self.for_each_comparison_mut(&mut |comparison| {
            let mapped = field_mapping.get(&comparison.field_id).ok_or_else(|| {
                AppError::Validation(format!(
                    "no field mapping found for field ID {}",
                    comparison.field_id
                ))
            })?;
            comparison.field_id.clone_from(mapped);
            Ok(())
        })
    }

    /// Returns whether any leaf references `field_id`.
    #[must_use]
    pub fn references_field(&self, field_id: &str) -> bool {
        let mut found = false;
        self.for_each_comparison(&mut |comparison| {
            found |= comparison.field_id == field_id;
        });
        found
    }

    fn for_each_comparison(&self, visit: &mut impl FnMut(&ComparisonCondition)) {
        match self {
            Self::And(children) | Self::Or(children) => {
                for child in children {
                    child.for_each_comparison(visit);
                }
            }
            Self::Is(comparison) | Self::IsNot(comparison) => visit(comparison),
        }
    }

    fn for_each_comparison_mut(
        &mut self,
        visit: &mut impl FnMut(&mut ComparisonCondition) -> AppResult<()>,
    ) -> AppResult<()> {
        match self {
            Self::And(children) | Self::Or(children) => children
                .iter_mut()
                .try_for_each(|child| child.for_each_comparison_mut(visit)),
            Self::Is(comparison) | Self::IsNot(comparison) => visit(comparison),
        }
    }
}

/// Reads a JSON string literal. `null` reads as the empty string.
fn decode_string(value: &Value) -> Option<&str> {
    match value {
        Value::String(content) => Some(content.as_str()),
        Value::Null => Some(""),
        _ => None,
    }
}

/// Reads a JSON array of strings. `null` reads as an empty array.
fn decode_string_array(value: &Value) -> Option<Vec<&str>> {
    match value {
        Value::Array(items) => items.iter().map(Value::as_str).collect(),
        Value::Null => Some(Vec::new()),
        _ => None,
    }
}

/// Case-insensitive equality under Unicode case folding.
fn equal_fold(left: &str, right: &str) -> bool {
    unicase::eq(left, right)
}

fn describe_value(field: Option<&PropertyField>, value: &Value) -> String {
    if let Some(field) = field
        && field.field_type.has_options()
        && let Some(option_ids) = decode_string_array(value)
    {
        let names: Vec<&str> = option_ids
            .into_iter()
            .map(|option_id| {
                field
                    .find_option(option_id)
                    .map_or(option_id, |option| option.name.as_str())
            })
            .collect();
        return describe_list(&names);
    }

    match value {
        Value::Null => "empty".to_owned(),
        Value::String(content) if content.is_empty() => "empty".to_owned(),
        Value::String(content) => format!("\"{content}\""),
        Value::Array(_) => match decode_string_array(value) {
            Some(items) => describe_list(&items),
            None => value.to_string(),
        },
        _ => value.to_string(),
    }
}

fn describe_list(items: &[&str]) -> String {
    match items {
        [] => "empty".to_owned(),
        [single] => (*single).to_owned(),
        _ => format!("[{}]", items.join(",")),
    }
}
