use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Supported property field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyFieldType {
    /// Free-form UTF-8 string field.
    Text,
    /// Single choice from the field option set.
    Select,
    /// Any number of choices from the field option set.
    Multiselect,
    /// Field type owned by the host that conditions cannot reference.
    #[serde(other)]
    Unsupported,
}

impl PropertyFieldType {
    /// Returns a stable storage value for the field type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Select => "select",
            Self::Multiselect => "multiselect",
            Self::Unsupported => "unsupported",
        }
    }

    /// Returns whether values reference option IDs.
    #[must_use]
    pub fn has_options(&self) -> bool {
        matches!(self, Self::Select | Self::Multiselect)
    }
}

/// One selectable option of a select or multiselect field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyOption {
    /// Stable option identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Optional display color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl PropertyOption {
    /// Creates an option without a color.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: None,
        }
    }
}

/// Typed property field metadata attached to a playbook or run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyField {
    /// Field identifier, unique within its playbook or run.
    pub id: String,
    /// Field type.
    #[serde(rename = "type")]
    pub field_type: PropertyFieldType,
    /// Display name.
    pub name: String,
    /// Ordered option set, only meaningful for select-like types.
    #[serde(default)]
    pub options: Vec<PropertyOption>,
}

impl PropertyField {
    /// Creates a text field.
    #[must_use]
    pub fn text(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            field_type: PropertyFieldType::Text,
            name: name.into(),
            options: Vec::new(),
        }
    }

    /// Creates a select field with the given options.
    #[must_use]
    pub fn select(
        id: impl Into<String>,
        name: impl Into<String>,
        options: Vec<PropertyOption>,
    ) -> Self {
        Self {
            id: id.into(),
            field_type: PropertyFieldType::Select,
            name: name.into(),
            options,
        }
    }

    /// Creates a multiselect field with the given options.
    #[must_use]
    pub fn multiselect(
        id: impl Into<String>,
        name: impl Into<String>,
        options: Vec<PropertyOption>,
    ) -> Self {
        Self {
            id: id.into(),
            field_type: PropertyFieldType::Multiselect,
            name: name.into(),
            options,
        }
    }

    /// Returns one option by identifier.
    #[must_use]
    pub fn find_option(&self, option_id: &str) -> Option<&PropertyOption> {
        self.options.iter().find(|option| option.id == option_id)
    }
}

/// Current value of one property field on a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyValue {
    /// Owning field identifier.
    pub field_id: String,
    /// JSON payload shaped by the field type. `None` means unset.
    #[serde(default)]
    pub value: Option<Value>,
}

impl PropertyValue {
    /// Creates a property value.
    #[must_use]
    pub fn new(field_id: impl Into<String>, value: Option<Value>) -> Self {
        Self {
            field_id: field_id.into(),
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{PropertyField, PropertyFieldType, PropertyOption};

    #[test]
    fn unknown_field_type_decodes_as_unsupported() {
        let field = serde_json::from_value::<PropertyField>(json!({
            "id": "owner_id",
            "type": "user",
            "name": "Owner"
        }));

        assert!(field.is_ok());
        let field = field.unwrap_or_else(|_| unreachable!());
        assert_eq!(field.field_type, PropertyFieldType::Unsupported);
        assert!(field.options.is_empty());
    }

    #[test]
    fn find_option_matches_by_id() {
        let field = PropertyField::select(
            "severity_id",
            "Severity",
            vec![
                PropertyOption::new("critical_id", "Critical"),
                PropertyOption::new("low_id", "Low"),
            ],
        );

        assert_eq!(
            field.find_option("low_id").map(|option| option.name.as_str()),
            Some("Low")
        );
        assert!(field.find_option("Low").is_none());
    }
}
