use async_trait::async_trait;
use runlist_core::AppResult;
use runlist_domain::PropertyField;

/// Port resolving the property fields a playbook currently defines.
#[async_trait]
pub trait PropertyFieldProvider: Send + Sync {
    /// Lists property fields used as validation context for conditions.
    async fn list_property_fields(&self, playbook_id: &str) -> AppResult<Vec<PropertyField>>;
}
