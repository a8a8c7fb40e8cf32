use std::collections::HashMap;

use async_trait::async_trait;
use runlist_application::PropertyFieldProvider;
use runlist_core::AppResult;
use runlist_domain::PropertyField;
use tokio::sync::RwLock;

/// In-memory property field catalogue keyed by playbook.
#[derive(Debug, Default)]
pub struct InMemoryPropertyFieldProvider {
    fields: RwLock<HashMap<String, Vec<PropertyField>>>,
}

impl InMemoryPropertyFieldProvider {
    /// Creates an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the property fields of one playbook.
    pub async fn set_property_fields(&self, playbook_id: &str, fields: Vec<PropertyField>) {
        self.fields
            .write()
            .await
            .insert(playbook_id.to_owned(), fields);
    }
}

#[async_trait]
impl PropertyFieldProvider for InMemoryPropertyFieldProvider {
    async fn list_property_fields(&self, playbook_id: &str) -> AppResult<Vec<PropertyField>> {
        Ok(self
            .fields
            .read()
            .await
            .get(playbook_id)
            .cloned()
            .unwrap_or_default())
    }
}
