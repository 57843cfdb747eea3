use async_trait::async_trait;

use crate::domain::entity::Entity;
use crate::error::AppResult;

#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Returns `None` when the catalog has no entity for `entity_ref`.
    async fn get_entity_by_ref(&self, entity_ref: &str, token: &str) -> AppResult<Option<Entity>>;
}
