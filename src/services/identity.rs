use async_trait::async_trait;

use crate::error::AppResult;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserInfo {
    pub user_entity_ref: Option<String>,
}

/// Resolves a caller's bearer token to the catalog user it was issued for.
#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn user_info(&self, user_token: &str) -> AppResult<UserInfo>;
}
