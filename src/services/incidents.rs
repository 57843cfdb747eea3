use async_trait::async_trait;

use crate::domain::incident::IncidentPick;
use crate::domain::query::IncidentQueryParams;
use crate::error::AppResult;

#[async_trait]
pub trait IncidentService: Send + Sync {
    async fn fetch_incidents(&self, params: &IncidentQueryParams) -> AppResult<Vec<IncidentPick>>;
}
