use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, header::AUTHORIZATION};
use serde_json::{Value, json};
use tracing::debug;

use crate::context::AppContext;
use crate::domain::incident::IncidentsData;
use crate::domain::query::IncidentQuery;
use crate::error::{AppError, AppResult};
use crate::workflow::incidents;

pub async fn health() -> Json<Value> {
    debug!("health check");
    Json(json!({ "status": "ok" }))
}

pub async fn list_incidents(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    query: Result<Query<IncidentQuery>, QueryRejection>,
) -> AppResult<Json<Vec<IncidentsData>>> {
    let token = bearer_token(&headers);
    let query = query
        .map(|Query(query)| query)
        .map_err(|rejection| AppError::Input(rejection.body_text()));
    let incidents = incidents::list_incidents(&ctx, token, query).await?;
    Ok(Json(incidents))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim_start().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
