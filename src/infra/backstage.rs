//! HTTP clients for the Backstage backend: the auth plugin's userinfo
//! endpoint and the catalog's entity lookup.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use tracing::instrument;

use crate::domain::entity::{Entity, EntityRef};
use crate::error::{AppError, AppResult};
use crate::services::{CatalogService, IdentityService, UserInfo};

#[derive(Deserialize)]
struct UserInfoResponse {
    #[serde(default)]
    claims: Claims,
}

#[derive(Default, Deserialize)]
struct Claims {
    #[serde(default)]
    sub: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

pub struct BackstageIdentityClient {
    http: Client,
    base_url: String,
}

impl BackstageIdentityClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl IdentityService for BackstageIdentityClient {
    #[instrument(skip_all)]
    async fn user_info(&self, user_token: &str) -> AppResult<UserInfo> {
        let response = self
            .http
            .get(format!("{}/api/auth/v1/userinfo", self.base_url))
            .bearer_auth(user_token)
            .send()
            .await
            .map_err(|err| AppError::Internal(format!("failed to call identity service: {err}")))?;

        let response = check_status(response, "identity lookup").await?;
        let payload: UserInfoResponse = response.json().await.map_err(|err| {
            AppError::Internal(format!("failed to parse identity response: {err}"))
        })?;

        Ok(UserInfo {
            user_entity_ref: payload.claims.sub.filter(|sub| !sub.is_empty()),
        })
    }
}

pub struct BackstageCatalogClient {
    http: Client,
    base_url: String,
}

impl BackstageCatalogClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn entity_url(&self, entity_ref: &EntityRef) -> AppResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|err| AppError::Configuration(format!("invalid catalog URL: {err}")))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Configuration("catalog URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend([
                "api",
                "catalog",
                "entities",
                "by-name",
                entity_ref.kind.as_str(),
                entity_ref.namespace.as_str(),
                entity_ref.name.as_str(),
            ]);
        Ok(url)
    }
}

#[async_trait]
impl CatalogService for BackstageCatalogClient {
    #[instrument(skip(self, token))]
    async fn get_entity_by_ref(&self, entity_ref: &str, token: &str) -> AppResult<Option<Entity>> {
        let parsed = EntityRef::parse(entity_ref)?;
        let response = self
            .http
            .get(self.entity_url(&parsed)?)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|err| AppError::Internal(format!("failed to call catalog: {err}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = check_status(response, "catalog lookup").await?;
        let entity: Entity = response
            .json()
            .await
            .map_err(|err| AppError::Internal(format!("failed to parse catalog entity: {err}")))?;
        Ok(Some(entity))
    }
}

async fn check_status(response: Response, operation: &str) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ErrorResponse>()
        .await
        .map(|body| body.error.message)
        .ok();

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AppError::Authentication(
            message.unwrap_or_else(|| "Invalid credentials".to_string()),
        )),
        StatusCode::NOT_FOUND => Err(AppError::NotFound(
            message.unwrap_or_else(|| format!("{operation} returned 404")),
        )),
        _ => Err(AppError::Internal(message.unwrap_or_else(|| {
            format!("{operation} failed with {status}")
        }))),
    }
}
