//! OAuth2 token acquisition against the ServiceNow token endpoint.
//!
//! Client credentials travel in the form body rather than a Basic header,
//! which is what `oauth_token.do` expects.

use reqwest::Client;
use reqwest::header::ACCEPT;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::config::{OAuthConfig, OAuthGrant};
use crate::error::{AppError, AppResult};

#[derive(Serialize)]
struct TokenRequest<'a> {
    grant_type: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

#[instrument(skip(http, oauth), fields(grant_type = oauth.grant.grant_type(), token_url = %oauth.token_url))]
pub async fn fetch_access_token(http: &Client, oauth: &OAuthConfig) -> AppResult<SecretString> {
    let (username, password) = match &oauth.grant {
        OAuthGrant::ClientCredentials => (None, None),
        OAuthGrant::Password { username, password } => {
            (Some(username.as_str()), Some(password.expose_secret()))
        }
    };

    let request = TokenRequest {
        grant_type: oauth.grant.grant_type(),
        client_id: &oauth.client_id,
        client_secret: oauth.client_secret.expose_secret(),
        username,
        password,
    };

    let response = http
        .post(&oauth.token_url)
        .header(ACCEPT, "application/json")
        .form(&request)
        .send()
        .await
        .map_err(|err| AppError::Upstream(format!("failed to call token endpoint: {err}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unable to read response>".to_string());
        return Err(AppError::Upstream(format!(
            "token endpoint responded with {status}: {body}"
        )));
    }

    let payload: TokenResponse = response
        .json()
        .await
        .map_err(|err| AppError::Upstream(format!("failed to parse token response: {err}")))?;

    payload
        .access_token
        .filter(|token| !token.is_empty())
        .map(SecretString::from)
        .ok_or_else(|| AppError::Upstream("Failed to obtain access token".to_string()))
}
