use secrecy::ExposeSecret;
use tracing::debug;

use crate::context::AppContext;
use crate::domain::incident::IncidentsData;
use crate::domain::query::IncidentQuery;
use crate::error::{AppError, AppResult};

/// Resolves the caller behind `user_token` to the email on their catalog
/// user entity.
pub async fn resolve_user_email(ctx: &AppContext, user_token: &str) -> AppResult<String> {
    let user_info = ctx.identity.user_info(user_token).await?;
    let user_ref = user_info.user_entity_ref.ok_or_else(|| {
        AppError::Input("User entity reference not found in user info".to_string())
    })?;

    let catalog_token = ctx
        .catalog_token
        .as_ref()
        .map(|token| token.expose_secret())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            AppError::Authentication("Plugin token is missing or invalid".to_string())
        })?;

    let entity = ctx
        .catalog
        .get_entity_by_ref(&user_ref, catalog_token)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User entity not found for ref: {user_ref}")))?;

    let email = entity
        .profile_email()
        .ok_or_else(|| AppError::NotFound(format!("Email not found for user {user_ref}")))?;

    debug!(
        user_ref = %user_ref,
        kind = %entity.kind,
        name = %entity.metadata.name,
        "resolved catalog user"
    );
    Ok(email.to_string())
}

/// Runs one `/incidents` request. `query` is the parsed query string, or the
/// input error it failed with; it is only consulted once the caller is known.
pub async fn list_incidents(
    ctx: &AppContext,
    user_token: Option<&str>,
    query: AppResult<IncidentQuery>,
) -> AppResult<Vec<IncidentsData>> {
    let user_token =
        user_token.ok_or_else(|| AppError::Authentication("Missing credentials".to_string()))?;

    let email = resolve_user_email(ctx, user_token).await?;
    let params = query?.into_params(Some(email))?;

    match ctx.incidents.fetch_incidents(&params).await {
        Ok(incidents) => Ok(incidents.into_iter().map(IncidentsData::from).collect()),
        Err(err @ (AppError::Input(_) | AppError::NotFound(_))) => Err(err),
        Err(err) => Err(AppError::FetchFailed(Box::new(err))),
    }
}
