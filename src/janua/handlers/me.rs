use anyhow::anyhow;
use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::instrument;

use super::principal::require_auth;
use crate::janua::{error::AuthError, store, token::TokenIssuer};

#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Authenticated user and most recently seen device", content_type = "application/json"),
        (status = 401, description = "Missing or invalid access token"),
    ),
    tag = "me"
)]
#[instrument(skip_all)]
pub async fn me(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    issuer: Extension<Arc<TokenIssuer>>,
) -> Result<impl IntoResponse, AuthError> {
    let principal = require_auth(&headers, &issuer)?;

    let profile = store::fetch_user_with_latest_device(&pool, principal.user_id)
        .await?
        .ok_or_else(|| AuthError::Dependency(anyhow!("no user row for a validated token")))?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "user": {
                "id": profile.user_id,
                "email": profile.email,
            },
            "device": {
                "name": profile.device_name,
                "last_seen": profile.device_last_seen,
            },
        })),
    ))
}
