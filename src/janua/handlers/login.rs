use axum::{extract::Extension, http::HeaderMap, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::ToSchema;

use super::{establish_session, valid_email, UserSummary};
use crate::cli::globals::GlobalArgs;
use crate::janua::{
    cookies::CookiePolicy,
    error::AuthError,
    password::{self, MIN_PASSWORD_LENGTH},
    store,
    token::TokenIssuer,
};

#[derive(ToSchema, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    #[schema(format = Password)]
    pub password: String,
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful, tokens issued", body = UserSummary, content_type = "application/json"),
        (status = 400, description = "Malformed request body"),
        (status = 401, description = "Invalid credentials"),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn login(
    pool: Extension<PgPool>,
    globals: Extension<GlobalArgs>,
    issuer: Extension<Arc<TokenIssuer>>,
    headers: HeaderMap,
    payload: Option<Json<LoginRequest>>,
) -> Result<impl IntoResponse, AuthError> {
    let Some(Json(request)) = payload else {
        return Err(AuthError::Validation("Missing payload".to_string()));
    };

    debug!("login: {}", request.email);

    if !valid_email(&request.email) || request.password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::Validation("Invalid request".to_string()));
    }

    // Every credential failure below maps to the same wire response; the
    // client cannot tell an unknown email from a wrong password.
    let user = store::find_user_by_email(&pool, &request.email)
        .await?
        .ok_or(AuthError::UnknownUser)?;

    let stored_hash = user
        .password_hash
        .as_deref()
        .filter(|hash| !hash.is_empty())
        .ok_or(AuthError::MissingPasswordHash)?;

    if !password::verify_password(&request.password, stored_hash).await? {
        return Err(AuthError::BadPassword);
    }

    let response_headers = establish_session(
        &pool,
        &issuer,
        CookiePolicy::new(globals.cookie_secure),
        user.id,
        &user.email,
        &headers,
    )
    .await?;

    Ok((
        StatusCode::OK,
        response_headers,
        Json(json!({
            "message": "Logged in successfully",
            "user": UserSummary::from(&user),
        })),
    ))
}
