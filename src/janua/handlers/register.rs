use axum::{extract::Extension, http::HeaderMap, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, error, instrument};
use utoipa::ToSchema;

use super::{establish_session, valid_email, UserSummary};
use crate::cli::globals::GlobalArgs;
use crate::janua::{
    cookies::CookiePolicy,
    error::AuthError,
    password::{self, MIN_PASSWORD_LENGTH},
    store::{self, InsertUserOutcome},
    token::TokenIssuer,
};

#[derive(ToSchema, Deserialize, Debug)]
pub struct RegisterRequest {
    pub email: String,
    #[schema(format = Password)]
    pub password: String,
}

#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration successful, tokens issued", body = UserSummary, content_type = "application/json"),
        (status = 400, description = "Malformed email or password"),
        (status = 409, description = "Email already registered"),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn register(
    pool: Extension<PgPool>,
    globals: Extension<GlobalArgs>,
    issuer: Extension<Arc<TokenIssuer>>,
    headers: HeaderMap,
    payload: Option<Json<RegisterRequest>>,
) -> Result<impl IntoResponse, AuthError> {
    let Some(Json(request)) = payload else {
        return Err(AuthError::Validation("Missing payload".to_string()));
    };

    debug!("register: {}", request.email);

    if !valid_email(&request.email) {
        return Err(AuthError::Validation("Invalid email".to_string()));
    }

    if request.password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let password_hash = password::hash_password(&request.password).await?;

    let user = match store::insert_user(&pool, &request.email, Some(&password_hash), None).await? {
        InsertUserOutcome::Created(user) => user,
        InsertUserOutcome::Conflict => return Err(AuthError::DuplicateEmail),
    };

    // Role assignment is best-effort once the role exists
    let role_id = store::ensure_default_role(&pool).await?;
    if let Err(err) = store::assign_role(&pool, user.id, role_id).await {
        error!("Failed to assign default role: {err:#}");
    }

    // Auto-login: registration ends with the same cookies as a login
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
        StatusCode::CREATED,
        response_headers,
        Json(json!({
            "message": "User registered and logged in successfully",
            "user": UserSummary::from(&user),
        })),
    ))
}
