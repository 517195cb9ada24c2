use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::instrument;

use crate::cli::globals::GlobalArgs;
use crate::janua::{
    cookies::{self, CookiePolicy, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE},
    error::AuthError,
};

#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 200, description = "Both auth cookies cleared"),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn logout(globals: Extension<GlobalArgs>) -> Result<impl IntoResponse, AuthError> {
    let policy = CookiePolicy::new(globals.cookie_secure);

    // No session lookup here: clearing the cookies is all logout does
    let mut headers = HeaderMap::new();
    headers.append(
        SET_COOKIE,
        cookies::clear_cookie(ACCESS_TOKEN_COOKIE, policy)
            .map_err(|err| AuthError::Dependency(anyhow::Error::new(err)))?,
    );
    headers.append(
        SET_COOKIE,
        cookies::clear_cookie(REFRESH_TOKEN_COOKIE, policy)
            .map_err(|err| AuthError::Dependency(anyhow::Error::new(err)))?,
    );

    Ok((
        StatusCode::OK,
        headers,
        Json(json!({ "message": "Logged out successfully" })),
    ))
}
