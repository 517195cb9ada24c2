//! Federated login: one OAuth2 authorization-code round trip.
//!
//! Flow Overview:
//! 1) `/google/login` stores a random state cookie and redirects to the
//!    provider.
//! 2) The callback requires the state cookie to exactly match the returned
//!    query value (CSRF defense), then clears it: the state is single-use.
//! 3) Code exchange and profile fetch are terminal on failure; unverified
//!    provider emails are rejected outright.
//! 4) The federated identity maps to a local user by (provider, subject id),
//!    created on first sight, then the normal session tail runs.

use axum::{
    extract::{Extension, Query},
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, error, instrument};
use utoipa::IntoParams;

use super::establish_session;
use crate::cli::globals::GlobalArgs;
use crate::janua::{
    cookies::{self, CookiePolicy, OAUTH_STATE_COOKIE},
    error::AuthError,
    oauth,
    store::{self, InsertUserOutcome},
    token::TokenIssuer,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct CallbackQuery {
    pub state: Option<String>,
    pub code: Option<String>,
}

#[utoipa::path(
    get,
    path = "/google/login",
    responses(
        (status = 307, description = "Redirect to the provider authorization URL"),
    ),
    tag = "federation"
)]
#[instrument(skip_all)]
pub async fn google_login(
    globals: Extension<GlobalArgs>,
) -> Result<impl IntoResponse, AuthError> {
    let state = oauth::generate_state()?;
    let policy = CookiePolicy::new(globals.cookie_secure);

    let mut headers = HeaderMap::new();
    headers.append(
        SET_COOKIE,
        cookies::state_cookie(&state, policy)
            .map_err(|err| AuthError::Dependency(anyhow::Error::new(err)))?,
    );

    let url = globals.oauth.authorize_url(&state)?;
    debug!("redirecting to provider authorization URL");

    Ok((headers, Redirect::temporary(&url)))
}

#[utoipa::path(
    get,
    path = "/google/callback",
    params(CallbackQuery),
    responses(
        (status = 200, description = "Federated login successful, tokens issued", content_type = "application/json"),
        (status = 400, description = "State mismatch, missing code, or unverified email"),
    ),
    tag = "federation"
)]
#[instrument(skip_all)]
pub async fn google_callback(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    globals: Extension<GlobalArgs>,
    issuer: Extension<Arc<TokenIssuer>>,
    Query(query): Query<CallbackQuery>,
) -> Response {
    // CSRF defense comes first; nothing else runs on a mismatch, and the
    // state cookie survives so the legitimate round trip can still finish.
    if let Err(err) = validate_state(&headers, &query) {
        return err.into_response();
    }

    let policy = CookiePolicy::new(globals.cookie_secure);
    let Ok(clear_state) = cookies::clear_state_cookie(policy) else {
        return AuthError::Dependency(anyhow::anyhow!("failed to build state cookie"))
            .into_response();
    };

    // The state is single-use: whatever happens next, the cookie goes away.
    let mut response = match run_callback(&pool, &globals, &issuer, &headers, &query).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    };
    response.headers_mut().append(SET_COOKIE, clear_state);
    response
}

fn validate_state(headers: &HeaderMap, query: &CallbackQuery) -> Result<(), AuthError> {
    let Some(state_cookie) = cookies::extract_cookie(headers, OAUTH_STATE_COOKIE) else {
        return Err(AuthError::StateMismatch);
    };

    match query.state.as_deref() {
        Some(state) if !state.is_empty() && state == state_cookie => Ok(()),
        _ => Err(AuthError::StateMismatch),
    }
}

async fn run_callback(
    pool: &PgPool,
    globals: &GlobalArgs,
    issuer: &TokenIssuer,
    request_headers: &HeaderMap,
    query: &CallbackQuery,
) -> Result<Response, AuthError> {
    let code = query
        .code
        .as_deref()
        .filter(|code| !code.is_empty())
        .ok_or_else(|| AuthError::Validation("No code in callback".to_string()))?;

    let token = oauth::exchange_code(&globals.oauth, code).await?;
    debug!("token exchange successful");

    let profile = oauth::fetch_profile(&globals.oauth, &token.access_token).await?;
    debug!("fetched provider profile: {}", profile.email);

    if !profile.verified_email {
        return Err(AuthError::UnverifiedEmail);
    }

    let provider = globals.oauth.name.as_str();
    let user = match store::find_user_by_provider(pool, provider, &profile.id).await? {
        Some(user) => {
            debug!("existing federated user: {}", user.email);
            user
        }
        None => {
            // First federated login: create the user without a password hash
            let user = match store::insert_user(
                pool,
                &profile.email,
                None,
                Some((provider, &profile.id)),
            )
            .await?
            {
                InsertUserOutcome::Created(user) => user,
                InsertUserOutcome::Conflict => return Err(AuthError::DuplicateEmail),
            };
            debug!("created federated user: {}", user.email);

            // Role assignment is best-effort once the role exists
            let role_id = store::ensure_default_role(pool).await?;
            if let Err(err) = store::assign_role(pool, user.id, role_id).await {
                error!("Failed to assign default role: {err:#}");
            }

            user
        }
    };

    let session_headers = establish_session(
        pool,
        issuer,
        CookiePolicy::new(globals.cookie_secure),
        user.id,
        &user.email,
        request_headers,
    )
    .await?;

    Ok((
        StatusCode::OK,
        session_headers,
        Json(json!({
            "message": "Logged in with Google successfully",
            "user": {
                "id": user.id,
                "email": user.email,
                "name": profile.name,
                "picture": profile.picture,
                "created_at": user.created_at,
            },
        })),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header::COOKIE, HeaderValue};

    fn headers_with_state(state: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("oauth_state={state}")).unwrap(),
        );
        headers
    }

    #[test]
    fn matching_state_passes() {
        let query = CallbackQuery {
            state: Some("abc123".to_string()),
            code: Some("code".to_string()),
        };
        assert!(validate_state(&headers_with_state("abc123"), &query).is_ok());
    }

    #[test]
    fn missing_cookie_is_rejected() {
        let query = CallbackQuery {
            state: Some("abc123".to_string()),
            code: Some("code".to_string()),
        };
        assert!(matches!(
            validate_state(&HeaderMap::new(), &query),
            Err(AuthError::StateMismatch)
        ));
    }

    #[test]
    fn mismatched_state_is_rejected() {
        let query = CallbackQuery {
            state: Some("evil".to_string()),
            code: Some("code".to_string()),
        };
        assert!(matches!(
            validate_state(&headers_with_state("abc123"), &query),
            Err(AuthError::StateMismatch)
        ));
    }

    #[test]
    fn empty_state_query_is_rejected() {
        let query = CallbackQuery {
            state: Some(String::new()),
            code: Some("code".to_string()),
        };
        assert!(validate_state(&headers_with_state("abc123"), &query).is_err());

        let query = CallbackQuery {
            state: None,
            code: Some("code".to_string()),
        };
        assert!(validate_state(&headers_with_state("abc123"), &query).is_err());
    }
}
