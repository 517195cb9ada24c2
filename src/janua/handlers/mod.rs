pub mod health;
pub use self::health::health;

pub mod register;
pub use self::register::register;

pub mod login;
pub use self::login::login;

pub mod logout;
pub use self::logout::logout;

pub mod me;
pub use self::me::me;

pub mod federated;
pub use self::federated::{google_callback, google_login};

pub mod principal;

// common functions for the handlers
use axum::http::{
    header::{SET_COOKIE, USER_AGENT},
    HeaderMap,
};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use sqlx::PgPool;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    cookies::{self, CookiePolicy, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE},
    device,
    error::AuthError,
    store,
    token::{TokenIssuer, ACCESS_TOKEN_TTL_SECONDS, REFRESH_TOKEN_TTL_SECONDS},
};

/// User fields echoed back by the login/registration endpoints.
#[derive(ToSchema, Serialize, Debug)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<&store::UserRecord> for UserSummary {
    fn from(user: &store::UserRecord) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            created_at: user.created_at,
        }
    }
}

pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").map_or(false, |re| re.is_match(email))
}

/// Client IP for device reconciliation, from common proxy headers.
pub fn client_ip(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }
    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map_or_else(|| "unknown".to_string(), str::to_string)
}

pub fn user_agent(headers: &HeaderMap) -> String {
    headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Shared post-authentication tail for the password, registration, and
/// federated paths: mint both tokens, persist the session row, reconcile
/// the device, and return the two `Set-Cookie` headers.
///
/// Device reconciliation is best-effort; a failure is logged and never
/// blocks the login.
pub(crate) async fn establish_session(
    pool: &PgPool,
    issuer: &TokenIssuer,
    policy: CookiePolicy,
    user_id: Uuid,
    email: &str,
    request_headers: &HeaderMap,
) -> Result<HeaderMap, AuthError> {
    let access_token = issuer.issue_access(user_id, email)?;
    let refresh_token = issuer.issue_refresh(user_id, email)?;

    store::create_session(pool, user_id, &refresh_token, issuer.refresh_expires_at()).await?;

    let profile = device::profile(&user_agent(request_headers));
    let ip = client_ip(request_headers);
    if let Err(err) = store::upsert_device(pool, user_id, &profile, &ip).await {
        error!("Failed to reconcile device: {err:#}");
    }

    let mut headers = HeaderMap::new();
    headers.append(
        SET_COOKIE,
        cookies::auth_cookie(
            ACCESS_TOKEN_COOKIE,
            &access_token,
            ACCESS_TOKEN_TTL_SECONDS,
            policy,
        )
        .map_err(|err| AuthError::Dependency(anyhow::Error::new(err)))?,
    );
    headers.append(
        SET_COOKIE,
        cookies::auth_cookie(
            REFRESH_TOKEN_COOKIE,
            &refresh_token,
            REFRESH_TOKEN_TTL_SECONDS,
            policy,
        )
        .map_err(|err| AuthError::Dependency(anyhow::Error::new(err)))?,
    );

    Ok(headers)
}
