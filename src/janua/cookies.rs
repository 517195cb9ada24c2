//! Cookie construction and extraction for the auth endpoints.
//!
//! One `CookiePolicy` is consumed by both the password and federated login
//! paths; the Secure flag is configuration, not call-site discretion.

use axum::http::{
    header::{InvalidHeaderValue, COOKIE},
    HeaderMap, HeaderValue,
};

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

pub const OAUTH_STATE_MAX_AGE_SECONDS: i64 = 60 * 60;

#[derive(Clone, Copy, Debug)]
pub struct CookiePolicy {
    pub secure: bool,
}

impl CookiePolicy {
    #[must_use]
    pub const fn new(secure: bool) -> Self {
        Self { secure }
    }
}

/// Build an `HttpOnly` auth cookie carrying a signed token.
pub fn auth_cookie(
    name: &str,
    value: &str,
    max_age_seconds: i64,
    policy: CookiePolicy,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie =
        format!("{name}={value}; Path=/; HttpOnly; SameSite=Strict; Max-Age={max_age_seconds}");
    if policy.secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Build an expired cookie that clears `name` in the browser.
pub fn clear_cookie(name: &str, policy: CookiePolicy) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{name}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0");
    if policy.secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Build the transient CSRF state cookie for the federation round trip.
///
/// `SameSite=Lax`, not `Strict`: the cookie must accompany the top-level
/// navigation back from the provider.
pub fn state_cookie(value: &str, policy: CookiePolicy) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!(
        "{OAUTH_STATE_COOKIE}={value}; Path=/; HttpOnly; SameSite=Lax; \
         Max-Age={OAUTH_STATE_MAX_AGE_SECONDS}"
    );
    if policy.secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Expire the CSRF state cookie; it is single-use.
pub fn clear_state_cookie(policy: CookiePolicy) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{OAUTH_STATE_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if policy.secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Pull a named cookie value out of the request headers.
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == name {
            return Some(val.to_string());
        }
    }
    None
}
