//! Authenticated principal extraction for protected routes.
//!
//! The gate trusts the signed claims: it validates the access cookie and
//! returns the caller's identity without touching the database.

use axum::http::HeaderMap;
use uuid::Uuid;

use crate::janua::{
    cookies::{self, ACCESS_TOKEN_COOKIE},
    error::AuthError,
    token::{TokenIssuer, TokenKind},
};

/// Caller identity resolved from a validated access token.
#[derive(Clone, Debug)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: String,
}

/// Resolve the access cookie into a principal, failing closed on any
/// missing or invalid token.
pub fn require_auth(headers: &HeaderMap, issuer: &TokenIssuer) -> Result<Principal, AuthError> {
    let token =
        cookies::extract_cookie(headers, ACCESS_TOKEN_COOKIE).ok_or(AuthError::MissingToken)?;

    let claims = issuer.validate(&token, TokenKind::Access)?;

    Ok(Principal {
        user_id: claims.sub,
        email: claims.email,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header::COOKIE, HeaderValue};
    use secrecy::SecretString;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(&SecretString::from("test-secret".to_string()))
    }

    fn headers_with_cookie(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("access_token={token}")).unwrap(),
        );
        headers
    }

    #[test]
    fn resolves_valid_access_token() {
        let issuer = issuer();
        let user_id = Uuid::new_v4();
        let token = issuer.issue_access(user_id, "alice@example.com").unwrap();

        let principal = require_auth(&headers_with_cookie(&token), &issuer).unwrap();
        assert_eq!(principal.user_id, user_id);
        assert_eq!(principal.email, "alice@example.com");
    }

    #[test]
    fn missing_cookie_fails_closed() {
        let issuer = issuer();
        assert!(matches!(
            require_auth(&HeaderMap::new(), &issuer),
            Err(AuthError::MissingToken)
        ));
    }

    #[test]
    fn refresh_token_is_not_accepted_as_access() {
        let issuer = issuer();
        let token = issuer
            .issue_refresh(Uuid::new_v4(), "alice@example.com")
            .unwrap();

        assert!(matches!(
            require_auth(&headers_with_cookie(&token), &issuer),
            Err(AuthError::WrongTokenKind)
        ));
    }

    #[test]
    fn tampered_token_fails_closed() {
        let issuer = issuer();
        let mut token = issuer
            .issue_access(Uuid::new_v4(), "alice@example.com")
            .unwrap();
        token.push('x');

        assert!(require_auth(&headers_with_cookie(&token), &issuer).is_err());
    }
}
