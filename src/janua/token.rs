//! Signed session token issuance and validation.
//!
//! Access and refresh tokens share one claims shape and one HS256 secret.
//! Validation pins the algorithm, checks expiry and issuer, and enforces
//! that the token kind matches the consuming endpoint.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::AuthError;

pub const ISSUER: &str = "janua";
pub const ACCESS_TOKEN_TTL_SECONDS: i64 = 15 * 60;
pub const REFRESH_TOKEN_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Distinguishes access tokens from refresh tokens.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    #[must_use]
    pub const fn ttl_seconds(self) -> i64 {
        match self {
            Self::Access => ACCESS_TOKEN_TTL_SECONDS,
            Self::Refresh => REFRESH_TOKEN_TTL_SECONDS,
        }
    }
}

/// Claims payload embedded in every token. Never persisted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    #[serde(rename = "type")]
    pub kind: TokenKind,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

/// Creates and verifies signed session tokens.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("validation", &self.validation)
            .finish()
    }
}

impl TokenIssuer {
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 5;
        validation.set_issuer(&[ISSUER]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.expose_secret().as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation,
        }
    }

    /// Issue a short-lived access token.
    pub fn issue_access(&self, user_id: Uuid, email: &str) -> Result<String, AuthError> {
        self.issue(user_id, email, TokenKind::Access)
    }

    /// Issue a long-lived refresh token.
    pub fn issue_refresh(&self, user_id: Uuid, email: &str) -> Result<String, AuthError> {
        self.issue(user_id, email, TokenKind::Refresh)
    }

    fn issue(&self, user_id: Uuid, email: &str, kind: TokenKind) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            kind,
            iat: now,
            exp: now + kind.ttl_seconds(),
            iss: ISSUER.to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|err| AuthError::Dependency(anyhow::Error::new(err)))
    }

    /// Validate a token and require the expected kind.
    ///
    /// Signature, algorithm, expiry, and issuer checks come from the pinned
    /// `Validation`; a kind mismatch is rejected with the same wire message
    /// as any other token failure.
    pub fn validate(&self, token: &str, expected: TokenKind) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|err| {
            match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid(err.to_string()),
            }
        })?;

        if data.claims.kind != expected {
            return Err(AuthError::WrongTokenKind);
        }

        Ok(data.claims)
    }

    /// Expiry timestamp recorded alongside a freshly issued refresh token.
    #[must_use]
    pub fn refresh_expires_at(&self) -> DateTime<Utc> {
        Utc::now() + Duration::seconds(REFRESH_TOKEN_TTL_SECONDS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(&SecretString::from("test-secret".to_string()))
    }

    #[test]
    fn access_token_round_trip() -> Result<(), AuthError> {
        let issuer = issuer();
        let user_id = Uuid::new_v4();

        let token = issuer.issue_access(user_id, "alice@example.com")?;
        let claims = issuer.validate(&token, TokenKind::Access)?;

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.exp - claims.iat, ACCESS_TOKEN_TTL_SECONDS);
        Ok(())
    }

    #[test]
    fn refresh_token_has_long_ttl() -> Result<(), AuthError> {
        let issuer = issuer();
        let token = issuer.issue_refresh(Uuid::new_v4(), "alice@example.com")?;
        let claims = issuer.validate(&token, TokenKind::Refresh)?;
        assert_eq!(claims.exp - claims.iat, REFRESH_TOKEN_TTL_SECONDS);
        Ok(())
    }

    #[test]
    fn expired_token_is_rejected_even_with_valid_signature() {
        let issuer = issuer();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "alice@example.com".to_string(),
            kind: TokenKind::Access,
            iat: now - 7200,
            exp: now - 3600,
            iss: ISSUER.to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(matches!(
            issuer.validate(&token, TokenKind::Access),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn wrong_kind_is_rejected() {
        let issuer = issuer();
        let token = issuer
            .issue_refresh(Uuid::new_v4(), "alice@example.com")
            .unwrap();

        assert!(matches!(
            issuer.validate(&token, TokenKind::Access),
            Err(AuthError::WrongTokenKind)
        ));
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let issuer = issuer();
        let other = TokenIssuer::new(&SecretString::from("other-secret".to_string()));
        let token = other
            .issue_access(Uuid::new_v4(), "alice@example.com")
            .unwrap();

        assert!(matches!(
            issuer.validate(&token, TokenKind::Access),
            Err(AuthError::TokenInvalid(_))
        ));
    }

    #[test]
    fn unexpected_algorithm_is_rejected() {
        let issuer = issuer();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "alice@example.com".to_string(),
            kind: TokenKind::Access,
            iat: now,
            exp: now + 60,
            iss: ISSUER.to_string(),
        };
        // Same secret, different HMAC variant: must not validate
        let token = encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(matches!(
            issuer.validate(&token, TokenKind::Access),
            Err(AuthError::TokenInvalid(_))
        ));
    }

    #[test]
    fn foreign_issuer_is_rejected() {
        let issuer = issuer();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "alice@example.com".to_string(),
            kind: TokenKind::Access,
            iat: now,
            exp: now + 60,
            iss: "someone-else".to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(matches!(
            issuer.validate(&token, TokenKind::Access),
            Err(AuthError::TokenInvalid(_))
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        let issuer = issuer();
        assert!(issuer.validate("not-a-token", TokenKind::Access).is_err());
        assert!(issuer.validate("", TokenKind::Access).is_err());
    }
}
