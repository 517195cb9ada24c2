//! Internal error taxonomy with a uniform wire-level translation.
//!
//! The variants keep the real cause for logs; the boundary collapses every
//! authentication failure of the same class into one client-visible message
//! so responses never reveal whether an account exists or why a token was
//! rejected.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no user for the presented email")]
    UnknownUser,

    #[error("user has no usable password hash")]
    MissingPasswordHash,

    #[error("password does not match the stored hash")]
    BadPassword,

    #[error("token rejected: {0}")]
    TokenInvalid(String),

    #[error("token expired")]
    TokenExpired,

    #[error("token kind does not match the consuming endpoint")]
    WrongTokenKind,

    #[error("no access token cookie on the request")]
    MissingToken,

    #[error("oauth state cookie missing or mismatched")]
    StateMismatch,

    #[error("federated email not verified by the provider")]
    UnverifiedEmail,

    #[error("email already registered")]
    DuplicateEmail,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Dependency(anyhow::Error),
}

impl AuthError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnknownUser
            | Self::MissingPasswordHash
            | Self::BadPassword
            | Self::TokenInvalid(_)
            | Self::TokenExpired
            | Self::WrongTokenKind
            | Self::MissingToken => StatusCode::UNAUTHORIZED,
            Self::StateMismatch | Self::UnverifiedEmail | Self::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::DuplicateEmail => StatusCode::CONFLICT,
            Self::Dependency(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The client-visible message. Credential and token failures collapse to
    /// one message per class regardless of the underlying cause.
    #[must_use]
    pub fn wire_message(&self) -> &'static str {
        match self {
            Self::UnknownUser | Self::MissingPasswordHash | Self::BadPassword => {
                "Invalid credentials"
            }
            Self::TokenInvalid(_) | Self::TokenExpired | Self::WrongTokenKind => {
                "Invalid or expired token"
            }
            Self::MissingToken => "Authentication required",
            Self::StateMismatch => "Invalid OAuth state",
            Self::UnverifiedEmail => "Unverified email",
            Self::DuplicateEmail => "Email already registered",
            Self::Validation(_) => "Invalid request",
            Self::Dependency(_) => "Server error",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match &self {
            Self::Dependency(err) => error!("request failed: {err:#}"),
            other => debug!("request rejected: {other}"),
        }
        (self.status(), self.wire_message().to_string()).into_response()
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Dependency(err)
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        Self::Dependency(anyhow::Error::new(err))
    }
}
