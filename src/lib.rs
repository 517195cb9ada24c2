//! # Janua (Authentication & Session Service)
//!
//! `janua` authenticates end users of a web application. It verifies
//! email/password credentials or a federated (OAuth2) identity, issues signed
//! access and refresh tokens, persists session and device records, and
//! authorizes subsequent requests via a bearer-cookie check.
//!
//! ## Token Model
//!
//! Tokens are HS256-signed JWTs carrying the user id, email, and a token
//! kind (`access` or `refresh`). Access tokens live 15 minutes, refresh
//! tokens 7 days. Validation pins the signing algorithm and enforces that
//! the presented kind matches the consuming endpoint.
//!
//! ## Federation
//!
//! Federated login drives a single OAuth2 authorization-code round trip with
//! a random single-use state cookie as CSRF defense. Identities are mapped
//! to local users by (provider, subject id); first-time federated users are
//! created without a password hash and linked to the lazily-created default
//! role.
//!
//! ## Failure Reporting
//!
//! Authentication failures are reported uniformly on the wire: the client is
//! never told whether an email exists, a password was wrong, or a token was
//! expired versus malformed. The internal error type keeps the real cause
//! for logs.

pub mod cli;
pub mod janua;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(GIT_COMMIT_HASH.len() >= 7);
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
