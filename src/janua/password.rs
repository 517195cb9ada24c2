//! Password hashing and verification on the blocking thread pool.

use bcrypt::{hash, verify, DEFAULT_COST};

use super::error::AuthError;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Hash a plaintext password with bcrypt at the default work factor.
///
/// bcrypt is CPU-bound; the work runs on the blocking pool so the async
/// runtime keeps serving requests.
pub async fn hash_password(password: &str) -> Result<String, AuthError> {
    let password = password.to_string();

    tokio::task::spawn_blocking(move || hash(password, DEFAULT_COST))
        .await
        .map_err(|err| AuthError::Dependency(anyhow::Error::new(err)))?
        .map_err(|err| AuthError::Dependency(anyhow::Error::new(err)))
}

/// Compare a plaintext password against a stored bcrypt hash.
///
/// The comparison itself is constant-time within bcrypt. A malformed stored
/// hash verifies as `false` rather than erroring, so the caller's failure
/// path stays uniform.
pub async fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AuthError> {
    let password = password.to_string();
    let stored_hash = stored_hash.to_string();

    let matched = tokio::task::spawn_blocking(move || verify(password, &stored_hash))
        .await
        .map_err(|err| AuthError::Dependency(anyhow::Error::new(err)))?
        .unwrap_or(false);

    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify_round_trip() -> Result<(), AuthError> {
        let hashed = hash_password("correct horse battery").await?;
        assert!(verify_password("correct horse battery", &hashed).await?);
        assert!(!verify_password("wrong password", &hashed).await?);
        Ok(())
    }

    #[tokio::test]
    async fn verify_against_low_cost_hash() -> Result<(), AuthError> {
        // MIN_COST keeps the test fast; the production path uses DEFAULT_COST
        let hashed = bcrypt::hash("password1", 4).unwrap();
        assert!(verify_password("password1", &hashed).await?);
        assert!(!verify_password("password2", &hashed).await?);
        Ok(())
    }

    #[tokio::test]
    async fn malformed_hash_verifies_false() -> Result<(), AuthError> {
        assert!(!verify_password("password1", "not-a-bcrypt-hash").await?);
        assert!(!verify_password("password1", "").await?);
        Ok(())
    }

    #[test]
    fn min_password_length_matches_register_contract() {
        assert_eq!(MIN_PASSWORD_LENGTH, 8);
    }
}
