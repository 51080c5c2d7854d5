//! Argon2id password hashing.

use std::sync::OnceLock;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use error::StoreError;

/// Hash a password into a PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, StoreError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!("Failed to hash password: {}", e);
            StoreError::Hashing(e.to_string())
        })
}

/// Check a password against a PHC hash. Unparseable hashes never match.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let parsed = match PasswordHash::new(password_hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!("Stored password hash is not a valid PHC string: {}", e);
            return false;
        }
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Hash a password on the blocking pool, keeping the async workers free.
pub async fn hash_password_blocking(password: &str) -> Result<String, StoreError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| {
            tracing::error!("Password hashing task failed: {}", e);
            StoreError::Unavailable(e.to_string())
        })?
}

/// [`verify_password`] on the blocking pool.
pub async fn verify_password_blocking(
    password: &str,
    password_hash: &str,
) -> Result<bool, StoreError> {
    let password = password.to_string();
    let password_hash = password_hash.to_string();
    tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
        .await
        .map_err(|e| {
            tracing::error!("Password verification task failed: {}", e);
            StoreError::Unavailable(e.to_string())
        })
}

/// A real hash of a throwaway password, checked against when the username
/// is unknown so that the lookup costs the same either way.
///
/// Failure is returned rather than papered over: an empty or unparseable
/// dummy would make unknown usernames measurably faster to reject.
pub fn dummy_hash() -> Result<&'static str, StoreError> {
    static DUMMY: OnceLock<String> = OnceLock::new();
    if let Some(hash) = DUMMY.get() {
        return Ok(hash.as_str());
    }
    let hash = hash_password("dummy-password-for-timing")?;
    Ok(DUMMY.get_or_init(|| hash).as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("password123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("password123", &hash));
        assert!(!verify_password("password124", &hash));
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password("password123").unwrap();
        let b = hash_password("password123").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_invalid_hash_never_matches() {
        assert!(!verify_password("password123", "password123"));
        assert!(!verify_password("", ""));
    }

    #[test]
    fn test_dummy_hash_is_a_real_hash() {
        let hash = dummy_hash().unwrap();
        assert_eq!(hash, dummy_hash().unwrap());
        assert!(PasswordHash::new(hash).is_ok());
        assert!(hash.starts_with("$argon2id$"));
        assert!(!verify_password("password123", hash));
    }

    #[tokio::test]
    async fn test_blocking_wrappers() {
        let hash = hash_password_blocking("password123").await.unwrap();
        assert!(verify_password_blocking("password123", &hash).await.unwrap());
        assert!(!verify_password_blocking("password124", &hash).await.unwrap());
    }
}
