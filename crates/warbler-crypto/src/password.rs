use std::sync::LazyLock;

use anyhow::{Result, anyhow};
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use tracing::warn;

/// Stand-in credential checked when the account does not exist, so a failed
/// login costs the same Argon2 work whether or not the username is taken.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("warbler-no-such-user").ok());

/// Hash a plaintext password with Argon2id and a fresh random salt.
pub fn hash_password(plaintext: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| anyhow!("Password hashing failed: {}", e))?;

    Ok(hash.to_string())
}

/// Check a plaintext password against a stored PHC string.
/// A stored value that does not parse never verifies.
pub fn verify_password(plaintext: &str, stored: &str) -> bool {
    let parsed = match PasswordHash::new(stored) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Stored credential is not a valid PHC string: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}

/// Run a verification that always fails, for logins naming no account.
pub fn reject_unknown_user(plaintext: &str) -> bool {
    match DUMMY_HASH.as_deref() {
        Some(stored) => {
            verify_password(plaintext, stored);
            false
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_original_password() {
        let stored = hash_password("testuser1").unwrap();

        assert_ne!(stored, "testuser1");
        assert!(stored.starts_with("$argon2id$"));
        assert!(verify_password("testuser1", &stored));
    }

    #[test]
    fn wrong_password_fails() {
        let stored = hash_password("correct horse").unwrap();
        assert!(!verify_password("battery staple", &stored));
    }

    #[test]
    fn salts_differ_between_hashes() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_stored_credential_never_verifies() {
        assert!(!verify_password("HASHED_PASSWORD", "HASHED_PASSWORD"));
        assert!(!verify_password("", ""));
    }

    #[test]
    fn unknown_user_check_does_real_work_and_fails() {
        let stored = DUMMY_HASH.as_deref().unwrap();
        assert!(PasswordHash::new(stored).is_ok());

        assert!(!reject_unknown_user("warbler-no-such-user"));
        assert!(!reject_unknown_user("anything"));
    }
}
