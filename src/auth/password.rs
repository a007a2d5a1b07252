//! Password hashing: PBKDF2-HMAC-SHA256 with a per-user random salt.
//!
//! Stored form: `pbkdf2-sha256$<iterations>$<salt>$<hash>` with base64
//! (standard, unpadded) salt and hash. The iteration count travels with
//! the hash so it can be raised without invalidating existing users.

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::AuthError;

pub const DEFAULT_ITERATIONS: u32 = 600_000;
pub const SALT_LENGTH: usize = 16;
pub const HASH_LENGTH: usize = 32;

const SCHEME: &str = "pbkdf2-sha256";

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str, iterations: u32) -> String {
    let salt = generate_salt();
    let hash = derive(password, &salt, iterations);
    format!(
        "{SCHEME}${iterations}${}${}",
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(hash)
    )
}

/// Check a password against a stored hash string.
///
/// `Ok(false)` is a wrong password; `Err` means the stored value is not
/// something `hash_password` produced.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, AuthError> {
    let mut parts = stored.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(hash), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return Err(AuthError::CorruptedHash);
    };

    if scheme != SCHEME {
        return Err(AuthError::CorruptedHash);
    }
    let iterations: u32 = iterations.parse().map_err(|_| AuthError::CorruptedHash)?;
    let salt = STANDARD_NO_PAD
        .decode(salt)
        .map_err(|_| AuthError::CorruptedHash)?;
    let expected = STANDARD_NO_PAD
        .decode(hash)
        .map_err(|_| AuthError::CorruptedHash)?;
    if expected.len() != HASH_LENGTH || iterations == 0 {
        return Err(AuthError::CorruptedHash);
    }

    let actual = derive(password, &salt, iterations);
    Ok(actual[..].ct_eq(&expected[..]).into())
}

/// Run `hash_password` on the blocking pool; PBKDF2 at production
/// iteration counts takes long enough to stall a runtime worker.
pub async fn hash_password_blocking(password: String, iterations: u32) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || hash_password(&password, iterations))
        .await
        .map_err(|e| AuthError::Internal(format!("hash task failed: {e}")))
}

/// Blocking-pool counterpart of `verify_password`.
pub async fn verify_password_blocking(password: String, stored: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(|e| AuthError::Internal(format!("verify task failed: {e}")))?
}

fn derive(password: &str, salt: &[u8], iterations: u32) -> [u8; HASH_LENGTH] {
    let mut out = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut out);
    out
}

fn generate_salt() -> [u8; SALT_LENGTH] {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST: u32 = 1_000;

    #[test]
    fn correct_password_verifies() {
        let stored = hash_password("correct horse", FAST);
        assert!(verify_password("correct horse", &stored).unwrap());
    }

    #[test]
    fn wrong_password_fails() {
        let stored = hash_password("correct horse", FAST);
        assert!(!verify_password("battery staple", &stored).unwrap());
    }

    #[test]
    fn same_password_gets_different_salts() {
        let a = hash_password("pw", FAST);
        let b = hash_password("pw", FAST);
        assert_ne!(a, b);
    }

    #[test]
    fn stored_form_carries_iterations() {
        let stored = hash_password("pw", 1234);
        assert!(stored.starts_with("pbkdf2-sha256$1234$"));
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("pw", "not-a-hash").is_err());
        assert!(verify_password("pw", "bcrypt$10$abc$def").is_err());
        assert!(verify_password("pw", "pbkdf2-sha256$0$AAAA$AAAA").is_err());
    }

    #[tokio::test]
    async fn blocking_variants_agree() {
        let stored = hash_password_blocking("pw".into(), FAST).await.unwrap();
        assert!(verify_password_blocking("pw".into(), stored.clone()).await.unwrap());
        assert!(!verify_password_blocking("nope".into(), stored).await.unwrap());
    }
}
