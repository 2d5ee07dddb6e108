use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

fn argon2_failure(step: &'static str, e: password_hash::Error) -> anyhow::Error {
    error!(error = %e, step, "argon2 failure");
    anyhow::anyhow!("argon2 {}: {}", step, e)
}

/// Salted Argon2 hash in PHC string format, as stored in `users.password_hash`.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| argon2_failure("hash", e))
}

/// `Ok(false)` on mismatch; `Err` only when `stored` is not a PHC string.
pub fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| argon2_failure("parse", e))?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_password_verifies_at_login() {
        let stored = hash_password("pw1").unwrap();
        assert!(stored.starts_with("$argon2id$"));
        assert!(!stored.contains("pw1"));
        assert!(verify_password("pw1", &stored).unwrap());
        assert!(!verify_password("pw2", &stored).unwrap());
        assert!(!verify_password("PW1", &stored).unwrap());
    }

    #[test]
    fn two_users_with_the_same_password_store_different_hashes() {
        let alice = hash_password("pw1").unwrap();
        let bob = hash_password("pw1").unwrap();
        assert_ne!(alice, bob);
        assert!(verify_password("pw1", &bob).unwrap());
    }

    #[test]
    fn non_ascii_passwords_round_trip() {
        let stored = hash_password("röntgen-Ω").unwrap();
        assert!(verify_password("röntgen-Ω", &stored).unwrap());
        assert!(!verify_password("rontgen-Ω", &stored).unwrap());
    }

    #[test]
    fn corrupted_stored_hash_is_an_error_not_a_mismatch() {
        let err = verify_password("pw1", "not-a-phc-string").unwrap_err();
        assert!(err.to_string().starts_with("argon2 parse"));
    }
}
