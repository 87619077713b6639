use anyhow::anyhow;
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use regex::Regex;
use tracing::error;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    /// Hash with the same parameters as real accounts, checked when the email is unknown.
    static ref DECOY_HASH: Option<String> = hash_password("decoy-password-never-matches").ok();
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Argon2id PHC string with a fresh random salt.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "password hashing failed");
            anyhow!("password hashing failed: {e}")
        })
}

/// `Ok(false)` on mismatch. `Err` when `stored` is not a readable PHC string
/// or Argon2 itself fails.
pub fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let stored = PasswordHash::new(stored).map_err(|e| {
        error!(error = %e, "stored password hash is unreadable");
        anyhow!("stored password hash is unreadable: {e}")
    })?;
    match Argon2::default().verify_password(plain.as_bytes(), &stored) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow!("password verification failed: {e}")),
    }
}

/// Does the Argon2 work of a real check and discards the result, so rejecting
/// an unknown email costs as much as rejecting a wrong password.
pub fn verify_against_decoy(plain: &str) {
    if let Some(decoy) = DECOY_HASH.as_deref() {
        let _ = verify_password(plain, decoy);
    }
}
