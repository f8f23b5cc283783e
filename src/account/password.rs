//! Argon2id password hashing and verification.

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2, PasswordHash, PasswordVerifier,
};
use secrecy::{ExposeSecret, SecretString};

/// Throwaway hash verified when no account matches a login, so the response
/// time does not reveal whether the account exists.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$gZiV/M1gPc22ElAH/Jh1Hw$CWOrkoo7oJBQ/iyh7uJ0LO2aLEfrHwTWllSAxT0zRno";

const PASSWORD_MIN_LENGTH: usize = 8;

/// Hash a password for storage.
///
/// # Errors
/// Returns an error if hashing fails.
pub fn hash_password(password: &SecretString) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.expose_secret().as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash password: {err}"))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored hash. Malformed hashes verify as false.
#[must_use]
pub fn verify_password(password: &SecretString, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.expose_secret().as_bytes(), &parsed)
        .is_ok()
}

/// Burn the same work as a real verification when there is no account to
/// check against.
pub fn dummy_verify(password: &SecretString) {
    let _ = verify_password(password, DUMMY_HASH);
}

/// Registration-form password policy: minimum length, at least one letter
/// and one digit.
///
/// # Errors
/// Returns the user-facing message for the first violated rule.
pub fn validate_password_strength(password: &SecretString) -> Result<(), &'static str> {
    let password = password.expose_secret();
    if password.chars().count() < PASSWORD_MIN_LENGTH {
        return Err("Password must be at least 8 characters");
    }
    if !password.chars().any(char::is_alphabetic) {
        return Err("Password must contain a letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain a digit");
    }
    Ok(())
}
