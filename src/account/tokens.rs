//! State-bound verification and password-reset tokens.
//!
//! Tokens are never persisted. A token is the keyed hash of a record's
//! current state (owner, value, verified flag) plus a coarse day bucket;
//! validation re-derives the hash from the record's *current* state for each
//! bucket inside the expiry window. Flipping `is_verified` — the one mutation
//! a successful validation performs — therefore invalidates the very token
//! that triggered it, and editing the record's value mid-flow kills every
//! outstanding token through the hash mismatch alone.

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use crate::account::models::{ContactRecord, User};
use crate::account::settings::AuthSettings;

pub type HmacSha256 = Hmac<Sha256>;

const DAY_SECONDS: i64 = 86_400;

fn day_bucket(at: DateTime<Utc>) -> i64 {
    at.timestamp().div_euclid(DAY_SECONDS)
}

fn keyed_mac(secret: &SecretString, input: &str) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(input.as_bytes());
    mac
}

fn encode_mac(mac: HmacSha256) -> String {
    Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes())
}

/// Constant-time check of `token` against the MAC of `input` for any day
/// bucket in `[bucket(at) - ttl_days, bucket(at)]`.
fn validate_window<F>(
    secret: &SecretString,
    ttl_days: i64,
    token: &str,
    at: DateTime<Utc>,
    input_for: F,
) -> bool
where
    F: Fn(i64) -> String,
{
    let Ok(candidate) = Base64UrlUnpadded::decode_vec(token) else {
        return false;
    };

    let current = day_bucket(at);
    (0..=ttl_days).any(|offset| {
        let mac = keyed_mac(secret, &input_for(current - offset));
        mac.verify_slice(&candidate).is_ok()
    })
}

/// Token mint/check for contact-record verification links.
pub struct VerificationTokens<'a> {
    settings: &'a AuthSettings,
}

impl<'a> VerificationTokens<'a> {
    #[must_use]
    pub fn new(settings: &'a AuthSettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub fn issue(&self, record: &ContactRecord) -> String {
        self.issue_at(record, Utc::now())
    }

    /// Mint a token for `record` as of `at`. Exposed separately so expiry is
    /// testable without a clock hook.
    #[must_use]
    pub fn issue_at(&self, record: &ContactRecord, at: DateTime<Utc>) -> String {
        let input = state_input(record, day_bucket(at));
        encode_mac(keyed_mac(self.settings.token_secret(), &input))
    }

    #[must_use]
    pub fn validate(&self, record: &ContactRecord, token: &str) -> bool {
        self.validate_at(record, token, Utc::now())
    }

    /// True iff `token` matches the record's current state for some bucket in
    /// the expiry window. Malformed tokens validate as false, never error.
    #[must_use]
    pub fn validate_at(&self, record: &ContactRecord, token: &str, at: DateTime<Utc>) -> bool {
        validate_window(
            self.settings.token_secret(),
            self.settings.verification_token_ttl_days(),
            token,
            at,
            |bucket| state_input(record, bucket),
        )
    }
}

fn state_input(record: &ContactRecord, bucket: i64) -> String {
    format!(
        "{}:{}:{}:{}:{}",
        record.user_id,
        bucket,
        record.kind.tag(),
        record.value,
        record.is_verified
    )
}

/// Password-reset tokens: the same engine keyed off the user's own identity.
/// The hash input covers the current password hash, so completing a reset
/// (or any password change) invalidates all outstanding reset tokens.
pub struct ResetTokens<'a> {
    settings: &'a AuthSettings,
}

impl<'a> ResetTokens<'a> {
    #[must_use]
    pub fn new(settings: &'a AuthSettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub fn issue(&self, user: &User) -> String {
        self.issue_at(user, Utc::now())
    }

    #[must_use]
    pub fn issue_at(&self, user: &User, at: DateTime<Utc>) -> String {
        let input = reset_input(user, day_bucket(at));
        encode_mac(keyed_mac(self.settings.token_secret(), &input))
    }

    #[must_use]
    pub fn validate(&self, user: &User, token: &str) -> bool {
        self.validate_at(user, token, Utc::now())
    }

    #[must_use]
    pub fn validate_at(&self, user: &User, token: &str, at: DateTime<Utc>) -> bool {
        validate_window(
            self.settings.token_secret(),
            self.settings.verification_token_ttl_days(),
            token,
            at,
            |bucket| reset_input(user, bucket),
        )
    }
}

fn reset_input(user: &User, bucket: i64) -> String {
    format!(
        "{}:{}:reset:{}:{}",
        user.id, bucket, user.password_hash, user.is_active
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::models::ContactKind;
    use crate::account::resolver::LoginMethod;
    use chrono::Duration;
    use uuid::Uuid;

    fn settings() -> AuthSettings {
        AuthSettings::new(
            vec![LoginMethod::Email],
            SecretString::from("token-unit-test-secret"),
        )
        .expect("non-empty methods")
    }

    fn email_record() -> ContactRecord {
        ContactRecord {
            id: 42,
            user_id: Uuid::new_v4(),
            kind: ContactKind::Email,
            value: "a@b.com".to_string(),
            is_verified: false,
            created_at: Utc::now(),
        }
    }

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "alice1".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            first_name: None,
            last_name: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn token_round_trips_within_window() {
        let settings = settings();
        let tokens = VerificationTokens::new(&settings);
        let record = email_record();
        let issued_at = Utc::now();

        let token = tokens.issue_at(&record, issued_at);
        assert!(tokens.validate_at(&record, &token, issued_at));
        assert!(tokens.validate_at(&record, &token, issued_at + Duration::days(3)));
    }

    #[test]
    fn token_expires_past_window() {
        let settings = settings();
        let tokens = VerificationTokens::new(&settings);
        let record = email_record();
        let issued_at = Utc::now();

        let token = tokens.issue_at(&record, issued_at);
        assert!(!tokens.validate_at(
            &record,
            &token,
            issued_at + Duration::days(4) + Duration::seconds(1)
        ));
    }

    #[test]
    fn flipping_verified_invalidates_the_token() {
        let settings = settings();
        let tokens = VerificationTokens::new(&settings);
        let mut record = email_record();
        let issued_at = Utc::now();

        let token = tokens.issue_at(&record, issued_at);
        record.is_verified = true;
        assert!(!tokens.validate_at(&record, &token, issued_at));
    }

    #[test]
    fn editing_the_value_invalidates_the_token() {
        let settings = settings();
        let tokens = VerificationTokens::new(&settings);
        let mut record = email_record();
        let issued_at = Utc::now();

        let token = tokens.issue_at(&record, issued_at);
        record.value = "new@b.com".to_string();
        assert!(!tokens.validate_at(&record, &token, issued_at));
    }

    #[test]
    fn malformed_tokens_validate_as_false() {
        let settings = settings();
        let tokens = VerificationTokens::new(&settings);
        let record = email_record();

        assert!(!tokens.validate(&record, ""));
        assert!(!tokens.validate(&record, "not-base64!!"));
        assert!(!tokens.validate(&record, "AAAA")); // wrong MAC length
    }

    #[test]
    fn tokens_are_record_specific() {
        let settings = settings();
        let tokens = VerificationTokens::new(&settings);
        let record = email_record();
        let other = ContactRecord {
            id: 43,
            value: "c@d.com".to_string(),
            ..record.clone()
        };

        let token = tokens.issue(&record);
        assert!(!tokens.validate(&other, &token));
    }

    #[test]
    fn reset_token_dies_with_password_change() {
        let settings = settings();
        let tokens = ResetTokens::new(&settings);
        let mut user = user();
        let issued_at = Utc::now();

        let token = tokens.issue_at(&user, issued_at);
        assert!(tokens.validate_at(&user, &token, issued_at));

        user.password_hash = "$argon2id$changed".to_string();
        assert!(!tokens.validate_at(&user, &token, issued_at));
    }

    #[test]
    fn reset_token_dies_with_deactivation() {
        let settings = settings();
        let tokens = ResetTokens::new(&settings);
        let mut user = user();
        let issued_at = Utc::now();

        let token = tokens.issue_at(&user, issued_at);
        user.is_active = false;
        assert!(!tokens.validate_at(&user, &token, issued_at));
    }
}
