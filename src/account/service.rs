//! Account operations: registration validation, authentication, and the
//! verification/reset confirmation flows that tie the token engine to
//! storage.

use anyhow::Result;
use base64ct::{Base64UrlUnpadded, Encoding};
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use uuid::Uuid;

use crate::account::error::{FieldErrors, RegisterError};
use crate::account::models::User;
use crate::account::password;
use crate::account::reference::decode_reference;
use crate::account::repo::{ContactRepo, NewAccount, UserRepo};
use crate::account::resolver::{lookup_key, resolve_login_method};
use crate::account::settings::AuthSettings;
use crate::account::tokens::{ResetTokens, VerificationTokens};
use crate::account::validators::{
    normalize_email, normalize_phone, valid_email, valid_username,
};

const REQUIRED_MESSAGE: &str = "This field is required";

/// Raw registration input as collected by the form/handler boundary.
#[derive(Debug)]
pub struct RegisterRequest {
    pub phone: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: SecretString,
    pub confirm_password: Option<SecretString>,
}

/// Registration fields after syntax validation and normalization.
#[derive(Debug, PartialEq, Eq)]
pub struct RegistrationData {
    pub username: String,
    pub phone: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

fn present(field: Option<&String>) -> Option<&str> {
    field.map(String::as_str).map(str::trim).filter(|s| !s.is_empty())
}

/// Check every field against the configured policy and collect *all*
/// failures into one field-error map instead of stopping at the first.
///
/// # Errors
/// Returns the field-error map when any field fails.
pub fn validate_register(
    settings: &AuthSettings,
    request: &RegisterRequest,
) -> Result<RegistrationData, FieldErrors> {
    let mut errors = FieldErrors::new();

    let phone = match present(request.phone.as_ref()) {
        Some(raw) => match normalize_phone(raw) {
            Some(phone) => Some(phone),
            None => {
                errors.add("phone", "Enter a valid phone number");
                None
            }
        },
        None => {
            errors.add("phone", REQUIRED_MESSAGE);
            None
        }
    };

    let username = match present(request.username.as_ref()) {
        Some(raw) => {
            if valid_username(raw) {
                Some(raw.to_string())
            } else {
                errors.add(
                    "username",
                    "Username should be 150 characters or fewer. Letters, digits and ./-/_ only.",
                );
                None
            }
        }
        None if settings.register_username_required() => {
            errors.add("username", REQUIRED_MESSAGE);
            None
        }
        // An omitted optional username still has to satisfy the UNIQUE
        // constraint, so substitute a generated one.
        None => Some(Uuid::new_v4().simple().to_string()),
    };

    let email = match present(request.email.as_ref()) {
        Some(raw) => {
            let email = normalize_email(raw);
            if valid_email(&email) {
                Some(Some(email))
            } else {
                errors.add("email", "Enter a valid email address");
                None
            }
        }
        None if settings.register_email_required() => {
            errors.add("email", REQUIRED_MESSAGE);
            None
        }
        None => Some(None),
    };

    let first_name = present(request.first_name.as_ref()).map(str::to_string);
    if first_name.is_none() && settings.register_first_name_required() {
        errors.add("first_name", REQUIRED_MESSAGE);
    }
    let last_name = present(request.last_name.as_ref()).map(str::to_string);
    if last_name.is_none() && settings.register_last_name_required() {
        errors.add("last_name", REQUIRED_MESSAGE);
    }

    if let Err(message) = password::validate_password_strength(&request.password) {
        errors.add("password", message);
    }
    if settings.register_confirm_password_required() {
        let confirmed = request
            .confirm_password
            .as_ref()
            .is_some_and(|confirm| {
                confirm.expose_secret() == request.password.expose_secret()
            });
        if !confirmed {
            errors.add("confirm_password", "Password didn't match");
        }
    }

    errors.into_result()?;

    // No errors were recorded, so every field resolved.
    match (phone, username, email) {
        (Some(phone), Some(username), Some(email)) => Ok(RegistrationData {
            username,
            phone,
            email,
            first_name,
            last_name,
        }),
        _ => {
            let mut errors = FieldErrors::new();
            errors.add("__all__", "Registration failed");
            Err(errors)
        }
    }
}

/// Validate, hash the password, and create the account with its contact
/// records in one atomic transaction.
///
/// # Errors
/// [`RegisterError::Invalid`] for field failures (including storage-detected
/// duplicates), [`RegisterError::Storage`] for infrastructure faults.
pub async fn register(
    pool: &PgPool,
    settings: &AuthSettings,
    request: RegisterRequest,
) -> Result<User, RegisterError> {
    let data = validate_register(settings, &request).map_err(RegisterError::Invalid)?;
    let password_hash = password::hash_password(&request.password)?;

    UserRepo::create_account(
        pool,
        NewAccount {
            username: data.username,
            password_hash,
            first_name: data.first_name,
            last_name: data.last_name,
            phone: data.phone,
            email: data.email,
        },
    )
    .await
}

/// Authenticate a `(login, password)` pair.
///
/// The login string is resolved to exactly one namespace in configured
/// priority order; the resolved account must pass the password check and be
/// active. Every failure path returns `Ok(None)` — the caller learns nothing
/// about which check failed, and a missing account burns the same hash work
/// as a wrong password.
///
/// # Errors
/// Returns an error only for storage faults.
pub async fn authenticate(
    pool: &PgPool,
    settings: &AuthSettings,
    login: &str,
    password: &SecretString,
) -> Result<Option<User>> {
    let Some(method) = resolve_login_method(login, settings) else {
        password::dummy_verify(password);
        return Ok(None);
    };
    let Some(key) = lookup_key(method, login) else {
        password::dummy_verify(password);
        return Ok(None);
    };
    let Some(user) = UserRepo::find_by_login(pool, method, &key).await? else {
        password::dummy_verify(password);
        return Ok(None);
    };

    if !password::verify_password(password, &user.password_hash) {
        return Ok(None);
    }
    if !user.is_active {
        return Ok(None);
    }

    Ok(Some(user))
}

/// Consume a verification link: decode the opaque reference, re-derive the
/// token against the record's current state, and flip the verified flag.
/// Every failure — malformed reference, unknown record, expired or
/// state-mismatched token — collapses into `false`.
///
/// # Errors
/// Returns an error only for storage faults.
pub async fn confirm_verification(
    pool: &PgPool,
    settings: &AuthSettings,
    idb64: &str,
    token: &str,
) -> Result<bool> {
    let Ok((kind, id)) = decode_reference(idb64) else {
        return Ok(false);
    };
    let Some(record) = ContactRepo::find(pool, kind, id).await? else {
        return Ok(false);
    };
    if !VerificationTokens::new(settings).validate(&record, token) {
        return Ok(false);
    }

    ContactRepo::mark_verified(pool, record.kind, record.id).await?;
    Ok(true)
}

/// Outcome of a password-reset confirmation.
#[derive(Debug, PartialEq, Eq)]
pub enum ResetOutcome {
    Completed,
    InvalidLink,
    WeakPassword(&'static str),
}

/// Consume a password-reset link and set the new password. The reset token
/// covers the current password hash, so it cannot be replayed after the
/// change completes.
///
/// # Errors
/// Returns an error only for storage faults.
pub async fn confirm_password_reset(
    pool: &PgPool,
    settings: &AuthSettings,
    uidb64: &str,
    token: &str,
    new_password: &SecretString,
) -> Result<ResetOutcome> {
    let Some(user_id) = decode_user_reference(uidb64) else {
        return Ok(ResetOutcome::InvalidLink);
    };
    let Some(user) = UserRepo::find_by_id(pool, user_id).await? else {
        return Ok(ResetOutcome::InvalidLink);
    };
    if !ResetTokens::new(settings).validate(&user, token) {
        return Ok(ResetOutcome::InvalidLink);
    }

    if let Err(message) = password::validate_password_strength(new_password) {
        return Ok(ResetOutcome::WeakPassword(message));
    }

    let password_hash = password::hash_password(new_password)?;
    UserRepo::set_password(pool, user.id, &password_hash).await?;
    Ok(ResetOutcome::Completed)
}

/// Encode a user id for reset URLs, mirroring the contact-record reference
/// format.
#[must_use]
pub fn encode_user_reference(id: Uuid) -> String {
    Base64UrlUnpadded::encode_string(id.to_string().as_bytes())
}

/// Reverse of [`encode_user_reference`]; malformed input is `None`.
#[must_use]
pub fn decode_user_reference(encoded: &str) -> Option<Uuid> {
    let bytes = Base64UrlUnpadded::decode_vec(encoded).ok()?;
    let text = std::str::from_utf8(&bytes).ok()?;
    Uuid::parse_str(text).ok()
}
