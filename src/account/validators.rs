//! Syntactic identifier checks. Pure predicates: no storage, no network,
//! and malformed input returns `false` instead of failing.

use regex::Regex;

const PHONE_MIN_DIGITS: usize = 8;
const PHONE_MAX_DIGITS: usize = 15;

/// Normalize an email for lookup/uniqueness checks.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
#[must_use]
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email))
}

/// Usernames follow the registration policy: letters, digits and `._-`,
/// 150 characters or fewer.
#[must_use]
pub fn valid_username(username: &str) -> bool {
    Regex::new(r"^[A-Za-z0-9._-]{1,150}$").is_ok_and(|regex| regex.is_match(username))
}

/// Canonicalize a phone number, stripping the separators people type.
/// International numbers keep their `+` prefix; bare national digit strings
/// are accepted verbatim. Returns `None` when the input is not phone-shaped.
#[must_use]
pub fn normalize_phone(phone: &str) -> Option<String> {
    let trimmed = phone.trim();
    let (prefix, rest) = match trimmed.strip_prefix('+') {
        Some(rest) => ("+", rest),
        None => ("", trimmed),
    };

    let mut digits = rest.to_string();
    digits.retain(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'));

    if digits.len() < PHONE_MIN_DIGITS || digits.len() > PHONE_MAX_DIGITS {
        return None;
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    Some(format!("{prefix}{digits}"))
}

/// Phone syntax check; accepts anything [`normalize_phone`] can canonicalize.
#[must_use]
pub fn valid_phone(phone: &str) -> bool {
    normalize_phone(phone).is_some()
}
