//! Credential resolution: decide which identifier namespace an ambiguous
//! login string belongs to, honoring the configured priority order.

use std::str::FromStr;

use crate::account::error::SettingsError;
use crate::account::settings::AuthSettings;
use crate::account::validators::{normalize_email, normalize_phone, valid_email, valid_phone, valid_username};

/// Identifier namespaces a login string may resolve into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMethod {
    Phone,
    Email,
    Username,
}

impl LoginMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Phone => "phone",
            Self::Email => "email",
            Self::Username => "username",
        }
    }

    /// Parse a comma-separated priority list such as `phone,email,username`.
    ///
    /// # Errors
    /// Returns [`SettingsError::MethodsEmpty`] for an empty list and
    /// [`SettingsError::UnknownMethod`] for unrecognized entries. Duplicates
    /// keep their first position.
    pub fn parse_list(list: &str) -> Result<Vec<Self>, SettingsError> {
        let mut methods = Vec::new();
        for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let method = entry.parse::<Self>()?;
            if !methods.contains(&method) {
                methods.push(method);
            }
        }
        if methods.is_empty() {
            return Err(SettingsError::MethodsEmpty);
        }
        Ok(methods)
    }
}

impl FromStr for LoginMethod {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "phone" => Ok(Self::Phone),
            "email" => Ok(Self::Email),
            "username" => Ok(Self::Username),
            other => Err(SettingsError::UnknownMethod(other.to_string())),
        }
    }
}

impl std::fmt::Display for LoginMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the namespace for `login`: walk the configured methods in priority
/// order and stop at the first whose validator accepts the string. Later
/// methods are never consulted, even if the chosen namespace ends up holding
/// no matching account. The settings constructor already rejected an empty
/// method list, so this never has to.
#[must_use]
pub fn resolve_login_method(login: &str, settings: &AuthSettings) -> Option<LoginMethod> {
    let login = login.trim();
    if login.is_empty() {
        return None;
    }

    settings.methods().iter().copied().find(|method| match method {
        LoginMethod::Phone => valid_phone(login),
        LoginMethod::Email => valid_email(&normalize_email(login)),
        LoginMethod::Username => valid_username(login),
    })
}

/// Normalized storage lookup key for a login string already resolved to
/// `method`. `None` when the string cannot be canonicalized after all.
#[must_use]
pub fn lookup_key(method: LoginMethod, login: &str) -> Option<String> {
    let login = login.trim();
    match method {
        LoginMethod::Phone => normalize_phone(login),
        LoginMethod::Email => Some(normalize_email(login)),
        LoginMethod::Username => Some(login.to_string()),
    }
}
