use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Configuration problems that must abort startup, never a request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("authentication methods can't be empty")]
    MethodsEmpty,
    #[error("unknown authentication method: {0}")]
    UnknownMethod(String),
}

/// Failures while decoding an opaque contact reference.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("invalid base64url encoding")]
    Base64,
    #[error("reference payload is not valid UTF-8")]
    Utf8,
    #[error("reference payload too short")]
    TooShort,
    #[error("unknown record kind tag")]
    UnknownKind,
    #[error("invalid record id")]
    InvalidId,
}

/// Field-keyed validation messages returned to the form boundary.
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

/// Registration failure: either field-level validation (including duplicates
/// detected by the storage unique constraints) or a genuine storage fault.
#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("registration validation failed")]
    Invalid(FieldErrors),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Contact record creation failure.
#[derive(Debug, Error)]
pub enum ContactError {
    #[error("{0} already exists")]
    Duplicate(crate::account::models::ContactKind),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_keep_first_message() {
        let mut errors = FieldErrors::new();
        errors.add("email", "Email already exists");
        errors.add("email", "second message is ignored");
        assert_eq!(errors.get("email"), Some("Email already exists"));
    }

    #[test]
    fn field_errors_into_result() {
        assert!(FieldErrors::new().into_result().is_ok());

        let mut errors = FieldErrors::new();
        errors.add("phone", "Phone already exists");
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn settings_error_messages() {
        assert_eq!(
            SettingsError::MethodsEmpty.to_string(),
            "authentication methods can't be empty"
        );
        assert_eq!(
            SettingsError::UnknownMethod("sms".to_string()).to_string(),
            "unknown authentication method: sms"
        );
    }
}
