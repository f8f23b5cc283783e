//! Immutable runtime settings for login and verification flows.
//!
//! Constructed once at startup from CLI/env configuration and passed by
//! reference into the resolver, authenticator and token engine. An empty
//! authentication-method list is rejected here, so misconfiguration aborts
//! the process instead of surfacing as "no user found" at login time.

use secrecy::SecretString;

use crate::account::error::SettingsError;
use crate::account::resolver::LoginMethod;

const DEFAULT_LOGIN_REDIRECT_URL: &str = "/accounts/profile/";
const DEFAULT_LOGOUT_REDIRECT_URL: &str = "/";
const DEFAULT_TOKEN_TTL_DAYS: i64 = 3;
const DEFAULT_FRONTEND_BASE_URL: &str = "http://localhost:3000";

#[derive(Clone, Debug)]
pub struct AuthSettings {
    methods: Vec<LoginMethod>,
    register_username_required: bool,
    register_email_required: bool,
    register_first_name_required: bool,
    register_last_name_required: bool,
    register_confirm_password_required: bool,
    login_redirect_url: String,
    logout_redirect_url: String,
    verification_token_ttl_days: i64,
    frontend_base_url: String,
    token_secret: SecretString,
}

impl AuthSettings {
    /// Build settings with the given method priority order and token secret.
    ///
    /// # Errors
    /// Returns [`SettingsError::MethodsEmpty`] when `methods` is empty.
    pub fn new(
        methods: Vec<LoginMethod>,
        token_secret: SecretString,
    ) -> Result<Self, SettingsError> {
        if methods.is_empty() {
            return Err(SettingsError::MethodsEmpty);
        }

        Ok(Self {
            methods,
            register_username_required: true,
            register_email_required: true,
            register_first_name_required: true,
            register_last_name_required: true,
            register_confirm_password_required: true,
            login_redirect_url: DEFAULT_LOGIN_REDIRECT_URL.to_string(),
            logout_redirect_url: DEFAULT_LOGOUT_REDIRECT_URL.to_string(),
            verification_token_ttl_days: DEFAULT_TOKEN_TTL_DAYS,
            frontend_base_url: DEFAULT_FRONTEND_BASE_URL.to_string(),
            token_secret,
        })
    }

    #[must_use]
    pub fn with_register_username_required(mut self, required: bool) -> Self {
        self.register_username_required = required;
        self
    }

    #[must_use]
    pub fn with_register_email_required(mut self, required: bool) -> Self {
        self.register_email_required = required;
        self
    }

    #[must_use]
    pub fn with_register_first_name_required(mut self, required: bool) -> Self {
        self.register_first_name_required = required;
        self
    }

    #[must_use]
    pub fn with_register_last_name_required(mut self, required: bool) -> Self {
        self.register_last_name_required = required;
        self
    }

    #[must_use]
    pub fn with_register_confirm_password_required(mut self, required: bool) -> Self {
        self.register_confirm_password_required = required;
        self
    }

    #[must_use]
    pub fn with_login_redirect_url(mut self, url: String) -> Self {
        self.login_redirect_url = url;
        self
    }

    #[must_use]
    pub fn with_logout_redirect_url(mut self, url: String) -> Self {
        self.logout_redirect_url = url;
        self
    }

    #[must_use]
    pub fn with_verification_token_ttl_days(mut self, days: i64) -> Self {
        self.verification_token_ttl_days = days.max(0);
        self
    }

    #[must_use]
    pub fn with_frontend_base_url(mut self, url: String) -> Self {
        self.frontend_base_url = url;
        self
    }

    /// Configured identifier namespaces in priority order; never empty.
    #[must_use]
    pub fn methods(&self) -> &[LoginMethod] {
        &self.methods
    }

    #[must_use]
    pub fn register_username_required(&self) -> bool {
        self.register_username_required
    }

    #[must_use]
    pub fn register_email_required(&self) -> bool {
        self.register_email_required
    }

    #[must_use]
    pub fn register_first_name_required(&self) -> bool {
        self.register_first_name_required
    }

    #[must_use]
    pub fn register_last_name_required(&self) -> bool {
        self.register_last_name_required
    }

    #[must_use]
    pub fn register_confirm_password_required(&self) -> bool {
        self.register_confirm_password_required
    }

    #[must_use]
    pub fn login_redirect_url(&self) -> &str {
        &self.login_redirect_url
    }

    #[must_use]
    pub fn logout_redirect_url(&self) -> &str {
        &self.logout_redirect_url
    }

    #[must_use]
    pub fn verification_token_ttl_days(&self) -> i64 {
        self.verification_token_ttl_days
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    #[must_use]
    pub fn token_secret(&self) -> &SecretString {
        &self.token_secret
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> SecretString {
        SecretString::from("test-secret")
    }

    #[test]
    fn empty_methods_is_a_configuration_error() {
        let result = AuthSettings::new(Vec::new(), secret());
        assert!(matches!(result, Err(SettingsError::MethodsEmpty)));
    }

    #[test]
    fn method_order_is_preserved() {
        let settings = AuthSettings::new(
            vec![LoginMethod::Username, LoginMethod::Phone],
            secret(),
        )
        .expect("non-empty methods");
        assert_eq!(
            settings.methods(),
            &[LoginMethod::Username, LoginMethod::Phone]
        );
    }

    #[test]
    fn defaults_match_register_policy() {
        let settings =
            AuthSettings::new(vec![LoginMethod::Email], secret()).expect("non-empty methods");
        assert!(settings.register_username_required());
        assert!(settings.register_email_required());
        assert!(settings.register_confirm_password_required());
        assert_eq!(settings.login_redirect_url(), "/accounts/profile/");
        assert_eq!(settings.logout_redirect_url(), "/");
        assert_eq!(settings.verification_token_ttl_days(), 3);
    }

    #[test]
    fn builders_override_defaults() {
        let settings = AuthSettings::new(vec![LoginMethod::Email], secret())
            .expect("non-empty methods")
            .with_register_username_required(false)
            .with_verification_token_ttl_days(1)
            .with_login_redirect_url("/home".to_string());
        assert!(!settings.register_username_required());
        assert_eq!(settings.verification_token_ttl_days(), 1);
        assert_eq!(settings.login_redirect_url(), "/home");
    }

    #[test]
    fn negative_ttl_clamps_to_zero() {
        let settings = AuthSettings::new(vec![LoginMethod::Email], secret())
            .expect("non-empty methods")
            .with_verification_token_ttl_days(-5);
        assert_eq!(settings.verification_token_ttl_days(), 0);
    }
}
