//! Request guard predicates.
//!
//! Session handling belongs to the host deployment; the upstream proxy (or
//! session middleware) asserts the signed-in user through the
//! `x-authenticated-user` header. Guards are plain predicates evaluated at
//! the top of a handler, composing instead of inheriting.

use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect, Response};
use uuid::Uuid;

use crate::account::settings::AuthSettings;

pub const PRINCIPAL_HEADER: &str = "x-authenticated-user";
const LOGIN_URL: &str = "/login";

/// The authenticated account asserted by the session layer, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal(pub Uuid);

/// Extract the principal from request headers; absent or malformed headers
/// mean an anonymous request.
#[must_use]
pub fn principal_from_headers(headers: &HeaderMap) -> Option<Principal> {
    headers
        .get(PRINCIPAL_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value.trim()).ok())
        .map(Principal)
}

#[derive(Debug, PartialEq, Eq)]
pub enum GuardOutcome {
    Allow,
    Redirect(String),
}

impl GuardOutcome {
    /// The redirect response to return early, when the guard denied.
    #[must_use]
    pub fn denied(self) -> Option<Response> {
        match self {
            Self::Allow => None,
            Self::Redirect(target) => Some(Redirect::to(&target).into_response()),
        }
    }
}

/// Only signed-in users may proceed; anonymous requests go to the login page.
#[must_use]
pub fn login_required(principal: Option<&Principal>) -> GuardOutcome {
    match principal {
        Some(_) => GuardOutcome::Allow,
        None => GuardOutcome::Redirect(LOGIN_URL.to_string()),
    }
}

/// [`login_required`] as a handler prelude: the principal to act as, or the
/// redirect to return early.
///
/// # Errors
/// The redirect response when the request is anonymous.
pub fn require_login(headers: &HeaderMap) -> Result<Principal, Response> {
    match principal_from_headers(headers) {
        Some(principal) => Ok(principal),
        None => Err(Redirect::to(LOGIN_URL).into_response()),
    }
}

/// Only anonymous users may proceed; signed-in users go to their profile.
#[must_use]
pub fn anonymous_required(
    principal: Option<&Principal>,
    settings: &AuthSettings,
) -> GuardOutcome {
    match principal {
        Some(_) => GuardOutcome::Redirect(settings.login_redirect_url().to_string()),
        None => GuardOutcome::Allow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::resolver::LoginMethod;
    use axum::http::HeaderValue;
    use secrecy::SecretString;

    fn settings() -> AuthSettings {
        AuthSettings::new(vec![LoginMethod::Email], SecretString::from("guard-secret"))
            .expect("non-empty methods")
    }

    #[test]
    fn principal_parses_uuid_header() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            PRINCIPAL_HEADER,
            HeaderValue::from_str(&id.to_string()).expect("valid header"),
        );
        assert_eq!(principal_from_headers(&headers), Some(Principal(id)));
    }

    #[test]
    fn malformed_principal_is_anonymous() {
        let mut headers = HeaderMap::new();
        headers.insert(PRINCIPAL_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert_eq!(principal_from_headers(&headers), None);
        assert_eq!(principal_from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn login_required_redirects_anonymous() {
        assert_eq!(login_required(None), GuardOutcome::Redirect("/login".to_string()));
        assert_eq!(
            login_required(Some(&Principal(Uuid::new_v4()))),
            GuardOutcome::Allow
        );
    }

    #[test]
    fn require_login_hands_back_the_principal() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            PRINCIPAL_HEADER,
            HeaderValue::from_str(&id.to_string()).expect("valid header"),
        );
        assert_eq!(require_login(&headers).ok(), Some(Principal(id)));
        assert!(require_login(&HeaderMap::new()).is_err());
    }

    #[test]
    fn anonymous_required_redirects_signed_in() {
        let settings = settings();
        assert_eq!(anonymous_required(None, &settings), GuardOutcome::Allow);
        assert_eq!(
            anonymous_required(Some(&Principal(Uuid::new_v4())), &settings),
            GuardOutcome::Redirect("/accounts/profile/".to_string())
        );
    }
}
