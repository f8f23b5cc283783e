//! Password reset: request a reset link by phone/email, then consume it.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, instrument};
use utoipa::ToSchema;

use crate::account::repo::UserRepo;
use crate::account::resolver::{lookup_key, resolve_login_method, LoginMethod};
use crate::account::service::{self, encode_user_reference, ResetOutcome};
use crate::account::settings::AuthSettings;
use crate::account::tokens::ResetTokens;
use crate::api::delivery::{self, Channel};

#[derive(ToSchema, Deserialize, Debug)]
pub struct ResetRequestPayload {
    login: String,
}

#[utoipa::path(
    post,
    path = "/password/reset",
    request_body = ResetRequestPayload,
    responses(
        (status = 200, description = "Reset reported as sent whether or not the login matched"),
    ),
    tag = "password"
)]
#[instrument(skip(pool, settings, payload))]
pub async fn request(
    pool: Extension<PgPool>,
    settings: Extension<Arc<AuthSettings>>,
    payload: Option<Json<ResetRequestPayload>>,
) -> Response {
    let Some(Json(payload)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    // The response is identical whether or not the login matched an account.
    let sent = Json(json!({ "detail": "Password reset sent" })).into_response();

    let Some((method, user)) = find_reset_target(&pool, &settings, &payload.login).await else {
        return sent;
    };

    let token = ResetTokens::new(&settings).issue(&user);
    let uidb64 = encode_user_reference(user.id);
    let url = reset_url(settings.frontend_base_url(), &uidb64, &token);

    let Some(recipient) = lookup_key(method, &payload.login) else {
        return sent;
    };
    let payload_json = json!({
        "recipient": recipient,
        "url": url,
    })
    .to_string();
    let (channel, template) = match method {
        LoginMethod::Phone => (Channel::Sms, "reset_password_phone"),
        _ => (Channel::Email, "reset_password_email"),
    };

    if let Err(err) = delivery::enqueue(&pool, channel, &recipient, template, &payload_json).await
    {
        error!("Failed to enqueue password reset delivery: {err:?}");
    }

    sent
}

/// Resolve the login against the configured phone/email namespaces only;
/// usernames are not reset targets since they carry no delivery address.
async fn find_reset_target(
    pool: &PgPool,
    settings: &AuthSettings,
    login: &str,
) -> Option<(LoginMethod, crate::account::models::User)> {
    let method = resolve_login_method(login, settings)?;
    if method == LoginMethod::Username {
        return None;
    }
    let key = lookup_key(method, login)?;
    match UserRepo::find_by_login(pool, method, &key).await {
        Ok(Some(user)) => Some((method, user)),
        Ok(None) => None,
        Err(err) => {
            error!("Failed to resolve reset target: {err:?}");
            None
        }
    }
}

fn reset_url(frontend_base_url: &str, uidb64: &str, token: &str) -> String {
    let base = frontend_base_url.trim_end_matches('/');
    format!("{base}/password/reset/confirm/{uidb64}/{token}")
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct ResetConfirmPayload {
    password: String,
}

#[utoipa::path(
    post,
    path = "/password/reset/confirm/{uidb64}/{token}",
    request_body = ResetConfirmPayload,
    params(
        ("uidb64" = String, Path, description = "Opaque user reference"),
        ("token" = String, Path, description = "State-bound reset token")
    ),
    responses(
        (status = 200, description = "Password updated"),
        (status = 400, description = "Link invalid or password rejected"),
    ),
    tag = "password"
)]
#[instrument(skip(pool, settings, payload))]
pub async fn confirm(
    pool: Extension<PgPool>,
    settings: Extension<Arc<AuthSettings>>,
    Path((uidb64, token)): Path<(String, String)>,
    payload: Option<Json<ResetConfirmPayload>>,
) -> Response {
    let Some(Json(payload)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let password = SecretString::from(payload.password);
    match service::confirm_password_reset(&pool, &settings, &uidb64, &token, &password).await {
        Ok(ResetOutcome::Completed) => {
            Json(json!({ "detail": "Password has been reset" })).into_response()
        }
        Ok(ResetOutcome::InvalidLink) => {
            (StatusCode::BAD_REQUEST, "Reset link invalid".to_string()).into_response()
        }
        Ok(ResetOutcome::WeakPassword(message)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "errors": { "password": message } })),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to confirm password reset: {err:?}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Reset failed".to_string(),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_url_trims_trailing_slash() {
        let url = reset_url("http://localhost:3000/", "dWlk", "token");
        assert_eq!(
            url,
            "http://localhost:3000/password/reset/confirm/dWlk/token"
        );
    }
}
