use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::account::service;
use crate::account::settings::AuthSettings;
use crate::api::guards::{anonymous_required, principal_from_headers};

/// Uniform rejection body; the caller never learns whether the login string,
/// the password, or the account state failed.
const INVALID_CREDENTIALS: &str = "Invalid Credentials";

#[derive(ToSchema, Deserialize, Debug)]
pub struct LoginPayload {
    login: String,
    password: String,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct LoggedIn {
    user_id: Uuid,
    redirect: String,
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Login successful", body = LoggedIn),
        (status = 401, description = "Invalid Credentials"),
    ),
    tag = "auth"
)]
#[instrument(skip(pool, settings, payload))]
pub async fn login(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    settings: Extension<Arc<AuthSettings>>,
    payload: Option<Json<LoginPayload>>,
) -> Response {
    let principal = principal_from_headers(&headers);
    if let Some(response) = anonymous_required(principal.as_ref(), &settings).denied() {
        return response;
    }

    let Some(Json(payload)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let password = SecretString::from(payload.password);
    match service::authenticate(&pool, &settings, &payload.login, &password).await {
        Ok(Some(user)) => (
            StatusCode::OK,
            Json(LoggedIn {
                user_id: user.id,
                redirect: settings.login_redirect_url().to_string(),
            }),
        )
            .into_response(),
        Ok(None) => {
            (StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS.to_string()).into_response()
        }
        Err(err) => {
            error!("Failed to authenticate: {err:?}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Login failed".to_string()).into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 200, description = "Logout acknowledged; session teardown is the host's job"),
    ),
    tag = "auth"
)]
pub async fn logout(settings: Extension<Arc<AuthSettings>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "redirect": settings.logout_redirect_url(),
    }))
}
