use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::account::error::RegisterError;
use crate::account::service::{self, RegisterRequest};
use crate::account::settings::AuthSettings;
use crate::api::guards::{anonymous_required, principal_from_headers};

#[derive(ToSchema, Deserialize, Debug)]
pub struct RegisterPayload {
    phone: Option<String>,
    username: Option<String>,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    password: String,
    confirm_password: Option<String>,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct Registered {
    id: Uuid,
    username: String,
}

#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterPayload,
    responses(
        (status = 201, description = "Registration successful", body = Registered),
        (status = 400, description = "Field validation failed, including duplicate identifiers"),
    ),
    tag = "auth"
)]
#[instrument(skip(pool, settings, payload))]
pub async fn register(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    settings: Extension<Arc<AuthSettings>>,
    payload: Option<Json<RegisterPayload>>,
) -> Response {
    let principal = principal_from_headers(&headers);
    if let Some(response) = anonymous_required(principal.as_ref(), &settings).denied() {
        return response;
    }

    let Some(Json(payload)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let request = RegisterRequest {
        phone: payload.phone,
        username: payload.username,
        email: payload.email,
        first_name: payload.first_name,
        last_name: payload.last_name,
        password: SecretString::from(payload.password),
        confirm_password: payload.confirm_password.map(SecretString::from),
    };

    match service::register(&pool, &settings, request).await {
        Ok(user) => (
            StatusCode::CREATED,
            Json(Registered {
                id: user.id,
                username: user.username,
            }),
        )
            .into_response(),
        Err(RegisterError::Invalid(errors)) => {
            (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response()
        }
        Err(RegisterError::Storage(err)) => {
            error!("Failed to register account: {err:?}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Registration failed".to_string(),
            )
                .into_response()
        }
    }
}
