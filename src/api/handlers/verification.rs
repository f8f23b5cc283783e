//! Contact verification endpoints: list records, send a verification link,
//! and confirm it.

use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, instrument};
use utoipa::ToSchema;

use crate::account::models::{ContactKind, ContactRecord};
use crate::account::reference::encode_reference;
use crate::account::repo::ContactRepo;
use crate::account::service;
use crate::account::settings::AuthSettings;
use crate::account::tokens::VerificationTokens;
use crate::api::delivery::{self, Channel};
use crate::api::guards::require_login;

/// All reference/token failures collapse into this body so a caller cannot
/// probe which sub-case fired.
const VERIFICATION_FAILED: &str = "Verification failed";

#[derive(ToSchema, Serialize, Debug)]
pub struct ContactSummary {
    id: i64,
    kind: String,
    value: String,
    is_verified: bool,
}

impl From<ContactRecord> for ContactSummary {
    fn from(record: ContactRecord) -> Self {
        Self {
            id: record.id,
            kind: record.kind.tag().to_string(),
            value: record.value,
            is_verified: record.is_verified,
        }
    }
}

#[utoipa::path(
    get,
    path = "/verification/contacts",
    responses(
        (status = 200, description = "Contact records with verification state", body = [ContactSummary]),
        (status = 303, description = "Anonymous; redirected to login"),
    ),
    tag = "verification"
)]
pub async fn contacts(
    headers: HeaderMap,
    pool: Extension<PgPool>,
) -> Response {
    let principal = match require_login(&headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    match ContactRepo::list_for_user(&pool, principal.0).await {
        Ok(records) => {
            let summaries: Vec<ContactSummary> =
                records.into_iter().map(ContactSummary::from).collect();
            Json(summaries).into_response()
        }
        Err(err) => {
            error!("Failed to list contact records: {err:?}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                VERIFICATION_FAILED.to_string(),
            )
                .into_response()
        }
    }
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct SendVerificationPayload {
    kind: String,
    id: i64,
}

#[utoipa::path(
    post,
    path = "/verification/send",
    request_body = SendVerificationPayload,
    responses(
        (status = 200, description = "Verification sent (reported for unknown records too)"),
        (status = 303, description = "Anonymous; redirected to login"),
    ),
    tag = "verification"
)]
#[instrument(skip(pool, settings, payload))]
pub async fn send(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    settings: Extension<Arc<AuthSettings>>,
    payload: Option<Json<SendVerificationPayload>>,
) -> Response {
    let principal = match require_login(&headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    let Some(Json(payload)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };
    let Some(kind) = ContactKind::from_tag(payload.kind.trim().to_lowercase().as_str()) else {
        return (
            StatusCode::BAD_REQUEST,
            VERIFICATION_FAILED.to_string(),
        )
            .into_response();
    };

    // A record that does not exist, belongs to someone else, or is already
    // verified still gets the success body, so the endpoint cannot be used
    // to probe which identifiers exist.
    let sent = sent_response(kind);

    let record = match ContactRepo::find_for_user(&pool, principal.0, kind, payload.id).await {
        Ok(Some(record)) if !record.is_verified => record,
        Ok(_) => return sent,
        Err(err) => {
            error!("Failed to load contact record: {err:?}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                VERIFICATION_FAILED.to_string(),
            )
                .into_response();
        }
    };

    let token = VerificationTokens::new(&settings).issue(&record);
    let idb64 = encode_reference(record.kind, record.id);
    let url = verification_url(settings.frontend_base_url(), &idb64, &token);

    let payload_json = json!({
        "recipient": record.value,
        "url": url,
    })
    .to_string();
    let template = match kind {
        ContactKind::Email => "verify_email",
        ContactKind::Phone => "verify_phone",
    };

    if let Err(err) = delivery::enqueue(
        &pool,
        Channel::for_kind(kind),
        &record.value,
        template,
        &payload_json,
    )
    .await
    {
        error!("Failed to enqueue verification delivery: {err:?}");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            VERIFICATION_FAILED.to_string(),
        )
            .into_response();
    }

    sent
}

fn sent_response(kind: ContactKind) -> Response {
    let detail = match kind {
        ContactKind::Email => "Email Verification Sent",
        ContactKind::Phone => "Phone Verification Sent",
    };
    Json(json!({ "detail": detail })).into_response()
}

/// Link placed in outbound messages; the host frontend serves the page that
/// calls the confirm endpoint.
fn verification_url(frontend_base_url: &str, idb64: &str, token: &str) -> String {
    let base = frontend_base_url.trim_end_matches('/');
    format!("{base}/verification/confirm/{idb64}/{token}")
}

#[utoipa::path(
    get,
    path = "/verification/confirm/{idb64}/{token}",
    params(
        ("idb64" = String, Path, description = "Opaque contact record reference"),
        ("token" = String, Path, description = "State-bound verification token")
    ),
    responses(
        (status = 200, description = "Verification successful"),
        (status = 400, description = "Verification failed"),
    ),
    tag = "verification"
)]
#[instrument(skip(pool, settings))]
pub async fn confirm(
    pool: Extension<PgPool>,
    settings: Extension<Arc<AuthSettings>>,
    Path((idb64, token)): Path<(String, String)>,
) -> Response {
    match service::confirm_verification(&pool, &settings, &idb64, &token).await {
        Ok(true) => (StatusCode::OK, "Verification successful".to_string()).into_response(),
        Ok(false) => {
            (StatusCode::BAD_REQUEST, VERIFICATION_FAILED.to_string()).into_response()
        }
        Err(err) => {
            error!("Failed to confirm verification: {err:?}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                VERIFICATION_FAILED.to_string(),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_url_trims_trailing_slash() {
        let url = verification_url("http://localhost:3000/", "aWQ", "token");
        assert_eq!(url, "http://localhost:3000/verification/confirm/aWQ/token");
    }
}
