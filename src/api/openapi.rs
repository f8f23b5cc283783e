use utoipa::OpenApi;

use crate::api::handlers::{health, login, password_reset, register, verification};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        register::register,
        login::login,
        login::logout,
        verification::contacts,
        verification::send,
        verification::confirm,
        password_reset::request,
        password_reset::confirm,
    ),
    components(schemas(
        health::Health,
        register::RegisterPayload,
        register::Registered,
        login::LoginPayload,
        login::LoggedIn,
        verification::ContactSummary,
        verification::SendVerificationPayload,
        password_reset::ResetRequestPayload,
        password_reset::ResetConfirmPayload,
    )),
    tags(
        (name = "health", description = "Service and database health"),
        (name = "auth", description = "Registration, login and logout"),
        (name = "verification", description = "Contact record verification links"),
        (name = "password", description = "Password reset flows"),
    )
)]
pub struct ApiDoc;

/// The generated `OpenAPI` document; also backs the Swagger UI mount.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
