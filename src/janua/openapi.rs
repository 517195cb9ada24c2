//! OpenAPI document for the swagger-ui mount.

use utoipa::OpenApi;

use super::handlers;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::register::register,
        handlers::login::login,
        handlers::logout::logout,
        handlers::me::me,
        handlers::federated::google_login,
        handlers::federated::google_callback,
    ),
    components(schemas(
        handlers::register::RegisterRequest,
        handlers::login::LoginRequest,
        handlers::UserSummary,
    )),
    tags(
        (name = "auth", description = "Password registration, login, logout"),
        (name = "federation", description = "OAuth2 federated login"),
        (name = "me", description = "Authenticated identity"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;
