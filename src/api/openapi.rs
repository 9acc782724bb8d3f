use super::handlers::{
    auth::{self, types},
    health, root, users,
};
use utoipa::OpenApi;

/// OpenAPI document covering every route the router serves. Info, contact,
/// and license come from Cargo metadata.
#[derive(OpenApi)]
#[openapi(
    paths(
        root::root,
        health::health,
        auth::register::send_code,
        auth::register::confirm,
        auth::login::login,
        auth::login::logout,
        auth::recovery::forgot_password,
        auth::recovery::change_password,
        users::me,
        users::list_users,
        users::create_user,
    ),
    components(schemas(
        types::ChangePasswordRequest,
        types::ConfirmRequest,
        types::ForgotPasswordRequest,
        types::LoginRequest,
        types::MessageResponse,
        types::SendCodeRequest,
        types::TokenResponse,
        types::UserOut,
        users::CreateUserRequest,
        health::Health,
    )),
    tags(
        (name = "auth", description = "Login, logout, registration, and password recovery"),
        (name = "users", description = "User directory and provisioning"),
        (name = "health", description = "Service health and metadata")
    )
)]
pub struct ApiDoc;
