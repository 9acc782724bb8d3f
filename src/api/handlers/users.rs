//! User-facing endpoints: profile lookup plus admin-only listing and
//! provisioning.

use crate::api::handlers::{
    auth::{
        error::AuthError,
        password, principal,
        state::AuthState,
        storage::{self, CreateUserOutcome},
        types::{Role, UserOut},
    },
    normalize_email, valid_email,
};
use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::Json,
};
use serde::Deserialize;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Profile of the calling user", body = UserOut),
        (status = 401, description = "Missing or invalid token")
    ),
    tag = "users"
)]
pub async fn me(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<Json<UserOut>, AuthError> {
    let user = principal::require_auth(&headers, &pool, &auth_state).await?;

    Ok(Json(UserOut::from(&user)))
}

#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All users, oldest first", body = [UserOut]),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not an admin")
    ),
    tag = "users"
)]
pub async fn list_users(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<Json<Vec<UserOut>>, AuthError> {
    let user = principal::require_auth(&headers, &pool, &auth_state).await?;
    principal::require_role(&user, &[Role::Admin])?;

    let users = storage::list_users(&pool).await?;

    Ok(Json(users.iter().map(UserOut::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserOut),
        (status = 400, description = "Missing payload, invalid email, or unknown role"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not an admin"),
        (status = 409, description = "Email exists")
    ),
    tag = "users"
)]
pub async fn create_user(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<CreateUserRequest>>,
) -> Result<(StatusCode, Json<UserOut>), AuthError> {
    let Some(Json(request)) = payload else {
        return Err(AuthError::BadRequest("Missing payload"));
    };

    let caller = principal::require_auth(&headers, &pool, &auth_state).await?;
    principal::require_role(&caller, &[Role::Admin])?;

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return Err(AuthError::BadRequest("Invalid email"));
    }

    // Provisioned accounts default to police; self-registration stays viewer.
    let role = match request.role.as_deref() {
        None => Role::Police,
        Some(value) => {
            let Some(role) = Role::parse(value) else {
                return Err(AuthError::BadRequest("Unknown role"));
            };

            role
        }
    };

    let password_hash = password::hash_blocking(request.password).await?;

    match storage::insert_user(&pool, &email, &password_hash, role.as_str(), true).await? {
        CreateUserOutcome::Created(user) => {
            info!("Created user {} with role {}", user.email, user.role);

            Ok((StatusCode::CREATED, Json(UserOut::from(&user))))
        }
        CreateUserOutcome::Conflict => Err(AuthError::Conflict("Email exists")),
    }
}
