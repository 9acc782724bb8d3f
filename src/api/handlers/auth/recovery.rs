//! Password recovery and password change.

use crate::api::{
    email::{self, EmailMessage},
    handlers::{
        auth::{
            error::AuthError,
            password, principal,
            state::AuthState,
            storage,
            types::{ChangePasswordRequest, ForgotPasswordRequest, MessageResponse},
        },
        normalize_email, valid_email,
    },
};
use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

const FORGOT_RESPONSE: &str = "A new password has been sent to your email";

#[utoipa::path(
    post,
    path = "/auth/password/forgot",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 202, description = "Recovery accepted", body = MessageResponse),
        (status = 400, description = "Missing payload or invalid email")
    ),
    tag = "auth"
)]
pub async fn forgot_password(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<ForgotPasswordRequest>>,
) -> Result<(StatusCode, Json<MessageResponse>), AuthError> {
    let Some(Json(request)) = payload else {
        return Err(AuthError::BadRequest("Missing payload"));
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return Err(AuthError::BadRequest("Invalid email"));
    }

    // The response is identical whether or not the account exists.
    if let Some(user) = storage::user_by_email(&pool, &email).await? {
        let new_password = password::generate_password();
        let password_hash = password::hash_blocking(new_password.clone()).await?;
        storage::update_password(&pool, user.id, &password_hash).await?;

        info!("Password reset for {}", user.email);

        email::dispatch(
            auth_state.sender(),
            &EmailMessage {
                to_email: user.email,
                subject: "Your new Semaforo password".to_string(),
                body: format!(
                    "Your new password is:\n\n{new_password}\n\nYou can login \
                     immediately with this password. Change it later if you want."
                ),
            },
        );
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse {
            message: FORGOT_RESPONSE.to_string(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/auth/password/change",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Missing payload or wrong old password"),
        (status = 401, description = "Missing or invalid token")
    ),
    tag = "auth"
)]
pub async fn change_password(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<ChangePasswordRequest>>,
) -> Result<Json<MessageResponse>, AuthError> {
    let Some(Json(request)) = payload else {
        return Err(AuthError::BadRequest("Missing payload"));
    };

    let user = principal::require_auth(&headers, &pool, &auth_state).await?;

    if !password::verify_blocking(request.old_password, user.password_hash.clone()).await? {
        return Err(AuthError::BadRequest("Old password incorrect"));
    }

    let password_hash = password::hash_blocking(request.new_password).await?;
    storage::update_password(&pool, user.id, &password_hash).await?;

    info!("Password changed for {}", user.email);

    Ok(Json(MessageResponse {
        message: "Password changed successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::{change_password, forgot_password};
    use crate::api::{
        email::LogEmailSender,
        handlers::auth::{
            error::AuthError,
            state::{AuthConfig, AuthState},
            types::ChangePasswordRequest,
        },
    };
    use axum::{extract::Extension, http::HeaderMap, response::Json};
    use secrecy::SecretString;
    use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
    use std::sync::Arc;

    fn unreachable_pool() -> sqlx::PgPool {
        let options = PgConnectOptions::new()
            .host("127.0.0.1")
            .port(1)
            .ssl_mode(PgSslMode::Disable);

        PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_millis(200))
            .connect_lazy_with(options)
    }

    fn state() -> Arc<AuthState> {
        Arc::new(AuthState::new(
            AuthConfig::new(SecretString::from("test-secret".to_string())),
            Arc::new(LogEmailSender),
        ))
    }

    #[tokio::test]
    async fn test_forgot_missing_payload() {
        let result = forgot_password(Extension(unreachable_pool()), Extension(state()), None).await;

        assert!(matches!(
            result,
            Err(AuthError::BadRequest("Missing payload"))
        ));
    }

    #[tokio::test]
    async fn test_change_password_requires_token() {
        let payload = Json(ChangePasswordRequest {
            old_password: "old".to_string(),
            new_password: "new".to_string(),
        });

        let result = change_password(
            HeaderMap::new(),
            Extension(unreachable_pool()),
            Extension(state()),
            Some(payload),
        )
        .await;

        assert!(matches!(
            result,
            Err(AuthError::Unauthorized("Missing authorization header"))
        ));
    }

    #[tokio::test]
    async fn test_change_password_missing_payload() {
        let result = change_password(
            HeaderMap::new(),
            Extension(unreachable_pool()),
            Extension(state()),
            None,
        )
        .await;

        assert!(matches!(
            result,
            Err(AuthError::BadRequest("Missing payload"))
        ));
    }
}
