//! Email-code registration: request a code, then confirm it to create the
//! account.

use crate::api::{
    email::{self, EmailMessage},
    handlers::{
        auth::{
            error::AuthError,
            password,
            state::AuthState,
            storage::{self, ConfirmOutcome},
            types::{ConfirmRequest, MessageResponse, Role, SendCodeRequest, UserOut},
        },
        normalize_email, valid_email,
    },
};
use axum::{extract::Extension, http::StatusCode, response::Json};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

#[utoipa::path(
    post,
    path = "/auth/register/send-code",
    request_body = SendCodeRequest,
    responses(
        (status = 202, description = "Verification code stored and emailed", body = MessageResponse),
        (status = 400, description = "Missing payload or invalid email"),
        (status = 409, description = "Email already registered")
    ),
    tag = "auth"
)]
pub async fn send_code(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<SendCodeRequest>>,
) -> Result<(StatusCode, Json<MessageResponse>), AuthError> {
    let Some(Json(request)) = payload else {
        return Err(AuthError::BadRequest("Missing payload"));
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return Err(AuthError::BadRequest("Invalid email"));
    }

    if storage::user_by_email(&pool, &email).await?.is_some() {
        return Err(AuthError::Conflict("Email already registered"));
    }

    let code = password::generate_code();
    let ttl_minutes = auth_state.config().code_ttl_minutes();
    storage::insert_verification(&pool, &email, &code, ttl_minutes).await?;

    // Dispatch failures are logged and swallowed; the code is already stored.
    email::dispatch(
        auth_state.sender(),
        &EmailMessage {
            to_email: email,
            subject: "Verify your Semaforo account".to_string(),
            body: format!("Your verification code is: {code}"),
        },
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse {
            message: "Verification code sent".to_string(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/auth/register/confirm",
    request_body = ConfirmRequest,
    responses(
        (status = 201, description = "Account created", body = UserOut),
        (status = 400, description = "Missing payload, invalid email, or bad code"),
        (status = 409, description = "Email already registered")
    ),
    tag = "auth"
)]
pub async fn confirm(
    pool: Extension<PgPool>,
    payload: Option<Json<ConfirmRequest>>,
) -> Result<(StatusCode, Json<UserOut>), AuthError> {
    let Some(Json(request)) = payload else {
        return Err(AuthError::BadRequest("Missing payload"));
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return Err(AuthError::BadRequest("Invalid email"));
    }

    // Hash before opening the transaction to keep it short; the code is
    // checked inside the transaction either way.
    let password_hash = password::hash_blocking(request.password).await?;

    let outcome = storage::confirm_registration(
        &pool,
        &email,
        &request.code,
        &password_hash,
        Role::Viewer.as_str(),
    )
    .await?;

    match outcome {
        ConfirmOutcome::Created(user) => {
            info!("Registered user {}", user.email);

            Ok((StatusCode::CREATED, Json(UserOut::from(&user))))
        }
        ConfirmOutcome::Conflict => Err(AuthError::Conflict("Email already registered")),
        ConfirmOutcome::InvalidCode => Err(AuthError::BadRequest("Invalid code")),
        ConfirmOutcome::ExpiredCode => Err(AuthError::BadRequest("Verification code expired")),
    }
}

#[cfg(test)]
mod tests {
    use super::{confirm, send_code};
    use crate::api::{
        email::LogEmailSender,
        handlers::auth::{
            error::AuthError,
            state::{AuthConfig, AuthState},
            types::SendCodeRequest,
        },
    };
    use axum::{extract::Extension, response::Json};
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
    async fn test_send_code_missing_payload() {
        let result = send_code(Extension(unreachable_pool()), Extension(state()), None).await;

        assert!(matches!(
            result,
            Err(AuthError::BadRequest("Missing payload"))
        ));
    }

    #[tokio::test]
    async fn test_send_code_invalid_email() {
        let payload = Json(SendCodeRequest {
            email: "  spaced out@example.com ".to_string(),
        });

        let result = send_code(
            Extension(unreachable_pool()),
            Extension(state()),
            Some(payload),
        )
        .await;

        assert!(matches!(result, Err(AuthError::BadRequest("Invalid email"))));
    }

    #[tokio::test]
    async fn test_confirm_missing_payload() {
        let result = confirm(Extension(unreachable_pool()), None).await;

        assert!(matches!(
            result,
            Err(AuthError::BadRequest("Missing payload"))
        ));
    }
}
