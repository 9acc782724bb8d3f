//! Authentication, authorization, and credential recovery.
//!
//! Login exchanges an email and password for a signed bearer token. Every
//! protected route validates the token in a fixed order: signature and
//! expiry, subject claim, blocklist, then user lookup. Role gates compose on
//! top of that and fail closed on unknown role values.

pub mod error;
pub mod login;
pub mod recovery;
pub mod register;
pub mod state;
pub mod types;

pub(crate) mod password;
pub(crate) mod principal;
pub(crate) mod storage;
pub(crate) mod token;


pub use error::AuthError;
pub use state::{AuthConfig, AuthState, DEFAULT_DEV_SECRET};

use anyhow::Result;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use tracing::info;

use types::Role;

/// Create the configured admin account on startup when it does not exist yet.
pub async fn seed_admin(pool: &PgPool, state: &AuthState) -> Result<()> {
    let Some((email, password)) = state.config().admin_seed() else {
        return Ok(());
    };

    let email = crate::api::handlers::normalize_email(email);

    if storage::user_by_email(pool, &email).await?.is_some() {
        return Ok(());
    }

    let password_hash = password::hash_blocking(password.expose_secret().to_string()).await?;

    match storage::insert_user(pool, &email, &password_hash, Role::Admin.as_str(), true).await? {
        storage::CreateUserOutcome::Created(user) => {
            info!("Seeded admin user {}", user.email);
        }
        // Lost a race with a concurrent seed; the account exists either way.
        storage::CreateUserOutcome::Conflict => {}
    }

    Ok(())
}
