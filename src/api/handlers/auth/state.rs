//! Auth state and configuration.

use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;

use super::token::TokenKeys;
use crate::api::email::EmailSender;

/// Known-insecure signing secret for local development. Startup logs a
/// warning when it is still in use.
pub const DEFAULT_DEV_SECRET: &str = "replace_this_secret_for_dev";

const DEFAULT_TOKEN_TTL_MINUTES: i64 = 24 * 60;
const DEFAULT_CODE_TTL_MINUTES: i64 = 10;
const DEFAULT_FRONTEND_ORIGIN: &str = "http://localhost:3000";

#[derive(Clone, Debug)]
pub struct AuthConfig {
    secret_key: SecretString,
    token_ttl_minutes: i64,
    code_ttl_minutes: i64,
    admin_email: Option<String>,
    admin_password: Option<SecretString>,
    frontend_origin: String,
}

impl AuthConfig {
    #[must_use]
    pub fn new(secret_key: SecretString) -> Self {
        Self {
            secret_key,
            token_ttl_minutes: DEFAULT_TOKEN_TTL_MINUTES,
            code_ttl_minutes: DEFAULT_CODE_TTL_MINUTES,
            admin_email: None,
            admin_password: None,
            frontend_origin: DEFAULT_FRONTEND_ORIGIN.to_string(),
        }
    }

    #[must_use]
    pub fn with_token_ttl_minutes(mut self, minutes: i64) -> Self {
        self.token_ttl_minutes = minutes;
        self
    }

    #[must_use]
    pub fn with_code_ttl_minutes(mut self, minutes: i64) -> Self {
        self.code_ttl_minutes = minutes;
        self
    }

    #[must_use]
    pub fn with_admin_seed(mut self, email: String, password: SecretString) -> Self {
        self.admin_email = Some(email);
        self.admin_password = Some(password);
        self
    }

    #[must_use]
    pub fn with_frontend_origin(mut self, origin: String) -> Self {
        self.frontend_origin = origin;
        self
    }

    #[must_use]
    pub fn uses_default_secret(&self) -> bool {
        self.secret_key.expose_secret() == DEFAULT_DEV_SECRET
    }

    pub(crate) fn frontend_origin(&self) -> &str {
        &self.frontend_origin
    }

    pub(super) fn token_ttl_minutes(&self) -> i64 {
        self.token_ttl_minutes
    }

    pub(super) fn code_ttl_minutes(&self) -> i64 {
        self.code_ttl_minutes
    }

    pub(super) fn admin_seed(&self) -> Option<(&str, &SecretString)> {
        match (&self.admin_email, &self.admin_password) {
            (Some(email), Some(password)) => Some((email.as_str(), password)),
            _ => None,
        }
    }

    fn secret_key(&self) -> &SecretString {
        &self.secret_key
    }
}

pub struct AuthState {
    config: AuthConfig,
    keys: TokenKeys,
    sender: Arc<dyn EmailSender>,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, sender: Arc<dyn EmailSender>) -> Self {
        let keys = TokenKeys::new(config.secret_key());

        Self {
            config,
            keys,
            sender,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub(crate) fn keys(&self) -> &TokenKeys {
        &self.keys
    }

    pub(super) fn sender(&self) -> &dyn EmailSender {
        self.sender.as_ref()
    }
}
