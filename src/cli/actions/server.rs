use crate::api::{self, handlers::auth::AuthConfig};
use anyhow::{ensure, Result};
use secrecy::SecretString;
use url::Url;

/// Everything the server needs, resolved from flags and environment.
#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub secret_key: SecretString,
    pub token_ttl_minutes: i64,
    pub code_ttl_minutes: i64,
    pub admin_email: Option<String>,
    pub admin_password: Option<SecretString>,
    pub frontend_origin: String,
}

/// Handle the server action
pub async fn execute(args: Args) -> Result<()> {
    let dsn = Url::parse(&args.dsn)?;

    ensure!(
        dsn.scheme() == "postgres" || dsn.scheme() == "postgresql",
        "unsupported database scheme: {}",
        dsn.scheme()
    );

    let config = AuthConfig::new(args.secret_key)
        .with_token_ttl_minutes(args.token_ttl_minutes)
        .with_code_ttl_minutes(args.code_ttl_minutes)
        .with_frontend_origin(args.frontend_origin);

    let config = match (args.admin_email, args.admin_password) {
        (Some(email), Some(password)) => config.with_admin_seed(email, password),
        _ => config,
    };

    api::new(args.port, dsn.to_string(), config).await
}
