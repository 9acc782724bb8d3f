use crate::api::handlers::auth::DEFAULT_DEV_SECRET;
use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("secret-key")
                .long("secret-key")
                .help("Secret used to sign bearer tokens")
                .env("SEMAFORO_SECRET_KEY")
                .default_value(DEFAULT_DEV_SECRET),
        )
        .arg(
            Arg::new("token-ttl")
                .long("token-ttl")
                .help("Bearer token lifetime in minutes")
                .env("SEMAFORO_TOKEN_TTL")
                .default_value("1440")
                .value_parser(clap::value_parser!(i64).range(1..)),
        )
        .arg(
            Arg::new("code-ttl")
                .long("code-ttl")
                .help("Verification code lifetime in minutes")
                .env("SEMAFORO_CODE_TTL")
                .default_value("10")
                .value_parser(clap::value_parser!(i64).range(1..)),
        )
        .arg(
            Arg::new("admin-email")
                .long("admin-email")
                .help("Seed an admin account with this email on startup")
                .env("SEMAFORO_ADMIN_EMAIL")
                .requires("admin-password"),
        )
        .arg(
            Arg::new("admin-password")
                .long("admin-password")
                .help("Password for the seeded admin account")
                .env("SEMAFORO_ADMIN_PASSWORD")
                .requires("admin-email"),
        )
        .arg(
            Arg::new("frontend-origin")
                .long("frontend-origin")
                .help("Origin allowed to call the API from a browser")
                .env("SEMAFORO_FRONTEND_ORIGIN")
                .default_value("http://localhost:3000"),
        )
}

/// Auth options resolved from the command line and environment.
pub struct Options {
    pub secret_key: SecretString,
    pub token_ttl_minutes: i64,
    pub code_ttl_minutes: i64,
    pub admin_email: Option<String>,
    pub admin_password: Option<SecretString>,
    pub frontend_origin: String,
}

impl Options {
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let secret_key = matches
            .get_one::<String>("secret-key")
            .map(|secret| SecretString::from(secret.clone()))
            .context("missing secret key")?;

        let token_ttl_minutes = matches
            .get_one::<i64>("token-ttl")
            .copied()
            .context("missing token ttl")?;

        let code_ttl_minutes = matches
            .get_one::<i64>("code-ttl")
            .copied()
            .context("missing code ttl")?;

        let admin_email = matches.get_one::<String>("admin-email").cloned();

        let admin_password = matches
            .get_one::<String>("admin-password")
            .map(|password| SecretString::from(password.clone()));

        let frontend_origin = matches
            .get_one::<String>("frontend-origin")
            .cloned()
            .context("missing frontend origin")?;

        Ok(Self {
            secret_key,
            token_ttl_minutes,
            code_ttl_minutes,
            admin_email,
            admin_password,
            frontend_origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Command;
    use secrecy::ExposeSecret;

    fn command() -> Command {
        with_args(Command::new("semaforo"))
    }

    #[test]
    fn test_parse_defaults() -> Result<()> {
        temp_env::with_vars_unset(
            vec![
                "SEMAFORO_SECRET_KEY",
                "SEMAFORO_TOKEN_TTL",
                "SEMAFORO_CODE_TTL",
                "SEMAFORO_ADMIN_EMAIL",
                "SEMAFORO_ADMIN_PASSWORD",
                "SEMAFORO_FRONTEND_ORIGIN",
            ],
            || -> Result<()> {
                let matches = command().get_matches_from(vec!["semaforo"]);
                let options = Options::parse(&matches)?;

                assert_eq!(options.secret_key.expose_secret(), DEFAULT_DEV_SECRET);
                assert_eq!(options.token_ttl_minutes, 1440);
                assert_eq!(options.code_ttl_minutes, 10);
                assert!(options.admin_email.is_none());
                assert!(options.admin_password.is_none());
                assert_eq!(options.frontend_origin, "http://localhost:3000");

                Ok(())
            },
        )
    }

    #[test]
    fn test_parse_admin_seed() -> Result<()> {
        temp_env::with_vars(
            [
                ("SEMAFORO_ADMIN_EMAIL", Some("admin@example.com")),
                ("SEMAFORO_ADMIN_PASSWORD", Some("hunter22hunter22")),
            ],
            || -> Result<()> {
                let matches = command().get_matches_from(vec!["semaforo"]);
                let options = Options::parse(&matches)?;

                assert_eq!(options.admin_email.as_deref(), Some("admin@example.com"));
                assert_eq!(
                    options
                        .admin_password
                        .as_ref()
                        .map(|password| password.expose_secret().to_string()),
                    Some("hunter22hunter22".to_string())
                );

                Ok(())
            },
        )
    }

    #[test]
    fn test_token_ttl_rejects_zero() {
        temp_env::with_var_unset("SEMAFORO_TOKEN_TTL", || {
            let result = command().try_get_matches_from(vec!["semaforo", "--token-ttl", "0"]);
            assert!(result.is_err());
        });
    }
}
