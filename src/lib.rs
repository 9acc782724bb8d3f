//! # Semaforo
//!
//! Access-control backend for the Semaforo traffic operations API. It covers
//! password authentication with legacy-hash migration, signed bearer tokens
//! with server-side revocation, role-based authorization, and email-code
//! account registration and recovery.
//!
//! ## Tokens
//!
//! Login exchanges an email and password for an HS256 bearer token carrying a
//! unique `jti` claim. Logout inserts that `jti` into a blocklist consulted on
//! every validation, so revocation wins over an otherwise valid signature.
//!
//! ## Passwords
//!
//! New hashes use Argon2id. bcrypt hashes from the previous deployment keep
//! verifying through a fallback path until those accounts rotate their
//! passwords.
//!
//! ## Roles
//!
//! Every user carries one of `admin`, `police`, or `viewer`. Values outside
//! that set fail closed on role-gated routes.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
