//! API handlers and shared utilities for Semaforo.
//!
//! This module organizes the service's route handlers and provides common
//! helpers for input validation.

pub mod auth;
pub mod health;
pub mod root;
pub mod users;

use regex::Regex;

/// Lightweight email sanity check used by auth handlers before persisting data.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Normalize an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
