//! Password hashing, verification, and credential generation.
//!
//! New hashes use Argon2id in PHC string format. bcrypt hashes written by the
//! previous deployment keep verifying through a fallback path until those
//! accounts rotate.

use anyhow::{anyhow, Context, Result};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::{rngs::OsRng, Rng};

/// Byte limit inherited from bcrypt. Applied on both hash and verify so the
/// current and legacy schemes see the same input.
const MAX_PASSWORD_BYTES: usize = 72;

const GENERATED_PASSWORD_LENGTH: usize = 16;
const PASSWORD_SYMBOLS: &str = "!@#$%^&*()-_=+";

/// Truncate to the bcrypt limit without splitting a UTF-8 character.
fn truncate_password(password: &str) -> &str {
    if password.len() <= MAX_PASSWORD_BYTES {
        return password;
    }

    let mut end = MAX_PASSWORD_BYTES;
    while !password.is_char_boundary(end) {
        end -= 1;
    }

    &password[..end]
}

/// Hash a password with the current scheme.
pub(crate) fn hash_password(password: &str) -> Result<String> {
    let password = truncate_password(password);
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("Failed to hash password: {err}"))?;

    Ok(hash.to_string())
}

/// Verify against the current scheme first, then the legacy one. A mismatch
/// and a malformed stored hash are both "not verified", never an error.
pub(crate) fn verify_password(password: &str, password_hash: &str) -> bool {
    let password = truncate_password(password);

    if let Ok(parsed) = PasswordHash::new(password_hash) {
        if Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
        {
            return true;
        }
    }

    bcrypt::verify(password, password_hash).unwrap_or(false)
}

/// Run the hash on a blocking thread; hashing is deliberately slow.
pub(crate) async fn hash_blocking(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .context("hashing task failed")?
}

/// Run verification on a blocking thread.
pub(crate) async fn verify_blocking(password: String, password_hash: String) -> Result<bool> {
    let verified = tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
        .await
        .context("verification task failed")?;

    Ok(verified)
}

/// Six digit verification code, uniform with leading zeros kept.
pub(crate) fn generate_code() -> String {
    format!("{:06}", OsRng.gen_range(0..1_000_000))
}

/// Random password for the forgot-password flow.
pub(crate) fn generate_password() -> String {
    let alphabet: Vec<char> = ('a'..='z')
        .chain('A'..='Z')
        .chain('0'..='9')
        .chain(PASSWORD_SYMBOLS.chars())
        .collect();

    (0..GENERATED_PASSWORD_LENGTH)
        .map(|_| alphabet[OsRng.gen_range(0..alphabet.len())])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        generate_code, generate_password, hash_password, truncate_password, verify_password,
        PASSWORD_SYMBOLS,
    };

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("correct horse battery staple").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse battery staple", &hash));
        assert!(!verify_password("correct horse battery", &hash));
    }

    #[test]
    fn test_same_password_different_hashes() {
        let first = hash_password("hunter22").unwrap();
        let second = hash_password("hunter22").unwrap();

        assert_ne!(first, second, "salts must differ");
    }

    #[test]
    fn test_verify_legacy_bcrypt_hash() {
        // Minimum cost keeps the test fast
        let legacy = bcrypt::hash("hunter22", 4).unwrap();

        assert!(verify_password("hunter22", &legacy));
        assert!(!verify_password("hunter23", &legacy));
    }

    #[test]
    fn test_verify_garbage_hash_is_false() {
        assert!(!verify_password("hunter22", "not-a-hash"));
        assert!(!verify_password("hunter22", ""));
    }

    #[test]
    fn test_truncation_is_consistent() {
        let long = "a".repeat(80);
        let exact = "a".repeat(72);

        let hash = hash_password(&long).unwrap();
        assert!(verify_password(&exact, &hash));
        assert!(verify_password(&long, &hash));
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        let mut password = "a".repeat(71);
        password.push('é');
        assert_eq!(password.len(), 73);

        assert_eq!(truncate_password(&password).len(), 71);
        // Must not panic on the multibyte boundary
        assert!(hash_password(&password).is_ok());
    }

    #[test]
    fn test_generate_code_format() {
        for _ in 0..32 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_generate_password_alphabet() {
        let password = generate_password();

        assert_eq!(password.len(), 16);
        assert!(password
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SYMBOLS.contains(c)));
    }
}
