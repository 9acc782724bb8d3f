//! Signed bearer tokens.
//!
//! Tokens are HS256 with `sub`, `iat`, `exp`, and a unique `jti` per
//! issuance. The `jti` is what the logout blocklist stores, so two logins by
//! the same user revoke independently.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub(crate) const TOKEN_TYPE: &str = "bearer";

/// Claims carried by every issued token.
///
/// `sub` and `jti` stay optional on decode so a token minted elsewhere fails
/// later with a precise message instead of a deserialization error.
#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct Claims {
    pub(crate) sub: Option<String>,
    pub(crate) iat: i64,
    pub(crate) exp: i64,
    pub(crate) jti: Option<String>,
}

pub(crate) struct IssuedToken {
    pub(crate) token: String,
    pub(crate) jti: String,
}

/// HS256 keys derived once from the process-wide secret.
pub(crate) struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenKeys {
    pub(crate) fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();

        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
        }
    }

    /// Sign a token for `subject` expiring `ttl_minutes` from now.
    pub(crate) fn issue(
        &self,
        subject: &str,
        ttl_minutes: i64,
    ) -> Result<IssuedToken, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let jti = Uuid::new_v4().to_string();

        let claims = Claims {
            sub: Some(subject.to_string()),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(ttl_minutes)).timestamp(),
            jti: Some(jti.clone()),
        };

        let token = encode(&Header::default(), &claims, &self.encoding)?;

        Ok(IssuedToken { token, jti })
    }

    /// Decode a token, checking signature and expiry. Expired, tampered, and
    /// malformed tokens are the same failure class for callers.
    pub(crate) fn decode(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact, no clock leeway
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding, &validation).map(|data| data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::{Claims, TokenKeys};
    use jsonwebtoken::{encode, errors::ErrorKind, EncodingKey, Header};
    use secrecy::SecretString;

    fn keys() -> TokenKeys {
        TokenKeys::new(&SecretString::from("test-secret".to_string()))
    }

    #[test]
    fn test_issue_and_decode() {
        let keys = keys();
        let issued = keys.issue("user@example.com", 30).unwrap();

        let claims = keys.decode(&issued.token).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("user@example.com"));
        assert_eq!(claims.jti.as_deref(), Some(issued.jti.as_str()));
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_jti_unique_per_issue() {
        let keys = keys();
        let first = keys.issue("user@example.com", 30).unwrap();
        let second = keys.issue("user@example.com", 30).unwrap();

        assert_ne!(first.jti, second.jti);
    }

    #[test]
    fn test_decode_rejects_tampered_token() {
        let keys = keys();
        let issued = keys.issue("user@example.com", 30).unwrap();

        let mut tampered = issued.token;
        tampered.push('x');

        assert!(keys.decode(&tampered).is_err());
    }

    #[test]
    fn test_decode_rejects_wrong_secret() {
        let keys = keys();
        let other = TokenKeys::new(&SecretString::from("other-secret".to_string()));

        let issued = keys.issue("user@example.com", 30).unwrap();
        assert!(other.decode(&issued.token).is_err());
    }

    #[test]
    fn test_decode_rejects_expired_token() {
        let keys = keys();
        let issued = keys.issue("user@example.com", -1).unwrap();

        let err = keys.decode(&issued.token).unwrap_err();
        assert_eq!(*err.kind(), ErrorKind::ExpiredSignature);
    }

    #[test]
    fn test_decode_keeps_missing_subject() {
        let claims = Claims {
            sub: None,
            iat: chrono::Utc::now().timestamp(),
            exp: chrono::Utc::now().timestamp() + 60,
            jti: None,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let decoded = keys().decode(&token).unwrap();
        assert!(decoded.sub.is_none());
        assert!(decoded.jti.is_none());
    }
}
