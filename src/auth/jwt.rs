//! JWT token generation and validation

use crate::core::config::SecurityConfig;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Claim names owned by the token service; never taken from extra claims
const REGISTERED_CLAIMS: [&str; 3] = ["sub", "iat", "exp"];

/// JWT Claims structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user ID
    pub sub: String,
    /// Issued at (Unix timestamp, seconds)
    pub iat: i64,
    /// Expiration (Unix timestamp, seconds)
    pub exp: i64,
    /// Application claims, e.g. `email`
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    /// The `email` claim, if the token carries one
    pub fn email(&self) -> Option<&str> {
        self.extra.get("email").and_then(Value::as_str)
    }
}

/// Why a token was refused.
///
/// Only logged; clients see one generic authentication failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("signature mismatch")]
    BadSignature,
    #[error("token expired")]
    Expired,
}

/// Issues and verifies HS256 access tokens with one process-wide secret.
///
/// Tokens are not tracked server-side: one stays valid until `exp` even if
/// the account changes, and replacing the secret invalidates every token at
/// once.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    /// Build the service from the startup security configuration
    pub fn new(config: &SecurityConfig) -> Self {
        Self::with_ttl(
            config.jwt_secret.as_bytes(),
            Duration::minutes(config.access_token_expire_minutes),
        )
    }

    /// Build the service from a raw secret and lifetime
    pub fn with_ttl(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Lifetime of issued tokens
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `subject_id` valid from `now` until `now + ttl`
    ///
    /// `iat` and `exp` are whole Unix seconds; the sub-second part of `now`
    /// is dropped, so the effective lifetime is between `ttl - 1s` and `ttl`.
    pub fn issue(
        &self,
        subject_id: &str,
        extra_claims: Map<String, Value>,
        now: DateTime<Utc>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let mut extra = extra_claims;
        for name in REGISTERED_CLAIMS {
            extra.remove(name);
        }

        let claims = Claims {
            sub: subject_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            extra,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
    }

    /// Verify signature and expiry (`now < exp`) and return the claims
    ///
    /// Expiry is compared at one-second granularity: `now` is truncated to
    /// whole seconds before the check.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against the caller's clock
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                _ => TokenError::Malformed,
            }
        })?;

        if now.timestamp() >= data.claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SECRET: &[u8] = b"test-secret-key-with-at-least-32-bytes";

    fn service() -> TokenService {
        TokenService::with_ttl(SECRET, Duration::minutes(30))
    }

    fn email_claims(email: &str) -> Map<String, Value> {
        let mut extra = Map::new();
        extra.insert("email".to_string(), Value::String(email.to_string()));
        extra
    }

    #[test]
    fn test_issue_and_verify() {
        let service = service();
        let now = Utc::now();
        let token = service.issue("user-1", email_claims("a@x.com"), now).unwrap();

        let claims = service.verify(&token, now).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email(), Some("a@x.com"));
        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.exp, now.timestamp() + 30 * 60);
    }

    #[test]
    fn test_expiry_boundary() {
        let service = service();
        let issued = Utc::now();
        let token = service.issue("user-1", Map::new(), issued).unwrap();
        let ttl = service.ttl();

        assert!(service.verify(&token, issued + ttl - Duration::seconds(1)).is_ok());
        assert_eq!(
            service.verify(&token, issued + ttl + Duration::seconds(1)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_expiry_has_one_second_granularity() {
        let service = service();
        let second = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let issued = second + Duration::milliseconds(900);
        let token = service.issue("user-1", Map::new(), issued).unwrap();
        let exp = second + service.ttl();

        let claims = service.verify(&token, issued).unwrap();
        assert_eq!(claims.iat, second.timestamp());
        assert_eq!(claims.exp, exp.timestamp());

        // Valid up to the last instant of the second before `exp`
        assert!(service.verify(&token, exp - Duration::nanoseconds(1)).is_ok());
        assert_eq!(service.verify(&token, exp), Err(TokenError::Expired));
        // Half a second short of a full ttl after issue, yet already at `exp`
        assert_eq!(
            service.verify(&token, issued + service.ttl() - Duration::milliseconds(500)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_wrong_key_rejected() {
        let now = Utc::now();
        let token = service().issue("user-1", Map::new(), now).unwrap();
        let other = TokenService::with_ttl(b"another-secret-key-also-32-bytes-long", Duration::minutes(30));

        assert_eq!(other.verify(&token, now), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let service = service();
        assert_eq!(service.verify("", Utc::now()), Err(TokenError::Malformed));
        assert_eq!(service.verify("a.b.c", Utc::now()), Err(TokenError::Malformed));
        assert_eq!(service.verify("not a token", Utc::now()), Err(TokenError::Malformed));
    }

    #[test]
    fn test_registered_claims_cannot_be_overridden() {
        let service = service();
        let now = Utc::now();
        let mut extra = email_claims("a@x.com");
        extra.insert("sub".to_string(), Value::String("someone-else".to_string()));
        extra.insert("exp".to_string(), Value::from(i64::MAX));

        let token = service.issue("user-1", extra, now).unwrap();
        let claims = service.verify(&token, now).unwrap();

        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.exp, now.timestamp() + 30 * 60);
        assert!(!claims.extra.contains_key("sub"));
    }

    #[test]
    fn test_token_never_carries_admin_bit() {
        let service = service();
        let now = Utc::now();
        let token = service.issue("user-1", email_claims("a@x.com"), now).unwrap();
        let claims = service.verify(&token, now).unwrap();

        assert_eq!(claims.extra.len(), 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_tampered_payload_rejected(pos in any::<prop::sample::Index>(), replacement in "[A-Za-z0-9_-]") {
            let service = service();
            let now = Utc::now();
            let token = service.issue("user-1", email_claims("a@x.com"), now).unwrap();

            let parts: Vec<&str> = token.split('.').collect();
            let payload = parts[1];
            // The last base64url character can carry padding bits only
            let idx = pos.index(payload.len() - 1);
            let original = &payload[idx..idx + 1];
            prop_assume!(original != replacement);

            let tampered_payload = format!("{}{}{}", &payload[..idx], replacement, &payload[idx + 1..]);
            let tampered = format!("{}.{}.{}", parts[0], tampered_payload, parts[2]);

            prop_assert!(service.verify(&tampered, now).is_err());
        }
    }
}
