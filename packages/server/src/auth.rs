//! Connection authentication against the platform's bearer tokens.
//!
//! Tokens are HS256 JWTs signed with a secret shared with the rest of the
//! platform. The gate runs before the WebSocket upgrade; a connection that
//! fails here never touches the registry or any room.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable holding the shared token signing secret.
pub const JWT_SECRET_ENV: &str = "AGORA_JWT_SECRET";

/// Platform role carried inside the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Mentor,
    Admin,
}

/// Decoded identity attached to a connection after authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cohort_id: Option<String>,
    /// Expiry as a Unix timestamp (seconds)
    pub exp: i64,
}

/// Authentication errors. Either variant rejects the connection outright;
/// the client must reconnect with a fresh token.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authentication error: no token provided")]
    MissingToken,

    #[error("authentication error: invalid token")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
}

/// Verifies bearer tokens against the shared signing secret.
pub struct TokenVerifier {
    decoding_key: DecodingKey,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Verify a token and return the decoded identity.
    ///
    /// Fails on expired, malformed, or mis-signed tokens.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let data = jsonwebtoken::decode::<Claims>(
            token,
            &self.decoding_key,
            &Validation::new(Algorithm::HS256),
        )?;
        Ok(data.claims)
    }
}

/// Sign a token the verifier will accept. Used by tests and operator tooling;
/// in production tokens come from the platform's auth service.
pub fn mint_token(secret: &str, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_shared::time::now_timestamp_millis;

    const SECRET: &str = "test-secret";

    fn claims_for(user_id: &str, cohort_id: Option<&str>, exp: i64) -> Claims {
        Claims {
            user_id: user_id.to_string(),
            role: Role::Student,
            cohort_id: cohort_id.map(str::to_string),
            exp,
        }
    }

    fn future_exp() -> i64 {
        now_timestamp_millis() / 1000 + 3600
    }

    #[test]
    fn test_verify_accepts_token_signed_with_shared_secret() {
        // given:
        let verifier = TokenVerifier::new(SECRET);
        let token = mint_token(SECRET, &claims_for("alice", Some("c1"), future_exp())).unwrap();

        // when:
        let result = verifier.verify(&token);

        // then:
        let claims = result.unwrap();
        assert_eq!(claims.user_id, "alice");
        assert_eq!(claims.role, Role::Student);
        assert_eq!(claims.cohort_id.as_deref(), Some("c1"));
    }

    #[test]
    fn test_verify_accepts_token_without_cohort() {
        // given:
        let verifier = TokenVerifier::new(SECRET);
        let token = mint_token(SECRET, &claims_for("bob", None, future_exp())).unwrap();

        // when:
        let claims = verifier.verify(&token).unwrap();

        // then:
        assert_eq!(claims.user_id, "bob");
        assert_eq!(claims.cohort_id, None);
    }

    #[test]
    fn test_verify_rejects_token_signed_with_other_secret() {
        // given:
        let verifier = TokenVerifier::new(SECRET);
        let token =
            mint_token("other-secret", &claims_for("alice", None, future_exp())).unwrap();

        // when:
        let result = verifier.verify(&token);

        // then:
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        // given: a token that expired an hour ago (well past validation leeway)
        let verifier = TokenVerifier::new(SECRET);
        let expired = now_timestamp_millis() / 1000 - 3600;
        let token = mint_token(SECRET, &claims_for("alice", None, expired)).unwrap();

        // when:
        let result = verifier.verify(&token);

        // then:
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_verify_rejects_malformed_token() {
        // given:
        let verifier = TokenVerifier::new(SECRET);

        // when:
        let result = verifier.verify("not-a-jwt");

        // then:
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_claims_use_camel_case_on_the_wire() {
        // given:
        let claims = claims_for("alice", Some("c1"), 1700000000);

        // when:
        let json = serde_json::to_value(&claims).unwrap();

        // then:
        assert_eq!(json["userId"], "alice");
        assert_eq!(json["cohortId"], "c1");
        assert_eq!(json["role"], "student");
    }
}
