use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::authz::Role;
use crate::config;

/// Session claims shared with the authentication provider (HS256, shared secret)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: Uuid,
    /// Organization the session belongs to; absent for platform staff
    #[serde(default)]
    pub org: Option<Uuid>,
    pub email: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub internal: bool,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn for_member(
        user_id: Uuid,
        organization_id: Uuid,
        email: impl Into<String>,
        role: Role,
    ) -> Self {
        Self::build(user_id, Some(organization_id), email.into(), Some(role), false)
    }

    pub fn for_internal(staff_id: Uuid, email: impl Into<String>) -> Self {
        Self::build(staff_id, None, email.into(), None, true)
    }

    fn build(
        sub: Uuid,
        org: Option<Uuid>,
        email: String,
        role: Option<Role>,
        internal: bool,
    ) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub,
            org,
            email,
            role,
            internal,
            exp,
            iat: now.timestamp(),
        }
    }

    /// Seconds until expiry, relative to issue time
    pub fn expires_in(&self) -> i64 {
        self.exp - self.iat
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("JWT secret not configured")]
    InvalidSecret,

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),
}

pub fn generate_jwt(claims: &Claims) -> Result<String, JwtError> {
    encode_with_secret(claims, &config::config().security.jwt_secret)
}

pub fn validate_jwt(token: &str) -> Result<Claims, JwtError> {
    decode_with_secret(token, &config::config().security.jwt_secret)
}

pub fn encode_with_secret(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

pub fn decode_with_secret(token: &str, secret: &str) -> Result<Claims, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
        .map_err(|e| JwtError::InvalidToken(e.to_string()))?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn member_tokens_round_trip() {
        let claims =
            Claims::for_member(Uuid::new_v4(), Uuid::new_v4(), "ada@example.com", Role::Editor);
        let token = encode_with_secret(&claims, SECRET).unwrap();
        let decoded = decode_with_secret(&token, SECRET).unwrap();
        assert_eq!(decoded, claims);
        assert!(!decoded.internal);
        assert!(decoded.expires_in() > 0);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let claims = Claims::for_internal(Uuid::new_v4(), "staff@example.com");
        let token = encode_with_secret(&claims, SECRET).unwrap();
        assert!(matches!(
            decode_with_secret(&token, "another-secret"),
            Err(JwtError::InvalidToken(_))
        ));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let mut claims = Claims::for_member(Uuid::new_v4(), Uuid::new_v4(), "a@b.co", Role::Viewer);
        claims.iat -= 7200;
        claims.exp = Utc::now().timestamp() - 3600;
        let token = encode_with_secret(&claims, SECRET).unwrap();
        assert!(decode_with_secret(&token, SECRET).is_err());
    }

    #[test]
    fn empty_secret_is_refused() {
        let claims = Claims::for_internal(Uuid::new_v4(), "staff@example.com");
        assert!(matches!(encode_with_secret(&claims, ""), Err(JwtError::InvalidSecret)));
    }
}
