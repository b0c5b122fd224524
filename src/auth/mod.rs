use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config;

/// Role claim carried by user session tokens
pub const AUTHENTICATED_ROLE: &str = "authenticated";

/// Session token claims, compatible with Supabase-issued access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

fn default_role() -> String {
    AUTHENTICATED_ROLE.to_string()
}

impl Claims {
    pub fn new(sub: Uuid, email: Option<String>) -> Self {
        let expiry_hours = config::config().security.jwt_expiry_hours;
        Self::with_expiry(sub, email, Duration::hours(expiry_hours as i64))
    }

    pub fn with_expiry(sub: Uuid, email: Option<String>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub,
            email,
            role: default_role(),
            aud: Some(AUTHENTICATED_ROLE.to_string()),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// The caller a request acts on behalf of
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub role: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}

impl AuthUser {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            email: None,
            role: default_role(),
        }
    }

    /// Claims as exposed to row-level security policies
    pub fn claims_json(&self) -> serde_json::Value {
        serde_json::json!({
            "sub": self.id,
            "email": self.email,
            "role": self.role,
        })
    }
}

#[derive(Debug)]
pub enum JwtError {
    TokenGeneration(String),
    InvalidSecret,
    InvalidToken(String),
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::TokenGeneration(msg) => write!(f, "JWT generation error: {}", msg),
            JwtError::InvalidSecret => write!(f, "Invalid JWT secret"),
            JwtError::InvalidToken(msg) => write!(f, "Invalid JWT token: {}", msg),
        }
    }
}

impl std::error::Error for JwtError {}

pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    let header = Header::default();

    encode(&header, claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

pub fn validate_jwt(token: &str, secret: &str) -> Result<Claims, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_aud = false;

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| JwtError::InvalidToken(e.to_string()))
}

/// Resolves the caller from a presented session token
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_user(&self, token: &str) -> Result<AuthUser, JwtError>;
}

/// Verifies HS256 tokens signed with a shared secret
#[derive(Clone)]
pub struct JwtIdentity {
    secret: String,
}

impl JwtIdentity {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }

    pub fn from_config() -> Self {
        Self::new(config::config().security.jwt_secret.clone())
    }

    /// Mint a token this provider will accept
    pub fn issue(&self, user_id: Uuid, email: Option<String>) -> Result<String, JwtError> {
        generate_jwt(&Claims::new(user_id, email), &self.secret)
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentity {
    async fn current_user(&self, token: &str) -> Result<AuthUser, JwtError> {
        validate_jwt(token, &self.secret).map(AuthUser::from)
    }
}
