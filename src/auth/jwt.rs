use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::{AuthError, AuthUser, Claims};
use crate::models::User;

/// JWT token service for creating and validating tokens
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expires_in: Duration,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("encoding_key", &"[REDACTED]")
            .field("decoding_key", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

impl JwtService {
    pub fn new(secret: &str, expires_in: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expires_in,
        }
    }

    /// Create a token for a user, issued now
    pub fn create_token(&self, user: &User) -> Result<String, AuthError> {
        self.create_token_at(user, Utc::now())
    }

    pub fn create_token_at(&self, user: &User, issued_at: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = Claims {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.expires_in).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(AuthError::Jwt)
    }

    /// Validate signature and expiry and decode the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|token_data| token_data.claims)
            .map_err(|err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })
    }

    pub fn authenticate(&self, token: &str) -> Result<AuthUser, AuthError> {
        self.validate_token(token).map(AuthUser::from)
    }

    pub fn expires_in_seconds(&self) -> i64 {
        self.expires_in.num_seconds()
    }
}

/// Extract bearer token from authorization header
pub fn extract_bearer_token(auth_header: &str) -> Result<&str, AuthError> {
    match auth_header.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AuthError::InvalidAuthHeaderFormat),
    }
}
