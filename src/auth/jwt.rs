//! Session token generation and validation

use crate::{
    config::AppConfig,
    error::AppError,
    models::user::{Principal, Role},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const SESSION_TOKEN_TYPE: &str = "session";

/// JWT claims for session tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    /// Subject (user ID)
    pub sub: String,

    pub email: String,

    /// Role at the time of login
    pub role: Role,

    pub token_type: String,

    /// Issued at
    pub iat: i64,

    /// Expiration
    pub exp: i64,

    /// JWT ID (unique token identifier)
    pub jti: String,
}

/// JWT service
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    session_exp_secs: u64,
}

impl JwtService {
    /// Create JWT service from config
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let secret = config.security.jwt_secret.expose_secret();

        // HS256 需要至少 32 字节
        if secret.len() < 32 {
            return Err(AppError::Config("JWT secret too short (min 32 chars)".to_string()));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            session_exp_secs: config.security.session_exp_secs,
        })
    }

    /// Seconds until a freshly issued token expires
    pub fn expires_in(&self) -> u64 {
        self.session_exp_secs
    }

    /// Issue a session token for `principal`
    pub fn generate_session_token(&self, principal: &Principal) -> Result<String, AppError> {
        let now = Utc::now();
        let expiration = now + Duration::seconds(self.session_exp_secs as i64);

        let claims = SessionClaims {
            sub: principal.id.to_string(),
            email: principal.email.clone(),
            role: principal.role,
            token_type: SESSION_TOKEN_TYPE.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode session token: {:?}", e);
            AppError::Internal(format!("Failed to encode session token: {}", e))
        })
    }

    /// Validate and decode token
    pub fn validate_token(&self, token: &str) -> Result<SessionClaims, AppError> {
        Ok(
            decode::<SessionClaims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
                .map_err(|e| {
                    tracing::debug!("Token validation failed: {:?}", e);
                    AppError::Unauthorized
                })?
                .claims,
        )
    }

    /// Validate a session token and return the principal it carries
    pub fn validate_session_token(&self, token: &str) -> Result<Principal, AppError> {
        let claims = self.validate_token(token)?;

        if claims.token_type != SESSION_TOKEN_TYPE {
            tracing::debug!(
                "Token type mismatch: expected '{}', got '{}'",
                SESSION_TOKEN_TYPE,
                claims.token_type
            );
            return Err(AppError::Unauthorized);
        }

        let id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized)?;

        Ok(Principal {
            id,
            email: claims.email,
            role: claims.role,
        })
    }
}
