use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::models::Role;

/// JWT service for token generation and validation
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expiry_minutes: i64,
}

/// Claims for access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject (user ID)
    pub sub: String,
    pub email: String,
    pub role: Role,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    pub jti: String,
}

/// Token response returned to client
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub role: Role,
    pub user_id: String,
}

impl JwtService {
    /// HS256 signer/verifier over the shared secret.
    pub fn new(config: &JwtConfig) -> Result<Self, anyhow::Error> {
        if config.secret.len() < 16 {
            anyhow::bail!("JWT secret must be at least 16 bytes");
        }

        tracing::info!("JWT service initialized with HS256 secret");

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            access_token_expiry_minutes: config.access_token_expiry_minutes,
        })
    }

    pub fn generate_access_token(
        &self,
        user_id: &str,
        email: &str,
        role: Role,
    ) -> Result<String, anyhow::Error> {
        let now = Utc::now();
        let exp = now + Duration::minutes(self.access_token_expiry_minutes);

        let claims = AccessTokenClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode access token: {}", e))
    }

    pub fn token_response(
        &self,
        user_id: &str,
        email: &str,
        role: Role,
    ) -> Result<TokenResponse, anyhow::Error> {
        Ok(TokenResponse {
            access_token: self.generate_access_token(user_id, email, role)?,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry_minutes * 60,
            role,
            user_id: user_id.to_string(),
        })
    }

    pub fn validate_access_token(
        &self,
        token: &str,
    ) -> Result<AccessTokenClaims, jsonwebtoken::errors::Error> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str, minutes: i64) -> JwtService {
        JwtService::new(&JwtConfig {
            secret: secret.to_string(),
            access_token_expiry_minutes: minutes,
        })
        .expect("valid jwt config")
    }

    #[test]
    fn access_token_round_trip_keeps_role() {
        let jwt = service("test-secret-0123456789", 120);
        let token = jwt
            .generate_access_token("user-1", "a@example.com", Role::PropertyManager)
            .unwrap();

        let claims = jwt.validate_access_token(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email, "a@example.com");
        assert_eq!(claims.role, Role::PropertyManager);
        assert_eq!(claims.exp - claims.iat, 120 * 60);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let issuer = service("issuer-secret-0123456789", 10);
        let verifier = service("verifier-secret-0123456789", 10);
        let token = issuer
            .generate_access_token("user-1", "a@example.com", Role::Admin)
            .unwrap();

        assert!(verifier.validate_access_token(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let jwt = service("test-secret-0123456789", -10);
        let token = jwt
            .generate_access_token("user-1", "a@example.com", Role::Customer)
            .unwrap();

        assert!(jwt.validate_access_token(&token).is_err());
    }

    #[test]
    fn short_secret_is_refused() {
        let result = JwtService::new(&JwtConfig {
            secret: "short".into(),
            access_token_expiry_minutes: 5,
        });
        assert!(result.is_err());
    }
}
