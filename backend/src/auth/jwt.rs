//! JWT token generation and validation
//!
//! Access and refresh tokens are signed with separate secrets; a token
//! minted for one purpose never validates for the other.

use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

const ACCESS: &str = "access";
const REFRESH: &str = "refresh";

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (account ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Token type: "access" or "refresh"
    pub token_type: String,
    /// Unique per issuance, so two tokens minted in the same second differ
    pub jti: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

impl Claims {
    pub fn account_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }
}

/// Profile claims embedded in access tokens
#[derive(Debug, Clone)]
pub struct TokenProfile {
    pub username: String,
    pub email: String,
    pub full_name: String,
}

/// Pre-computed JWT keys for one secret
#[derive(Clone)]
pub struct JwtKeys {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
}

impl JwtKeys {
    /// Create new JWT keys from secret
    /// This should be called once at startup
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
        }
    }

    pub fn encoding(&self) -> &EncodingKey {
        &self.encoding
    }

    pub fn decoding(&self) -> &DecodingKey {
        &self.decoding
    }
}

/// JWT service for token operations
///
/// Keys are wrapped in Arc for cheap cloning into request handlers.
#[derive(Clone)]
pub struct JwtService {
    access_keys: JwtKeys,
    refresh_keys: JwtKeys,
    access_token_expiry_secs: i64,
    refresh_token_expiry_secs: i64,
}

impl JwtService {
    /// Create a new JWT service with pre-computed keys
    ///
    /// Call this once at application startup and store in AppState.
    pub fn new(
        access_secret: &str,
        refresh_secret: &str,
        access_token_expiry_secs: i64,
        refresh_token_expiry_secs: i64,
    ) -> Self {
        Self {
            access_keys: JwtKeys::new(access_secret),
            refresh_keys: JwtKeys::new(refresh_secret),
            access_token_expiry_secs,
            refresh_token_expiry_secs,
        }
    }

    pub fn from_config(config: &crate::config::JwtConfig) -> Self {
        Self::new(
            &config.access_token_secret,
            &config.refresh_token_secret,
            config.access_token_expiry_secs,
            config.refresh_token_expiry_secs,
        )
    }

    /// Generate an access token carrying the account's profile claims
    #[inline]
    pub fn generate_access_token(&self, account_id: Uuid, profile: &TokenProfile) -> Result<String> {
        let claims = self.claims(account_id, ACCESS, self.access_token_expiry_secs, Some(profile));
        self.sign(&claims, &self.access_keys)
    }

    /// Generate a refresh token (account id only)
    #[inline]
    pub fn generate_refresh_token(&self, account_id: Uuid) -> Result<String> {
        let claims = self.claims(account_id, REFRESH, self.refresh_token_expiry_secs, None);
        self.sign(&claims, &self.refresh_keys)
    }

    fn claims(
        &self,
        account_id: Uuid,
        token_type: &str,
        expiry_secs: i64,
        profile: Option<&TokenProfile>,
    ) -> Claims {
        let now = Utc::now();
        let exp = now + Duration::seconds(expiry_secs);

        Claims {
            sub: account_id.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            token_type: token_type.to_string(),
            jti: Uuid::new_v4().to_string(),
            username: profile.map(|p| p.username.clone()),
            email: profile.map(|p| p.email.clone()),
            full_name: profile.map(|p| p.full_name.clone()),
        }
    }

    fn sign(&self, claims: &Claims, keys: &JwtKeys) -> Result<String> {
        encode(&Header::default(), claims, keys.encoding())
            .map_err(|e| anyhow::anyhow!("Failed to generate {} token: {}", claims.token_type, e))
    }

    fn validate(&self, token: &str, keys: &JwtKeys, token_type: &str) -> Result<Claims> {
        // Expired means expired: no clock leeway
        let mut validation = Validation::default();
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, keys.decoding(), &validation)
            .map_err(|e| anyhow::anyhow!("Invalid token: {}", e))?;

        if token_data.claims.token_type != token_type {
            return Err(anyhow::anyhow!("Not an {} token", token_type));
        }
        Ok(token_data.claims)
    }

    /// Validate an access token: signature, expiry and type
    #[inline]
    pub fn validate_access_token(&self, token: &str) -> Result<Claims> {
        self.validate(token, &self.access_keys, ACCESS)
    }

    /// Validate a refresh token: signature, expiry and type.
    ///
    /// This alone does not make a refresh token usable; it must also match
    /// the value stored on the account.
    #[inline]
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims> {
        self.validate(token, &self.refresh_keys, REFRESH)
    }

    #[inline]
    pub fn access_token_expiry_secs(&self) -> i64 {
        self.access_token_expiry_secs
    }

    #[inline]
    pub fn refresh_token_expiry_secs(&self) -> i64 {
        self.refresh_token_expiry_secs
    }
}
