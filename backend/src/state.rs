//! Application state management
//!
//! This module provides the shared application state that is passed
//! to all request handlers via Axum's state extraction.
//!
//! All fields are `Arc`s or Arc-backed, so cloning per request is O(1), and
//! nothing in the state is mutated after startup.

use crate::auth::{JwtService, TokenIssuer};
use crate::config::AppConfig;
use crate::repositories::AccountRepository;
use crate::services::media::MediaUploader;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Account store
    pub accounts: Arc<dyn AccountRepository>,
    /// Media hosting client
    pub media: Arc<dyn MediaUploader>,
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Pre-initialized JWT service with cached keys
    pub jwt: JwtService,
    /// Token pair issuer sharing the JWT keys and account store
    pub tokens: TokenIssuer,
}

impl AppState {
    /// Create a new application state
    ///
    /// Pre-computes the JWT keys from the configured secrets; call once at
    /// startup.
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        media: Arc<dyn MediaUploader>,
        config: AppConfig,
    ) -> Self {
        let jwt = JwtService::from_config(&config.jwt);
        let tokens = TokenIssuer::new(jwt.clone(), accounts.clone());

        Self {
            accounts,
            media,
            config: Arc::new(config),
            jwt,
            tokens,
        }
    }

    #[inline]
    pub fn accounts(&self) -> &dyn AccountRepository {
        self.accounts.as_ref()
    }

    #[inline]
    pub fn media(&self) -> &dyn MediaUploader {
        self.media.as_ref()
    }

    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[inline]
    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    #[inline]
    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }
}
