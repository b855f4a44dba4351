//! Access/refresh token pair issuance
//!
//! Both tokens are signed before anything is written, and nothing is handed
//! back unless the refresh token was persisted.

use super::jwt::JwtService;
use crate::error::{ApiError, ApiResult};
use crate::repositories::{AccountRecord, AccountRepository};
use account_auth_shared::RefreshError;
use anyhow::Context;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

const ISSUE_FAILED: &str = "Something went wrong while generating refresh and access token";

/// A freshly issued access/refresh token pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Mints token pairs and keeps the account's stored refresh token in step
#[derive(Clone)]
pub struct TokenIssuer {
    jwt: JwtService,
    accounts: Arc<dyn AccountRepository>,
}

impl TokenIssuer {
    pub fn new(jwt: JwtService, accounts: Arc<dyn AccountRepository>) -> Self {
        Self { jwt, accounts }
    }

    /// Issue a new pair for an existing account, overwriting whatever refresh
    /// token was stored before.
    pub async fn issue_token_pair(&self, account_id: Uuid) -> ApiResult<TokenPair> {
        let account = self
            .accounts
            .find_by_id(account_id)
            .await
            .context(ISSUE_FAILED)?
            .ok_or_else(|| anyhow::anyhow!("account {} vanished before token issuance", account_id))
            .context(ISSUE_FAILED)?;

        let pair = self.sign_pair(&account)?;

        let stored = self
            .accounts
            .set_refresh_token(account.id, Some(&pair.refresh_token))
            .await
            .context(ISSUE_FAILED)?;
        if !stored {
            return Err(anyhow::anyhow!("account {} vanished before token issuance", account_id)
                .context(ISSUE_FAILED)
                .into());
        }

        debug!(account_id = %account.id, "Issued token pair");
        Ok(pair)
    }

    /// Issue a new pair in exchange for `presented`, which must still be the
    /// stored refresh token at the moment of the write. Of two concurrent
    /// rotations with the same token only one succeeds.
    pub async fn rotate_token_pair(
        &self,
        account: &AccountRecord,
        presented: &str,
    ) -> ApiResult<TokenPair> {
        let pair = self.sign_pair(account)?;

        let swapped = self
            .accounts
            .swap_refresh_token(account.id, presented, &pair.refresh_token)
            .await
            .context(ISSUE_FAILED)?;
        if !swapped {
            return Err(RefreshError::Superseded.into());
        }

        debug!(account_id = %account.id, "Rotated token pair");
        Ok(pair)
    }

    fn sign_pair(&self, account: &AccountRecord) -> Result<TokenPair, ApiError> {
        let access_token = self
            .jwt
            .generate_access_token(account.id, &account.token_profile())
            .context(ISSUE_FAILED)?;
        let refresh_token = self
            .jwt
            .generate_refresh_token(account.id)
            .context(ISSUE_FAILED)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }
}
