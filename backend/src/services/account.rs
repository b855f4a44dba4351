//! Account service: registration, login, logout, refresh and password change
//!
//! Password hashing/verification runs on the blocking thread pool; token
//! signing reuses the pre-computed keys held by the [`TokenIssuer`].

use crate::auth::{PasswordService, TokenIssuer, TokenPair};
use crate::error::{ApiError, ApiResult};
use crate::repositories::{AccountRepository, NewAccount};
use crate::services::media::MediaUploader;
use account_auth_shared::validation::{missing_fields, non_blank, normalize_username, validate_email};
use account_auth_shared::{AccountProfile, ChangePasswordRequest, LoginRequest, RefreshError};
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

/// Registration form after multipart parsing. Files are already staged locally.
#[derive(Debug, Clone, Default)]
pub struct RegisterInput {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub avatar: Option<PathBuf>,
    pub cover_image: Option<PathBuf>,
}

/// Account service for authentication operations
pub struct AccountService;

impl AccountService {
    /// Register a new account
    ///
    /// Every check that can reject the request runs before the store is
    /// written to.
    pub async fn register(
        accounts: &dyn AccountRepository,
        media: &dyn MediaUploader,
        input: RegisterInput,
    ) -> ApiResult<AccountProfile> {
        let missing = missing_fields(&[
            ("fullName", input.full_name.as_deref()),
            ("email", input.email.as_deref()),
            ("username", input.username.as_deref()),
            ("password", input.password.as_deref()),
        ]);
        if !missing.is_empty() {
            return Err(ApiError::MissingFields(
                missing.into_iter().map(str::to_string).collect(),
            ));
        }

        let full_name = input.full_name.unwrap_or_default().trim().to_string();
        let email = input.email.unwrap_or_default().trim().to_string();
        let username = normalize_username(&input.username.unwrap_or_default());
        let password = input.password.unwrap_or_default();

        validate_email(&email).map_err(ApiError::Validation)?;

        if accounts
            .find_by_username_or_email(Some(&username), Some(&email))
            .await?
            .is_some()
        {
            return Err(ApiError::Conflict(
                "User with email or username already exists".to_string(),
            ));
        }

        let avatar_path = input
            .avatar
            .ok_or_else(|| ApiError::BadRequest("Avatar file is required".to_string()))?;
        let avatar = media
            .upload(&avatar_path)
            .await
            .ok_or_else(|| ApiError::BadRequest("Avatar file is required".to_string()))?;

        let cover_image = match input.cover_image {
            Some(path) => media.upload(&path).await.map(|m| m.url).unwrap_or_default(),
            None => String::new(),
        };

        let password_hash = PasswordService::hash_async(password).await?;

        let account = accounts
            .create(NewAccount {
                username,
                email,
                full_name,
                avatar: avatar.url,
                cover_image,
                password_hash,
            })
            .await?
            .ok_or_else(|| {
                ApiError::Conflict("User with email or username already exists".to_string())
            })?;

        info!(account_id = %account.id, username = %account.username, "Account registered");
        Ok(account.profile())
    }

    /// Login with username or email and password
    pub async fn login(
        accounts: &dyn AccountRepository,
        tokens: &TokenIssuer,
        req: &LoginRequest,
    ) -> ApiResult<(AccountProfile, TokenPair)> {
        let username = non_blank(req.username.as_deref()).map(normalize_username);
        let email = non_blank(req.email.as_deref());

        if username.is_none() && email.is_none() {
            return Err(ApiError::BadRequest(
                "username or email is required".to_string(),
            ));
        }
        let password = req
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ApiError::BadRequest("password is required".to_string()))?;

        let account = accounts
            .find_by_username_or_email(username.as_deref(), email)
            .await?
            .ok_or_else(|| ApiError::NotFound("User does not exist".to_string()))?;

        if !account.is_password_correct(password).await? {
            info!(account_id = %account.id, "Login rejected: bad password");
            return Err(ApiError::Unauthorized("Invalid user credentials".to_string()));
        }

        let pair = tokens.issue_token_pair(account.id).await?;

        let profile = accounts
            .find_by_id(account.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("account {} vanished after login", account.id))?
            .profile();

        info!(account_id = %account.id, "Logged in");
        Ok((profile, pair))
    }

    /// Forget the stored refresh token. Safe to repeat.
    pub async fn logout(accounts: &dyn AccountRepository, account_id: Uuid) -> ApiResult<()> {
        accounts.set_refresh_token(account_id, None).await?;
        info!(account_id = %account_id, "Logged out");
        Ok(())
    }

    /// Exchange a refresh token for a new pair.
    ///
    /// The token must verify against the refresh secret AND equal the value
    /// stored on its account; the rotation itself is a compare-and-swap.
    pub async fn refresh(
        accounts: &dyn AccountRepository,
        tokens: &TokenIssuer,
        presented: Option<&str>,
    ) -> ApiResult<TokenPair> {
        let presented = non_blank(presented).ok_or(RefreshError::MissingToken)?;

        let claims = tokens
            .jwt()
            .validate_refresh_token(presented)
            .map_err(|_| RefreshError::InvalidToken)?;
        let account_id = claims.account_id().ok_or(RefreshError::InvalidToken)?;

        let account = accounts
            .find_by_id(account_id)
            .await?
            .ok_or(RefreshError::InvalidToken)?;

        if account.refresh_token.as_deref() != Some(presented) {
            info!(account_id = %account.id, "Refresh rejected: token superseded");
            return Err(RefreshError::Superseded.into());
        }

        let pair = tokens.rotate_token_pair(&account, presented).await?;
        info!(account_id = %account.id, "Refreshed tokens");
        Ok(pair)
    }

    /// Replace the password after checking the old one.
    ///
    /// With `revoke_sessions` the stored refresh token is cleared in the same
    /// write, so sessions from before the change cannot refresh.
    pub async fn change_password(
        accounts: &dyn AccountRepository,
        account_id: Uuid,
        req: &ChangePasswordRequest,
        revoke_sessions: bool,
    ) -> ApiResult<()> {
        if req.new_password.trim().is_empty() {
            return Err(ApiError::BadRequest("newPassword is required".to_string()));
        }

        let account = accounts
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User does not exist".to_string()))?;

        if !account.is_password_correct(&req.old_password).await? {
            return Err(ApiError::Unauthorized("Invalid old password".to_string()));
        }

        let password_hash = PasswordService::hash_async(req.new_password.clone()).await?;
        let updated = accounts
            .update_password_hash(account_id, &password_hash, revoke_sessions)
            .await?;
        if !updated {
            return Err(ApiError::NotFound("User does not exist".to_string()));
        }

        info!(account_id = %account_id, revoked = revoke_sessions, "Password changed");
        Ok(())
    }
}
