//! Session middleware
//!
//! Resolves the access token on a request to an account. Handlers that take a
//! [`CurrentAccount`] argument only run once that succeeded; on any failure
//! the request is answered with 401 and no identity is ever produced.

use super::cookie::{get_cookie, ACCESS_COOKIE_NAME};
use crate::error::{ApiError, ApiResult};
use crate::repositories::{AccountRecord, AccountRepository};
use crate::state::AppState;
use account_auth_shared::{AccountProfile, AuthError};
use axum::{
    extract::FromRef,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::debug;
use uuid::Uuid;

/// The authenticated account, credential fields stripped
#[derive(Debug, Clone)]
pub struct CurrentAccount(pub AccountProfile);

impl CurrentAccount {
    pub fn id(&self) -> Uuid {
        self.0.id
    }

    pub fn profile(&self) -> &AccountProfile {
        &self.0
    }
}

/// Access token from the `accessToken` cookie, else from `Authorization: Bearer`
pub fn access_token_from(headers: &HeaderMap) -> Option<&str> {
    get_cookie(headers, ACCESS_COOKIE_NAME).or_else(|| {
        headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
    })
}

/// Validate the request's access token and load the account it names.
///
/// Store failures surface as internal errors; every token problem is 401.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> ApiResult<AccountRecord> {
    let token = access_token_from(headers).ok_or(AuthError::MissingToken)?;

    let claims = state.jwt().validate_access_token(token).map_err(|e| {
        debug!("Rejected access token: {}", e);
        AuthError::InvalidToken
    })?;

    let account_id = claims.account_id().ok_or(AuthError::InvalidToken)?;

    let account = state
        .accounts()
        .find_by_id(account_id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or(AuthError::AccountNotFound)?;

    Ok(account)
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentAccount
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let account = authenticate(&app_state, &parts.headers).await?;
        Ok(CurrentAccount(account.profile()))
    }
}
