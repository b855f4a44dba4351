//! Error types for the account auth service

use thiserror::Error;

/// Reasons a bearer token can fail to establish a session.
///
/// The `Display` output is what clients see, so every failure past
/// "no token at all" deliberately shares one generic message.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("Unauthorized request")]
    MissingToken,

    #[error("Invalid access token")]
    InvalidToken,

    #[error("Invalid access token")]
    AccountNotFound,
}

/// Refresh-flow failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshError {
    #[error("Unauthorized request")]
    MissingToken,

    #[error("Invalid refresh token")]
    InvalidToken,

    #[error("Refresh token is expired or used")]
    Superseded,
}
