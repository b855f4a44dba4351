//! Account authentication routes
//!
//! Tokens are delivered twice: as HttpOnly cookies for browsers and in the
//! JSON body for clients that cannot hold cookies.

use crate::auth::cookie::{
    clear_cookie, get_cookie, session_cookie, ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME,
};
use crate::auth::{CurrentAccount, TokenPair};
use crate::error::{ApiError, ApiResult};
use crate::services::media::{discard_staged, stage_file};
use crate::services::{AccountService, RegisterInput};
use crate::state::AppState;
use account_auth_shared::{
    AccountProfile, ApiResponse, AuthTokens, ChangePasswordRequest, EmptyData, LoginRequest,
    LoginResponse, RefreshTokenRequest,
};
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header::SET_COOKIE, HeaderMap, HeaderName, StatusCode},
    response::{AppendHeaders, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use std::path::{Path, PathBuf};

type SessionCookies = AppendHeaders<[(HeaderName, String); 2]>;

/// Create account auth routes
pub fn auth_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/register",
            post(register).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/refresh-token", post(refresh_token))
        .route("/change-password", post(change_password))
        .route("/current-user", get(current_user))
}

fn set_session_cookies(state: &AppState, tokens: &TokenPair) -> SessionCookies {
    let config = &state.config().cookies;
    AppendHeaders([
        (
            SET_COOKIE,
            session_cookie(
                config,
                ACCESS_COOKIE_NAME,
                &tokens.access_token,
                state.jwt().access_token_expiry_secs(),
            ),
        ),
        (
            SET_COOKIE,
            session_cookie(
                config,
                REFRESH_COOKIE_NAME,
                &tokens.refresh_token,
                state.jwt().refresh_token_expiry_secs(),
            ),
        ),
    ])
}

fn clear_session_cookies(state: &AppState) -> SessionCookies {
    let config = &state.config().cookies;
    AppendHeaders([
        (SET_COOKIE, clear_cookie(config, ACCESS_COOKIE_NAME)),
        (SET_COOKIE, clear_cookie(config, REFRESH_COOKIE_NAME)),
    ])
}

/// Register a new account
///
/// POST /api/v1/users/register (multipart/form-data)
///
/// Staged upload files are removed whatever the outcome.
async fn register(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<ApiResponse<AccountProfile>>)> {
    let mut staged = Vec::new();
    let result = register_from_form(&state, &mut multipart, &mut staged).await;
    discard_staged(&staged).await;

    let profile = result?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            StatusCode::CREATED.as_u16(),
            profile,
            "User registered successfully",
        )),
    ))
}

async fn register_from_form(
    state: &AppState,
    multipart: &mut Multipart,
    staged: &mut Vec<PathBuf>,
) -> ApiResult<AccountProfile> {
    let temp_dir = Path::new(&state.config().media.temp_dir);
    let mut input = RegisterInput::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("Invalid multipart data".to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "fullName" | "email" | "username" | "password" => {
                let text = field
                    .text()
                    .await
                    .map_err(|_| ApiError::BadRequest(format!("Failed to read {}", name)))?;
                let slot = match name.as_str() {
                    "fullName" => &mut input.full_name,
                    "email" => &mut input.email,
                    "username" => &mut input.username,
                    _ => &mut input.password,
                };
                *slot = Some(text);
            }
            "avatar" | "coverImage" => {
                let file_name = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| ApiError::BadRequest(format!("Failed to read {}", name)))?;
                if bytes.is_empty() {
                    continue;
                }

                let path = stage_file(temp_dir, file_name.as_deref(), &bytes).await?;
                staged.push(path.clone());

                let slot = if name == "avatar" {
                    &mut input.avatar
                } else {
                    &mut input.cover_image
                };
                // First file wins
                slot.get_or_insert(path);
            }
            _ => {}
        }
    }

    AccountService::register(state.accounts(), state.media(), input).await
}

/// Login with username or email
///
/// POST /api/v1/users/login
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let (user, tokens) = AccountService::login(state.accounts(), state.tokens(), &req).await?;

    let cookies = set_session_cookies(&state, &tokens);
    let body = LoginResponse {
        user,
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
    };
    Ok((
        cookies,
        Json(ApiResponse::new(200, body, "User logged In Successfully")),
    ))
}

/// Logout (requires authentication)
///
/// POST /api/v1/users/logout
async fn logout(
    State(state): State<AppState>,
    current: CurrentAccount,
) -> ApiResult<impl IntoResponse> {
    AccountService::logout(state.accounts(), current.id()).await?;

    Ok((
        clear_session_cookies(&state),
        Json(ApiResponse::new(200, EmptyData {}, "User logged Out")),
    ))
}

/// Exchange the refresh token for a new pair
///
/// POST /api/v1/users/refresh-token
///
/// Reads the `refreshToken` cookie, falling back to `{"refreshToken": ...}`.
async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<RefreshTokenRequest>>,
) -> ApiResult<impl IntoResponse> {
    let presented = get_cookie(&headers, REFRESH_COOKIE_NAME)
        .map(str::to_string)
        .or_else(|| body.and_then(|Json(req)| req.refresh_token));

    let tokens =
        AccountService::refresh(state.accounts(), state.tokens(), presented.as_deref()).await?;

    let cookies = set_session_cookies(&state, &tokens);
    let body = AuthTokens {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
    };
    Ok((
        cookies,
        Json(ApiResponse::new(200, body, "Access token refreshed")),
    ))
}

/// Change password (requires authentication)
///
/// POST /api/v1/users/change-password
async fn change_password(
    State(state): State<AppState>,
    current: CurrentAccount,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<Json<ApiResponse<EmptyData>>> {
    AccountService::change_password(
        state.accounts(),
        current.id(),
        &req,
        state.config().auth.revoke_sessions_on_password_change,
    )
    .await?;

    Ok(Json(ApiResponse::new(
        200,
        EmptyData {},
        "Password changed successfully",
    )))
}

/// Current account (requires authentication)
///
/// GET /api/v1/users/current-user
async fn current_user(current: CurrentAccount) -> Json<ApiResponse<AccountProfile>> {
    Json(ApiResponse::new(
        200,
        current.0,
        "Current user fetched successfully",
    ))
}
