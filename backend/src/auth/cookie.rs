//! Session cookie parsing and `Set-Cookie` construction

use crate::config::CookieConfig;
use axum::http::{header, HeaderMap};

/// Cookie carrying the access token
pub const ACCESS_COOKIE_NAME: &str = "accessToken";

/// Cookie carrying the refresh token
pub const REFRESH_COOKIE_NAME: &str = "refreshToken";

/// Extract a cookie value from the Cookie header(s).
pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|part| part.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value for an HttpOnly session cookie
pub fn session_cookie(config: &CookieConfig, name: &str, value: &str, max_age_secs: i64) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; Path=/; SameSite={}; Max-Age={}",
        name,
        value,
        config.same_site,
        max_age_secs.max(0)
    );
    if config.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that removes a session cookie
pub fn clear_cookie(config: &CookieConfig, name: &str) -> String {
    session_cookie(config, name, "", 0)
}
