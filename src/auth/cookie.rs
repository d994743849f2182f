//! Binding of session tokens to cookies.
//!
//! Issued cookies carry no `Max-Age`: they live for the browser session and
//! the expiry embedded in the token is what actually ends the session.

use axum::http::{HeaderMap, HeaderValue, header};

use crate::jwt::TokenClass;

/// Cookie name for the access token.
pub const ACCESS_COOKIE_NAME: &str = "access_token_cookie";

/// Cookie name for the refresh token.
pub const REFRESH_COOKIE_NAME: &str = "refresh_token_cookie";

/// The access cookie is sent with every request.
pub const ACCESS_COOKIE_PATH: &str = "/";

/// The refresh cookie is only sent to the refresh endpoint.
pub const REFRESH_COOKIE_PATH: &str = "/refresh";

/// Cookie name and path for a token class.
pub fn cookie_slot(class: TokenClass) -> (&'static str, &'static str) {
    match class {
        TokenClass::Access => (ACCESS_COOKIE_NAME, ACCESS_COOKIE_PATH),
        TokenClass::Refresh => (REFRESH_COOKIE_NAME, REFRESH_COOKIE_PATH),
    }
}

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in cookie_header.split(';') {
        let part = part.trim();
        if let Some((key, value)) = part.split_once('=') {
            if key.trim() == name {
                let value = value.trim();
                return (!value.is_empty()).then_some(value);
            }
        }
    }
    None
}

/// Read the token of the given class from the request cookies.
pub fn extract(headers: &HeaderMap, class: TokenClass) -> Option<&str> {
    get_cookie(headers, cookie_slot(class).0)
}

/// `Set-Cookie` value carrying a token.
pub fn token_cookie(class: TokenClass, token: &str, secure: bool) -> String {
    let (name, path) = cookie_slot(class);
    let secure = if secure { "; Secure" } else { "" };
    format!(
        "{}={}; HttpOnly; SameSite=Strict; Path={}{}",
        name, token, path, secure
    )
}

/// `Set-Cookie` value deleting the cookie of a token class.
/// The path must match the one used when setting it, or the browser keeps it.
pub fn clear_cookie(class: TokenClass, secure: bool) -> String {
    let (name, path) = cookie_slot(class);
    let secure = if secure { "; Secure" } else { "" };
    format!(
        "{}=; HttpOnly; SameSite=Strict; Path={}; Max-Age=0{}",
        name, path, secure
    )
}

fn append_set_cookie(headers: &mut HeaderMap, value: String) {
    match HeaderValue::from_str(&value) {
        Ok(value) => {
            headers.append(header::SET_COOKIE, value);
        }
        Err(e) => tracing::error!(error = %e, "Invalid Set-Cookie value"),
    }
}

/// Set both session cookies.
pub fn attach(headers: &mut HeaderMap, access_token: &str, refresh_token: &str, secure: bool) {
    attach_access(headers, access_token, secure);
    append_set_cookie(headers, token_cookie(TokenClass::Refresh, refresh_token, secure));
}

/// Set only the access cookie.
pub fn attach_access(headers: &mut HeaderMap, access_token: &str, secure: bool) {
    append_set_cookie(headers, token_cookie(TokenClass::Access, access_token, secure));
}

/// Delete both session cookies, whether or not the request carried them.
pub fn clear(headers: &mut HeaderMap, secure: bool) {
    append_set_cookie(headers, clear_cookie(TokenClass::Access, secure));
    append_set_cookie(headers, clear_cookie(TokenClass::Refresh, secure));
}
