// Auth middleware — stateless HMAC-SHA256 session cookie validation.
//
// Session token format: {timestamp_secs}.{nonce_hex}.{hmac_hex}
//
// The HMAC covers "{timestamp_secs}.{nonce_hex}" signed with
// MEGAPHONE_SESSION_SECRET. Tokens are valid for SESSION_TTL_SECS (24 hours).
//
// Login flow:
//   POST /api/login { password } → check MEGAPHONE_ADMIN_PASSWORD
//     success: set megaphone_session cookie with new HMAC token
//     failure: 401
//
// Auth check (this middleware):
//   extract megaphone_session cookie → parse → verify HMAC → verify age → allow
//   anything else → 401 {"message": "Unauthorized"}, before any registry read

use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use tracing::debug;

use super::AppState;
use crate::error::BroadcastError;

type HmacSha256 = Hmac<Sha256>;

/// Session cookie name.
pub const COOKIE_NAME: &str = "megaphone_session";

/// Session lifetime: 24 hours.
pub const SESSION_TTL_SECS: u64 = 86_400;

/// Build a new session token signed with `secret`.
///
/// Returns the raw cookie value (the token string, not the full Set-Cookie header).
pub fn create_token(secret: &str) -> String {
    create_token_at(secret, now_secs())
}

fn create_token_at(secret: &str, timestamp: u64) -> String {
    let mut nonce_bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut nonce_bytes);
    let nonce = hex::encode(nonce_bytes);

    let payload = format!("{timestamp}.{nonce}");
    let sig = hmac_sign(secret, &payload);

    format!("{payload}.{sig}")
}

/// Verify a session token. Returns `true` if the HMAC is valid and the token
/// is not older than `SESSION_TTL_SECS`.
pub fn verify_token(secret: &str, token: &str) -> bool {
    let parts: Vec<&str> = token.splitn(3, '.').collect();
    let [timestamp_str, nonce, provided_sig] = parts[..] else {
        return false;
    };

    let payload = format!("{timestamp_str}.{nonce}");
    let expected_sig = hmac_sign(secret, &payload);
    if !constant_time_eq(provided_sig, &expected_sig) {
        return false;
    }

    let Ok(timestamp) = timestamp_str.parse::<u64>() else {
        return false;
    };
    now_secs().saturating_sub(timestamp) < SESSION_TTL_SECS
}

/// Axum middleware: reject requests without a valid session cookie with 401.
pub async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if !has_valid_session(&request, &state.config.session_secret) {
        debug!(path = %request.uri().path(), "Rejected request without valid session");
        return super::broadcast_error_response(&BroadcastError::Unauthorized);
    }
    next.run(request).await
}

/// Build the `Set-Cookie` header value for a new session.
pub fn set_cookie_header(token: &str, secure: bool) -> String {
    let secure_flag = if secure { "; Secure" } else { "" };
    format!(
        "{COOKIE_NAME}={token}; HttpOnly{secure_flag}; SameSite=Strict; Path=/; Max-Age={SESSION_TTL_SECS}"
    )
}

/// Build the `Set-Cookie` header value that clears the session cookie.
pub fn clear_cookie_header() -> String {
    format!("{COOKIE_NAME}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0")
}

/// Constant-time string comparison to prevent timing attacks.
pub(crate) fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

// --- Private helpers ---

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn hmac_sign(secret: &str, payload: &str) -> String {
    // HMAC accepts keys of any length, so this never fails in practice.
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return String::new();
    };
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Extract and validate the session cookie from the request.
fn has_valid_session(request: &Request, session_secret: &str) -> bool {
    let Some(cookie_header) = request
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };

    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| name.trim() == COOKIE_NAME)
        .is_some_and(|(_, value)| verify_token(session_secret, value.trim()))
}
