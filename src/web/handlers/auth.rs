// Auth handlers — POST /api/login and POST /api/logout.
//
// Login: checks MEGAPHONE_ADMIN_PASSWORD from the request body, then sets a
// signed HMAC session cookie. Logout: clears the session cookie.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::{info, warn};

use crate::web::auth::{clear_cookie_header, constant_time_eq, create_token, set_cookie_header};
use crate::web::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    password: String,
}

/// POST /api/login — authenticate with MEGAPHONE_ADMIN_PASSWORD.
///
/// On success: returns 200 with a signed session cookie.
/// On failure: returns 401.
pub async fn login(State(state): State<AppState>, Json(body): Json<LoginRequest>) -> Response {
    let expected = &state.config.admin_password;

    if expected.is_empty() || !constant_time_eq(expected, &body.password) {
        warn!("Admin login rejected");
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "message": "Invalid password" })),
        )
            .into_response();
    }

    let token = create_token(&state.config.session_secret);
    // TLS terminates at the proxy in front of us, so Secure can't be inferred here.
    let cookie = set_cookie_header(&token, false);
    info!("Admin session started");

    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(serde_json::json!({ "message": "Authenticated" })),
    )
        .into_response()
}

/// POST /api/logout — clear the session cookie.
pub async fn logout() -> Response {
    (
        StatusCode::OK,
        [(header::SET_COOKIE, clear_cookie_header())],
        Json(serde_json::json!({ "message": "Logged out" })),
    )
        .into_response()
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::dispatch::dry_run::DryRunProvider;
    use crate::web::{auth, test_support};

    fn login_request(password: &str) -> Request<Body> {
        Request::post("/api/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::json!({ "password": password }).to_string(),
            ))
            .unwrap()
    }

    #[tokio::test]
    async fn test_login_sets_verifiable_cookie() {
        let db = crate::db::initialize_sqlite(":memory:").unwrap();
        let state = test_support::state(db, Arc::new(DryRunProvider));
        let router = crate::web::build_router(state);

        let response = router
            .oneshot(login_request(test_support::PASSWORD))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        let token = cookie
            .strip_prefix("megaphone_session=")
            .and_then(|rest| rest.split(';').next())
            .unwrap();
        assert!(auth::verify_token(test_support::SECRET, token));
    }

    #[tokio::test]
    async fn test_wrong_password_rejected() {
        let db = crate::db::initialize_sqlite(":memory:").unwrap();
        let state = test_support::state(db, Arc::new(DryRunProvider));

        let (status, body) = test_support::call(state, login_request("nope")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid password");
    }

    #[tokio::test]
    async fn test_logout_requires_session() {
        let db = crate::db::initialize_sqlite(":memory:").unwrap();
        let state = test_support::state(db, Arc::new(DryRunProvider));

        let request = Request::post("/api/logout")
            .header(header::COOKIE, test_support::session_cookie())
            .body(Body::empty())
            .unwrap();
        let (status, body) = test_support::call(state, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Logged out");
    }
}
