// Broadcast handler — POST /api/admin/send-emails.
//
// Runs the whole pipeline for one request and maps the outcome onto the
// response shapes the admin dashboard expects:
//   200 {message, data: {totalSent, batchData}}   batch accepted
//   200 {message: "No users found."}               empty segment
//   500 {message: "Failed to send emails.", error} anything else, including
//                                                  a body that doesn't parse

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{error, info, warn};

use crate::broadcast::BroadcastRequest;
use crate::pipeline::{self, BroadcastOutcome};
use crate::web::{broadcast_error_response, send_failure_response, AppState};

/// POST /api/admin/send-emails — compose and send one broadcast.
pub async fn send_emails(
    State(state): State<AppState>,
    payload: Result<Json<BroadcastRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(status = %rejection.status(), error = %rejection.body_text(), "Malformed broadcast request");
            return send_failure_response(&rejection.body_text());
        }
    };

    info!(
        segment = %request.segment_filter,
        test_mode = request.test_mode,
        provider = state.provider.name(),
        "Broadcast requested"
    );

    let settings = state.config.compose_settings();
    let outcome = pipeline::run(
        state.db.as_ref(),
        state.provider.as_ref(),
        &settings,
        &request,
    )
    .await;

    match outcome {
        Ok(outcome) => {
            let message = outcome.message();
            let body = match outcome {
                BroadcastOutcome::Sent(result) => {
                    serde_json::json!({ "message": message, "data": result })
                }
                BroadcastOutcome::NoRecipients => serde_json::json!({ "message": message }),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            error!(kind = e.kind(), error = %e, "Broadcast failed");
            broadcast_error_response(&e)
        }
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request};
    use chrono::{Duration, Utc};

    use super::*;
    use crate::broadcast::OutboundMessage;
    use crate::db::models::Recipient;
    use crate::db::sqlite::SqliteDatabase;
    use crate::db::{queries, schema, Database};
    use crate::dispatch::dry_run::DryRunProvider;
    use crate::dispatch::DeliveryProvider;
    use crate::web::test_support;

    struct RejectingProvider;

    #[async_trait]
    impl DeliveryProvider for RejectingProvider {
        fn name(&self) -> &'static str {
            "rejecting"
        }

        async fn send_batch(&self, _messages: &[OutboundMessage]) -> Result<serde_json::Value> {
            anyhow::bail!("quota exceeded")
        }
    }

    fn seeded_registry() -> Arc<dyn Database> {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        schema::create_tables(&conn).unwrap();
        for (email, referral, referred_by) in [
            ("ada@x.io", "ref-ada", None),
            ("bo@x.io", "ref-bo", Some("ref-ada")),
        ] {
            let recipient = Recipient {
                email: email.to_string(),
                first_name: None,
                claim_id: None,
                referral_id: Some(referral.to_string()),
                created_at: Utc::now() - Duration::days(3),
                referred_by: referred_by.map(str::to_string),
            };
            queries::insert_recipient(&conn, &recipient, None).unwrap();
        }
        Arc::new(SqliteDatabase::new(conn))
    }

    fn send_request(body: serde_json::Value) -> Request<Body> {
        Request::post("/api/admin/send-emails")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::COOKIE, test_support::session_cookie())
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_unauthenticated_send_is_rejected() {
        let state = test_support::state(seeded_registry(), Arc::new(DryRunProvider));
        let request = Request::post("/api/admin/send-emails")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"subject":"Hi","components":[]}"#))
            .unwrap();

        let (status, body) = test_support::call(state, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, serde_json::json!({"message": "Unauthorized"}));
    }

    #[tokio::test]
    async fn test_test_mode_sends_to_both_test_recipients() {
        let empty = crate::db::initialize_sqlite(":memory:").unwrap();
        let state = test_support::state(empty, Arc::new(DryRunProvider));

        let (status, body) = test_support::call(
            state,
            send_request(serde_json::json!({
                "subject": "Hi",
                "components": [{"id": 1, "type": "link"}],
                "targetGroup": "all",
                "sendTestUser": true
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Successfully sent emails to 2 users.");
        assert_eq!(body["data"]["totalSent"], 2);
        assert_eq!(body["data"]["batchData"]["data"][1]["id"], "dry-run-1");
    }

    #[tokio::test]
    async fn test_segment_send_reports_count() {
        let state = test_support::state(seeded_registry(), Arc::new(DryRunProvider));

        let (status, body) = test_support::call(
            state,
            send_request(serde_json::json!({
                "subject": "Hi {name}",
                "components": [{"id": 1, "type": "text", "content": "Hi {name}"}],
                "targetGroup": "not_referred_anyone"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Successfully sent emails to 1 users.");
    }

    #[tokio::test]
    async fn test_empty_segment_reports_no_users() {
        let state = test_support::state(seeded_registry(), Arc::new(DryRunProvider));

        let (status, body) = test_support::call(
            state,
            send_request(serde_json::json!({
                "subject": "Hi",
                "components": [],
                "targetGroup": "claimed_username"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"message": "No users found."}));
    }

    #[tokio::test]
    async fn test_provider_failure_is_500() {
        let state = test_support::state(seeded_registry(), Arc::new(RejectingProvider));

        let (status, body) = test_support::call(
            state,
            send_request(serde_json::json!({"subject": "Hi", "components": []})),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Failed to send emails.");
        assert!(body["error"].as_str().unwrap().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_malformed_body_gets_uniform_failure() {
        for body in [
            serde_json::json!({"components": []}),
            serde_json::json!({"subject": "Hi", "components": [{"id": 1, "type": "video"}]}),
        ] {
            let state = test_support::state(seeded_registry(), Arc::new(DryRunProvider));
            let (status, json) = test_support::call(state, send_request(body)).await;

            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(json["message"], "Failed to send emails.");
            assert!(!json["error"].as_str().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_out_of_range_time_filter_gets_uniform_failure() {
        let state = test_support::state(seeded_registry(), Arc::new(DryRunProvider));

        let (status, body) = test_support::call(
            state,
            send_request(serde_json::json!({
                "subject": "Hi",
                "components": [],
                "timeFilter": "100000000"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Failed to send emails.");
        assert!(body["error"].as_str().unwrap().contains("100000000 days"));
    }

    #[tokio::test]
    async fn test_registry_failure_is_500() {
        // No waitlist table: every select fails.
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let broken: Arc<dyn Database> = Arc::new(SqliteDatabase::new(conn));
        let state = test_support::state(broken, Arc::new(DryRunProvider));

        let (status, body) = test_support::call(
            state,
            send_request(serde_json::json!({"subject": "Hi", "components": []})),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Registry query failed"));
    }
}
