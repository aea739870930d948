// Segment preview — GET /api/admin/segment?targetGroup=&timeFilter=
//
// Resolves the same segment a broadcast with these parameters would target
// and returns the total plus the first `limit` recipients, so the operator
// can sanity-check the audience before sending.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::db::models::{format_timestamp, Recipient};
use crate::segment::{resolver, SegmentFilter, TimeFilter};
use crate::web::AppState;

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 500;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentParams {
    target_group: Option<String>,
    time_filter: Option<String>,
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PreviewRow {
    email: String,
    first_name: Option<String>,
    created_at: String,
}

impl From<&Recipient> for PreviewRow {
    fn from(r: &Recipient) -> Self {
        Self {
            email: r.email.clone(),
            first_name: r.first_name.clone(),
            created_at: format_timestamp(&r.created_at),
        }
    }
}

/// GET /api/admin/segment — preview who a broadcast would reach.
pub async fn preview_segment(
    State(state): State<AppState>,
    Query(params): Query<SegmentParams>,
) -> Response {
    let filter = SegmentFilter::from_target_group(params.target_group.as_deref());
    let time_filter = TimeFilter::parse(params.time_filter.as_deref());
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);

    match resolver::resolve(state.db.as_ref(), filter, time_filter).await {
        Ok(recipients) => {
            let rows: Vec<PreviewRow> = recipients.iter().take(limit).map(PreviewRow::from).collect();
            Json(serde_json::json!({
                "targetGroup": filter.as_str(),
                "timeFilter": time_filter.map(|t| t.days),
                "total": recipients.len(),
                "recipients": rows,
            }))
            .into_response()
        }
        Err(e) => {
            error!(segment = %filter, error = %e, "Segment preview failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "message": "Failed to resolve segment.",
                    "error": format!("{e:#}"),
                })),
            )
                .into_response()
        }
    }
}
