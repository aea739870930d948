// Data models — Rust structs that map to registry rows.
//
// These are the types that flow through the application. They're separate
// from the database queries so other modules can use them without depending
// on rusqlite or sqlx directly.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One waitlist entry eligible for messaging.
///
/// The registry owns these rows; this crate only ever reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub email: String,
    pub first_name: Option<String>,
    /// Token for the claim deep link (`/claim/{claim_id}`)
    pub claim_id: Option<String>,
    /// This recipient's own referral token, handed out to people they invite
    pub referral_id: Option<String>,
    pub created_at: DateTime<Utc>,
    /// The referral token of whoever referred this recipient, if anyone did
    pub referred_by: Option<String>,
}

/// Filters pushed down into a registry read.
///
/// All set fields apply conjunctively. The default query selects every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipientQuery {
    /// `Some(true)`: claimed_username is non-null. `Some(false)`: it is null.
    pub claimed: Option<bool>,
    /// Drop rows whose referral_id is in this list. Rows with no referral_id are kept.
    pub exclude_referral_ids: Vec<String>,
    /// Keep only rows with created_at strictly earlier than this instant.
    pub created_before: Option<DateTime<Utc>>,
}

/// Canonical text form for timestamps stored in SQLite.
///
/// Fixed-width millisecond RFC 3339 in UTC, so lexical order matches
/// chronological order and `created_at < ?` comparisons stay correct.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored timestamp. Accepts RFC 3339 and SQLite's
/// `datetime('now')` format (`YYYY-MM-DD HH:MM:SS`, implicitly UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}
