// Segment resolution — named filter + optional time cutoff → recipients.
//
// Filters are composed into one RecipientQuery and pushed to the registry.
// For not_referred_anyone the referrer projection has to finish first: its
// result becomes the query's not-in list.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::filter::{SegmentFilter, TimeFilter};
use super::referral::SuccessfulReferrers;
use crate::db::models::{Recipient, RecipientQuery};
use crate::db::Database;

/// Resolve a segment against the registry, using the wall clock for the
/// time cutoff.
pub async fn resolve(
    db: &dyn Database,
    filter: SegmentFilter,
    time_filter: Option<TimeFilter>,
) -> Result<Vec<Recipient>> {
    resolve_at(db, filter, time_filter, Utc::now()).await
}

/// Resolve a segment with an explicit "now".
pub async fn resolve_at(
    db: &dyn Database,
    filter: SegmentFilter,
    time_filter: Option<TimeFilter>,
    now: DateTime<Utc>,
) -> Result<Vec<Recipient>> {
    let query = build_query(db, filter, time_filter, now).await?;
    let recipients = db
        .select_recipients(&query)
        .await
        .with_context(|| format!("Failed to select segment {filter}"))?;

    info!(
        segment = %filter,
        days = ?time_filter.map(|t| t.days),
        count = recipients.len(),
        "Segment resolved"
    );
    Ok(recipients)
}

/// Count a segment without loading it.
pub async fn count_at(
    db: &dyn Database,
    filter: SegmentFilter,
    time_filter: Option<TimeFilter>,
    now: DateTime<Utc>,
) -> Result<i64> {
    let query = build_query(db, filter, time_filter, now).await?;
    db.count_recipients(&query)
        .await
        .with_context(|| format!("Failed to count segment {filter}"))
}

/// Translate a filter pair into a registry query.
pub async fn build_query(
    db: &dyn Database,
    filter: SegmentFilter,
    time_filter: Option<TimeFilter>,
    now: DateTime<Utc>,
) -> Result<RecipientQuery> {
    let mut query = RecipientQuery::default();

    match filter {
        SegmentFilter::All => {}
        SegmentFilter::ClaimedUsername => query.claimed = Some(true),
        SegmentFilter::NotClaimedUsername => query.claimed = Some(false),
        SegmentFilter::NotReferredAnyone => {
            let references = db
                .referrer_references()
                .await
                .context("Failed to load referrer references")?;
            let referrers = SuccessfulReferrers::from_references(references);
            debug!(referrers = referrers.len(), "Successful referrers collected");
            // Empty set: nobody has referred anyone, so nobody is excluded
            if !referrers.is_empty() {
                query.exclude_referral_ids = referrers.to_sorted_vec();
            }
        }
    }

    if let Some(time) = time_filter {
        let cutoff = time.cutoff(now).with_context(|| {
            format!("timeFilter of {} days reaches before the earliest supported date", time.days)
        })?;
        query.created_before = Some(cutoff);
    }

    Ok(query)
}
