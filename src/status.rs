// Registry status — backend, table check, and the size of every segment.

use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;

use crate::db::Database;
use crate::segment::{resolver, SegmentFilter};

/// Every named segment, in the order the admin form lists them.
const SEGMENTS: [SegmentFilter; 4] = [
    SegmentFilter::All,
    SegmentFilter::ClaimedUsername,
    SegmentFilter::NotClaimedUsername,
    SegmentFilter::NotReferredAnyone,
];

/// Count each named segment (no time cutoff) as of `now`.
pub async fn segment_counts(
    db: &dyn Database,
    now: DateTime<Utc>,
) -> Result<Vec<(SegmentFilter, i64)>> {
    let mut counts = Vec::with_capacity(SEGMENTS.len());
    for filter in SEGMENTS {
        counts.push((filter, resolver::count_at(db, filter, None, now).await?));
    }
    Ok(counts)
}

/// Display registry status to the terminal.
///
/// `db_display` is the SQLite path or a redacted Postgres URL; only the
/// former is checked for existence and size.
pub async fn show(db: &Arc<dyn Database>, db_display: &str, is_sqlite: bool) -> Result<()> {
    if is_sqlite {
        let size = std::fs::metadata(Path::new(db_display))
            .map(|m| format_bytes(m.len()))
            .unwrap_or_else(|_| "unknown".to_string());
        println!("Registry: {db_display} ({size})");
    } else {
        println!("Registry: {db_display}");
    }

    if db.table_count().await? == 0 {
        println!("Waitlist table: {}", "missing".red());
        println!("  Run `megaphone init` to create it");
        return Ok(());
    }

    println!("\nSegments:");
    for (filter, count) in segment_counts(db.as_ref(), Utc::now()).await? {
        println!("  {:<22} {:>6}", filter.as_str(), count);
    }
    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
