// Registry schema — the waitlist table the broadcast reads from.
//
// The registry is owned by the signup flow; this crate only creates the
// table if it's missing (for `megaphone init` and tests). No migrations.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create the waitlist table and its indexes if they don't exist yet.
///
/// This is idempotent — safe to call on every startup.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS waitlist (
            email TEXT PRIMARY KEY,
            first_name TEXT,
            claim_id TEXT,                     -- token for the claim deep link
            referral_id TEXT UNIQUE,           -- this person's own referral token
            claimed_username TEXT,             -- non-null once a username is claimed
            referred_by TEXT,                  -- referral_id of whoever invited them
            created_at TEXT NOT NULL           -- RFC 3339, UTC, millisecond precision
        );

        -- Referrer projection scans this column
        CREATE INDEX IF NOT EXISTS idx_waitlist_referred_by
            ON waitlist(referred_by);

        -- Time filter compares against this column
        CREATE INDEX IF NOT EXISTS idx_waitlist_created_at
            ON waitlist(created_at);
        ",
    )
    .context("Failed to create waitlist table")?;

    Ok(())
}

/// Count the number of tables in the database (useful for init confirmation).
pub fn table_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}
