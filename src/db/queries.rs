// Registry queries — the SQL behind the Database trait's SQLite backend.
//
// Every registry read goes through this module. This keeps SQL contained
// in one place and gives the rest of the app clean Rust interfaces.

use anyhow::{Context, Result};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};

use super::models::{format_timestamp, parse_timestamp, Recipient, RecipientQuery};

/// Build the WHERE clause and its bound values for a recipient query.
///
/// The not-in filter binds the excluded ids as one JSON array and expands
/// it with json_each, so the statement text doesn't grow with the list.
/// The time filter compares instants through julianday(): the signup flow
/// may store `YYYY-MM-DD HH:MM:SS`, second precision or an offset, none of
/// which sort correctly as text against our millisecond form.
fn where_clause(query: &RecipientQuery) -> Result<(String, Vec<Value>)> {
    let mut conditions: Vec<String> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    match query.claimed {
        Some(true) => conditions.push("claimed_username IS NOT NULL".to_string()),
        Some(false) => conditions.push("claimed_username IS NULL".to_string()),
        None => {}
    }

    if !query.exclude_referral_ids.is_empty() {
        values.push(Value::Text(serde_json::to_string(
            &query.exclude_referral_ids,
        )?));
        conditions.push(format!(
            "(referral_id IS NULL OR referral_id NOT IN (SELECT value FROM json_each(?{})))",
            values.len()
        ));
    }

    if let Some(ref cutoff) = query.created_before {
        values.push(Value::Text(format_timestamp(cutoff)));
        conditions.push(format!(
            "julianday(created_at) < julianday(?{})",
            values.len()
        ));
    }

    let clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };
    Ok((clause, values))
}

/// Select every recipient matching the query, in registry insertion order.
pub fn select_recipients(conn: &Connection, query: &RecipientQuery) -> Result<Vec<Recipient>> {
    let (clause, values) = where_clause(query)?;
    let sql = format!(
        "SELECT email, first_name, claim_id, referral_id, created_at, referred_by
         FROM waitlist{clause}
         ORDER BY rowid"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, Option<String>>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, Option<String>>(5)?,
        ))
    })?;

    let mut recipients = Vec::new();
    for row in rows {
        let (email, first_name, claim_id, referral_id, created_at, referred_by) = row?;
        let created_at = parse_timestamp(&created_at)
            .with_context(|| format!("Unreadable created_at {created_at:?} for {email}"))?;
        recipients.push(Recipient {
            email,
            first_name,
            claim_id,
            referral_id,
            created_at,
            referred_by,
        });
    }
    Ok(recipients)
}

/// Count recipients matching the query without loading them.
pub fn count_recipients(conn: &Connection, query: &RecipientQuery) -> Result<i64> {
    let (clause, values) = where_clause(query)?;
    let sql = format!("SELECT COUNT(*) FROM waitlist{clause}");
    let count = conn.query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))?;
    Ok(count)
}

/// Project the distinct non-null `referred_by` values across the whole table.
///
/// Each value is the referral_id of someone who successfully referred at
/// least one other person.
pub fn referrer_references(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT referred_by FROM waitlist
         WHERE referred_by IS NOT NULL
         ORDER BY referred_by",
    )?;
    let refs = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(refs)
}

/// Insert a registry row. The signup flow owns writes in production;
/// this exists for fixtures and tests.
pub fn insert_recipient(
    conn: &Connection,
    recipient: &Recipient,
    claimed_username: Option<&str>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO waitlist (email, first_name, claim_id, referral_id, claimed_username, referred_by, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            recipient.email,
            recipient.first_name,
            recipient.claim_id,
            recipient.referral_id,
            claimed_username,
            recipient.referred_by,
            format_timestamp(&recipient.created_at),
        ],
    )
    .with_context(|| format!("Failed to insert {}", recipient.email))?;
    Ok(())
}
