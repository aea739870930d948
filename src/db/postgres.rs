// PgDatabase — PostgreSQL backend implementing the Database trait.
//
// Uses sqlx PgPool for native async queries. All queries use runtime
// parameter binding (not compile-time macros) to avoid requiring
// DATABASE_URL at compile time.
//
// Key differences from SQLite:
// - TIMESTAMPTZ instead of TEXT for created_at
// - the not-in filter binds a TEXT[] and uses `<> ALL($n)`
// - $1/$2 parameter syntax (handled by sqlx)

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx_core::pool::Pool;
use sqlx_core::row::Row;
use sqlx_postgres::Postgres;

use super::models::{Recipient, RecipientQuery};
use super::traits::Database;

/// Type alias for the PostgreSQL connection pool.
pub type PgPool = Pool<Postgres>;

/// Idempotent DDL for the registry table. Not a migration: an existing
/// table is left alone.
const ENSURE_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS waitlist (
        email TEXT PRIMARY KEY,
        first_name TEXT,
        claim_id TEXT,
        referral_id TEXT UNIQUE,
        claimed_username TEXT,
        referred_by TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    );
    CREATE INDEX IF NOT EXISTS idx_waitlist_referred_by ON waitlist(referred_by);
    CREATE INDEX IF NOT EXISTS idx_waitlist_created_at ON waitlist(created_at);
";

pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    /// Connect to PostgreSQL and make sure the waitlist table exists.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .context("Failed to connect to PostgreSQL")?;

        sqlx_core::raw_sql::raw_sql(ENSURE_SCHEMA)
            .execute(&pool)
            .await
            .context("Failed to create waitlist table")?;

        Ok(Self { pool })
    }

    /// Access the pool directly (integration tests seed rows through it).
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// WHERE clause text plus the values to bind, in placeholder order.
struct PgFilter {
    clause: String,
    exclude: Option<Vec<String>>,
    created_before: Option<DateTime<Utc>>,
}

fn pg_filter(query: &RecipientQuery) -> PgFilter {
    let mut conditions: Vec<String> = Vec::new();
    let mut next_param = 1;

    match query.claimed {
        Some(true) => conditions.push("claimed_username IS NOT NULL".to_string()),
        Some(false) => conditions.push("claimed_username IS NULL".to_string()),
        None => {}
    }

    let exclude = if query.exclude_referral_ids.is_empty() {
        None
    } else {
        conditions.push(format!(
            "(referral_id IS NULL OR referral_id <> ALL(${next_param}))"
        ));
        next_param += 1;
        Some(query.exclude_referral_ids.clone())
    };

    if query.created_before.is_some() {
        conditions.push(format!("created_at < ${next_param}"));
    }

    let clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    PgFilter {
        clause,
        exclude,
        created_before: query.created_before,
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn table_count(&self) -> Result<i64> {
        let row = sqlx_core::query::query(
            "SELECT COUNT(*)::bigint FROM information_schema.tables
             WHERE table_schema = 'public' AND table_type = 'BASE TABLE'",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get::<i64, _>(0))
    }

    async fn select_recipients(&self, query: &RecipientQuery) -> Result<Vec<Recipient>> {
        let filter = pg_filter(query);
        let sql = format!(
            "SELECT email, first_name, claim_id, referral_id, created_at, referred_by
             FROM waitlist{}
             ORDER BY created_at, email",
            filter.clause
        );

        let mut q = sqlx_core::query::query(&sql);
        if let Some(exclude) = filter.exclude {
            q = q.bind(exclude);
        }
        if let Some(cutoff) = filter.created_before {
            q = q.bind(cutoff);
        }

        let rows = q
            .fetch_all(&self.pool)
            .await
            .context("Failed to select recipients")?;

        Ok(rows
            .into_iter()
            .map(|r| Recipient {
                email: r.get::<String, _>("email"),
                first_name: r.get::<Option<String>, _>("first_name"),
                claim_id: r.get::<Option<String>, _>("claim_id"),
                referral_id: r.get::<Option<String>, _>("referral_id"),
                created_at: r.get::<DateTime<Utc>, _>("created_at"),
                referred_by: r.get::<Option<String>, _>("referred_by"),
            })
            .collect())
    }

    async fn count_recipients(&self, query: &RecipientQuery) -> Result<i64> {
        let filter = pg_filter(query);
        let sql = format!("SELECT COUNT(*)::bigint FROM waitlist{}", filter.clause);

        let mut q = sqlx_core::query::query(&sql);
        if let Some(exclude) = filter.exclude {
            q = q.bind(exclude);
        }
        if let Some(cutoff) = filter.created_before {
            q = q.bind(cutoff);
        }

        let row = q.fetch_one(&self.pool).await?;
        Ok(row.get::<i64, _>(0))
    }

    async fn referrer_references(&self) -> Result<Vec<String>> {
        let rows = sqlx_core::query::query(
            "SELECT DISTINCT referred_by FROM waitlist
             WHERE referred_by IS NOT NULL
             ORDER BY referred_by",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to project referred_by")?;
        Ok(rows.into_iter().map(|r| r.get::<String, _>(0)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_numbers_params_in_bind_order() {
        let filter = pg_filter(&RecipientQuery {
            claimed: Some(false),
            exclude_referral_ids: vec!["r1".to_string()],
            created_before: Some(Utc::now()),
        });
        assert_eq!(
            filter.clause,
            " WHERE claimed_username IS NULL \
             AND (referral_id IS NULL OR referral_id <> ALL($1)) \
             AND created_at < $2"
        );
    }

    #[test]
    fn test_filter_time_only_uses_first_param() {
        let filter = pg_filter(&RecipientQuery {
            created_before: Some(Utc::now()),
            ..Default::default()
        });
        assert_eq!(filter.clause, " WHERE created_at < $1");
        assert!(filter.exclude.is_none());
    }

    #[test]
    fn test_empty_filter() {
        assert_eq!(pg_filter(&RecipientQuery::default()).clause, "");
    }
}
