// Registry trait — backend-agnostic async interface for registry reads.
//
// Implementors: SqliteDatabase (wraps rusqlite), PgDatabase (wraps sqlx).
// All methods are async so both sync (rusqlite via Mutex) and native async
// (sqlx) backends fit behind a single interface.
//
// The broadcast core never writes to the registry, so the trait is
// read-only. Each primitive maps to one contract the segment resolver
// needs: filtered selection, a single-column projection, a not-in filter
// and a timestamp comparison (the last two ride on RecipientQuery).

use anyhow::Result;
use async_trait::async_trait;

use super::models::{Recipient, RecipientQuery};

#[async_trait]
pub trait Database: Send + Sync {
    /// Count the number of user-created tables in the database.
    async fn table_count(&self) -> Result<i64>;

    /// Select every recipient matching the query, in registry order.
    async fn select_recipients(&self, query: &RecipientQuery) -> Result<Vec<Recipient>>;

    /// Count recipients matching the query.
    async fn count_recipients(&self, query: &RecipientQuery) -> Result<i64>;

    /// Distinct non-null `referred_by` values across the entire registry.
    async fn referrer_references(&self) -> Result<Vec<String>>;
}
