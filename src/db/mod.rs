// Registry layer — read access to the waitlist the broadcast targets.
//
// SQLite (rusqlite, "bundled", no system dependency) is the default backend;
// its file lives wherever MEGAPHONE_DB_PATH points (defaults to
// ./megaphone.db). PostgreSQL is available behind the `postgres` feature.

pub mod models;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod queries;
#[cfg(feature = "sqlite")]
pub mod schema;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use traits::Database;

#[cfg(feature = "sqlite")]
use anyhow::{Context, Result};
#[cfg(feature = "sqlite")]
use std::path::Path;
#[cfg(feature = "sqlite")]
use std::sync::Arc;

/// Open (or create) the SQLite registry and ensure the table exists.
///
/// Called by `megaphone init`.
#[cfg(feature = "sqlite")]
pub fn initialize_sqlite(db_path: &str) -> Result<Arc<dyn Database>> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory for database: {}", db_path))?;
        }
    }

    let conn = rusqlite::Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path))?;

    // WAL so the signup flow can keep writing while we read
    conn.pragma_update(None, "journal_mode", "WAL")?;
    schema::create_tables(&conn)?;

    Ok(Arc::new(sqlite::SqliteDatabase::new(conn)))
}

/// Open an existing SQLite registry (fails if it doesn't exist yet).
#[cfg(feature = "sqlite")]
pub fn open_sqlite(db_path: &str) -> Result<Arc<dyn Database>> {
    if !Path::new(db_path).exists() {
        anyhow::bail!(
            "Database not found at {}. Run `megaphone init` first.",
            db_path
        );
    }

    let conn = rusqlite::Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path))?;
    conn.pragma_update(None, "journal_mode", "WAL")?;

    Ok(Arc::new(sqlite::SqliteDatabase::new(conn)))
}

/// Connect to a PostgreSQL registry.
#[cfg(feature = "postgres")]
pub async fn connect_postgres(database_url: &str) -> anyhow::Result<std::sync::Arc<dyn Database>> {
    let db = postgres::PgDatabase::connect(database_url).await?;
    Ok(std::sync::Arc::new(db))
}
