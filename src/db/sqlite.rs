// SqliteDatabase — rusqlite backend implementing the Database trait.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is !Sync.
// Trait methods lock the mutex, do synchronous rusqlite work, and return.
// The lock is never held across .await points.

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use tokio::sync::Mutex;

use super::models::{Recipient, RecipientQuery};
use super::traits::Database;

pub struct SqliteDatabase {
    conn: Mutex<Connection>,
}

impl SqliteDatabase {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Run a closure against the underlying connection.
    ///
    /// Fixtures use this to seed rows; the trait itself stays read-only.
    pub async fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.conn.lock().await;
        f(&conn)
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }

    async fn select_recipients(&self, query: &RecipientQuery) -> Result<Vec<Recipient>> {
        let conn = self.conn.lock().await;
        super::queries::select_recipients(&conn, query)
    }

    async fn count_recipients(&self, query: &RecipientQuery) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::count_recipients(&conn, query)
    }

    async fn referrer_references(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().await;
        super::queries::referrer_references(&conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::queries::insert_recipient;
    use crate::db::schema::create_tables;
    use chrono::Utc;

    async fn test_db() -> SqliteDatabase {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        SqliteDatabase::new(conn)
    }

    fn person(email: &str, referral_id: &str, referred_by: Option<&str>) -> Recipient {
        Recipient {
            email: email.to_string(),
            first_name: Some("Pat".to_string()),
            claim_id: None,
            referral_id: Some(referral_id.to_string()),
            created_at: Utc::now(),
            referred_by: referred_by.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_trait_table_count() {
        let db = test_db().await;
        assert_eq!(db.table_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_trait_select_and_count() {
        let db = test_db().await;
        db.with_conn(|conn| {
            insert_recipient(conn, &person("a@x.io", "ra", None), None)?;
            insert_recipient(conn, &person("b@x.io", "rb", Some("ra")), Some("bee"))
        })
        .await
        .unwrap();

        let all = db.select_recipients(&RecipientQuery::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].referred_by.as_deref(), Some("ra"));

        let claimed = RecipientQuery {
            claimed: Some(true),
            ..Default::default()
        };
        assert_eq!(db.count_recipients(&claimed).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_trait_referrer_references() {
        let db = test_db().await;
        assert!(db.referrer_references().await.unwrap().is_empty());
        db.with_conn(|conn| {
            insert_recipient(conn, &person("a@x.io", "ra", None), None)?;
            insert_recipient(conn, &person("b@x.io", "rb", Some("ra")), None)
        })
        .await
        .unwrap();
        assert_eq!(db.referrer_references().await.unwrap(), vec!["ra"]);
    }

    #[tokio::test]
    async fn test_missing_table_surfaces_error() {
        let db = SqliteDatabase::new(Connection::open_in_memory().unwrap());
        assert!(db.select_recipients(&RecipientQuery::default()).await.is_err());
        assert!(db.referrer_references().await.is_err());
    }
}
