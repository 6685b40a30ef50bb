use async_trait::async_trait;
use rusqlite::{Connection, Result as SqliteResult};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::AuditSink;
use crate::api::middleware::AppError;
use crate::models::AuditEntry;

/// SQLite-backed audit trail of submitted queries
/// Uses tokio::Mutex for async-friendly locking
pub struct SqliteAuditLog {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteAuditLog {
    /// Open (or create) the audit database
    pub async fn new<P: AsRef<Path>>(db_path: P) -> SqliteResult<Self> {
        // Handle SQLite URL format (sqlite:./path or sqlite://path)
        let path_str = db_path.as_ref().to_string_lossy();
        let clean_path: &str = if path_str.starts_with("sqlite:") {
            path_str.trim_start_matches("sqlite:").trim_start_matches("//")
        } else {
            &path_str
        };

        let conn = Connection::open(clean_path)?;
        let storage = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        storage.init_schema().await?;
        Ok(storage)
    }

    pub async fn in_memory() -> SqliteResult<Self> {
        let storage = Self {
            conn: Arc::new(Mutex::new(Connection::open_in_memory()?)),
        };
        storage.init_schema().await?;
        Ok(storage)
    }

    async fn init_schema(&self) -> SqliteResult<()> {
        let conn = self.conn.lock().await;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS query_log (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                role TEXT NOT NULL,
                query_text TEXT NOT NULL,
                executed_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_query_log_executed_at ON query_log(executed_at DESC)",
            [],
        )?;

        Ok(())
    }

    /// Most recent entries, newest first
    pub async fn recent(&self, limit: usize) -> SqliteResult<Vec<AuditEntry>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, role, query_text, executed_at
            FROM query_log
            ORDER BY executed_at DESC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            let executed_at: String = row.get(4)?;
            let executed_at = chrono::DateTime::parse_from_rfc3339(&executed_at)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
                })?;
            Ok(AuditEntry {
                id: row.get(0)?,
                user_id: row.get(1)?,
                role: row.get(2)?,
                query_text: row.get(3)?,
                executed_at,
            })
        })?;

        rows.collect()
    }
}

#[async_trait]
impl AuditSink for SqliteAuditLog {
    async fn record(&self, entry: &AuditEntry) -> Result<(), AppError> {
        let conn = self.conn.lock().await;
        conn.execute(
            r#"
            INSERT INTO query_log (id, user_id, role, query_text, executed_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            rusqlite::params![
                &entry.id,
                &entry.user_id,
                &entry.role,
                &entry.query_text,
                entry.executed_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}
