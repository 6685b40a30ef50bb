pub mod sqlite;

use async_trait::async_trait;

use crate::api::middleware::AppError;
use crate::models::AuditEntry;

pub use sqlite::SqliteAuditLog;

/// Persists who submitted which query, independent of execution outcome
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: &AuditEntry) -> Result<(), AppError>;
}
