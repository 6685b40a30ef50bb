pub mod query;
pub mod status;

use std::sync::Arc;

use crate::config::Config;
use crate::services::nlq::NlqTranslator;
use crate::services::QueryExecutor;
use crate::storage::AuditSink;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub translator: Arc<NlqTranslator>,
    pub executor: Arc<dyn QueryExecutor>,
    pub audit: Arc<dyn AuditSink>,
}
