use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::api::middleware::AppError;
use crate::config::EngineConfig;
use crate::models::QueryOutcome;

/// Submits query text verbatim to the federated engine
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<QueryOutcome, AppError>;
}

/// Response envelope of the engine's REST query endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EngineResponse {
    query_state: Option<String>,
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<serde_json::Value>,
    error_message: Option<String>,
}

impl EngineResponse {
    fn into_outcome(self) -> Result<QueryOutcome, AppError> {
        match self.query_state.as_deref() {
            Some("COMPLETED") => Ok(QueryOutcome {
                columns: self.columns,
                rows: self.rows,
            }),
            state => {
                let message = self.error_message.unwrap_or_else(|| {
                    format!("query finished in state {}", state.unwrap_or("UNKNOWN"))
                });
                Err(AppError::QueryEngine(message))
            }
        }
    }
}

/// HTTP client for the federated SQL engine (Drill REST API)
pub struct FederatedQueryService {
    endpoint: Url,
    timeout: Duration,
    http_client: HttpClient,
}

impl FederatedQueryService {
    pub fn new(config: &EngineConfig) -> Result<Self, AppError> {
        let base = Url::parse(&config.url)
            .map_err(|e| AppError::Internal(format!("Invalid query engine URL {}: {}", config.url, e)))?;
        let endpoint = base
            .join("/query.json")
            .map_err(|e| AppError::Internal(format!("Invalid query engine URL {}: {}", config.url, e)))?;

        Ok(Self {
            endpoint,
            timeout: Duration::from_secs(config.timeout_secs),
            http_client: HttpClient::new(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl QueryExecutor for FederatedQueryService {
    async fn execute(&self, sql: &str) -> Result<QueryOutcome, AppError> {
        let start_time = Instant::now();

        let response = self
            .http_client
            .post(self.endpoint.clone())
            .timeout(self.timeout)
            .json(&json!({ "queryType": "SQL", "query": sql }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::QueryTimeout(self.timeout.as_secs())
                } else {
                    AppError::QueryEngine(format!("Failed to reach query engine: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::QueryEngine(format!("Failed to read engine response: {}", e)))?;

        let parsed: EngineResponse = serde_json::from_str(&body).map_err(|_| {
            AppError::QueryEngine(format!("Engine returned {}: {}", status, body.trim()))
        })?;

        let outcome = parsed.into_outcome()?;
        tracing::info!(
            "Query completed: {} rows in {}ms",
            outcome.row_count(),
            start_time.elapsed().as_millis()
        );
        Ok(outcome)
    }
}
