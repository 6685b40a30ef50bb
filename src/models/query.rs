use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::translation::{Translation, TranslationMethod};

#[derive(Debug, Deserialize)]
pub struct NaturalLanguageQueryRequest {
    #[serde(alias = "question")]
    pub query: String,
}

/// Row set returned by the federated engine
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QueryOutcome {
    pub columns: Vec<String>,
    pub rows: Vec<serde_json::Value>,
}

impl QueryOutcome {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Response body of the natural-language query endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NaturalQueryResponse {
    pub success: bool,
    pub generated_sql: String,
    pub interpretation: String,
    pub confidence: f64,
    pub method: TranslationMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NaturalQueryResponse {
    fn from_translation(translation: &Translation) -> Self {
        Self {
            success: false,
            generated_sql: translation.query().to_string(),
            interpretation: translation.interpretation().to_string(),
            confidence: translation.confidence(),
            method: translation.method(),
            data: None,
            row_count: None,
            error: None,
        }
    }

    /// A translation that produced no query; nothing was executed
    pub fn not_translated(translation: &Translation) -> Self {
        let mut response = Self::from_translation(translation);
        response.error = Some(translation.interpretation().to_string());
        response
    }

    pub fn completed(translation: &Translation, outcome: QueryOutcome) -> Self {
        let mut response = Self::from_translation(translation);
        response.success = true;
        response.row_count = Some(outcome.row_count());
        response.data = Some(outcome.rows);
        response
    }

    pub fn failed(translation: &Translation, error: impl Into<String>) -> Self {
        let mut response = Self::from_translation(translation);
        response.error = Some(error.into());
        response
    }
}

/// One persisted audit record: who submitted which query text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    pub id: String,
    pub user_id: String,
    pub role: String,
    pub query_text: String,
    pub executed_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(user_id: String, role: String, query_text: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            role,
            query_text,
            executed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_accepts_question_alias() {
        let req: NaturalLanguageQueryRequest =
            serde_json::from_str(r#"{"question": "Show me all regions"}"#).unwrap();
        assert_eq!(req.query, "Show me all regions");

        let req: NaturalLanguageQueryRequest =
            serde_json::from_str(r#"{"query": "Show me all regions"}"#).unwrap();
        assert_eq!(req.query, "Show me all regions");
    }

    #[test]
    fn test_completed_response() {
        let translation = Translation::Generated {
            query: "SELECT * FROM postgres.public.`region_info` LIMIT 10".to_string(),
            confidence: crate::models::GENERATED_CONFIDENCE,
            interpretation: "converting 'regions' to SQL query".to_string(),
        };
        let outcome = QueryOutcome {
            columns: vec!["region_id".to_string()],
            rows: vec![serde_json::json!({"region_id": 1})],
        };
        let response = NaturalQueryResponse::completed(&translation, outcome);

        assert!(response.success);
        assert_eq!(response.row_count, Some(1));
        assert_eq!(response.method, TranslationMethod::Generated);
        assert!(response.error.is_none());
    }

    #[test]
    fn test_not_translated_response_carries_reason() {
        let translation = Translation::unavailable("LLM not available");
        let response = NaturalQueryResponse::not_translated(&translation);

        assert!(!response.success);
        assert_eq!(response.generated_sql, "");
        assert_eq!(response.confidence, 0.0);
        assert_eq!(response.error.as_deref(), Some("LLM not available"));

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_audit_entry_ids_unique() {
        let a = AuditEntry::new("1".into(), "Researcher".into(), "SELECT 1".into());
        let b = AuditEntry::new("1".into(), "Researcher".into(), "SELECT 1".into());
        assert_ne!(a.id, b.id);
    }
}
