use axum::{extract::State, Json};

use crate::api::handlers::AppState;

/// Report whether queries are generated by the model or by keyword fallback
pub async fn llm_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "available": state.translator.is_available(),
        "model": state.translator.model(),
        "fallback_enabled": state.config.llm.fallback_enabled,
        "catalog_version": state.translator.catalog().version,
    }))
}
