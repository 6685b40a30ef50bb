use axum::{extract::State, Json};

use crate::api::handlers::AppState;
use crate::api::middleware::{AppError, CallerIdentity};
use crate::models::{
    AuditEntry, NaturalLanguageQueryRequest, NaturalQueryResponse, Translation, TranslationResult,
};
use crate::validation::SqlValidator;

fn validated_question(payload: &NaturalLanguageQueryRequest) -> Result<&str, AppError> {
    let question = payload.query.trim();
    if question.is_empty() {
        return Err(AppError::Validation("Question cannot be empty".to_string()));
    }
    Ok(question)
}

async fn translate(state: &AppState, question: &str) -> Translation {
    if state.config.llm.fallback_enabled {
        state.translator.translate_with_fallback(question).await
    } else {
        state.translator.translate(question).await
    }
}

/// Translate a question without executing it
pub async fn translate_query(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Json(payload): Json<NaturalLanguageQueryRequest>,
) -> Result<Json<TranslationResult>, AppError> {
    let question = validated_question(&payload)?;
    tracing::info!("Translating question for user {} ({})", caller.user_id, caller.role);

    let translation = translate(&state, question).await;
    Ok(Json(TranslationResult::from(translation)))
}

/// Translate a question, record it for audit and execute it on the federated engine
pub async fn execute_natural_language_query(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Json(payload): Json<NaturalLanguageQueryRequest>,
) -> Result<Json<NaturalQueryResponse>, AppError> {
    let question = validated_question(&payload)?;
    tracing::info!(
        "Natural language query from user {} ({}): {}",
        caller.user_id,
        caller.role,
        question
    );

    let translation = translate(&state, question).await;
    if !translation.is_available() {
        tracing::info!("No query produced: {}", translation.interpretation());
        return Ok(Json(NaturalQueryResponse::not_translated(&translation)));
    }

    let sql = translation.query();
    let entry = AuditEntry::new(caller.user_id.clone(), caller.role.clone(), sql.to_string());
    if let Err(e) = state.audit.record(&entry).await {
        tracing::error!("Failed to record audit entry {}: {}", entry.id, e);
    }

    if state.config.engine.strict_validation {
        if let Err(e) = SqlValidator::validate_generated(sql) {
            tracing::warn!("Rejected translated query: {}", e);
            return Ok(Json(NaturalQueryResponse::failed(&translation, e.to_string())));
        }
    }

    match state.executor.execute(sql).await {
        Ok(outcome) => Ok(Json(NaturalQueryResponse::completed(&translation, outcome))),
        Err(e) => {
            tracing::error!("Query execution failed: {}", e);
            Ok(Json(NaturalQueryResponse::failed(&translation, e.to_string())))
        }
    }
}
