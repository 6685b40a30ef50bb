use std::sync::Arc;

use crate::models::{SchemaCatalog, Translation};
use crate::services::llm_service::{GenerationClient, GenerationError};

use super::{annotator, fallback, prompt, sanitizer};

/// Natural-language-to-federated-SQL pipeline.
///
/// question -> prompt -> model -> sanitizer -> annotator. Holds no mutable
/// state; one instance serves concurrent requests.
pub struct NlqTranslator {
    catalog: &'static SchemaCatalog,
    generator: Arc<dyn GenerationClient>,
}

impl NlqTranslator {
    pub fn new(catalog: &'static SchemaCatalog, generator: Arc<dyn GenerationClient>) -> Self {
        Self { catalog, generator }
    }

    pub fn is_available(&self) -> bool {
        self.generator.is_available()
    }

    pub fn model(&self) -> &str {
        self.generator.model()
    }

    pub fn catalog(&self) -> &'static SchemaCatalog {
        self.catalog
    }

    /// Translate with the model only. Never fails; problems become `Unavailable`.
    pub async fn translate(&self, question: &str) -> Translation {
        if !self.generator.is_available() {
            tracing::info!("No LLM credential configured, skipping generation");
            return Translation::unavailable(GenerationError::NotConfigured.to_string());
        }

        let prompt = prompt::compile_prompt(question, self.catalog);
        tracing::debug!("Compiled prompt: {} bytes", prompt.len());

        let raw = match self.generator.generate(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("LLM generation failed: {}", e);
                return Translation::unavailable(format!("Error processing query: {}", e));
            }
        };

        let query = sanitizer::sanitize(&raw);
        if query.is_empty() {
            tracing::warn!("LLM response contained no query after sanitization");
            return Translation::unavailable("Error processing query: model returned no query text");
        }

        let annotation = annotator::annotate(question, &query);
        tracing::info!("Generated SQL: {}", query);

        Translation::Generated {
            query,
            confidence: annotation.confidence,
            interpretation: annotation.interpretation,
        }
    }

    /// Translate, routing to the keyword fallback whenever the model is unavailable
    pub async fn translate_with_fallback(&self, question: &str) -> Translation {
        match self.translate(question).await {
            Translation::Unavailable { reason } => {
                let fallback = fallback::match_question(question);
                tracing::warn!(
                    "Using rule-based fallback ({}): {}",
                    reason,
                    fallback.query()
                );
                fallback
            }
            translation => translation,
        }
    }
}
