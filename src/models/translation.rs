// Translation Result Model
//
// Outcome of one natural-language-to-query translation. Internally a tagged
// variant; callers receive the flat `TranslationResult` record.

use serde::{Deserialize, Serialize};

/// Confidence reported for model-generated queries
pub const GENERATED_CONFIDENCE: f64 = 0.95;

/// How a translation was produced
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TranslationMethod {
    Generated,
    RuleBased,
    Unavailable,
}

impl TranslationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranslationMethod::Generated => "generated",
            TranslationMethod::RuleBased => "rule-based",
            TranslationMethod::Unavailable => "unavailable",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Translation {
    Generated {
        query: String,
        confidence: f64,
        interpretation: String,
    },
    RuleBased {
        query: String,
        confidence: f64,
        interpretation: String,
    },
    Unavailable {
        reason: String,
    },
}

impl Translation {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Translation::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn method(&self) -> TranslationMethod {
        match self {
            Translation::Generated { .. } => TranslationMethod::Generated,
            Translation::RuleBased { .. } => TranslationMethod::RuleBased,
            Translation::Unavailable { .. } => TranslationMethod::Unavailable,
        }
    }

    /// Query text; empty only for `Unavailable`
    pub fn query(&self) -> &str {
        match self {
            Translation::Generated { query, .. } | Translation::RuleBased { query, .. } => query,
            Translation::Unavailable { .. } => "",
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            Translation::Generated { confidence, .. }
            | Translation::RuleBased { confidence, .. } => *confidence,
            Translation::Unavailable { .. } => 0.0,
        }
    }

    pub fn interpretation(&self) -> &str {
        match self {
            Translation::Generated { interpretation, .. }
            | Translation::RuleBased { interpretation, .. } => interpretation,
            Translation::Unavailable { reason } => reason,
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, Translation::Unavailable { .. })
    }
}

/// Flat record handed to callers and to the execution collaborator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranslationResult {
    pub query: String,
    pub confidence: f64,
    pub interpretation: String,
    pub method: TranslationMethod,
}

impl From<&Translation> for TranslationResult {
    fn from(translation: &Translation) -> Self {
        Self {
            query: translation.query().to_string(),
            confidence: translation.confidence(),
            interpretation: translation.interpretation().to_string(),
            method: translation.method(),
        }
    }
}

impl From<Translation> for TranslationResult {
    fn from(translation: Translation) -> Self {
        TranslationResult::from(&translation)
    }
}
