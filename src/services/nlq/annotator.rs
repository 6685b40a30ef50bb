// Interpretation Annotator
//
// Human-facing hint derived from token presence in the sanitized query. The
// query is never parsed; this is not a correctness check.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{SourceKind, GENERATED_CONFIDENCE};

static JOIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bJOIN\b").expect("valid join pattern"));

static AGGREGATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:AVG|SUM|COUNT|MIN|MAX)\s*\(").expect("valid aggregate pattern")
});

static FILTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bWHERE\b").expect("valid filter pattern"));

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub interpretation: String,
    pub confidence: f64,
}

/// Source kinds a query references, in catalog order
pub fn referenced_kinds(query: &str) -> Vec<SourceKind> {
    let lower = query.to_lowercase();
    SourceKind::ALL
        .into_iter()
        .filter(|kind| kind.query_tokens().iter().any(|token| lower.contains(token)))
        .collect()
}

pub fn interpret(question: &str, query: &str) -> String {
    let mut interpretation = format!("converting '{}' to SQL query", question.trim());

    if JOIN.is_match(query) {
        let kinds = referenced_kinds(query);
        let names: Vec<&str> = kinds.iter().map(|k| k.display_name()).collect();
        match names.len() {
            0 => {}
            1 => interpretation = format!("joining tables in {}", names[0]),
            _ => interpretation = format!("federated query across {}", names.join(", ")),
        }
    }

    if AGGREGATE.is_match(query) {
        interpretation.push_str(" with aggregation");
    }

    if FILTER.is_match(query) {
        interpretation.push_str(" with filtering");
    }

    interpretation
}

/// Annotate a generated query. An empty query carries zero confidence.
pub fn annotate(question: &str, query: &str) -> Annotation {
    let confidence = if query.trim().is_empty() {
        0.0
    } else {
        GENERATED_CONFIDENCE
    };
    Annotation {
        interpretation: interpret(question, query),
        confidence,
    }
}
