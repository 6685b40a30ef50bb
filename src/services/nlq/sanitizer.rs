// Output Sanitizer
//
// Repairs free-text model output into a single-line query string the engine
// accepts. Surface text only: SQL semantics are never inspected. Every stage
// is total and the whole pipeline is idempotent.

use std::sync::LazyLock;

use regex::Regex;

static THINK_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid think-span pattern"));

// A language tag only counts when it runs to the end of the fence line, except
// `sql`, which models also emit inline ("```sql SELECT ...").
static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```(?:[ \t]*[A-Za-z][\w+-]*[ \t]*(?:\r?\n|$)|[ \t]*(?i:sql)\b)?")
        .expect("valid code-fence pattern")
});

static OUTPUT_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)(?:sql\s+query|query|sql)\s*:").expect("valid output-label pattern")
});

pub const STATEMENT_TERMINATOR: char = ';';

/// Stage 1: drop `<think>...</think>` spans, first closing marker wins
pub fn strip_reasoning(text: &str) -> String {
    THINK_SPAN.replace_all(text, "").into_owned()
}

/// Stage 2: drop fence delimiters, keep the fenced text
pub fn strip_code_fences(text: &str) -> String {
    CODE_FENCE.replace_all(text, "").into_owned()
}

/// Stage 4: drop a leading "SQL Query:" / "Query:" / "SQL:" label
pub fn strip_output_label(text: &str) -> String {
    let mut rest = text;
    while let Some(label) = OUTPUT_LABEL.find(rest) {
        rest = rest[label.end()..].trim_start();
    }
    rest.to_string()
}

/// Stage 5: every whitespace run becomes one space
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Stage 6: drop trailing statement terminators
pub fn strip_terminator(text: &str) -> String {
    let mut rest = text;
    while let Some(stripped) = rest.strip_suffix(STATEMENT_TERMINATOR) {
        rest = stripped.trim_end();
    }
    rest.to_string()
}

fn sanitize_once(raw: &str) -> String {
    let text = strip_reasoning(raw);
    let text = strip_code_fences(&text);
    let text = strip_output_label(text.trim());
    let text = collapse_whitespace(&text);
    strip_terminator(&text)
}

/// Run the pipeline until the text stops changing.
///
/// Each pass either leaves its input untouched or makes it shorter, so this
/// terminates, and a fixpoint is by construction idempotent.
pub fn sanitize(raw: &str) -> String {
    let mut current = sanitize_once(raw);
    loop {
        let next = sanitize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}
