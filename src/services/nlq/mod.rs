// Natural Language Query Module
//
// Translates a question into one federated SQL statement:
// 1. catalog    - static description of the estate
// 2. prompt     - renders catalog + generation rules + question
// 3. sanitizer  - repairs raw model output into a single-line query
// 4. annotator  - interpretation and confidence from token presence
// 5. fallback   - keyword rules used when no model is reachable
// 6. translator - the pipeline itself

pub mod annotator;
pub mod catalog;
pub mod fallback;
pub mod prompt;
pub mod sanitizer;
pub mod translator;

pub use annotator::{annotate, Annotation};
pub use prompt::{compile_prompt, GenerationRule};
pub use sanitizer::sanitize;
pub use translator::NlqTranslator;
