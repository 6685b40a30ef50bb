pub mod llm_service;
pub mod nlq; // Natural-language-to-SQL pipeline
pub mod query_service;

pub use llm_service::*;
pub use query_service::*;
