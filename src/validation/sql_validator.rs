use sqlparser::ast::Statement;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

use crate::api::middleware::AppError;

/// Optional structural check applied to translated queries before execution.
///
/// GenericDialect accepts the engine's backtick-quoted, source-prefixed
/// references (postgres.public.`region_info`).
pub struct SqlValidator;

impl SqlValidator {
    fn parse(sql: &str) -> Result<Vec<Statement>, AppError> {
        let dialect = GenericDialect {};
        Parser::new(&dialect)
            .try_with_sql(sql)
            .and_then(|mut parser| parser.parse_statements())
            .map_err(|e| AppError::InvalidSql(format!("SQL parsing error: {}", e)))
    }

    /// Accept exactly one query (SELECT / WITH ... SELECT) statement
    pub fn validate_select_only(sql: &str) -> Result<(), AppError> {
        let ast = Self::parse(sql)?;

        match ast.as_slice() {
            [] => Err(AppError::InvalidSql("Empty SQL query".to_string())),
            [Statement::Query(_)] => Ok(()),
            [_] => Err(AppError::InvalidSql(
                "Only SELECT queries are permitted".to_string(),
            )),
            _ => Err(AppError::InvalidSql(format!(
                "Expected a single statement, found {}",
                ast.len()
            ))),
        }
    }

    /// Strict-mode gate for translated queries: one SELECT ending in a row limit
    pub fn validate_generated(sql: &str) -> Result<(), AppError> {
        Self::validate_select_only(sql)?;
        if !Self::has_limit(sql) {
            return Err(AppError::InvalidSql(
                "Generated query must end with a LIMIT clause".to_string(),
            ));
        }
        Ok(())
    }

    /// Check for a row-limit clause using the AST rather than substring search
    pub fn has_limit(sql: &str) -> bool {
        match Self::parse(sql) {
            Ok(ast) => matches!(
                ast.first(),
                Some(Statement::Query(query)) if query.limit_clause.is_some()
            ),
            Err(_) => false,
        }
    }
}
