// Prompt Compiler
//
// Renders the catalog, the generation rules and the user's question into the
// single instruction string sent to the model. Output is a pure function of
// its inputs: no clocks, no randomness.

use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::{CatalogEntry, SchemaCatalog, SourceKind, RESERVED_WORDS};

pub const ROLE_STATEMENT: &str = "You are a query-generation assistant for a federated SQL engine \
(Apache Drill) that queries PostgreSQL, MongoDB and CSV files in a single statement.";

pub const OUTPUT_DIRECTIVE: &str = "Return ONLY the SQL query text. Do not include explanations, \
reasoning, <think> tags, markdown or code fences.";

/// Label the model is asked to continue from; the sanitizer strips it if echoed
pub const OUTPUT_LABEL: &str = "SQL Query:";

/// Row limit every generated query must end with
pub const ROW_LIMIT: u32 = 10;

/// Largest limit the model may choose when the question asks for more rows
pub const MAX_ROW_LIMIT: u32 = 20;

/// Constraints the generated query must satisfy, in prompt order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationRule {
    QualifiedReferences,
    CteIsolation,
    UnqualifiedCteColumns,
    ReservedWordColumns,
    ArrayFields,
    FlatFileCasts,
    QualitativeThresholds,
    RowLimit,
    NoTerminator,
}

impl GenerationRule {
    pub const ALL: [GenerationRule; 9] = [
        GenerationRule::QualifiedReferences,
        GenerationRule::CteIsolation,
        GenerationRule::UnqualifiedCteColumns,
        GenerationRule::ReservedWordColumns,
        GenerationRule::ArrayFields,
        GenerationRule::FlatFileCasts,
        GenerationRule::QualitativeThresholds,
        GenerationRule::RowLimit,
        GenerationRule::NoTerminator,
    ];

    pub fn text(&self, catalog: &SchemaCatalog) -> String {
        match self {
            GenerationRule::QualifiedReferences => {
                "Reference every table, collection and file exactly as written in the schema, \
                 including its source prefix and backticks."
                    .to_string()
            }
            GenerationRule::CteIsolation => {
                "When the result combines more than one source kind (PostgreSQL, MongoDB, CSV), \
                 put each source in its own named CTE (WITH name AS (SELECT ... FROM <one source>)), \
                 each self-contained. The final SELECT joins only those CTEs and never references \
                 raw tables from different sources. Joins within a single source may be written directly."
                    .to_string()
            }
            GenerationRule::UnqualifiedCteColumns => {
                "Inside a CTE, write column names without any table alias prefix \
                 (region_id, not c.region_id)."
                    .to_string()
            }
            GenerationRule::ReservedWordColumns => {
                let names = catalog.reserved_word_columns();
                let listed = if names.is_empty() {
                    RESERVED_WORDS
                        .iter()
                        .map(|w| format!("`{}`", w))
                        .collect::<Vec<_>>()
                } else {
                    names.iter().map(|n| format!("`{}`", n)).collect()
                };
                format!(
                    "Never select columns whose name is a reserved word ({}) inside a CTE; \
                     leave them out of the projection.",
                    listed.join(", ")
                )
            }
            GenerationRule::ArrayFields => {
                "Array fields must be selected as-is. Never wrap them in COUNT, COUNT(DISTINCT ...) \
                 or any other aggregate; where the schema names a count field for an array, \
                 use that field instead."
                    .to_string()
            }
            GenerationRule::FlatFileCasts => {
                "CSV columns are all text. CAST any CSV column used in arithmetic, aggregation, \
                 a join condition or a numeric comparison to its stated type, \
                 e.g. CAST(region_id AS INT), CAST(co2_level AS FLOAT)."
                    .to_string()
            }
            GenerationRule::QualitativeThresholds => {
                "Translate qualitative terms (high, low, hot, cold, wet, dry) into WHERE conditions \
                 using the thresholds given in the schema notes. Avoid ORDER BY on timestamp columns."
                    .to_string()
            }
            GenerationRule::RowLimit => format!(
                "End every query with LIMIT {} (never more than LIMIT {}).",
                ROW_LIMIT, MAX_ROW_LIMIT
            ),
            GenerationRule::NoTerminator => "Do not end the query with a semicolon.".to_string(),
        }
    }
}

/// A worked question and the query that answers it
#[derive(Debug, Clone, Copy)]
pub struct QueryExample {
    pub question: &'static str,
    pub query: &'static str,
    pub note: &'static str,
}

static SOURCE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:postgres|mongo|dfs)\.\w+\.`[^`]+`").expect("valid source reference pattern")
});

impl QueryExample {
    /// Fully qualified references the example query uses
    pub fn references(&self) -> Vec<&'static str> {
        SOURCE_REFERENCE
            .find_iter(self.query)
            .map(|m| m.as_str())
            .collect()
    }

    /// Whether every object the example touches exists in `catalog`
    pub fn applies_to(&self, catalog: &SchemaCatalog) -> bool {
        self.references()
            .iter()
            .all(|reference| catalog.find(reference).is_some())
    }
}

pub const EXAMPLES: &[QueryExample] = &[
    QueryExample {
        question: "List all regions",
        query: "SELECT * FROM postgres.public.`region_info` LIMIT 10",
        note: "Single table, qualified reference.",
    },
    QueryExample {
        question: "Show climate data with region names",
        query: "SELECT r.region_name, c.temperature, c.rainfall, c.humidity \
                FROM postgres.public.`climate_data` c \
                JOIN postgres.public.`region_info` r ON c.region_id = r.region_id LIMIT 10",
        note: "Both tables live in PostgreSQL, so a direct JOIN is fine.",
    },
    QueryExample {
        question: "Which regions have high temperature?",
        query: "SELECT r.region_name, c.temperature \
                FROM postgres.public.`climate_data` c \
                JOIN postgres.public.`region_info` r ON c.region_id = r.region_id \
                WHERE c.temperature > 25 LIMIT 10",
        note: "high temperature: temperature > 25; low temperature: temperature < 10; \
               high rainfall: rainfall > 200; high humidity: humidity > 70.",
    },
    QueryExample {
        question: "Show species counts with region names",
        query: "WITH pg_data AS (SELECT region_id, region_name FROM postgres.public.`region_info`), \
                mongo_data AS (SELECT region_id, species_count, conservation_status \
                FROM mongo.environmental_db.`Biodiversity_Data`) \
                SELECT pg_data.region_name, mongo_data.species_count, mongo_data.conservation_status \
                FROM pg_data JOIN mongo_data ON pg_data.region_id = mongo_data.region_id LIMIT 10",
        note: "PostgreSQL and MongoDB: one CTE per source, unqualified columns inside each CTE, \
               species_count instead of counting endangered_species.",
    },
    QueryExample {
        question: "Average CO2 level per region",
        query: "WITH sensor_data AS (SELECT CAST(region_id AS INT) AS region_id, \
                CAST(co2_level AS FLOAT) AS co2_level FROM dfs.data.`sensor_readings.csv`), \
                region_data AS (SELECT region_id, region_name FROM postgres.public.`region_info`) \
                SELECT region_data.region_name, AVG(sensor_data.co2_level) AS avg_co2 \
                FROM sensor_data JOIN region_data ON sensor_data.region_id = region_data.region_id \
                GROUP BY region_data.region_name LIMIT 10",
        note: "CSV columns are text: CAST before joining or aggregating.",
    },
];

/// Recurring question shapes and the sources that answer them
pub const COMMON_PATTERNS: &[&str] = &[
    "Climate with regions: climate_data joined to region_info",
    "Biodiversity analysis: Biodiversity_Data (MongoDB) with region_info (PostgreSQL)",
    "Sensor analysis: sensor_readings.csv with region_info, casting region_id",
    "Complete view: all three source kinds on region_id, one CTE per source",
];

/// Render the worked examples that apply to `catalog`, then the common patterns
pub fn render_examples(examples: &[QueryExample], catalog: &SchemaCatalog) -> String {
    let mut out = String::new();
    let applicable = examples.iter().filter(|e| e.applies_to(catalog));
    for (i, example) in applicable.enumerate() {
        let _ = writeln!(out, "### Example {}", i + 1);
        let _ = writeln!(out, "Question: {}", example.question);
        let _ = writeln!(out, "SQL: {}", example.query);
        let _ = writeln!(out, "Note: {}\n", example.note);
    }
    out.push_str("## Common query patterns\n\n");
    for pattern in COMMON_PATTERNS {
        let _ = writeln!(out, "- {}", pattern);
    }
    out
}

/// Render one catalog entry as a schema block
pub fn render_entry(entry: &CatalogEntry) -> String {
    let mut block = String::new();
    let _ = writeln!(block, "### {}", entry.reference);
    block.push_str("Columns:\n");
    for column in entry.columns {
        let _ = write!(block, "  - {} ({})", column.name, column.data_type.sql_name());
        if let Some(target) = column.cast_as {
            let _ = write!(block, " [stored as text, CAST AS {}]", target.sql_name());
        }
        if let Some(count_field) = column.count_field {
            let _ = write!(block, " [array; use {} for counts]", count_field);
        }
        if let Some(note) = column.note {
            let _ = write!(block, ": {}", note);
        }
        block.push('\n');
    }
    let _ = writeln!(block, "Description: {}", entry.description);
    for join in entry.joins {
        let _ = writeln!(
            block,
            "Join: {}.{} = {}.{}",
            entry.reference, join.column, join.target, join.target_column
        );
    }
    block
}

/// Render the whole catalog, grouped by source kind
pub fn render_catalog(catalog: &SchemaCatalog) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# FEDERATED SCHEMA (catalog {})", catalog.version);
    for kind in SourceKind::ALL {
        let _ = writeln!(
            out,
            "\n## {} (reference syntax: {})\n",
            kind.display_name(),
            kind.addressing_syntax()
        );
        for entry in catalog.entries_of(kind) {
            out.push_str(&render_entry(entry));
            out.push('\n');
        }
    }
    out
}

pub fn render_rules(rules: &[GenerationRule], catalog: &SchemaCatalog) -> String {
    let mut out = String::new();
    for (i, rule) in rules.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, rule.text(catalog));
    }
    out
}

/// Compile the model instruction for `question`
pub fn compile_prompt(question: &str, catalog: &SchemaCatalog) -> String {
    format!(
        "{role}\n\n{schema}\n# GENERATION RULES\n\n{rules}\n# EXAMPLES\n\n{examples}\nUSER QUESTION: \"{question}\"\n\n{directive}\n\n{label}",
        role = ROLE_STATEMENT,
        schema = render_catalog(catalog),
        rules = render_rules(&GenerationRule::ALL, catalog),
        examples = render_examples(EXAMPLES, catalog),
        question = question,
        directive = OUTPUT_DIRECTIVE,
        label = OUTPUT_LABEL,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Column, ColumnType, SourceKind};
    use crate::services::nlq::{catalog, sanitize};

    const QUESTION: &str = "Show me all regions with their climate data";

    #[test]
    fn test_prompt_is_deterministic() {
        let first = compile_prompt(QUESTION, catalog::builtin());
        for _ in 0..5 {
            assert_eq!(compile_prompt(QUESTION, catalog::builtin()), first);
        }
    }

    #[test]
    fn test_sections_in_order() {
        let prompt = compile_prompt(QUESTION, catalog::builtin());
        let role = prompt.find(ROLE_STATEMENT).unwrap();
        let schema = prompt.find("# FEDERATED SCHEMA").unwrap();
        let rules = prompt.find("# GENERATION RULES").unwrap();
        let examples = prompt.find("# EXAMPLES").unwrap();
        let question = prompt.find(&format!("USER QUESTION: \"{}\"", QUESTION)).unwrap();
        let directive = prompt.find(OUTPUT_DIRECTIVE).unwrap();

        assert_eq!(role, 0);
        assert!(role < schema && schema < rules && rules < examples);
        assert!(examples < question && question < directive);
        assert!(prompt.ends_with(OUTPUT_LABEL));
    }

    #[test]
    fn test_every_entry_rendered() {
        let prompt = compile_prompt(QUESTION, catalog::builtin());
        for entry in catalog::builtin().entries {
            assert!(prompt.contains(&format!("### {}", entry.reference)));
            for column in entry.columns {
                assert!(prompt.contains(column.name));
            }
        }
    }

    #[test]
    fn test_entry_block_order() {
        let climate = catalog::builtin()
            .find("postgres.public.`climate_data`")
            .unwrap();
        let block = render_entry(climate);
        let reference = block.find("### postgres.public.`climate_data`").unwrap();
        let columns = block.find("Columns:").unwrap();
        let description = block.find("Description:").unwrap();
        assert!(reference < columns && columns < description);
    }

    #[test]
    fn test_rules_numbered_in_order() {
        let catalog = catalog::builtin();
        let prompt = compile_prompt(QUESTION, catalog);
        let mut last = 0;
        for (i, rule) in GenerationRule::ALL.iter().enumerate() {
            let line = format!("{}. {}", i + 1, rule.text(catalog));
            let pos = prompt.find(&line).unwrap_or_else(|| panic!("missing rule {:?}", rule));
            assert!(pos > last);
            last = pos;
        }
    }

    #[test]
    fn test_required_constraints_are_encoded() {
        let rules = render_rules(&GenerationRule::ALL, catalog::builtin());
        assert!(rules.contains("own named CTE"));
        assert!(rules.contains("without any table alias prefix"));
        assert!(rules.contains("(`timestamp`)"));
        assert!(rules.contains("COUNT(DISTINCT"));
        assert!(rules.contains("CAST"));
        assert!(rules.contains("LIMIT 10"));
        assert!(rules.contains("semicolon"));

        let cte = GenerationRule::ALL
            .iter()
            .position(|r| *r == GenerationRule::CteIsolation)
            .unwrap();
        let terminator = GenerationRule::ALL
            .iter()
            .position(|r| *r == GenerationRule::NoTerminator)
            .unwrap();
        assert!(cte < terminator);
        assert_eq!(terminator, GenerationRule::ALL.len() - 1);
    }

    #[test]
    fn test_reserved_word_rule_follows_catalog() {
        static EXTRA: &[crate::models::CatalogEntry] = &[crate::models::CatalogEntry {
            kind: SourceKind::DocumentCollection,
            reference: "mongo.environmental_db.`Field_Visits`",
            description: "Field survey visits",
            columns: &[
                Column::new("visit_id", ColumnType::Integer),
                Column::new("date", ColumnType::Timestamp),
                Column::new("user", ColumnType::String),
            ],
            joins: &[],
        }];
        let catalog = SchemaCatalog {
            version: "test",
            entries: EXTRA,
        };
        let text = GenerationRule::ReservedWordColumns.text(&catalog);
        assert!(text.contains("`date`"));
        assert!(text.contains("`user`"));
        assert!(!text.contains("`timestamp`"));

        let empty = SchemaCatalog {
            version: "empty",
            entries: &[],
        };
        let text = GenerationRule::ReservedWordColumns.text(&empty);
        for word in RESERVED_WORDS {
            assert!(text.contains(&format!("`{}`", word)));
        }
    }

    #[test]
    fn test_row_limit_rule_within_bounds() {
        assert!((10..=20).contains(&ROW_LIMIT));
        assert!(ROW_LIMIT <= MAX_ROW_LIMIT && MAX_ROW_LIMIT <= 20);
        let text = GenerationRule::RowLimit.text(catalog::builtin());
        assert!(text.contains(&format!("LIMIT {}", ROW_LIMIT)));
        assert!(text.contains(&format!("LIMIT {}", MAX_ROW_LIMIT)));
    }

    #[test]
    fn test_examples_follow_the_rules() {
        let catalog = catalog::builtin();
        for example in EXAMPLES {
            assert!(example.applies_to(catalog), "{}", example.question);
            assert!(!example.references().is_empty());
            assert_eq!(sanitize(example.query), example.query);
            assert!(example.query.ends_with(&format!("LIMIT {}", ROW_LIMIT)));

            let kinds: Vec<SourceKind> = SourceKind::ALL
                .into_iter()
                .filter(|kind| {
                    example
                        .references()
                        .iter()
                        .any(|r| r.starts_with(kind.reference_prefix()))
                })
                .collect();
            if kinds.len() > 1 {
                assert!(example.query.starts_with("WITH "), "{}", example.question);
            }
            assert!(!example.query.contains("COUNT(endangered_species"));
        }
    }

    #[test]
    fn test_examples_rendered_with_patterns() {
        let prompt = compile_prompt(QUESTION, catalog::builtin());
        assert!(prompt.contains("### Example 1\nQuestion: List all regions"));
        assert!(prompt.contains("WHERE c.temperature > 25"));
        assert!(prompt.contains("high rainfall: rainfall > 200"));
        assert!(prompt.contains("## Common query patterns"));
        for pattern in COMMON_PATTERNS {
            assert!(prompt.contains(pattern));
        }
    }

    #[test]
    fn test_examples_skip_unknown_sources() {
        static ONLY_REGIONS: &[crate::models::CatalogEntry] = &[crate::models::CatalogEntry {
            kind: SourceKind::RelationalTable,
            reference: "postgres.public.`region_info`",
            description: "regions",
            columns: &[Column::new("region_id", ColumnType::Integer)],
            joins: &[],
        }];
        let catalog = SchemaCatalog {
            version: "regions-only",
            entries: ONLY_REGIONS,
        };
        let rendered = render_examples(EXAMPLES, &catalog);
        assert!(rendered.contains("List all regions"));
        assert!(!rendered.contains("Biodiversity_Data`"));
        assert!(!rendered.contains("### Example 2"));
    }

    #[test]
    fn test_entry_rendering_marks_casts_and_counts() {
        let catalog = catalog::builtin();
        let csv = catalog.find("dfs.data.`sensor_readings.csv`").unwrap();
        let block = render_entry(csv);
        assert!(block.contains("co2_level (VARCHAR) [stored as text, CAST AS FLOAT]"));

        let bio = catalog
            .find("mongo.environmental_db.`Biodiversity_Data`")
            .unwrap();
        let block = render_entry(bio);
        assert!(block.contains("endangered_species (ARRAY) [array; use species_count for counts]"));
        assert!(block.contains("Join: mongo.environmental_db.`Biodiversity_Data`.region_id = postgres.public.`region_info`.region_id"));
    }
}
