// Schema Catalog Model
//
// Static description of every queryable object in the federated estate.
// Entries are built in const context and never mutated; see
// `services::nlq::catalog` for the estate itself.

use serde::Serialize;

/// Category of backing store an entry lives in
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// Relational table (PostgreSQL storage plugin)
    RelationalTable,
    /// Document collection (MongoDB storage plugin)
    DocumentCollection,
    /// Flat file read through the filesystem plugin
    FlatFile,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [
        SourceKind::RelationalTable,
        SourceKind::DocumentCollection,
        SourceKind::FlatFile,
    ];

    /// Name of the backing store as it is shown to users
    pub fn display_name(&self) -> &'static str {
        match self {
            SourceKind::RelationalTable => "PostgreSQL",
            SourceKind::DocumentCollection => "MongoDB",
            SourceKind::FlatFile => "CSV",
        }
    }

    /// Leading addressing segment of every reference of this kind
    pub fn reference_prefix(&self) -> &'static str {
        match self {
            SourceKind::RelationalTable => "postgres.",
            SourceKind::DocumentCollection => "mongo.",
            SourceKind::FlatFile => "dfs.",
        }
    }

    /// Lower-case tokens whose presence in a query marks this kind as referenced
    pub fn query_tokens(&self) -> &'static [&'static str] {
        match self {
            SourceKind::RelationalTable => &["postgres"],
            SourceKind::DocumentCollection => &["mongo"],
            SourceKind::FlatFile => &["dfs", ".csv"],
        }
    }

    /// Example reference syntax used in the prompt
    pub fn addressing_syntax(&self) -> &'static str {
        match self {
            SourceKind::RelationalTable => "postgres.public.`table_name`",
            SourceKind::DocumentCollection => "mongo.environmental_db.`CollectionName`",
            SourceKind::FlatFile => "dfs.data.`filename.csv`",
        }
    }
}

/// Declared column types. Flat-file columns are always `String`.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Decimal,
    String,
    Timestamp,
    Array,
    Object,
}

impl ColumnType {
    /// Type name as written in the prompt and in CAST targets
    pub fn sql_name(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INT",
            ColumnType::Decimal => "FLOAT",
            ColumnType::String => "VARCHAR",
            ColumnType::Timestamp => "TIMESTAMP",
            ColumnType::Array => "ARRAY",
            ColumnType::Object => "OBJECT",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Column {
    pub name: &'static str,
    pub data_type: ColumnType,
    /// Free-text semantics: value ranges, high/low thresholds, enumerations
    pub note: Option<&'static str>,
    /// Type a text column must be cast to before arithmetic or comparison
    pub cast_as: Option<ColumnType>,
    /// Scalar field holding a precomputed element count of this array
    pub count_field: Option<&'static str>,
}

impl Column {
    pub const fn new(name: &'static str, data_type: ColumnType) -> Self {
        Self {
            name,
            data_type,
            note: None,
            cast_as: None,
            count_field: None,
        }
    }

    pub const fn with_note(self, note: &'static str) -> Self {
        Column {
            note: Some(note),
            ..self
        }
    }

    pub const fn cast_as(self, target: ColumnType) -> Self {
        Column {
            cast_as: Some(target),
            ..self
        }
    }

    pub const fn counted_by(self, field: &'static str) -> Self {
        Column {
            count_field: Some(field),
            ..self
        }
    }
}

/// Join key declared once, on the referencing side
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct JoinKey {
    pub column: &'static str,
    pub target: &'static str,
    pub target_column: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct CatalogEntry {
    pub kind: SourceKind,
    /// Fully qualified, pre-quoted reference ready for substitution into a query
    pub reference: &'static str,
    pub description: &'static str,
    pub columns: &'static [Column],
    pub joins: &'static [JoinKey],
}

impl CatalogEntry {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SchemaCatalog {
    pub version: &'static str,
    pub entries: &'static [CatalogEntry],
}

impl SchemaCatalog {
    pub fn entries_of(&self, kind: SourceKind) -> impl Iterator<Item = &CatalogEntry> + '_ {
        self.entries.iter().filter(move |e| e.kind == kind)
    }

    pub fn find(&self, reference: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.reference == reference)
    }

    /// Columns whose names collide with a reserved word of the engine
    pub fn reserved_word_columns(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self
            .entries
            .iter()
            .flat_map(|e| e.columns.iter())
            .map(|c| c.name)
            .filter(|name| is_reserved_word(name))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

/// Reserved words of the federated engine that also occur as column names
pub const RESERVED_WORDS: &[&str] = &["timestamp", "date", "time", "value", "user"];

pub fn is_reserved_word(name: &str) -> bool {
    RESERVED_WORDS
        .iter()
        .any(|word| word.eq_ignore_ascii_case(name))
}
