//! Error types for the composable-gsea library.

use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum GseaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid value '{value}' at row {row}, column {col}")]
    InvalidValue {
        value: String,
        row: usize,
        col: usize,
    },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Missing sample: {0}")]
    MissingSample(String),

    #[error("Missing column '{0}'")]
    MissingColumn(String),

    #[error("Grouping column '{column}' must contain exactly 2 groups, found {found}: {levels:?}")]
    InvalidGroup {
        column: String,
        found: usize,
        levels: Vec<String>,
    },

    #[error("No pathways pass size filtering (min_size={min_size}, max_size={max_size}, {n_pathways} pathways supplied)")]
    EmptyPathwaySet {
        min_size: usize,
        max_size: usize,
        n_pathways: usize,
    },

    #[error("At least 1 permutation is required, got {0}")]
    InsufficientPermutations(usize),

    #[error("Duplicate identifier '{0}'")]
    DuplicateIdentifier(String),

    #[error("Analysis cancelled after {completed} of {requested} permutations")]
    Cancelled { completed: usize, requested: usize },

    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, GseaError>;
