use liftqual_io::{ColumnKind, IoError};

/// Errors from column filtering, partitioning, and encoding.
#[derive(Debug, thiserror::Error)]
pub enum PrepError {
    // --- filter configuration ---
    #[error("invalid {name} threshold {value}: must be finite and {requirement}")]
    InvalidThreshold {
        name: &'static str,
        value: f64,
        requirement: &'static str,
    },

    #[error("invalid column name pattern \"{pattern}\"")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    // --- filter outcome ---
    /// The label column is absent from the input or was removed by the missingness rule.
    #[error("label column \"{label}\" is missing or has missing values")]
    LabelMissing { label: String },

    #[error("every predictor column was removed by the filter")]
    AllColumnsRemoved,

    // --- partitioning ---
    #[error("invalid split fraction {fraction}: must lie strictly between 0 and 1")]
    InvalidFraction { fraction: f64 },

    #[error("cannot split an empty label set")]
    EmptyLabels,

    /// Both partitions need at least one row of every class.
    #[error("class {class} has {count} row(s); a stratified split needs at least 2")]
    TooFewRowsForSplit { class: usize, count: usize },

    // --- encoding ---
    #[error("label missing at row {row}")]
    MissingLabel { row: usize },

    #[error("label \"{label}\" was not seen when the encoder was fit")]
    UnknownLabel { label: String },

    #[error("class code {code} out of range for {n_classes} classes")]
    ClassCodeOutOfRange { code: usize, n_classes: usize },

    #[error("predictor column \"{name}\" not found")]
    MissingColumn { name: String },

    #[error("missing value in column \"{column}\" at row {row}")]
    MissingValue { column: String, row: usize },

    #[error("level \"{level}\" in column \"{column}\" was not seen when the encoder was fit")]
    UnknownLevel { column: String, level: String },

    #[error("column \"{column}\" is {got:?}, expected {expected:?}")]
    TypeMismatch {
        column: String,
        expected: ColumnKind,
        got: ColumnKind,
    },

    #[error(transparent)]
    Table(#[from] IoError),
}
