//! I/O error types for liftqual-io.

use std::path::PathBuf;

/// Errors from CSV loading, table construction, and result writing.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// The input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The CSV parser hit a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        path: PathBuf,
        offset: u64,
        source: csv::Error,
    },

    /// Header present, but no data rows.
    #[error("empty dataset (no data rows) in {path}")]
    EmptyDataset { path: PathBuf },

    #[error("no columns in header of {path}")]
    NoColumns { path: PathBuf },

    /// A data row has a different number of fields than the header.
    #[error("inconsistent row length in {path}: row {row_index} has {got} columns, expected {expected}")]
    InconsistentRowLength {
        path: PathBuf,
        /// Zero-based, excluding the header.
        row_index: usize,
        expected: usize,
        got: usize,
    },

    /// A header cell other than the first is blank.
    #[error("column {index} of {path} has an empty name")]
    EmptyColumnName { path: PathBuf, index: usize },

    #[error("duplicate column name \"{name}\"")]
    DuplicateColumn { name: String },

    /// Columns handed to a table have different lengths.
    #[error("column \"{name}\" has {got} rows, expected {expected}")]
    RaggedColumns {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("column \"{name}\" not found")]
    MissingColumn { name: String },

    #[error("row index {row} out of range for {n_rows} rows")]
    RowOutOfRange { row: usize, n_rows: usize },

    #[error("column mask has {got} entries for {expected} columns")]
    MaskLength { expected: usize, got: usize },

    /// The experiment name contains characters outside `[a-zA-Z0-9_-]`.
    #[error("invalid experiment name \"{name}\": must match [a-zA-Z0-9_-]+")]
    InvalidExperimentName { name: String },

    #[error("cannot create output directory {path}")]
    OutputDirCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot serialize {what}")]
    Serialize {
        what: String,
        source: serde_json::Error,
    },

    #[error("cannot write file {path}")]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },
}
