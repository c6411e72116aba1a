//! CSV loading into typed tables, plus report and answer-file writers.

mod domain;
mod error;
mod reader;
mod table;
mod writer;

pub use domain::ExperimentName;
pub use error::IoError;
pub use reader::{TableReader, DEFAULT_MISSING_TOKENS, ROW_NAME_COLUMN};
pub use table::{Column, ColumnData, ColumnKind, Table};
pub use writer::{AnswerWriter, ReportWriter};
