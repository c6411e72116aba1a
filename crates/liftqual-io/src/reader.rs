//! CSV table reader with missing-value tokens and column type inference.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::table::{Column, ColumnData, ColumnKind, Table};
use crate::IoError;

/// Tokens treated as missing when no others are configured.
pub const DEFAULT_MISSING_TOKENS: [&str; 3] = ["", "NA", "#DIV/0!"];

/// Name given to a blank leading header cell (an exported row-name column).
pub const ROW_NAME_COLUMN: &str = "X";

/// Reads a delimited table from a CSV file.
///
/// Expected CSV format:
/// - Header row required; names must be unique and non-empty, except that
///   a blank first header cell is named [`ROW_NAME_COLUMN`]
/// - All rows have as many fields as the header
///
/// Cells are trimmed before matching against the missing tokens. A column
/// whose present cells all parse as finite floats becomes
/// [`ColumnData::Numeric`]; any other column becomes [`ColumnData::Text`].
/// A column with no present cells is numeric.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::NoColumns`] | Header row is empty |
/// | [`IoError::EmptyColumnName`] | A header cell after the first is blank |
/// | [`IoError::DuplicateColumn`] | Two header cells share a name |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
pub struct TableReader {
    path: PathBuf,
    missing_tokens: Vec<String>,
}

impl TableReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            missing_tokens: DEFAULT_MISSING_TOKENS.iter().map(|t| (*t).to_string()).collect(),
        }
    }

    /// Replace the set of tokens read as missing cells.
    ///
    /// An empty cell is missing whatever the list holds.
    #[must_use]
    pub fn with_missing_tokens<S: AsRef<str>>(mut self, tokens: &[S]) -> Self {
        self.missing_tokens = tokens.iter().map(|t| t.as_ref().to_string()).collect();
        self
    }

    /// Read the CSV file into a [`Table`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<Table, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) so ragged rows reach the InconsistentRowLength check
        // rather than failing inside the parser.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.parse_error(e))?.clone();
        let names = self.column_names(&header)?;
        let n_cols = names.len();
        debug!(n_cols, "read CSV header");

        let missing: HashSet<&str> = self.missing_tokens.iter().map(String::as_str).collect();
        let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); n_cols];

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.parse_error(e))?;
            if record.len() != n_cols {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: n_cols,
                    got: record.len(),
                });
            }
            for (column, raw) in cells.iter_mut().zip(record.iter()) {
                let value = raw.trim();
                let present = !value.is_empty() && !missing.contains(value);
                column.push(present.then(|| value.to_string()));
            }
        }

        let n_rows = cells.first().map_or(0, Vec::len);
        if n_rows == 0 {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        let columns: Vec<Column> = names
            .into_iter()
            .zip(cells)
            .map(|(name, values)| Column::new(name, infer(values)))
            .collect();
        let n_numeric = columns
            .iter()
            .filter(|c| c.kind() == ColumnKind::Numeric)
            .count();
        let table = Table::new(columns)?;

        info!(
            n_rows,
            n_cols,
            n_numeric,
            n_text = n_cols - n_numeric,
            "table loaded"
        );
        Ok(table)
    }

    fn column_names(&self, header: &csv::StringRecord) -> Result<Vec<String>, IoError> {
        if header.is_empty() {
            return Err(IoError::NoColumns {
                path: self.path.clone(),
            });
        }
        let mut seen = HashSet::new();
        let mut names = Vec::with_capacity(header.len());
        for (index, raw) in header.iter().enumerate() {
            let name = match raw.trim() {
                "" if index == 0 => ROW_NAME_COLUMN.to_string(),
                "" => {
                    return Err(IoError::EmptyColumnName {
                        path: self.path.clone(),
                        index,
                    });
                }
                name => name.to_string(),
            };
            if !seen.insert(name.clone()) {
                return Err(IoError::DuplicateColumn { name });
            }
            names.push(name);
        }
        Ok(names)
    }

    fn parse_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}

/// Numeric when every present cell is a finite float, text otherwise.
fn infer(values: Vec<Option<String>>) -> ColumnData {
    let parsed: Option<Vec<Option<f64>>> = values
        .iter()
        .map(|cell| match cell {
            None => Some(None),
            Some(s) => s.parse::<f64>().ok().filter(|v| v.is_finite()).map(Some),
        })
        .collect();
    match parsed {
        Some(numbers) => ColumnData::Numeric(numbers),
        None => ColumnData::Text(values),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn read_mixed_types() {
        let csv = "\"\",user_name,roll_belt,classe\n1,carlitos,1.41,A\n2,pedro,-0.5,B\n";
        let f = write_csv(csv);
        let table = TableReader::new(f.path()).read().unwrap();

        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.column_names(), vec!["X", "user_name", "roll_belt", "classe"]);
        assert_eq!(table.require("X").unwrap().kind(), ColumnKind::Numeric);
        assert_eq!(table.require("user_name").unwrap().kind(), ColumnKind::Text);
        assert_eq!(table.require("roll_belt").unwrap().number_at(1), Some(-0.5));
        assert_eq!(table.require("classe").unwrap().text_at(0), Some("A"));
    }

    #[test]
    fn missing_tokens_become_none() {
        let csv = "a,b,c\nNA,#DIV/0!,1\n,2.5,\n3, x ,NA\n";
        let f = write_csv(csv);
        let table = TableReader::new(f.path()).read().unwrap();

        let a = table.require("a").unwrap();
        assert_eq!(a.kind(), ColumnKind::Numeric);
        assert_eq!(a.n_missing(), 2);

        let b = table.require("b").unwrap();
        assert_eq!(b.kind(), ColumnKind::Text);
        assert_eq!(b.n_missing(), 1);
        assert_eq!(b.text_at(2), Some("x"));

        assert_eq!(table.require("c").unwrap().n_missing(), 2);
    }

    #[test]
    fn all_missing_column_is_numeric() {
        let csv = "kurtosis_yaw_belt,classe\n,A\nNA,B\n";
        let f = write_csv(csv);
        let table = TableReader::new(f.path()).read().unwrap();
        let col = table.require("kurtosis_yaw_belt").unwrap();
        assert_eq!(col.kind(), ColumnKind::Numeric);
        assert_eq!(col.n_missing(), 2);
    }

    #[test]
    fn non_finite_numbers_read_as_text() {
        let csv = "v\n1.0\ninf\n";
        let f = write_csv(csv);
        let table = TableReader::new(f.path()).read().unwrap();
        assert_eq!(table.require("v").unwrap().kind(), ColumnKind::Text);
    }

    #[test]
    fn custom_missing_tokens() {
        let csv = "v\n?\n2\n";
        let f = write_csv(csv);
        let table = TableReader::new(f.path())
            .with_missing_tokens(&["?"])
            .read()
            .unwrap();
        let v = table.require("v").unwrap();
        assert_eq!(v.kind(), ColumnKind::Numeric);
        assert_eq!(v.n_missing(), 1);
    }

    #[test]
    fn empty_cells_stay_missing_with_custom_tokens() {
        let f = write_csv("label,v
A,
B, 
C,NA
");
        let table = TableReader::new(f.path())
            .with_missing_tokens(&["NA"])
            .read()
            .unwrap();
        let v = table.require("v").unwrap();
        assert_eq!(v.n_missing(), 3);
        assert!(v.is_missing(0) && v.is_missing(1));
    }

    #[test]
    fn nonexistent_file() {
        let result = TableReader::new(Path::new("/nonexistent/pml-training.csv")).read();
        assert!(matches!(result, Err(IoError::FileNotFound { .. })));
    }

    #[test]
    fn header_only_is_empty() {
        let f = write_csv("a,b,classe\n");
        let result = TableReader::new(f.path()).read();
        assert!(matches!(result, Err(IoError::EmptyDataset { .. })));
    }

    #[test]
    fn ragged_row_rejected() {
        let f = write_csv("a,b\n1,2\n3\n");
        let result = TableReader::new(f.path()).read();
        assert!(matches!(
            result,
            Err(IoError::InconsistentRowLength {
                row_index: 1,
                expected: 2,
                got: 1,
                ..
            })
        ));
    }

    #[test]
    fn duplicate_header_rejected() {
        let f = write_csv("a,a\n1,2\n");
        let result = TableReader::new(f.path()).read();
        assert!(matches!(result, Err(IoError::DuplicateColumn { .. })));
    }

    #[test]
    fn blank_inner_header_rejected() {
        let f = write_csv("a,,c\n1,2,3\n");
        let result = TableReader::new(f.path()).read();
        assert!(matches!(result, Err(IoError::EmptyColumnName { index: 1, .. })));
    }
}
