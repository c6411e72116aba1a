//! Label and feature encoding into the numeric form the forest consumes.

use std::collections::BTreeSet;

use liftqual_io::{Column, ColumnData, ColumnKind, Table};
use tracing::{debug, instrument};

use crate::PrepError;

/// Maps label strings to dense class codes in sorted label order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Learn the sorted set of distinct labels in `column`.
    ///
    /// # Errors
    ///
    /// Returns [`PrepError::MissingLabel`] for the first missing cell.
    pub fn fit(column: &Column) -> Result<Self, PrepError> {
        let mut classes = BTreeSet::new();
        for row in 0..column.len() {
            let label = column.render(row).ok_or(PrepError::MissingLabel { row })?;
            classes.insert(label);
        }
        Ok(Self {
            classes: classes.into_iter().collect(),
        })
    }

    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Class code of every row of `column`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`PrepError::MissingLabel`] | a cell is missing |
    /// | [`PrepError::UnknownLabel`] | a label was not seen by [`fit`](Self::fit) |
    pub fn encode(&self, column: &Column) -> Result<Vec<usize>, PrepError> {
        (0..column.len())
            .map(|row| {
                let label = column.render(row).ok_or(PrepError::MissingLabel { row })?;
                self.classes
                    .binary_search(&label)
                    .map_err(|_| PrepError::UnknownLabel { label })
            })
            .collect()
    }

    /// # Errors
    ///
    /// Returns [`PrepError::ClassCodeOutOfRange`] when `code >= n_classes`.
    pub fn decode(&self, code: usize) -> Result<&str, PrepError> {
        self.classes
            .get(code)
            .map(String::as_str)
            .ok_or(PrepError::ClassCodeOutOfRange {
                code,
                n_classes: self.classes.len(),
            })
    }

    /// Decode a sequence of codes.
    ///
    /// # Errors
    ///
    /// Returns [`PrepError::ClassCodeOutOfRange`] for the first bad code.
    pub fn decode_all(&self, codes: &[usize]) -> Result<Vec<String>, PrepError> {
        codes
            .iter()
            .map(|&code| self.decode(code).map(str::to_string))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Encoding {
    Numeric,
    /// Text column coded by position in its sorted training levels.
    Ordinal(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
struct EncodedColumn {
    name: String,
    encoding: Encoding,
}

/// Turns a table's predictor columns into a row-major `f64` matrix.
///
/// Numeric columns pass through. Text columns become the index of the value
/// in the sorted set of levels seen when fitting, so the same encoder can be
/// applied to any table carrying the predictor columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureEncoder {
    columns: Vec<EncodedColumn>,
}

impl FeatureEncoder {
    /// Learn encodings for `predictors` from `table`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`PrepError::MissingColumn`] | a predictor is not in `table` |
    /// | [`PrepError::MissingValue`] | a text predictor has a missing cell |
    #[instrument(skip_all, fields(n_predictors = predictors.len()))]
    pub fn fit<S: AsRef<str>>(table: &Table, predictors: &[S]) -> Result<Self, PrepError> {
        let columns = predictors
            .iter()
            .map(|name| {
                let column = require(table, name.as_ref())?;
                let encoding = match column.data() {
                    ColumnData::Numeric(_) => Encoding::Numeric,
                    ColumnData::Text(values) => {
                        let mut levels = BTreeSet::new();
                        for (row, value) in values.iter().enumerate() {
                            let value = value.as_deref().ok_or_else(|| PrepError::MissingValue {
                                column: column.name().to_string(),
                                row,
                            })?;
                            levels.insert(value.to_string());
                        }
                        debug!(column = column.name(), n_levels = levels.len(), "ordinal encoding");
                        Encoding::Ordinal(levels.into_iter().collect())
                    }
                };
                Ok::<_, PrepError>(EncodedColumn {
                    name: column.name().to_string(),
                    encoding,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { columns })
    }

    #[must_use]
    pub fn feature_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.columns.len()
    }

    /// Encode every row of `table`; extra columns are ignored.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`PrepError::MissingColumn`] | a predictor is not in `table` |
    /// | [`PrepError::TypeMismatch`] | a numeric predictor arrives as text |
    /// | [`PrepError::MissingValue`] | a predictor cell is missing |
    /// | [`PrepError::UnknownLevel`] | a text value was not seen when fitting |
    pub fn encode(&self, table: &Table) -> Result<Vec<Vec<f64>>, PrepError> {
        let mut rows = vec![Vec::with_capacity(self.columns.len()); table.n_rows()];
        for encoded in &self.columns {
            let column = require(table, &encoded.name)?;
            match &encoded.encoding {
                Encoding::Numeric => {
                    if column.kind() != ColumnKind::Numeric {
                        return Err(PrepError::TypeMismatch {
                            column: encoded.name.clone(),
                            expected: ColumnKind::Numeric,
                            got: column.kind(),
                        });
                    }
                    for (row, out) in rows.iter_mut().enumerate() {
                        let value = column.number_at(row).ok_or_else(|| missing(encoded, row))?;
                        out.push(value);
                    }
                }
                Encoding::Ordinal(levels) => {
                    // Numeric cells are matched by their rendered text.
                    for (row, out) in rows.iter_mut().enumerate() {
                        let value = column.render(row).ok_or_else(|| missing(encoded, row))?;
                        let code = levels.binary_search(&value).map_err(|_| {
                            PrepError::UnknownLevel {
                                column: encoded.name.clone(),
                                level: value,
                            }
                        })?;
                        out.push(code as f64);
                    }
                }
            }
        }
        Ok(rows)
    }
}

fn require<'a>(table: &'a Table, name: &str) -> Result<&'a Column, PrepError> {
    table.column(name).ok_or_else(|| PrepError::MissingColumn {
        name: name.to_string(),
    })
}

fn missing(encoded: &EncodedColumn, row: usize) -> PrepError {
    PrepError::MissingValue {
        column: encoded.name.clone(),
        row,
    }
}
