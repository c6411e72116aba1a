//! In-memory columnar table with typed columns.

use std::collections::HashSet;

use crate::IoError;

/// Values of one column; `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// Every present cell is a finite float.
    Numeric(Vec<Option<f64>>),
    /// Free text or categorical values.
    Text(Vec<Option<String>>),
}

/// Type tag of a [`ColumnData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Text,
}

/// A named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Shorthand for a fully present numeric column.
    pub fn numeric(name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        Self::new(name, ColumnData::Numeric(values.into_iter().map(Some).collect()))
    }

    /// Shorthand for a fully present text column.
    pub fn text<S: Into<String>>(name: impl Into<String>, values: impl IntoIterator<Item = S>) -> Self {
        Self::new(
            name,
            ColumnData::Text(values.into_iter().map(|v| Some(v.into())).collect()),
        )
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    #[must_use]
    pub fn kind(&self) -> ColumnKind {
        match self.data {
            ColumnData::Numeric(_) => ColumnKind::Numeric,
            ColumnData::Text(_) => ColumnKind::Text,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match &self.data {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn is_missing(&self, row: usize) -> bool {
        match &self.data {
            ColumnData::Numeric(v) => v[row].is_none(),
            ColumnData::Text(v) => v[row].is_none(),
        }
    }

    #[must_use]
    pub fn n_missing(&self) -> usize {
        (0..self.len()).filter(|&row| self.is_missing(row)).count()
    }

    /// The numeric value at `row`, if this is a numeric column and the cell is present.
    #[must_use]
    pub fn number_at(&self, row: usize) -> Option<f64> {
        match &self.data {
            ColumnData::Numeric(v) => v[row],
            ColumnData::Text(_) => None,
        }
    }

    /// The text value at `row`, if this is a text column and the cell is present.
    #[must_use]
    pub fn text_at(&self, row: usize) -> Option<&str> {
        match &self.data {
            ColumnData::Text(v) => v[row].as_deref(),
            ColumnData::Numeric(_) => None,
        }
    }

    /// The cell at `row` as a string, or `None` when missing.
    #[must_use]
    pub fn render(&self, row: usize) -> Option<String> {
        match &self.data {
            ColumnData::Numeric(v) => v[row].map(|x| x.to_string()),
            ColumnData::Text(v) => v[row].clone(),
        }
    }

    fn take(&self, rows: &[usize]) -> Column {
        let data = match &self.data {
            ColumnData::Numeric(v) => ColumnData::Numeric(rows.iter().map(|&r| v[r]).collect()),
            ColumnData::Text(v) => ColumnData::Text(rows.iter().map(|&r| v[r].clone()).collect()),
        };
        Column::new(self.name.clone(), data)
    }
}

/// Ordered collection of equal-length named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    n_rows: usize,
}

impl Table {
    /// Build a table, checking that names are unique and lengths agree.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::DuplicateColumn`] | two columns share a name |
    /// | [`IoError::RaggedColumns`] | a column's length differs from the first column's |
    pub fn new(columns: Vec<Column>) -> Result<Self, IoError> {
        let n_rows = columns.first().map_or(0, Column::len);
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name()) {
                return Err(IoError::DuplicateColumn {
                    name: column.name().to_string(),
                });
            }
            if column.len() != n_rows {
                return Err(IoError::RaggedColumns {
                    name: column.name().to_string(),
                    expected: n_rows,
                    got: column.len(),
                });
            }
        }
        Ok(Self { columns, n_rows })
    }

    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    #[must_use]
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    #[must_use]
    pub fn column_at(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Like [`column`](Self::column), but a missing column is an error.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::MissingColumn`] when no column is called `name`.
    pub fn require(&self, name: &str) -> Result<&Column, IoError> {
        self.column(name).ok_or_else(|| IoError::MissingColumn {
            name: name.to_string(),
        })
    }

    /// New table holding the named columns in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::MissingColumn`] for an unknown name and
    /// [`IoError::DuplicateColumn`] if a name is requested twice.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Table, IoError> {
        let columns = names
            .iter()
            .map(|n| self.require(n.as_ref()).cloned())
            .collect::<Result<Vec<_>, _>>()?;
        let mut table = Table::new(columns)?;
        table.n_rows = self.n_rows;
        Ok(table)
    }

    /// New table keeping the columns whose mask entry is `true`.
    ///
    /// `mask` is aligned with [`columns`](Self::columns).
    ///
    /// # Errors
    ///
    /// Returns [`IoError::MaskLength`] unless `mask` has one entry per column.
    pub fn retain_columns(&self, mask: &[bool]) -> Result<Table, IoError> {
        if mask.len() != self.columns.len() {
            return Err(IoError::MaskLength {
                expected: self.columns.len(),
                got: mask.len(),
            });
        }
        let columns = self
            .columns
            .iter()
            .zip(mask)
            .filter(|(_, keep)| **keep)
            .map(|(c, _)| c.clone())
            .collect();
        Ok(Table {
            columns,
            n_rows: self.n_rows,
        })
    }

    /// New table with the given rows, in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::RowOutOfRange`] for an index `>= n_rows`.
    pub fn take_rows(&self, rows: &[usize]) -> Result<Table, IoError> {
        if let Some(&row) = rows.iter().find(|&&r| r >= self.n_rows) {
            return Err(IoError::RowOutOfRange {
                row,
                n_rows: self.n_rows,
            });
        }
        Ok(Table {
            columns: self.columns.iter().map(|c| c.take(rows)).collect(),
            n_rows: rows.len(),
        })
    }
}
