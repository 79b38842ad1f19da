//! Self-contained result sets.
//!
//! A [`ResultSet`] owns a private copy of everything one command returned:
//! column metadata shared across rows behind an `Arc`, and one [`Row`] per
//! tuple. It keeps no reference to the connection or transaction that produced
//! it and stays valid after either is gone.

use std::ops::{Deref, Index};
use std::sync::Arc;

use crate::driver::RawResult;
use crate::error::SessionError;
use crate::value::{CellValue, FromCell};

/// Metadata for one result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Column name as reported by the backend.
    pub name: String,
    /// Backend type identifier (PostgreSQL type OID; 0 when unknown).
    pub type_oid: u32,
}

/// A single row, sharing column metadata with its result set.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Arc<Vec<Column>>,
    values: Vec<CellValue>,
}

impl Row {
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn values(&self) -> &[CellValue] {
        &self.values
    }

    /// Index of a column by name.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|col| col.name == name)
    }

    /// Field accessor for the cell at `column`.
    ///
    /// # Errors
    /// `RangeError` if `column` is out of bounds.
    pub fn get(&self, column: usize) -> Result<Field<'_>, SessionError> {
        match (self.values.get(column), self.columns.get(column)) {
            (Some(value), Some(meta)) => Ok(Field { value, column: meta }),
            _ => Err(SessionError::RangeError(format!(
                "column index {column} out of range (0..{})",
                self.columns.len()
            ))),
        }
    }

    /// Field accessor for the cell in the column named `name`.
    ///
    /// # Errors
    /// `ColumnNotFound` if no column has that name.
    pub fn get_named(&self, name: &str) -> Result<Field<'_>, SessionError> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| SessionError::ColumnNotFound(name.to_string()))?;
        self.get(idx)
    }
}

/// Immutable tabular view over the rows one command returned.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    columns: Arc<Vec<Column>>,
    rows: Vec<Row>,
}

impl ResultSet {
    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Index of a column by name.
    ///
    /// # Errors
    /// `ColumnNotFound` if no column has that name.
    pub fn column_number(&self, name: &str) -> Result<usize, SessionError> {
        self.columns
            .iter()
            .position(|col| col.name == name)
            .ok_or_else(|| SessionError::ColumnNotFound(name.to_string()))
    }

    /// Row accessor; out-of-range indices fail, never clamp.
    ///
    /// # Errors
    /// `RangeError` if `row` is out of bounds.
    pub fn row(&self, row: usize) -> Result<&Row, SessionError> {
        self.rows.get(row).ok_or_else(|| {
            SessionError::RangeError(format!(
                "row index {row} out of range (0..{})",
                self.rows.len()
            ))
        })
    }

    /// Field accessor for the cell at (`row`, `column`).
    ///
    /// # Errors
    /// `RangeError` if either index is out of bounds.
    pub fn field(&self, row: usize, column: usize) -> Result<Field<'_>, SessionError> {
        self.row(row)?.get(column)
    }

    /// Lazy, double-ended, restartable iteration over row cursors.
    #[must_use]
    pub fn iter(&self) -> Rows<'_> {
        Rows {
            result: self,
            front: 0,
            back: self.rows.len(),
        }
    }
}

impl From<RawResult> for ResultSet {
    fn from(raw: RawResult) -> Self {
        let columns = Arc::new(raw.columns);
        let rows = raw
            .rows
            .into_iter()
            .map(|values| Row {
                columns: Arc::clone(&columns),
                values,
            })
            .collect();
        Self { columns, rows }
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = RowRef<'a>;
    type IntoIter = Rows<'a>;

    fn into_iter(self) -> Rows<'a> {
        self.iter()
    }
}

/// Iterator over the row cursors of a [`ResultSet`].
#[derive(Debug, Clone)]
pub struct Rows<'a> {
    result: &'a ResultSet,
    front: usize,
    back: usize,
}

impl<'a> Iterator for Rows<'a> {
    type Item = RowRef<'a>;

    fn next(&mut self) -> Option<RowRef<'a>> {
        if self.front < self.back {
            let index = self.front;
            self.front += 1;
            Some(RowRef {
                result: self.result,
                index,
            })
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl DoubleEndedIterator for Rows<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front < self.back {
            self.back -= 1;
            Some(RowRef {
                result: self.result,
                index: self.back,
            })
        } else {
            None
        }
    }
}

impl ExactSizeIterator for Rows<'_> {}

/// A cursor naming one row of a result set; knows its own row number.
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    result: &'a ResultSet,
    index: usize,
}

impl<'a> RowRef<'a> {
    /// This cursor's row index within the result set.
    #[must_use]
    pub fn num(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn row(&self) -> &'a Row {
        // The cursor is only built from in-range indices.
        &self.result.rows[self.index]
    }

    /// Checked field access on this row.
    ///
    /// # Errors
    /// `RangeError` if `column` is out of bounds.
    pub fn field(&self, column: usize) -> Result<Field<'a>, SessionError> {
        self.row().get(column)
    }
}

impl Deref for RowRef<'_> {
    type Target = Row;

    fn deref(&self) -> &Row {
        self.row()
    }
}

impl Index<usize> for RowRef<'_> {
    type Output = CellValue;

    fn index(&self, column: usize) -> &CellValue {
        &self.row().values[column]
    }
}

/// Transient accessor for one cell; decodes on demand.
#[derive(Debug, Clone, Copy)]
pub struct Field<'a> {
    value: &'a CellValue,
    column: &'a Column,
}

impl Field<'_> {
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    #[must_use]
    pub fn value(&self) -> &CellValue {
        self.value
    }

    #[must_use]
    pub fn column(&self) -> &Column {
        self.column
    }

    /// Decode this cell as `T`.
    ///
    /// # Errors
    /// `ConversionError` when the stored representation cannot be read as `T`
    /// (including NULL into a non-optional target).
    pub fn to<T: FromCell>(&self) -> Result<T, SessionError> {
        T::from_cell(self.value).map_err(|e| match e {
            SessionError::ConversionError(msg) => SessionError::ConversionError(format!(
                "column {:?}: {msg}",
                self.column.name
            )),
            other => other,
        })
    }

    /// Decode this cell as `T`, substituting `default` when the cell is NULL.
    ///
    /// # Errors
    /// `ConversionError` when a non-NULL cell cannot be read as `T`.
    pub fn to_or<T: FromCell>(&self, default: T) -> Result<T, SessionError> {
        if self.value.is_null() {
            Ok(default)
        } else {
            self.to()
        }
    }
}
