use std::sync::Arc;

use crate::error::{DbalError, Result};

/// Driver-agnostic raw result from a database query.
/// All values are converted to strings by the driver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawQueryResult {
    /// Column names in order
    pub columns: Vec<String>,
    /// Rows, where each row is a vector of optional string values in column order
    pub rows: Vec<Vec<Option<String>>>,
    /// Rows touched by a statement that returns no result set
    pub affected_rows: u64,
}

impl RawQueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self {
            columns,
            rows,
            affected_rows: 0,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// A result with no result set, only an affected row count.
    pub fn affected(rows: u64) -> Self {
        Self {
            affected_rows: rows,
            ..Self::default()
        }
    }

    /// Row count as reported to callers: affected rows for statements without
    /// a result set, otherwise the number of rows returned.
    pub fn row_count(&self) -> u64 {
        if self.columns.is_empty() {
            self.affected_rows
        } else {
            self.rows.len() as u64
        }
    }
}

/// A single row result from a query.
/// Values are kept in column order and can be read by name or position.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Option<String>>,
}

impl Row {
    /// Creates a new Row from column names and values.
    pub(crate) fn new(columns: Arc<[String]>, values: Vec<Option<String>>) -> Self {
        Self { columns, values }
    }

    /// Gets a value by column name. SQL NULL is returned as `None`.
    pub fn get(&self, column: &str) -> Result<Option<&str>> {
        let index = self
            .columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| DbalError::ColumnNotFound(column.to_string()))?;
        self.values
            .get(index)
            .map(Option::as_deref)
            .ok_or_else(|| DbalError::ColumnNotFound(column.to_string()))
    }

    /// Gets a value by zero-based column position.
    pub fn get_index(&self, index: usize) -> Result<Option<&str>> {
        self.values
            .get(index)
            .map(|v| v.as_deref())
            .ok_or_else(|| DbalError::ColumnNotFound(format!("#{index}")))
    }

    /// Returns all column names in this row.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the values in column order.
    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }

    /// Returns the number of columns in this row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if this row has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Result of a query execution, containing zero or more rows.
#[derive(Debug)]
pub struct QueryResult {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl QueryResult {
    /// Creates a QueryResult from a RawQueryResult.
    pub fn from_raw(raw: RawQueryResult) -> Self {
        let shared: Arc<[String]> = raw.columns.clone().into();
        let rows = raw
            .rows
            .into_iter()
            .map(|values| Row::new(Arc::clone(&shared), values))
            .collect();
        Self {
            columns: raw.columns,
            rows,
        }
    }

    pub(crate) fn from_rows(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Extracts a single row from the result.
    /// Returns an error if the result contains zero or more than one row.
    pub fn single_row(self) -> Result<Row> {
        let actual = self.rows.len();
        match <[Row; 1]>::try_from(self.rows) {
            Ok([row]) => Ok(row),
            Err(_) => Err(DbalError::UnexpectedRowCount {
                expected: 1,
                actual,
            }),
        }
    }

    /// Returns all rows from the result.
    pub fn rows(self) -> Vec<Row> {
        self.rows
    }

    /// Returns a reference to the rows without consuming the result.
    pub fn rows_ref(&self) -> &[Row] {
        &self.rows
    }

    /// Returns the column names from this result.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the number of rows in this result.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if this result contains no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
