use std::collections::VecDeque;
use std::sync::Arc;

use crate::error::{DbalError, ErrorInfo, Result};
use crate::traits::NativeStatement;
use crate::types::{FetchMode, QueryResult, RawQueryResult, Row, SqlValue, StatementClass};

/// A value produced by [`Statement::fetch`], shaped by the statement's fetch mode.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    Assoc(Row),
    Numeric(Vec<Option<String>>),
    Column(Option<String>),
}

/// Statement produced by a [`crate::DecoratedConnection`].
///
/// Owned by the caller; the connection that produced it keeps no reference to it.
pub struct Statement {
    inner: Box<dyn NativeStatement>,
    fetch_mode: FetchMode,
    columns: Arc<[String]>,
    pending: VecDeque<Vec<Option<String>>>,
    row_count: u64,
}

impl Statement {
    pub(crate) fn from_native(inner: Box<dyn NativeStatement>) -> Result<Self> {
        let expected = StatementClass::of::<Statement>();
        if inner.class() != expected {
            return Err(DbalError::Configuration(format!(
                "statement built as {}, expected {}",
                inner.class(),
                expected
            )));
        }
        Ok(Self {
            inner,
            fetch_mode: FetchMode::default(),
            columns: Arc::from(Vec::new()),
            pending: VecDeque::new(),
            row_count: 0,
        })
    }

    /// Wraps a statement the native handle has already executed.
    pub(crate) fn from_executed(inner: Box<dyn NativeStatement>, mode: FetchMode) -> Result<Self> {
        let mut statement = Self::from_native(inner)?;
        statement.fetch_mode = mode;
        statement.buffer();
        Ok(statement)
    }

    pub fn class(&self) -> StatementClass {
        self.inner.class()
    }

    pub fn sql(&self) -> &str {
        self.inner.sql()
    }

    /// Execute with positional parameters, replacing any unread rows.
    pub async fn execute(&mut self, params: &[SqlValue]) -> Result<()> {
        tracing::trace!(sql = self.inner.sql(), params = params.len(), "execute");
        if !self.inner.execute(params).await? {
            let info = self
                .inner
                .error_info()
                .unwrap_or_else(|| ErrorInfo::general("statement execution failed"));
            return Err(DbalError::QueryFailed(info));
        }
        self.buffer();
        Ok(())
    }

    fn buffer(&mut self) {
        let RawQueryResult { columns, rows, .. } = self.inner.take_result();
        self.row_count = self.inner.row_count();
        self.columns = columns.into();
        self.pending = rows.into();
    }

    pub fn fetch_mode(&self) -> FetchMode {
        self.fetch_mode
    }

    pub fn set_fetch_mode(&mut self, mode: FetchMode) {
        self.fetch_mode = mode;
    }

    /// Fetches the next row in the current fetch mode.
    pub fn fetch(&mut self) -> Result<Option<Fetched>> {
        if let FetchMode::Column(index) = self.fetch_mode {
            if index >= self.columns.len() && !self.pending.is_empty() {
                return Err(DbalError::ColumnNotFound(format!("#{index}")));
            }
        }
        let Some(values) = self.pending.pop_front() else {
            return Ok(None);
        };
        let fetched = match self.fetch_mode {
            FetchMode::Assoc => Fetched::Assoc(Row::new(Arc::clone(&self.columns), values)),
            FetchMode::Numeric => Fetched::Numeric(values),
            FetchMode::Column(index) => Fetched::Column(values.into_iter().nth(index).flatten()),
        };
        Ok(Some(fetched))
    }

    /// Fetches the next row regardless of the fetch mode.
    pub fn fetch_row(&mut self) -> Option<Row> {
        self.pending
            .pop_front()
            .map(|values| Row::new(Arc::clone(&self.columns), values))
    }

    /// Fetches all remaining rows in the current fetch mode.
    pub fn fetch_all(&mut self) -> Result<Vec<Fetched>> {
        let mut all = Vec::with_capacity(self.pending.len());
        while let Some(fetched) = self.fetch()? {
            all.push(fetched);
        }
        Ok(all)
    }

    /// Consumes the statement, collecting the remaining rows.
    pub fn into_result(mut self) -> QueryResult {
        let mut rows = Vec::with_capacity(self.pending.len());
        while let Some(row) = self.fetch_row() {
            rows.push(row);
        }
        QueryResult::from_rows(self.columns.to_vec(), rows)
    }

    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn error_code(&self) -> Option<String> {
        self.inner.error_info().map(|info| info.sqlstate)
    }

    pub fn error_info(&self) -> Option<ErrorInfo> {
        self.inner.error_info()
    }
}

impl std::fmt::Debug for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Statement")
            .field("sql", &self.inner.sql())
            .field("class", &self.inner.class())
            .field("fetch_mode", &self.fetch_mode)
            .field("pending", &self.pending.len())
            .finish()
    }
}
