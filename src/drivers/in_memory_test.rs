use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{DbalError, ErrorInfo, Result};
use crate::traits::{
    settle, transaction_open_after, HandleSnapshot, NativeHandle, NativeStatement,
};
use crate::types::{
    quote_literal, ErrorMode, ParameterType, RawQueryResult, SqlValue, StatementClass,
};

const DRIVER_NAME: &str = "in-memory";

/// A recorded query execution for verification.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedQuery {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Where a scripted failure is raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Prepare,
    Execute,
}

#[derive(Debug, Clone)]
struct Failure {
    fragment: String,
    stage: FailureStage,
    info: ErrorInfo,
}

#[derive(Debug, Default)]
struct State {
    responses: VecDeque<RawQueryResult>,
    default_response: RawQueryResult,
    recorded_queries: Vec<RecordedQuery>,
    failures: Vec<Failure>,
    sequences: HashMap<String, String>,
    last_insert_id: Option<String>,
    in_transaction: bool,
    last_error: Option<ErrorInfo>,
    attributes: BTreeMap<String, String>,
}

impl State {
    fn failure_for(&self, sql: &str, stage: FailureStage) -> Option<ErrorInfo> {
        if stage == FailureStage::Prepare && sql.trim().is_empty() {
            return Some(ErrorInfo::new("42601", "syntax error: empty query"));
        }
        self.failures
            .iter()
            .find(|f| f.stage == stage && sql.contains(&f.fragment))
            .map(|f| f.info.clone())
    }

    fn next_response(&mut self) -> RawQueryResult {
        self.responses
            .pop_front()
            .unwrap_or_else(|| self.default_response.clone())
    }

    fn record(&mut self, sql: &str, params: &[SqlValue]) {
        self.recorded_queries.push(RecordedQuery {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
    }
}

/// An in-memory native handle for testing.
///
/// Starts in [`ErrorMode::Silent`] like a raw driver handle. Responses are
/// scripted up front, failures are triggered by SQL fragments, and every
/// executed statement is recorded for verification.
///
/// # Example
/// ```
/// use dbal::drivers::{InMemoryTestHandle, InMemoryTestResponseBuilder};
/// use dbal::DecoratedConnection;
///
/// let handle = InMemoryTestHandle::new().with_response(
///     InMemoryTestResponseBuilder::new()
///         .columns(&["id", "name"])
///         .row(&["1", "Alice"])
///         .build(),
/// );
/// let connection = DecoratedConnection::new(handle).unwrap();
/// ```
pub struct InMemoryTestHandle {
    state: Arc<Mutex<State>>,
    error_mode: ErrorMode,
    statement_class: StatementClass,
    server_version: String,
    serializable: bool,
    locked_attributes: bool,
}

impl InMemoryTestHandle {
    /// Create a new in-memory handle with no pre-configured responses.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            error_mode: ErrorMode::Silent,
            statement_class: StatementClass::NATIVE,
            server_version: "16.2".to_string(),
            serializable: false,
            locked_attributes: false,
        }
    }

    /// Add a response to be returned by the next executed statement.
    /// Responses are returned in FIFO order.
    pub fn with_response(self, response: RawQueryResult) -> Self {
        self.state.lock().unwrap().responses.push_back(response);
        self
    }

    /// Add multiple responses to be returned by subsequent statements.
    pub fn with_responses(self, responses: impl IntoIterator<Item = RawQueryResult>) -> Self {
        self.state.lock().unwrap().responses.extend(responses);
        self
    }

    /// Set a default response to use when no queued responses remain.
    pub fn with_default_response(self, response: RawQueryResult) -> Self {
        self.state.lock().unwrap().default_response = response;
        self
    }

    /// Fail any statement whose SQL contains `fragment` at the given stage.
    /// Execute-stage failures also apply to `BEGIN`, `COMMIT` and `ROLLBACK`.
    pub fn with_failure(self, fragment: &str, stage: FailureStage, info: ErrorInfo) -> Self {
        self.state.lock().unwrap().failures.push(Failure {
            fragment: fragment.to_string(),
            stage,
            info,
        });
        self
    }

    pub fn with_server_version(mut self, version: &str) -> Self {
        self.server_version = version.to_string();
        self
    }

    pub fn with_sequence(self, name: &str, value: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .sequences
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_last_insert_id(self, id: &str) -> Self {
        self.state.lock().unwrap().last_insert_id = Some(id.to_string());
        self
    }

    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Allow the handle to be suspended and resumed.
    pub fn serializable(mut self) -> Self {
        self.serializable = true;
        self
    }

    /// Make the handle ignore error mode and statement class changes.
    pub fn with_locked_attributes(mut self) -> Self {
        self.locked_attributes = true;
        self
    }

    /// Driver specific attribute lookup.
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.state.lock().unwrap().attributes.get(name).cloned()
    }

    /// Sets a driver specific attribute, returning the previous value.
    pub fn set_attribute(&self, name: &str, value: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .attributes
            .insert(name.to_string(), value.to_string())
    }

    pub fn in_transaction(&self) -> bool {
        self.state.lock().unwrap().in_transaction
    }

    /// Get all recorded queries that have been executed.
    pub fn recorded_queries(&self) -> Vec<RecordedQuery> {
        self.state.lock().unwrap().recorded_queries.clone()
    }

    /// Get the last recorded query, if any.
    pub fn last_query(&self) -> Option<RecordedQuery> {
        self.state.lock().unwrap().recorded_queries.last().cloned()
    }

    /// Clear all recorded queries.
    pub fn clear_recorded_queries(&self) {
        self.state.lock().unwrap().recorded_queries.clear();
    }

    /// Assert that the last query matches the expected SQL and parameters.
    pub fn assert_last_query(&self, expected_sql: &str, expected_params: &[SqlValue]) {
        let last = self.last_query().expect("No queries were recorded");
        assert_eq!(
            last.sql, expected_sql,
            "SQL mismatch.\nExpected: {}\nActual: {}",
            expected_sql, last.sql
        );
        assert_eq!(
            last.params, expected_params,
            "Parameters mismatch.\nExpected: {:?}\nActual: {:?}",
            expected_params, last.params
        );
    }

    /// Assert that exactly n queries were executed.
    pub fn assert_query_count(&self, expected: usize) {
        let actual = self.state.lock().unwrap().recorded_queries.len();
        assert_eq!(
            actual, expected,
            "Query count mismatch. Expected: {}, Actual: {}",
            expected, actual
        );
    }

    /// Records `info` as the last error and reports it per the error mode.
    fn fail<T>(&self, info: ErrorInfo, fallback: T) -> Result<T> {
        self.state.lock().unwrap().last_error = Some(info.clone());
        settle(self.error_mode, DbalError::QueryFailed(info), fallback)
    }

    fn protocol_violation(&self, info: ErrorInfo) -> Result<bool> {
        self.state.lock().unwrap().last_error = Some(info.clone());
        settle(self.error_mode, DbalError::Transaction(info), false)
    }

    fn transition(&self, sql: &str, open: bool) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        if state.in_transaction == open {
            let info = if open {
                ErrorInfo::new("25001", "there is already an active transaction")
            } else {
                ErrorInfo::new("25P01", "there is no active transaction")
            };
            drop(state);
            return self.protocol_violation(info);
        }
        let failure = state.failure_for(sql, FailureStage::Execute);
        state.in_transaction = transaction_open_after(open, failure.is_none(), state.in_transaction);
        match failure {
            Some(info) => {
                drop(state);
                self.fail(info, false)
            }
            None => {
                state.record(sql, &[]);
                state.last_error = None;
                Ok(true)
            }
        }
    }
}

impl Default for InMemoryTestHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NativeHandle for InMemoryTestHandle {
    fn error_mode(&self) -> ErrorMode {
        self.error_mode
    }

    fn set_error_mode(&mut self, mode: ErrorMode) -> Result<()> {
        if !self.locked_attributes {
            self.error_mode = mode;
        }
        Ok(())
    }

    fn statement_class(&self) -> StatementClass {
        self.statement_class
    }

    fn set_statement_class(&mut self, class: StatementClass) -> Result<()> {
        if !self.locked_attributes {
            self.statement_class = class;
        }
        Ok(())
    }

    fn server_version(&self) -> String {
        self.server_version.clone()
    }

    async fn prepare(&self, sql: &str) -> Result<Option<Box<dyn NativeStatement>>> {
        let failure = self
            .state
            .lock()
            .unwrap()
            .failure_for(sql, FailureStage::Prepare);
        if let Some(info) = failure {
            return self.fail(info, None);
        }
        Ok(Some(Box::new(InMemoryStatement {
            state: Arc::clone(&self.state),
            sql: sql.to_string(),
            class: self.statement_class,
            error_mode: self.error_mode,
            result: RawQueryResult::empty(),
            row_count: 0,
            error: None,
        })))
    }

    fn quote(&self, value: &SqlValue, ty: ParameterType) -> Result<Option<String>> {
        match quote_literal(value, ty) {
            Ok(literal) => Ok(Some(literal)),
            Err(err) => {
                self.state.lock().unwrap().last_error =
                    Some(ErrorInfo::new("IM001", err.to_string()));
                settle(self.error_mode, err, None)
            }
        }
    }

    async fn exec(&self, sql: &str) -> Result<Option<u64>> {
        let mut state = self.state.lock().unwrap();
        let failure = state
            .failure_for(sql, FailureStage::Prepare)
            .or_else(|| state.failure_for(sql, FailureStage::Execute));
        state.record(sql, &[]);
        if let Some(info) = failure {
            drop(state);
            return self.fail(info, None);
        }
        state.last_error = None;
        Ok(Some(state.next_response().affected_rows))
    }

    async fn last_insert_id(&self, name: Option<&str>) -> Result<Option<String>> {
        let state = self.state.lock().unwrap();
        let found = match name {
            Some(name) => state.sequences.get(name).cloned().ok_or_else(|| {
                ErrorInfo::new("55000", format!("currval of sequence \"{name}\" is not yet defined"))
            }),
            None => state.last_insert_id.clone().ok_or_else(|| {
                ErrorInfo::new("IM001", "driver cannot report a last insert id without a sequence name")
            }),
        };
        drop(state);
        match found {
            Ok(id) => Ok(Some(id)),
            Err(info) if name.is_none() => {
                self.state.lock().unwrap().last_error = Some(info.clone());
                settle(self.error_mode, DbalError::Unsupported(info.message), None)
            }
            Err(info) => self.fail(info, None),
        }
    }

    async fn begin_transaction(&self) -> Result<bool> {
        self.transition("BEGIN", true)
    }

    async fn commit(&self) -> Result<bool> {
        self.transition("COMMIT", false)
    }

    async fn roll_back(&self) -> Result<bool> {
        self.transition("ROLLBACK", false)
    }

    fn error_info(&self) -> Option<ErrorInfo> {
        self.state.lock().unwrap().last_error.clone()
    }

    fn suspend(&self) -> Result<HandleSnapshot> {
        if !self.serializable {
            return Err(DbalError::NotSerializable(DRIVER_NAME.to_string()));
        }
        let mut attributes = self.state.lock().unwrap().attributes.clone();
        attributes.insert("server_version".to_string(), self.server_version.clone());
        Ok(HandleSnapshot {
            driver: DRIVER_NAME.to_string(),
            attributes,
        })
    }

    fn resume(mut snapshot: HandleSnapshot) -> Result<Self> {
        if snapshot.driver != DRIVER_NAME {
            return Err(DbalError::NotSerializable(format!(
                "snapshot of {} cannot resume as {}",
                snapshot.driver, DRIVER_NAME
            )));
        }
        let mut handle = Self::new().serializable();
        if let Some(version) = snapshot.attributes.remove("server_version") {
            handle.server_version = version;
        }
        handle.state.lock().unwrap().attributes = snapshot.attributes;
        Ok(handle)
    }
}

struct InMemoryStatement {
    state: Arc<Mutex<State>>,
    sql: String,
    class: StatementClass,
    error_mode: ErrorMode,
    result: RawQueryResult,
    row_count: u64,
    error: Option<ErrorInfo>,
}

#[async_trait]
impl NativeStatement for InMemoryStatement {
    fn class(&self) -> StatementClass {
        self.class
    }

    fn sql(&self) -> &str {
        &self.sql
    }

    async fn execute(&mut self, params: &[SqlValue]) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        state.record(&self.sql, params);
        if let Some(info) = state.failure_for(&self.sql, FailureStage::Execute) {
            state.last_error = Some(info.clone());
            self.error = Some(info.clone());
            return settle(self.error_mode, DbalError::QueryFailed(info), false);
        }
        state.last_error = None;
        self.error = None;
        self.result = state.next_response();
        self.row_count = self.result.row_count();
        Ok(true)
    }

    fn take_result(&mut self) -> RawQueryResult {
        std::mem::take(&mut self.result)
    }

    fn row_count(&self) -> u64 {
        self.row_count
    }

    fn error_info(&self) -> Option<ErrorInfo> {
        self.error.clone()
    }
}

/// Builder for creating test responses easily.
pub struct InMemoryTestResponseBuilder {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
    affected_rows: u64,
}

impl InMemoryTestResponseBuilder {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            affected_rows: 0,
        }
    }

    /// Set the column names for the response.
    pub fn columns(mut self, cols: &[&str]) -> Self {
        self.columns = cols.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Add a row of string values.
    pub fn row(mut self, values: &[&str]) -> Self {
        self.rows
            .push(values.iter().map(|s| Some(s.to_string())).collect());
        self
    }

    /// Add a row where `None` stands for SQL NULL.
    pub fn nullable_row(mut self, values: &[Option<&str>]) -> Self {
        self.rows
            .push(values.iter().map(|v| v.map(str::to_string)).collect());
        self
    }

    /// Set the affected row count reported for statements without a result set.
    pub fn affected_rows(mut self, rows: u64) -> Self {
        self.affected_rows = rows;
        self
    }

    /// Build the RawQueryResult.
    pub fn build(self) -> RawQueryResult {
        RawQueryResult {
            columns: self.columns,
            rows: self.rows,
            affected_rows: self.affected_rows,
        }
    }
}

impl Default for InMemoryTestResponseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_silent_mode_reports_failure_by_return_value() {
        let handle = InMemoryTestHandle::new().with_failure(
            "INSERT",
            FailureStage::Execute,
            ErrorInfo::new("23505", "duplicate key"),
        );

        let affected = handle.exec("INSERT INTO t VALUES (1)").await.unwrap();
        assert_eq!(affected, None);
        assert_eq!(handle.error_code().as_deref(), Some("23505"));
    }

    #[tokio::test]
    async fn test_raise_mode_returns_errors() {
        let handle = InMemoryTestHandle::new()
            .with_error_mode(ErrorMode::Raise)
            .with_failure("SELEC ", FailureStage::Prepare, ErrorInfo::new("42601", "syntax"));

        let err = handle.prepare("SELEC 1").await.err().unwrap();
        assert!(matches!(err, DbalError::QueryFailed(_)));
    }

    #[tokio::test]
    async fn test_successful_call_clears_last_error() {
        let handle = InMemoryTestHandle::new().with_failure(
            "bad",
            FailureStage::Execute,
            ErrorInfo::general("bad"),
        );
        handle.exec("bad").await.unwrap();
        assert!(handle.error_info().is_some());
        handle.exec("good").await.unwrap();
        assert!(handle.error_info().is_none());
    }

    #[tokio::test]
    async fn test_transaction_slot() {
        let handle = InMemoryTestHandle::new();
        assert!(handle.begin_transaction().await.unwrap());
        assert!(!handle.begin_transaction().await.unwrap());
        assert_eq!(handle.error_code().as_deref(), Some("25001"));
        assert!(handle.commit().await.unwrap());
        assert!(!handle.roll_back().await.unwrap());
        assert_eq!(handle.error_code().as_deref(), Some("25P01"));
    }

    #[test]
    fn test_locked_attributes_ignore_overrides() {
        let mut handle = InMemoryTestHandle::new().with_locked_attributes();
        handle.set_error_mode(ErrorMode::Raise).unwrap();
        assert_eq!(handle.error_mode(), ErrorMode::Silent);
    }

    #[test]
    fn test_suspend_refused_unless_serializable() {
        assert!(matches!(
            InMemoryTestHandle::new().suspend(),
            Err(DbalError::NotSerializable(_))
        ));

        let handle = InMemoryTestHandle::new()
            .serializable()
            .with_server_version("15.4");
        handle.set_attribute("application_name", "reports");
        let snapshot = handle.suspend().unwrap();
        let resumed = InMemoryTestHandle::resume(snapshot).unwrap();
        assert_eq!(resumed.server_version(), "15.4");
        assert_eq!(resumed.attribute("application_name").as_deref(), Some("reports"));
    }
}
