use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{DbalError, ErrorInfo, Result};
use crate::types::{ErrorMode, ParameterType, RawQueryResult, SqlValue, StatementClass};

/// Statement object produced by a native handle.
#[async_trait]
pub trait NativeStatement: Send + Sync {
    /// The statement class the handle was configured with when this statement was built.
    fn class(&self) -> StatementClass;

    fn sql(&self) -> &str;

    /// Execute with positional parameters.
    /// Returns `false` on failure when the owning handle is not in raise mode.
    async fn execute(&mut self, params: &[SqlValue]) -> Result<bool>;

    /// Takes the buffered result of the last execution.
    fn take_result(&mut self) -> RawQueryResult;

    /// Rows affected or returned by the last execution.
    fn row_count(&self) -> u64;

    fn error_info(&self) -> Option<ErrorInfo>;
}

/// Trait for native database handle implementations.
///
/// A handle reports failures according to its [`ErrorMode`]: in raise mode
/// every failure is an `Err`, otherwise the call returns `None` / `false` and
/// the failure is only visible through [`NativeHandle::error_info`].
#[async_trait]
pub trait NativeHandle: Send + Sync {
    fn error_mode(&self) -> ErrorMode;

    fn set_error_mode(&mut self, mode: ErrorMode) -> Result<()>;

    fn statement_class(&self) -> StatementClass;

    fn set_statement_class(&mut self, class: StatementClass) -> Result<()>;

    /// Server version as reported when the connection was established.
    fn server_version(&self) -> String;

    async fn prepare(&self, sql: &str) -> Result<Option<Box<dyn NativeStatement>>>;

    /// Prepare and execute `sql` in one step.
    async fn query(&self, sql: &str) -> Result<Option<Box<dyn NativeStatement>>> {
        let Some(mut statement) = self.prepare(sql).await? else {
            return Ok(None);
        };
        if !statement.execute(&[]).await? {
            return Ok(None);
        }
        Ok(Some(statement))
    }

    fn quote(&self, value: &SqlValue, ty: ParameterType) -> Result<Option<String>>;

    /// Execute a statement without a result set and return the affected row count.
    async fn exec(&self, sql: &str) -> Result<Option<u64>>;

    async fn last_insert_id(&self, name: Option<&str>) -> Result<Option<String>>;

    async fn begin_transaction(&self) -> Result<bool>;

    async fn commit(&self) -> Result<bool>;

    async fn roll_back(&self) -> Result<bool>;

    /// SQLSTATE of the last failed operation, if any.
    fn error_code(&self) -> Option<String> {
        self.error_info().map(|info| info.sqlstate)
    }

    fn error_info(&self) -> Option<ErrorInfo>;

    /// Captures the state needed to reopen this handle elsewhere.
    /// Handles bound to a live session refuse.
    fn suspend(&self) -> Result<HandleSnapshot> {
        Err(DbalError::NotSerializable(
            std::any::type_name::<Self>().to_string(),
        ))
    }

    /// Reopens a handle from a snapshot taken by [`NativeHandle::suspend`].
    fn resume(_snapshot: HandleSnapshot) -> Result<Self>
    where
        Self: Sized,
    {
        Err(DbalError::NotSerializable(
            std::any::type_name::<Self>().to_string(),
        ))
    }
}

/// Serializable state of a suspended native handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandleSnapshot {
    pub driver: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// Reports a failed native call according to `mode`.
///
/// Raise mode returns the error; the other modes return `fallback`, which is
/// the `None` / `false` value a raw handle hands back on failure.
pub fn settle<T>(mode: ErrorMode, err: DbalError, fallback: T) -> Result<T> {
    match mode {
        ErrorMode::Raise => Err(err),
        ErrorMode::Warning => {
            tracing::warn!(error = %err, "database operation failed");
            Ok(fallback)
        }
        ErrorMode::Silent => Ok(fallback),
    }
}

/// Whether a transaction is open after sending BEGIN (`open`) or
/// COMMIT/ROLLBACK (`!open`).
///
/// PostgreSQL ends the transaction even when COMMIT or ROLLBACK fails.
pub(crate) fn transaction_open_after(open: bool, succeeded: bool, was_open: bool) -> bool {
    if succeeded || !open {
        open
    } else {
        was_open
    }
}
