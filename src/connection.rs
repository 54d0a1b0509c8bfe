use std::ops::Deref;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{DbalError, ErrorInfo, Result};
use crate::statement::Statement;
use crate::traits::{HandleSnapshot, NativeHandle};
use crate::types::{ErrorMode, FetchMode, ParameterType, SqlValue, StatementClass};

/// Uniform database connection interface.
///
/// Every failing operation returns an error; none of them signal failure
/// through a `false` or zero return value.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Prepares a statement for execution.
    async fn prepare(&self, sql: &str) -> Result<Statement>;

    /// Executes `sql` and returns the statement positioned at its first row.
    async fn query(&self, sql: &str) -> Result<Statement> {
        self.query_with_mode(sql, FetchMode::default()).await
    }

    async fn query_with_mode(&self, sql: &str, mode: FetchMode) -> Result<Statement>;

    /// Quotes a value for inlining into SQL where binding is unavailable.
    fn quote(&self, value: &SqlValue, ty: ParameterType) -> Result<String>;

    /// Executes a statement without a result set and returns the affected row count.
    async fn exec(&self, sql: &str) -> Result<u64>;

    /// Returns the ID of the last inserted row or sequence value.
    async fn last_insert_id(&self, name: Option<&str>) -> Result<String>;

    async fn begin_transaction(&self) -> Result<bool>;

    async fn commit(&self) -> Result<bool>;

    async fn roll_back(&self) -> Result<bool>;

    fn error_code(&self) -> Option<String>;

    fn error_info(&self) -> Option<ErrorInfo>;
}

/// A connection able to report the server version.
pub trait ServerInfoAwareConnection: Connection {
    fn server_version(&self) -> String;

    /// Whether `server_version` has to run a query to answer.
    fn requires_query_for_server_version(&self) -> bool;
}

/// Connection over an exclusively owned native handle.
///
/// Construction switches the handle to [`ErrorMode::Raise`] and makes it build
/// statements for [`Statement`]. The handle is never handed out mutably, so
/// neither setting can be reverted. Native capabilities outside
/// [`Connection`] are reachable through `Deref` or [`DecoratedConnection::native`].
pub struct DecoratedConnection<H: NativeHandle> {
    native: H,
}

impl<H: NativeHandle> DecoratedConnection<H> {
    pub fn new(mut native: H) -> Result<Self> {
        let class = StatementClass::of::<Statement>();
        native.set_statement_class(class)?;
        native.set_error_mode(ErrorMode::Raise)?;

        if native.statement_class() != class {
            return Err(DbalError::Configuration(format!(
                "handle kept statement class {} after override to {}",
                native.statement_class(),
                class
            )));
        }
        if native.error_mode() != ErrorMode::Raise {
            return Err(DbalError::Configuration(format!(
                "handle kept error mode {:?} after override to Raise",
                native.error_mode()
            )));
        }

        tracing::debug!(
            handle = std::any::type_name::<H>(),
            server_version = %native.server_version(),
            "decorated native handle"
        );
        Ok(Self { native })
    }

    /// The wrapped handle, for capabilities the decorator does not model.
    pub fn native(&self) -> &H {
        &self.native
    }

    /// Closes the connection, dropping the native handle.
    pub fn close(self) {
        tracing::debug!(handle = std::any::type_name::<H>(), "closing connection");
        drop(self.native);
    }

    /// Delegates to the handle's own suspend hook.
    pub fn suspend(&self) -> Result<HandleSnapshot> {
        self.native.suspend()
    }

    /// Reopens the handle from `snapshot` and decorates it again.
    pub fn resume(snapshot: HandleSnapshot) -> Result<Self> {
        Self::new(H::resume(snapshot)?)
    }

    /// Error for a native call that reported failure by return value.
    fn unraised(&self, operation: &str) -> ErrorInfo {
        self.native
            .error_info()
            .unwrap_or_else(|| ErrorInfo::general(format!("{operation} failed")))
    }

    fn confirm_transaction(&self, operation: &str, succeeded: bool) -> Result<bool> {
        if succeeded {
            Ok(true)
        } else {
            Err(DbalError::Transaction(self.unraised(operation)))
        }
    }
}

impl<H: NativeHandle> Deref for DecoratedConnection<H> {
    type Target = H;

    fn deref(&self) -> &H {
        &self.native
    }
}

#[async_trait]
impl<H: NativeHandle> Connection for DecoratedConnection<H> {
    async fn prepare(&self, sql: &str) -> Result<Statement> {
        tracing::trace!(sql, "prepare");
        match self.native.prepare(sql).await? {
            Some(native) => Statement::from_native(native),
            None => Err(DbalError::QueryFailed(self.unraised("prepare"))),
        }
    }

    async fn query_with_mode(&self, sql: &str, mode: FetchMode) -> Result<Statement> {
        tracing::trace!(sql, ?mode, "query");
        match self.native.query(sql).await? {
            Some(native) => Statement::from_executed(native, mode),
            None => Err(DbalError::QueryFailed(self.unraised("query"))),
        }
    }

    fn quote(&self, value: &SqlValue, ty: ParameterType) -> Result<String> {
        self.native.quote(value, ty)?.ok_or_else(|| {
            DbalError::Unsupported(format!("cannot quote {value:?} as {ty:?}"))
        })
    }

    async fn exec(&self, sql: &str) -> Result<u64> {
        tracing::trace!(sql, "exec");
        match self.native.exec(sql).await? {
            Some(affected) => Ok(affected),
            None => Err(DbalError::QueryFailed(self.unraised("exec"))),
        }
    }

    async fn last_insert_id(&self, name: Option<&str>) -> Result<String> {
        match self.native.last_insert_id(name).await? {
            Some(id) => Ok(id),
            None => Err(DbalError::QueryFailed(self.unraised("last insert id"))),
        }
    }

    async fn begin_transaction(&self) -> Result<bool> {
        tracing::trace!("begin transaction");
        let begun = self.native.begin_transaction().await?;
        self.confirm_transaction("begin transaction", begun)
    }

    async fn commit(&self) -> Result<bool> {
        tracing::trace!("commit");
        let committed = self.native.commit().await?;
        self.confirm_transaction("commit", committed)
    }

    async fn roll_back(&self) -> Result<bool> {
        tracing::trace!("roll back");
        let rolled_back = self.native.roll_back().await?;
        self.confirm_transaction("roll back", rolled_back)
    }

    fn error_code(&self) -> Option<String> {
        self.native.error_code()
    }

    fn error_info(&self) -> Option<ErrorInfo> {
        self.native.error_info()
    }
}

impl<H: NativeHandle> ServerInfoAwareConnection for DecoratedConnection<H> {
    fn server_version(&self) -> String {
        self.native.server_version()
    }

    fn requires_query_for_server_version(&self) -> bool {
        false
    }
}

impl<H: NativeHandle> Serialize for DecoratedConnection<H> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.suspend()
            .map_err(<S::Error as serde::ser::Error>::custom)?
            .serialize(serializer)
    }
}

impl<'de, H: NativeHandle> Deserialize<'de> for DecoratedConnection<H> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let snapshot = HandleSnapshot::deserialize(deserializer)?;
        Self::resume(snapshot).map_err(<D::Error as serde::de::Error>::custom)
    }
}

impl<H: NativeHandle> std::fmt::Debug for DecoratedConnection<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoratedConnection")
            .field("handle", &std::any::type_name::<H>())
            .field("server_version", &self.native.server_version())
            .finish()
    }
}
