use std::fmt;

use thiserror::Error;

/// SQLSTATE used when a driver failed without reporting a more specific one.
pub const GENERAL_ERROR: &str = "HY000";

/// Structured diagnostic for a failed database operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    /// Five character SQLSTATE code
    pub sqlstate: String,
    /// Driver specific error code, when the driver has one
    pub driver_code: Option<i32>,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(sqlstate: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            sqlstate: sqlstate.into(),
            driver_code: None,
            message: message.into(),
        }
    }

    /// An error with the generic `HY000` SQLSTATE.
    pub fn general(message: impl Into<String>) -> Self {
        Self::new(GENERAL_ERROR, message)
    }

    pub fn with_driver_code(mut self, code: i32) -> Self {
        self.driver_code = Some(code);
        self
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.driver_code {
            Some(code) => write!(f, "SQLSTATE[{}] ({}): {}", self.sqlstate, code, self.message),
            None => write!(f, "SQLSTATE[{}]: {}", self.sqlstate, self.message),
        }
    }
}

/// Error type for dbal operations
#[derive(Debug, Error)]
pub enum DbalError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(ErrorInfo),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Transaction error: {0}")]
    Transaction(ErrorInfo),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Handle is not serializable: {0}")]
    NotSerializable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Expected {expected} row(s), got {actual}")]
    UnexpectedRowCount { expected: usize, actual: usize },

    #[error("Column not found: {0}")]
    ColumnNotFound(String),
}

impl DbalError {
    /// The diagnostic attached to execution and protocol errors.
    pub fn error_info(&self) -> Option<&ErrorInfo> {
        match self {
            DbalError::QueryFailed(info) | DbalError::Transaction(info) => Some(info),
            _ => None,
        }
    }
}

/// Result type alias for dbal operations
pub type Result<T> = std::result::Result<T, DbalError>;
