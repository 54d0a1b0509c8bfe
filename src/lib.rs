//! dbal - A uniform connection interface over native database handles
//!
//! A [`DecoratedConnection`] takes exclusive ownership of a native handle,
//! switches it to raise-on-failure error reporting and makes it build
//! [`Statement`]s, so every failing operation surfaces as an `Err`.
//!
//! # Example
//! ```ignore
//! use dbal::{Connection, DecoratedConnection, ServerInfoAwareConnection};
//!
//! let connection = DecoratedConnection::connect("postgres://localhost/mydb").await?;
//! println!("server {}", connection.server_version());
//!
//! connection.begin_transaction().await?;
//! let affected = connection.exec("UPDATE users SET active = true").await?;
//! connection.commit().await?;
//!
//! let mut statement = connection.prepare("SELECT id, name FROM users WHERE id = $1").await?;
//! statement.execute(&[42.into()]).await?;
//! let row = statement.into_result().single_row()?;
//! ```

pub mod config;
pub mod drivers;
pub mod error;
pub mod schema;
pub mod traits;
pub mod types;

mod connection;
mod statement;

// Re-export main types for convenient access
pub use config::ConnectionConfig;
pub use connection::{Connection, DecoratedConnection, ServerInfoAwareConnection};
pub use error::{DbalError, ErrorInfo, Result};
pub use schema::{NamespaceVisitor, Schema, Visitor};
pub use statement::{Fetched, Statement};
pub use traits::{HandleSnapshot, NativeHandle, NativeStatement, Table};
pub use types::{
    ErrorMode, FetchMode, ParameterType, QueryResult, RawQueryResult, Row, SqlValue,
    StatementClass,
};
