mod attributes;
mod row;
mod sql_value;

pub use attributes::{ErrorMode, FetchMode, StatementClass};
pub use row::{QueryResult, RawQueryResult, Row};
pub use sql_value::{quote_literal, ParameterType, SqlValue};
