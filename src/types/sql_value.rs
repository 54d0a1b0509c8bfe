use crate::error::{DbalError, Result};

/// Represents a SQL parameter value in a driver-agnostic way.
/// Drivers are responsible for converting these to their native types.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Text(String),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    Bool(bool),
    Bytes(Vec<u8>),
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int32(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int64(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float64(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        SqlValue::Bytes(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => SqlValue::Null,
        }
    }
}

/// Type hint passed to `quote`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParameterType {
    Null,
    Integer,
    #[default]
    String,
    Boolean,
    Binary,
    LargeObject,
}

/// Renders `value` as a SQL literal for the given type hint.
///
/// Strings use standard-conforming quoting (single quotes doubled, backslashes
/// kept as-is). Large objects have no literal form and NUL bytes cannot appear
/// inside a text literal; both are rejected.
pub fn quote_literal(value: &SqlValue, ty: ParameterType) -> Result<String> {
    if matches!(value, SqlValue::Null) || ty == ParameterType::Null {
        return Ok("NULL".to_string());
    }

    match ty {
        ParameterType::Null => Ok("NULL".to_string()),
        ParameterType::Integer => match value {
            SqlValue::Int32(i) => Ok(i.to_string()),
            SqlValue::Int64(i) => Ok(i.to_string()),
            SqlValue::Bool(b) => Ok(if *b { "1" } else { "0" }.to_string()),
            SqlValue::Text(s) => s
                .trim()
                .parse::<i64>()
                .map(|i| i.to_string())
                .map_err(|_| DbalError::Unsupported(format!("cannot quote {s:?} as an integer"))),
            other => Err(DbalError::Unsupported(format!(
                "cannot quote {other:?} as an integer"
            ))),
        },
        ParameterType::Boolean => match value {
            SqlValue::Bool(b) => Ok(if *b { "TRUE" } else { "FALSE" }.to_string()),
            SqlValue::Int32(i) => Ok(if *i != 0 { "TRUE" } else { "FALSE" }.to_string()),
            SqlValue::Int64(i) => Ok(if *i != 0 { "TRUE" } else { "FALSE" }.to_string()),
            other => Err(DbalError::Unsupported(format!(
                "cannot quote {other:?} as a boolean"
            ))),
        },
        ParameterType::String => {
            let text = match value {
                SqlValue::Text(s) => s.clone(),
                SqlValue::Int32(i) => i.to_string(),
                SqlValue::Int64(i) => i.to_string(),
                SqlValue::Float64(f) => f.to_string(),
                SqlValue::Bool(b) => b.to_string(),
                SqlValue::Bytes(bytes) => String::from_utf8(bytes.clone()).map_err(|_| {
                    DbalError::Unsupported("bytes are not valid UTF-8, quote as binary".to_string())
                })?,
                SqlValue::Null => unreachable!("handled above"),
            };
            quote_string(&text)
        }
        ParameterType::Binary => match value {
            SqlValue::Bytes(bytes) => {
                let mut literal = String::with_capacity(bytes.len() * 2 + 4);
                literal.push_str("'\\x");
                for byte in bytes {
                    literal.push_str(&format!("{byte:02x}"));
                }
                literal.push('\'');
                Ok(literal)
            }
            other => Err(DbalError::Unsupported(format!(
                "cannot quote {other:?} as binary"
            ))),
        },
        ParameterType::LargeObject => Err(DbalError::Unsupported(
            "large objects have no literal form".to_string(),
        )),
    }
}

fn quote_string(text: &str) -> Result<String> {
    if text.contains('\0') {
        return Err(DbalError::Unsupported(
            "text literals cannot contain NUL bytes".to_string(),
        ));
    }
    Ok(format!("'{}'", text.replace('\'', "''")))
}
