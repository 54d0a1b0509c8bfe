use std::fmt;

/// How a native handle reports failed operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Failures only set the error code; the call returns `None` or `false`.
    #[default]
    Silent,
    /// Like `Silent`, but the failure is also logged.
    Warning,
    /// Failures are returned as errors.
    Raise,
}

/// Identity of the statement type a handle builds statements for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatementClass(&'static str);

impl StatementClass {
    /// The class a handle uses before any override is applied.
    pub const NATIVE: StatementClass = StatementClass("native");

    pub fn of<T: ?Sized>() -> Self {
        StatementClass(std::any::type_name::<T>())
    }

    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for StatementClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Shape of the values returned when fetching from a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// Whole rows, addressable by column name
    #[default]
    Assoc,
    /// Bare values in column order
    Numeric,
    /// A single column of each row
    Column(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker;

    #[test]
    fn test_statement_class_identity() {
        assert_eq!(StatementClass::of::<Marker>(), StatementClass::of::<Marker>());
        assert_ne!(StatementClass::of::<Marker>(), StatementClass::NATIVE);
        assert!(StatementClass::of::<Marker>().name().ends_with("Marker"));
    }
}
