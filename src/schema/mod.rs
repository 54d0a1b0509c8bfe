//! Minimal schema model and the visitor protocol used to walk it.

mod create_schema;
mod visitor;

use std::fmt;

use crate::traits::Table;

pub use create_schema::CreateSchemaSqlCollector;
pub use visitor::{NamespaceCollector, NamespaceVisitor, SchemaVisitor, TableVisitor, Visitor};

/// A table name, optionally qualified by its namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName {
    namespace: Option<String>,
    name: String,
}

impl TableName {
    pub fn new(namespace: Option<&str>, name: &str) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
        }
    }

    /// Splits `namespace.table`; a name without a dot has no namespace.
    pub fn parse(qualified: &str) -> Self {
        match qualified.split_once('.') {
            Some((namespace, name)) => Self::new(Some(namespace), name),
            None => Self::new(None, qualified),
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{}.{}", namespace, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Namespaces and tables of a database schema.
///
/// Namespaces keep insertion order and are unique ignoring ASCII case.
/// Adding a qualified table registers its namespace.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    namespaces: Vec<String>,
    tables: Vec<TableName>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(mut self, name: &str) -> Self {
        self.add_namespace(name);
        self
    }

    pub fn with_table(mut self, table: TableName) -> Self {
        self.add_table(table);
        self
    }

    /// Adds a namespace. Returns `false` if it was already present.
    pub fn add_namespace(&mut self, name: &str) -> bool {
        if self.has_namespace(name) {
            return false;
        }
        self.namespaces.push(name.to_string());
        true
    }

    pub fn has_namespace(&self, name: &str) -> bool {
        self.namespaces.iter().any(|n| n.eq_ignore_ascii_case(name))
    }

    pub fn add_table(&mut self, table: TableName) {
        if let Some(namespace) = table.namespace() {
            self.add_namespace(namespace);
        }
        if !self.tables.contains(&table) {
            self.tables.push(table);
        }
    }

    /// Registers a table described by the [`Table`] trait.
    pub fn add_table_def<T: Table>(&mut self) {
        self.add_table(TableName::new(T::schema(), T::table_name()));
    }

    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    pub fn tables(&self) -> &[TableName] {
        &self.tables
    }

    /// Walks the schema: the schema itself, then each namespace, then each table.
    pub fn visit(&self, visitor: &mut dyn Visitor) {
        if let Some(schema_visitor) = visitor.as_schema_visitor() {
            schema_visitor.accept_schema(self);
        }
        if let Some(namespace_visitor) = visitor.as_namespace_visitor() {
            for namespace in &self.namespaces {
                namespace_visitor.accept_namespace(namespace);
            }
        }
        if let Some(table_visitor) = visitor.as_table_visitor() {
            for table in &self.tables {
                table_visitor.accept_table(table);
            }
        }
    }
}
