//! Visitor capabilities for walking a [`Schema`].
//!
//! A concrete visitor implements any subset of the capability traits and
//! advertises them through [`Visitor`]; [`Schema::visit`] only calls the
//! capabilities that are present.

use super::{Schema, TableName};

/// Visitor that can visit schema namespaces.
pub trait NamespaceVisitor {
    /// Accepts a schema namespace name.
    fn accept_namespace(&mut self, namespace_name: &str);
}

/// Visitor notified once with the schema being walked, before anything else.
pub trait SchemaVisitor {
    fn accept_schema(&mut self, schema: &Schema);
}

/// Visitor that can visit tables.
pub trait TableVisitor {
    fn accept_table(&mut self, table: &TableName);
}

/// Capability lookup used by the traversal driver.
pub trait Visitor {
    fn as_schema_visitor(&mut self) -> Option<&mut dyn SchemaVisitor> {
        None
    }

    fn as_namespace_visitor(&mut self) -> Option<&mut dyn NamespaceVisitor> {
        None
    }

    fn as_table_visitor(&mut self) -> Option<&mut dyn TableVisitor> {
        None
    }
}

/// Collects namespace names in visit order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NamespaceCollector {
    names: Vec<String>,
}

impl NamespaceCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn into_names(self) -> Vec<String> {
        self.names
    }
}

impl NamespaceVisitor for NamespaceCollector {
    fn accept_namespace(&mut self, namespace_name: &str) {
        self.names.push(namespace_name.to_string());
    }
}

impl Visitor for NamespaceCollector {
    fn as_namespace_visitor(&mut self) -> Option<&mut dyn NamespaceVisitor> {
        Some(self)
    }
}
