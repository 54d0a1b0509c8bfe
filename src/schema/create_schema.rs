use crate::connection::Connection;
use crate::error::Result;

use super::visitor::{NamespaceVisitor, Visitor};

/// Emits a `CREATE SCHEMA` statement for every visited namespace.
#[derive(Debug, Default, Clone)]
pub struct CreateSchemaSqlCollector {
    statements: Vec<String>,
}

impl CreateSchemaSqlCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    pub fn reset(&mut self) {
        self.statements.clear();
    }

    /// Runs the collected statements in order, stopping at the first failure.
    pub async fn execute(&self, connection: &dyn Connection) -> Result<()> {
        for sql in &self.statements {
            connection.exec(sql).await?;
        }
        Ok(())
    }
}

impl NamespaceVisitor for CreateSchemaSqlCollector {
    fn accept_namespace(&mut self, namespace_name: &str) {
        self.statements
            .push(format!("CREATE SCHEMA {}", quote_identifier(namespace_name)));
    }
}

impl Visitor for CreateSchemaSqlCollector {
    fn as_namespace_visitor(&mut self) -> Option<&mut dyn NamespaceVisitor> {
        Some(self)
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
