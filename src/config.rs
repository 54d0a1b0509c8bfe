use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{DbalError, Result};

/// Connection settings, usually read from the `[connection]` table of a TOML file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub dbname: String,
    pub application_name: Option<String>,
    pub connect_timeout_secs: Option<u64>,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    connection: ConnectionConfig,
}

impl ConnectionConfig {
    /// Parses a TOML document holding a `[connection]` table.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(content).map_err(|e| DbalError::InvalidConfig(e.to_string()))?;
        file.connection.validate()?;
        Ok(file.connection)
    }

    /// Loads configuration from a TOML file at the given path.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| DbalError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(DbalError::InvalidConfig("host must not be empty".to_string()));
        }
        if self.dbname.trim().is_empty() {
            return Err(DbalError::InvalidConfig("dbname must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(DbalError::InvalidConfig("port must not be 0".to_string()));
        }
        Ok(())
    }

    /// Renders the settings as a libpq style key/value connection string.
    pub fn to_connection_string(&self) -> String {
        let mut parts = vec![
            format!("host={}", escape(&self.host)),
            format!("port={}", self.port),
            format!("user={}", escape(&self.user)),
            format!("dbname={}", escape(&self.dbname)),
        ];
        if let Some(password) = &self.password {
            parts.push(format!("password={}", escape(password)));
        }
        if let Some(name) = &self.application_name {
            parts.push(format!("application_name={}", escape(name)));
        }
        if let Some(timeout) = self.connect_timeout_secs {
            parts.push(format!("connect_timeout={timeout}"));
        }
        parts.join(" ")
    }
}

/// Quotes a connection string value when it contains spaces, quotes or backslashes.
fn escape(value: &str) -> String {
    if !value.is_empty() && !value.contains([' ', '\'', '\\']) {
        return value.to_string();
    }
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}
