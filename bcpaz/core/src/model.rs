//! Target tables and source files

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::redact::Redactor;

fn default_comma() -> char {
    ','
}

/// How the client programs authenticate against the server
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Auth {
    /// Integrated (Kerberos / trusted connection) authentication
    Integrated,
    /// SQL login
    Credentials { username: String, password: String },
}

impl Auth {
    pub fn credentials(username: impl Into<String>, password: impl Into<String>) -> Self {
        Auth::Credentials {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> Option<&str> {
        match self {
            Auth::Integrated => None,
            Auth::Credentials { password, .. } => Some(password),
        }
    }

    /// Redactor scrubbing this password from diagnostics
    pub fn redactor(&self) -> Redactor {
        Redactor::new(self.password())
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::Integrated => write!(f, "Integrated"),
            Auth::Credentials { username, .. } => f
                .debug_struct("Credentials")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// Destination table of a load
#[derive(Debug, Clone, Deserialize, derive_new::new)]
pub struct SqlTable {
    /// Server address, e.g. `myserver.database.windows.net`
    pub server: String,

    /// Database holding the table
    pub database: String,

    /// Schema name, e.g. `dbo`
    pub schema: String,

    /// Table name
    pub table: String,

    pub auth: Auth,
}

impl SqlTable {
    /// `schema.table` as passed to bcp
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }
}

/// Source flat file of a load
#[derive(Debug, Clone, Serialize, Deserialize, derive_new::new)]
pub struct FlatFile {
    /// Path of the delimited file
    pub path: PathBuf,

    /// Set to `true` when the first line holds column names
    #[serde(default)]
    pub file_has_header_line: bool,

    /// bcp format file describing the columns, generated from the file when absent
    #[serde(default)]
    #[new(default)]
    pub format_file_path: Option<PathBuf>,

    /// Field delimiter, defaults to `,`
    #[serde(default = "default_comma")]
    #[new(value = "default_comma()")]
    pub delimiter: char,
}

impl FlatFile {
    pub fn with_format_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.format_file_path = Some(path.into());
        self
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final path component, used as the staged blob name
    pub fn base_name(&self) -> Result<&str> {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                Error::Configuration(format!(
                    "flat file path {} has no usable file name",
                    self.path.display()
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_debug_hides_password() {
        let auth = Auth::credentials("loader", "S3cr3t-P@ss");

        let debug = format!("{auth:?}");

        assert!(debug.contains("loader"));
        assert!(!debug.contains("S3cr3t-P@ss"));
    }

    #[test]
    fn test_table_deserialization() {
        let table: SqlTable = serde_json::from_str(
            r#"{
                "server": "sql.example.com",
                "database": "warehouse",
                "schema": "staging",
                "table": "orders",
                "auth": {"type": "credentials", "username": "loader", "password": "pwd"}
            }"#,
        )
        .unwrap();

        assert_eq!(table.qualified_name(), "staging.orders");
        assert_eq!(table.auth, Auth::credentials("loader", "pwd"));
    }

    #[test]
    fn test_integrated_auth_deserialization() {
        let auth: Auth = serde_json::from_str(r#"{"type": "integrated"}"#).unwrap();

        assert_eq!(auth, Auth::Integrated);
        assert_eq!(auth.password(), None);
    }

    #[test]
    fn test_flat_file_defaults() {
        let file: FlatFile = serde_json::from_str(r#"{"path": "/data/orders.csv"}"#).unwrap();

        assert!(!file.file_has_header_line);
        assert_eq!(file.delimiter, ',');
        assert!(file.format_file_path.is_none());
        assert_eq!(file.base_name().unwrap(), "orders.csv");
    }

    #[test]
    fn test_flat_file_builder() {
        let file = FlatFile::new("/data/orders.tsv".into(), true)
            .with_delimiter('\t')
            .with_format_file("/data/orders.fmt");

        assert_eq!(file.delimiter, '\t');
        assert_eq!(file.format_file_path, Some(PathBuf::from("/data/orders.fmt")));
    }

    #[test]
    fn test_base_name_requires_file_name() {
        let file = FlatFile::new("/".into(), false);

        assert!(matches!(file.base_name(), Err(Error::Configuration(_))));
    }
}
