//! Repository configuration via `docrepo.toml`
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration.

use std::path::Path;

use docrepo_core::{Error, Result, DEFAULT_PAGE_SIZE};
use serde::{Deserialize, Serialize};

/// Conventional config file name
pub const CONFIG_FILE_NAME: &str = "docrepo.toml";

/// Repository configuration loaded from `docrepo.toml`.
///
/// # Example
///
/// ```toml
/// database = "orders"
/// partition_separator = "-"
/// default_page_size = 50
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Database name handed to the client
    #[serde(default = "default_database")]
    pub database: String,
    /// Joins partition key and base name: `<partition><sep><base>`
    #[serde(default = "default_separator")]
    pub partition_separator: String,
    /// Page size used when a caller does not choose one
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
}

fn default_database() -> String {
    "docrepo".to_string()
}

fn default_separator() -> String {
    "-".to_string()
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            partition_separator: default_separator(),
            default_page_size: default_page_size(),
        }
    }
}

impl RepositoryConfig {
    /// Default config bound to `database`
    pub fn for_database(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..Self::default()
        }
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# docrepo configuration
#
# Database the repository binds to.
database = "docrepo"

# Separator between partition key and collection base name.
# A partitioned document of type Invoice with partition key "acme"
# is stored in collection "acme-Invoice".
partition_separator = "-"

# Page size used when a caller does not pass one.
default_page_size = 50
"#
    }

    /// Parse and validate config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the text cannot be parsed or is invalid.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RepositoryConfig = toml::from_str(content)
            .map_err(|e| Error::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate config from a file path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Reject settings the resolver cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.database.trim().is_empty() {
            return Err(Error::config("database name must not be empty"));
        }
        if self.partition_separator.is_empty() {
            return Err(Error::config("partition_separator must not be empty"));
        }
        if self.default_page_size == 0 {
            return Err(Error::config("default_page_size must be positive"));
        }
        Ok(())
    }
}
