//! Configuration handling for the docql CLI
//!
//! Manages the docql.toml configuration file.
//!
//! ## Environment Variables
//!
//! The following environment variables can override config file settings:
//!
//! - `DOCQL_SCHEMA` - Path of the schema metadata JSON file
//! - `DOCQL_DATABASE` - Database to compile against
//! - `DOCQL_LOG` - Log filter directive, e.g. `docql=debug`
//!
//! These can be set in a `.env` file next to the configuration file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use docql_core::{DatabaseMeta, Dialect};

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "docql.toml";

/// Environment variable names
pub const ENV_SCHEMA: &str = "DOCQL_SCHEMA";
pub const ENV_DATABASE: &str = "DOCQL_DATABASE";
pub const ENV_LOG: &str = "DOCQL_LOG";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Schema metadata file (relative to the config file)
    pub schema: PathBuf,
    /// Database name; defaults to the name in the schema file
    #[serde(default)]
    pub database: Option<String>,
    /// Force a dialect instead of the one declared by the schema
    #[serde(default)]
    pub dialect_override: Option<Dialect>,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_log_filter() -> String {
    "docql=info".to_string()
}

impl Config {
    pub fn new(schema: PathBuf) -> Self {
        Self {
            schema,
            database: None,
            dialect_override: None,
            log_filter: default_log_filter(),
        }
    }

    /// Load configuration from a directory
    ///
    /// This also loads any `.env` file in the directory and applies
    /// environment variable overrides.
    pub fn load(dir: &Path) -> anyhow::Result<Self> {
        Self::load_with_env(dir, ".env")
    }

    fn load_with_env(dir: &Path, env_file: &str) -> anyhow::Result<Self> {
        let env_path = dir.join(env_file);
        if env_path.exists() {
            let _ = dotenvy::from_path(&env_path);
        }

        let config_path = dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            anyhow::bail!("Configuration file not found: {}", config_path.display());
        }

        let content = std::fs::read_to_string(&config_path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(schema) = std::env::var(ENV_SCHEMA) {
            if !schema.is_empty() {
                self.schema = PathBuf::from(schema);
            }
        }

        if let Ok(database) = std::env::var(ENV_DATABASE) {
            if !database.is_empty() {
                self.database = Some(database);
            }
        }

        if let Ok(filter) = std::env::var(ENV_LOG) {
            if !filter.is_empty() {
                self.log_filter = filter;
            }
        }
    }

    pub fn schema_path(&self, config_dir: &Path) -> PathBuf {
        if self.schema.is_absolute() {
            self.schema.clone()
        } else {
            config_dir.join(&self.schema)
        }
    }

    /// Read the schema metadata, applying the database and dialect overrides
    pub fn load_schema(&self, config_dir: &Path) -> anyhow::Result<DatabaseMeta> {
        let path = self.schema_path(config_dir);
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read schema file {}: {}", path.display(), e))?;
        let mut meta: DatabaseMeta = serde_json::from_str(&content)?;
        if let Some(database) = &self.database {
            meta.name = database.clone();
        }
        if let Some(dialect) = self.dialect_override {
            meta.dialect = dialect;
        }
        Ok(meta)
    }
}
