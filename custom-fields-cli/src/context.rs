//! Shared setup for every command: configuration, the manager, and output.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;

use custom_fields::{CustomFieldManager, FieldsConfig};

/// Everything a command needs to run.
pub struct CommandContext {
    pub config: FieldsConfig,
    pub json: bool,
}

impl CommandContext {
    /// Load configuration, applying a `--database` override.
    pub fn load(database: Option<PathBuf>, json: bool) -> Result<Self> {
        let mut config = FieldsConfig::load().context("failed to load configuration")?;
        if let Some(path) = database {
            config.database.path = path;
        }
        debug!(database = %config.database.path.display(), "using database");
        Ok(Self { config, json })
    }

    pub fn manager(&self) -> Result<CustomFieldManager> {
        CustomFieldManager::from_config(&self.config).with_context(|| {
            format!(
                "failed to open database {}",
                self.config.database.path.display()
            )
        })
    }

    /// Print a JSON document to stdout.
    pub fn print_json(&self, value: &Value) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}
