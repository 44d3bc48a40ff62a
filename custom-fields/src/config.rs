//! Layered configuration using Figment.
//!
//! Sources are merged in precedence order, later sources override earlier ones:
//! 1. Built-in defaults
//! 2. Global file `~/.custom-fields/config.{toml,yaml,yml,json}`
//! 3. Project file `./.custom-fields/config.{toml,yaml,yml,json}`
//! 4. Environment variables prefixed `CUSTOM_FIELDS_`, with `__` between
//!    nesting levels (`CUSTOM_FIELDS_DATABASE__TABLE_PREFIX=site2_`)

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{FieldsError, Result};
use crate::sanitize::is_valid_table_prefix;

/// Directory name searched for configuration files.
pub const CONFIG_DIR_NAME: &str = ".custom-fields";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "CUSTOM_FIELDS_";

const CONFIG_FILE_STEM: &str = "config";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file.
    pub path: PathBuf,
    /// Prefix prepended to every table name.
    pub table_prefix: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("custom-fields.db"),
            table_prefix: "wp_".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UploadConfig {
    /// Base URI the upload endpoint is served from, e.g. `/plugins/custom-fields/`.
    pub base_uri: String,
    /// Upload endpoint path relative to `base_uri`.
    pub endpoint: String,
    /// Label shown beside the upload-by-URL input.
    pub url_label: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            base_uri: String::new(),
            endpoint: "upload.php".to_string(),
            url_label: "Or URL".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PanelSettings {
    /// Fields in groups of this panel are visible on every post.
    pub global_panel: String,
    /// Post meta key holding the id of the panel a post is edited with.
    pub panel_meta_key: String,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            global_panel: "_Global".to_string(),
            panel_meta_key: "_mf_write_panel_id".to_string(),
        }
    }
}

/// Complete configuration for the custom fields store and its front ends.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FieldsConfig {
    pub database: DatabaseConfig,
    pub upload: UploadConfig,
    pub panels: PanelSettings,
}

impl FieldsConfig {
    /// Load configuration for the current working directory.
    pub fn load() -> Result<Self> {
        let cwd = std::env::current_dir()?;
        Self::load_from(&cwd)
    }

    /// Load configuration with `project_dir` as the project root.
    pub fn load_from(project_dir: &Path) -> Result<Self> {
        let global = dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME));
        Self::from_figment(&Self::figment(global.as_deref(), project_dir))
    }

    /// Build the figment with all sources in precedence order.
    pub fn figment(global_dir: Option<&Path>, project_dir: &Path) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(FieldsConfig::default()));

        if let Some(dir) = global_dir {
            figment = merge_config_files(figment, dir);
        }
        figment = merge_config_files(figment, &project_dir.join(CONFIG_DIR_NAME));

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Extract and validate a configuration from a prepared figment.
    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let config: FieldsConfig = figment.extract()?;
        config.validate()?;
        debug!(
            database = %config.database.path.display(),
            prefix = %config.database.table_prefix,
            "loaded custom fields configuration"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !is_valid_table_prefix(&self.database.table_prefix) {
            return Err(FieldsError::InvalidTablePrefix {
                prefix: self.database.table_prefix.clone(),
            });
        }
        Ok(())
    }
}

fn merge_config_files(mut figment: Figment, dir: &Path) -> Figment {
    for ext in ["toml", "yaml", "yml", "json"] {
        let path = dir.join(format!("{CONFIG_FILE_STEM}.{ext}"));
        if !path.is_file() {
            continue;
        }
        trace!(path = %path.display(), "merging config file");
        figment = match ext {
            "toml" => figment.merge(Toml::file(&path)),
            "json" => figment.merge(Json::file(&path)),
            _ => figment.merge(Yaml::file(&path)),
        };
    }
    figment
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn write_project_config(dir: &Path, file: &str, content: &str) {
        let config_dir = dir.join(CONFIG_DIR_NAME);
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join(file), content).unwrap();
    }

    #[test]
    #[serial]
    fn defaults_without_files() {
        let tmp = TempDir::new().unwrap();
        let config = FieldsConfig::from_figment(&FieldsConfig::figment(None, tmp.path())).unwrap();
        assert_eq!(config, FieldsConfig::default());
        assert_eq!(config.database.table_prefix, "wp_");
        assert_eq!(config.panels.global_panel, "_Global");
        assert_eq!(config.upload.url_label, "Or URL");
    }

    #[test]
    #[serial]
    fn project_toml_overrides_defaults() {
        let tmp = TempDir::new().unwrap();
        write_project_config(
            tmp.path(),
            "config.toml",
            r#"
[database]
path = "site.db"
table_prefix = "site2_"

[upload]
base_uri = "/plugins/fields/"
"#,
        );

        let config = FieldsConfig::from_figment(&FieldsConfig::figment(None, tmp.path())).unwrap();
        assert_eq!(config.database.path, PathBuf::from("site.db"));
        assert_eq!(config.database.table_prefix, "site2_");
        assert_eq!(config.upload.base_uri, "/plugins/fields/");
        assert_eq!(config.upload.endpoint, "upload.php");
    }

    #[test]
    #[serial]
    fn project_overrides_global() {
        let global = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        fs::write(
            global.path().join("config.yaml"),
            "panels:\n  global_panel: Everywhere\ndatabase:\n  table_prefix: g_\n",
        )
        .unwrap();
        write_project_config(project.path(), "config.json", r#"{"database": {"table_prefix": "p_"}}"#);

        let config =
            FieldsConfig::from_figment(&FieldsConfig::figment(Some(global.path()), project.path()))
                .unwrap();
        assert_eq!(config.panels.global_panel, "Everywhere");
        assert_eq!(config.database.table_prefix, "p_");
    }

    #[test]
    #[serial]
    fn environment_overrides_files() {
        let tmp = TempDir::new().unwrap();
        write_project_config(tmp.path(), "config.toml", "[database]\ntable_prefix = \"file_\"\n");

        std::env::set_var("CUSTOM_FIELDS_DATABASE__TABLE_PREFIX", "env_");
        let result = FieldsConfig::from_figment(&FieldsConfig::figment(None, tmp.path()));
        std::env::remove_var("CUSTOM_FIELDS_DATABASE__TABLE_PREFIX");

        assert_eq!(result.unwrap().database.table_prefix, "env_");
    }

    #[test]
    #[serial]
    fn invalid_prefix_is_rejected() {
        let tmp = TempDir::new().unwrap();
        write_project_config(tmp.path(), "config.toml", "[database]\ntable_prefix = \"x; --\"\n");

        let err = FieldsConfig::from_figment(&FieldsConfig::figment(None, tmp.path())).unwrap_err();
        assert!(matches!(err, FieldsError::InvalidTablePrefix { .. }));
    }
}
