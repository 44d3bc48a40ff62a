//! SQLite storage for custom fields.
//!
//! # Schema
//!
//! All table names share a configurable prefix (`wp_` by default).
//!
//! - `mf_write_panels`: edit-screen panels (id, name)
//! - `mf_module_groups`: field groups inside a panel
//! - `mf_panel_custom_field`: field definitions
//! - `mf_custom_field_options`: one row per field whose type has options
//! - `mf_custom_field_option_values`: the option and default-value lists, one row per entry
//! - `mf_custom_field_properties`: one row per field whose type has properties (JSON map)
//! - `postmeta`: native per-post key/value store
//! - `mf_post_meta`: index from (field, group_count, field_count, post) to a `postmeta` row

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::Connection;
use tracing::debug;

use crate::config::DatabaseConfig;
use crate::error::{FieldsError, Result};
use crate::sanitize::is_valid_table_prefix;

/// Fully qualified table names for one prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub panels: String,
    pub panel_groups: String,
    pub group_fields: String,
    pub field_options: String,
    pub field_option_values: String,
    pub field_properties: String,
    pub post_meta_index: String,
    pub postmeta: String,
}

impl TableNames {
    pub fn with_prefix(prefix: &str) -> Result<Self> {
        if !is_valid_table_prefix(prefix) {
            return Err(FieldsError::InvalidTablePrefix {
                prefix: prefix.to_string(),
            });
        }
        Ok(Self::build(prefix))
    }

    fn build(prefix: &str) -> Self {
        Self {
            panels: format!("{prefix}mf_write_panels"),
            panel_groups: format!("{prefix}mf_module_groups"),
            group_fields: format!("{prefix}mf_panel_custom_field"),
            field_options: format!("{prefix}mf_custom_field_options"),
            field_option_values: format!("{prefix}mf_custom_field_option_values"),
            field_properties: format!("{prefix}mf_custom_field_properties"),
            post_meta_index: format!("{prefix}mf_post_meta"),
            postmeta: format!("{prefix}postmeta"),
        }
    }
}

impl Default for TableNames {
    fn default() -> Self {
        Self::build("wp_")
    }
}

/// SQLite database holding field definitions and post meta.
///
/// The connection sits behind a Mutex so the database is `Send + Sync`.
pub struct FieldDatabase {
    conn: Mutex<Connection>,
    tables: TableNames,
}

impl FieldDatabase {
    /// Open (or create) a database file and make sure the schema exists.
    pub fn open(path: impl AsRef<Path>, table_prefix: &str) -> Result<Self> {
        let tables = TableNames::with_prefix(table_prefix)?;
        let conn = Connection::open(path.as_ref())?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        debug!(path = %path.as_ref().display(), "opened custom fields database");
        Self::with_connection(conn, tables)
    }

    /// Open a private in-memory database with the default prefix.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, TableNames::default())
    }

    pub fn from_config(config: &DatabaseConfig) -> Result<Self> {
        Self::open(&config.path, &config.table_prefix)
    }

    fn with_connection(conn: Connection, tables: TableNames) -> Result<Self> {
        let db = Self {
            conn: Mutex::new(conn),
            tables,
        };
        db.create_schema()?;
        Ok(db)
    }

    pub fn tables(&self) -> &TableNames {
        &self.tables
    }

    /// Lock the connection. A poisoned lock still yields the connection,
    /// every write runs in its own transaction.
    pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn create_schema(&self) -> Result<()> {
        let t = &self.tables;
        let sql = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {panels} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS {panel_groups} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                panel_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                duplicate INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS {group_fields} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                group_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                display_order INTEGER NOT NULL DEFAULT 1,
                required_field INTEGER NOT NULL DEFAULT 0,
                type INTEGER NOT NULL,
                CSS TEXT,
                duplicate INTEGER NOT NULL DEFAULT 0,
                help_text TEXT,
                UNIQUE (group_id, name)
            );

            CREATE TABLE IF NOT EXISTS {field_options} (
                custom_field_id INTEGER PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS {field_option_values} (
                custom_field_id INTEGER NOT NULL,
                kind TEXT NOT NULL CHECK (kind IN ('option', 'default')),
                position INTEGER NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (custom_field_id, kind, position)
            );

            CREATE TABLE IF NOT EXISTS {field_properties} (
                custom_field_id INTEGER PRIMARY KEY,
                properties TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS {postmeta} (
                meta_id INTEGER PRIMARY KEY AUTOINCREMENT,
                post_id INTEGER NOT NULL,
                meta_key TEXT,
                meta_value TEXT
            );

            CREATE TABLE IF NOT EXISTS {post_meta_index} (
                id INTEGER PRIMARY KEY,
                field_name TEXT NOT NULL,
                group_count INTEGER NOT NULL DEFAULT 1,
                field_count INTEGER NOT NULL DEFAULT 1,
                post_id INTEGER NOT NULL,
                order_id INTEGER NOT NULL DEFAULT 1
            );

            CREATE INDEX IF NOT EXISTS idx_{postmeta}_post_key ON {postmeta}(post_id, meta_key);
            CREATE INDEX IF NOT EXISTS idx_{post_meta_index}_lookup
                ON {post_meta_index}(post_id, field_name, group_count, field_count);
            CREATE INDEX IF NOT EXISTS idx_{group_fields}_name ON {group_fields}(name);
            "#,
            panels = t.panels,
            panel_groups = t.panel_groups,
            group_fields = t.group_fields,
            field_options = t.field_options,
            field_option_values = t.field_option_values,
            field_properties = t.field_properties,
            postmeta = t.postmeta,
            post_meta_index = t.post_meta_index,
        );
        self.conn().execute_batch(&sql)?;
        Ok(())
    }

    /// Number of rows in a table. Used by callers checking for orphans.
    pub fn row_count(&self, table: &str) -> Result<i64> {
        let count = self
            .conn()
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(count)
    }
}
