//! Typed custom fields attached to posts
//!
//! `custom-fields` stores field definitions for a content-management system and
//! reads and writes their values on posts. Everything lives in one SQLite
//! database whose table names share a configurable prefix.
//!
//! # Architecture
//!
//! - **Static type registry**: sixteen field types decide whether a field owns
//!   an options list, a property map, or multiple default values
//! - **Definitions**: one row per field, options stored as ordered rows, properties as JSON
//! - **Post meta**: values live in the native `postmeta` table, with an index
//!   table recording the group and field repetition of each value
//! - **Panels**: a post is edited with one panel; fields in the global panel
//!   are visible on every post
//!
//! ```rust,ignore
//! use custom_fields::{CustomFieldManager, FieldInput, FieldKind, MetaSlot, FieldValue};
//!
//! let manager = CustomFieldManager::in_memory()?;
//! let panel = manager.create_panel("Products")?;
//! let group = manager.create_group(panel.id, "Details", false)?;
//! manager.create(&FieldInput::new(group.id, "price", "Price", FieldKind::Textbox.id()))?;
//! manager.assign_post_to_panel(42, panel.id)?;
//! manager.set_field_value(&MetaSlot::new(42, "price"), &FieldValue::from("9.99"))?;
//! ```

pub mod config;
pub mod db;
pub mod error;
mod lookup;
pub mod manager;
mod panels;
mod post_meta;
pub mod registry;
pub mod sanitize;
pub mod types;
mod values;

pub use config::{DatabaseConfig, FieldsConfig, PanelSettings, UploadConfig};
pub use db::{FieldDatabase, TableNames};
pub use error::{FieldsError, Result};
pub use manager::CustomFieldManager;
pub use registry::{FieldKind, FieldType};
pub use types::{
    CustomField, FieldData, FieldDefinition, FieldInfo, FieldInput, FieldOptions,
    FieldProperties, FieldValue, ListInput, MetaSlot, Panel, PanelGroup, ValueMode,
};
