//! Create, read, update and delete field definitions.
//!
//! A definition row always exists for a field. Its options rows exist only
//! when the field's type has options, and its properties row only when the
//! type has properties. Every write keeps that invariant inside a single
//! transaction.

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use crate::config::{FieldsConfig, PanelSettings};
use crate::db::{FieldDatabase, TableNames};
use crate::error::{FieldsError, Result};
use crate::post_meta::PostMeta;
use crate::registry::{self, FieldType};
use crate::sanitize::{escape_text, normalize_field_name, sanitize_css};
use crate::types::{CustomField, FieldDefinition, FieldInput, FieldOptions, FieldProperties};

const OPTION_KIND: &str = "option";
const DEFAULT_KIND: &str = "default";

/// Entry point for every custom field operation.
///
/// ```rust,ignore
/// let manager = CustomFieldManager::in_memory()?;
/// let panel = manager.create_panel("Products")?;
/// let group = manager.create_group(panel.id, "Details", false)?;
/// let id = manager.create(&FieldInput::new(group.id, "price", "Price", 1))?;
/// let field = manager.get(id)?;
/// ```
pub struct CustomFieldManager {
    db: FieldDatabase,
    pub(crate) panels: PanelSettings,
}

impl CustomFieldManager {
    pub fn new(db: FieldDatabase, panels: PanelSettings) -> Self {
        Self { db, panels }
    }

    /// Manager over a fresh in-memory database with default settings.
    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(
            FieldDatabase::open_in_memory()?,
            PanelSettings::default(),
        ))
    }

    pub fn from_config(config: &FieldsConfig) -> Result<Self> {
        Ok(Self::new(
            FieldDatabase::from_config(&config.database)?,
            config.panels.clone(),
        ))
    }

    pub fn database(&self) -> &FieldDatabase {
        &self.db
    }

    pub(crate) fn tables(&self) -> &TableNames {
        self.db.tables()
    }

    /// All registered field types.
    pub fn field_types(&self) -> &'static [FieldType] {
        registry::field_types()
    }

    /// A single field type, or `None` for an id outside the registry.
    pub fn field_type(&self, type_id: i64) -> Option<&'static FieldType> {
        registry::lookup(type_id)
    }

    /// Create a field and return its id.
    ///
    /// Name, label and help text are HTML-escaped; spaces in the name become
    /// underscores. An unknown type id is rejected before anything is written.
    pub fn create(&self, input: &FieldInput) -> Result<i64> {
        let field_type = require_type(input.type_id)?;
        let tables = self.tables();

        let mut conn = self.db.conn();
        let tx = conn.transaction()?;

        let name = normalize_field_name(&input.name);
        tx.execute(
            &format!(
                "INSERT INTO {} (group_id, name, description, display_order, required_field, \
                 type, CSS, duplicate, help_text) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                tables.group_fields
            ),
            params![
                input.group_id,
                name,
                escape_text(&input.label),
                input.display_order,
                input.required,
                input.type_id,
                input.css.as_deref().map(sanitize_css),
                input.duplicate,
                input.help_text.as_deref().map(escape_text),
            ],
        )?;
        let id = tx.last_insert_rowid();

        if field_type.has_options {
            write_options(&tx, tables, id, &input.normalized_options())?;
        }
        if field_type.has_properties {
            write_properties(&tx, tables, id, &input.properties)?;
        }
        tx.commit()?;

        info!(id, name = %name, field_type = field_type.name, "created custom field");
        Ok(id)
    }

    /// Fetch a field with its type, options and properties.
    pub fn get(&self, id: i64) -> Result<CustomField> {
        let conn = self.db.conn();
        load_field(&conn, self.tables(), id)
    }

    /// Replace a field's definition, options and properties.
    ///
    /// When the name changes every post meta row stored under the old name
    /// is moved to the new one. A `None` CSS clears the stored class.
    pub fn update(&self, id: i64, input: &FieldInput) -> Result<()> {
        let field_type = require_type(input.type_id)?;
        let tables = self.tables();

        let mut conn = self.db.conn();
        let tx = conn.transaction()?;

        let old = load_field(&tx, tables, id)?;
        let name = normalize_field_name(&input.name);
        if old.name() != name {
            PostMeta::new(&tx, tables).rename_key(old.name(), &name)?;
        }

        tx.execute(
            &format!(
                "UPDATE {} SET group_id = ?1, name = ?2, description = ?3, display_order = ?4, \
                 required_field = ?5, type = ?6, CSS = ?7, duplicate = ?8, help_text = ?9 \
                 WHERE id = ?10",
                tables.group_fields
            ),
            params![
                input.group_id,
                name,
                escape_text(&input.label),
                input.display_order,
                input.required,
                input.type_id,
                input.css.as_deref().map(sanitize_css),
                input.duplicate,
                input.help_text.as_deref().map(escape_text),
                id,
            ],
        )?;

        if field_type.has_options {
            write_options(&tx, tables, id, &input.normalized_options())?;
        } else {
            delete_options(&tx, tables, id)?;
        }
        if field_type.has_properties {
            write_properties(&tx, tables, id, &input.properties)?;
        } else {
            delete_properties(&tx, tables, id)?;
        }
        tx.commit()?;

        info!(id, name = %name, field_type = field_type.name, "updated custom field");
        Ok(())
    }

    /// Delete a field together with the options and properties its type owns.
    pub fn delete(&self, id: i64) -> Result<()> {
        let tables = self.tables();

        let mut conn = self.db.conn();
        let tx = conn.transaction()?;

        let field = load_field(&tx, tables, id)?;
        tx.execute(
            &format!("DELETE FROM {} WHERE id = ?1", tables.group_fields),
            [id],
        )?;
        if field.field_type.has_options {
            delete_options(&tx, tables, id)?;
        }
        if field.field_type.has_properties {
            delete_properties(&tx, tables, id)?;
        }
        tx.commit()?;

        info!(id, name = %field.name(), "deleted custom field");
        Ok(())
    }

    /// Fields of a group in display order.
    pub fn fields_in_group(&self, group_id: i64) -> Result<Vec<CustomField>> {
        let conn = self.db.conn();
        let tables = self.tables();
        let ids = {
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT id FROM {} WHERE group_id = ?1 ORDER BY display_order, id",
                tables.group_fields
            ))?;
            let rows = stmt.query_map([group_id], |row| row.get::<_, i64>(0))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };
        ids.into_iter()
            .map(|id| load_field(&conn, tables, id))
            .collect()
    }

    pub(crate) fn with_conn<T>(&self, f: impl FnOnce(&Connection, &TableNames) -> Result<T>) -> Result<T> {
        let conn = self.db.conn();
        f(&*conn, self.tables())
    }

    /// Run `f` inside a transaction, committing only when it succeeds.
    pub(crate) fn with_transaction<T>(
        &self,
        f: impl FnOnce(&Connection, &TableNames) -> Result<T>,
    ) -> Result<T> {
        let mut conn = self.db.conn();
        let tx = conn.transaction()?;
        let value = f(&*tx, self.tables())?;
        tx.commit()?;
        Ok(value)
    }
}

fn require_type(type_id: i64) -> Result<&'static FieldType> {
    registry::lookup(type_id).ok_or(FieldsError::UnknownFieldType { id: type_id })
}

fn definition_from_row(row: &Row<'_>) -> rusqlite::Result<FieldDefinition> {
    Ok(FieldDefinition {
        id: row.get(0)?,
        group_id: row.get(1)?,
        name: row.get(2)?,
        label: row.get(3)?,
        help_text: row.get(4)?,
        display_order: row.get(5)?,
        required: row.get(6)?,
        type_id: row.get(7)?,
        css: row.get(8)?,
        duplicate: row.get(9)?,
    })
}

pub(crate) fn load_field(conn: &Connection, tables: &TableNames, id: i64) -> Result<CustomField> {
    let (definition, has_options, properties) = conn
        .query_row(
            &format!(
                "SELECT cf.id, cf.group_id, cf.name, cf.description, cf.help_text, \
                 cf.display_order, cf.required_field, cf.type, cf.CSS, cf.duplicate, \
                 co.custom_field_id IS NOT NULL, cp.properties \
                 FROM {} cf \
                 LEFT JOIN {} co ON co.custom_field_id = cf.id \
                 LEFT JOIN {} cp ON cp.custom_field_id = cf.id \
                 WHERE cf.id = ?1",
                tables.group_fields, tables.field_options, tables.field_properties
            ),
            [id],
            |row| {
                Ok((
                    definition_from_row(row)?,
                    row.get::<_, bool>(10)?,
                    row.get::<_, Option<String>>(11)?,
                ))
            },
        )
        .optional()?
        .ok_or(FieldsError::FieldNotFound { id })?;

    let field_type = *require_type(definition.type_id)?;
    let options = if has_options {
        Some(read_options(conn, tables, id)?)
    } else {
        None
    };
    let properties = properties
        .map(|json| serde_json::from_str::<FieldProperties>(&json))
        .transpose()?;

    debug!(id, "loaded custom field");
    Ok(CustomField {
        definition,
        field_type,
        options,
        properties,
    })
}

fn read_options(conn: &Connection, tables: &TableNames, id: i64) -> Result<FieldOptions> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT kind, value FROM {} WHERE custom_field_id = ?1 ORDER BY kind, position",
        tables.field_option_values
    ))?;
    let rows = stmt.query_map([id], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

    let mut options = FieldOptions::default();
    for row in rows {
        let (kind, value) = row?;
        if kind == DEFAULT_KIND {
            options.default_values.push(value);
        } else {
            options.options.push(value);
        }
    }
    Ok(options)
}

/// Insert or replace the options record of a field.
fn write_options(conn: &Connection, tables: &TableNames, id: i64, options: &FieldOptions) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT OR IGNORE INTO {} (custom_field_id) VALUES (?1)",
            tables.field_options
        ),
        [id],
    )?;
    conn.execute(
        &format!(
            "DELETE FROM {} WHERE custom_field_id = ?1",
            tables.field_option_values
        ),
        [id],
    )?;

    let mut stmt = conn.prepare_cached(&format!(
        "INSERT INTO {} (custom_field_id, kind, position, value) VALUES (?1, ?2, ?3, ?4)",
        tables.field_option_values
    ))?;
    for (kind, values) in [
        (OPTION_KIND, &options.options),
        (DEFAULT_KIND, &options.default_values),
    ] {
        for (position, value) in values.iter().enumerate() {
            stmt.execute(params![id, kind, position as i64, value])?;
        }
    }
    debug!(
        id,
        options = options.options.len(),
        defaults = options.default_values.len(),
        "wrote field options"
    );
    Ok(())
}

fn delete_options(conn: &Connection, tables: &TableNames, id: i64) -> Result<()> {
    conn.execute(
        &format!(
            "DELETE FROM {} WHERE custom_field_id = ?1",
            tables.field_option_values
        ),
        [id],
    )?;
    conn.execute(
        &format!("DELETE FROM {} WHERE custom_field_id = ?1", tables.field_options),
        [id],
    )?;
    Ok(())
}

fn write_properties(
    conn: &Connection,
    tables: &TableNames,
    id: i64,
    properties: &FieldProperties,
) -> Result<()> {
    let json = serde_json::to_string(properties)?;
    conn.execute(
        &format!(
            "INSERT INTO {} (custom_field_id, properties) VALUES (?1, ?2) \
             ON CONFLICT(custom_field_id) DO UPDATE SET properties = excluded.properties",
            tables.field_properties
        ),
        params![id, json],
    )?;
    Ok(())
}

fn delete_properties(conn: &Connection, tables: &TableNames, id: i64) -> Result<()> {
    conn.execute(
        &format!("DELETE FROM {} WHERE custom_field_id = ?1", tables.field_properties),
        [id],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FieldKind;
    use crate::types::{FieldValue, MetaSlot, ValueMode};
    use serde_json::json;
    use test_log::test;

    fn manager() -> CustomFieldManager {
        CustomFieldManager::in_memory().unwrap()
    }

    fn count(manager: &CustomFieldManager, table: &str) -> i64 {
        manager.database().row_count(table).unwrap()
    }

    #[test]
    fn create_list_field_round_trips_options() {
        let m = manager();
        let input = FieldInput::new(1, "colour", "Colour", FieldKind::DropdownList.id())
            .with_options(" Red\nGreen \n\nBlue")
            .with_default_values("Green\n");
        let id = m.create(&input).unwrap();

        let field = m.get(id).unwrap();
        let options = field.options.unwrap();
        assert_eq!(options.options, vec!["Red", "Green", "Blue"]);
        assert_eq!(options.default_values, vec!["Green"]);
        assert!(field.properties.is_none());
        assert_eq!(field.field_type.name, "Dropdown List");
    }

    #[test]
    fn create_escapes_and_normalizes_text() {
        let m = manager();
        let input = FieldInput::new(1, "hero image", "<b>Hero</b>", FieldKind::Image.id())
            .with_help_text("Use \"large\" images")
            .with_css("wide\tcol")
            .with_property("max_height", json!(300));
        let field = m.get(m.create(&input).unwrap()).unwrap();

        assert_eq!(field.name(), "hero_image");
        assert_eq!(field.definition.label, "&lt;b&gt;Hero&lt;/b&gt;");
        assert_eq!(field.definition.help_text.as_deref(), Some("Use &quot;large&quot; images"));
        assert_eq!(field.definition.css.as_deref(), Some("wide&#9;col"));
        assert_eq!(field.properties.unwrap()["max_height"], json!(300));
        assert!(field.options.is_none());
    }

    #[test]
    fn create_rejects_unknown_type() {
        let m = manager();
        let err = m.create(&FieldInput::new(1, "x", "X", 99)).unwrap_err();
        assert!(matches!(err, FieldsError::UnknownFieldType { id: 99 }));
        assert_eq!(count(&m, &m.tables().group_fields.clone()), 0);
    }

    #[test]
    fn duplicate_name_in_group_is_a_database_error() {
        let m = manager();
        m.create(&FieldInput::new(1, "a", "A", 1)).unwrap();
        let err = m.create(&FieldInput::new(1, "a", "A again", 1)).unwrap_err();
        assert!(matches!(err, FieldsError::Database(_)));
        // same name in another group is fine
        m.create(&FieldInput::new(2, "a", "A", 1)).unwrap();
    }

    #[test]
    fn get_missing_field_is_not_found() {
        let err = manager().get(404).unwrap_err();
        assert!(matches!(err, FieldsError::FieldNotFound { id: 404 }));
    }

    #[test]
    fn rows_exist_only_for_flagged_types() {
        let m = manager();
        let t = m.tables().clone();

        m.create(&FieldInput::new(1, "plain", "Plain", FieldKind::Checkbox.id()))
            .unwrap();
        assert_eq!(count(&m, &t.field_options), 0);
        assert_eq!(count(&m, &t.field_properties), 0);

        // listbox has both options and properties, with empty lists
        let id = m
            .create(&FieldInput::new(1, "list", "List", FieldKind::Listbox.id()))
            .unwrap();
        assert_eq!(count(&m, &t.field_options), 1);
        assert_eq!(count(&m, &t.field_properties), 1);
        let field = m.get(id).unwrap();
        assert_eq!(field.options, Some(FieldOptions::default()));
        assert_eq!(field.properties, Some(FieldProperties::new()));
    }

    #[test]
    fn delete_removes_definition_options_and_properties() {
        let m = manager();
        let t = m.tables().clone();
        let listbox = m
            .create(
                &FieldInput::new(1, "sizes", "Sizes", FieldKind::Listbox.id())
                    .with_options(vec!["S", "M", "L"])
                    .with_default_values(vec!["M", "L"])
                    .with_property("size", json!(3)),
            )
            .unwrap();
        let plain = m.create(&FieldInput::new(1, "flag", "Flag", FieldKind::Checkbox.id())).unwrap();

        m.delete(listbox).unwrap();
        assert_eq!(count(&m, &t.field_options), 0);
        assert_eq!(count(&m, &t.field_option_values), 0);
        assert_eq!(count(&m, &t.field_properties), 0);
        assert_eq!(count(&m, &t.group_fields), 1);

        m.delete(plain).unwrap();
        assert_eq!(count(&m, &t.group_fields), 0);
        assert!(matches!(m.delete(plain), Err(FieldsError::FieldNotFound { .. })));
    }

    #[test]
    fn update_renames_post_meta_and_keeps_values() {
        let m = manager();
        let id = m.create(&FieldInput::new(1, "subtitle", "Subtitle", 1)).unwrap();
        m.set_field_value(&MetaSlot::new(5, "subtitle"), &FieldValue::from("Hello"))
            .unwrap();
        m.add_legacy_meta(6, "subtitle", "Old").unwrap();

        m.update(id, &FieldInput::new(1, "tag line", "Tag line", 1)).unwrap();

        assert_eq!(m.get(id).unwrap().name(), "tag_line");
        let slot = MetaSlot::new(5, "tag_line");
        assert_eq!(
            m.get_custom_field_values(&slot, ValueMode::Single).unwrap(),
            FieldValue::from("Hello")
        );
        assert_eq!(
            m.get_custom_field_values(&MetaSlot::new(6, "tag_line"), ValueMode::Multiple)
                .unwrap(),
            FieldValue::from(vec!["Old"])
        );
        assert!(m.get_meta_id(&MetaSlot::new(5, "subtitle")).unwrap().is_none());
    }

    #[test]
    fn update_switches_rows_with_the_type() {
        let m = manager();
        let t = m.tables().clone();
        let id = m
            .create(
                &FieldInput::new(1, "choice", "Choice", FieldKind::RadiobuttonList.id())
                    .with_options("a\nb"),
            )
            .unwrap();

        m.update(
            id,
            &FieldInput::new(1, "choice", "Choice", FieldKind::Date.id())
                .with_property("format", json!("d/m/Y")),
        )
        .unwrap();
        let field = m.get(id).unwrap();
        assert!(field.options.is_none());
        assert_eq!(count(&m, &t.field_option_values), 0);
        assert_eq!(field.properties.unwrap()["format"], json!("d/m/Y"));

        m.update(
            id,
            &FieldInput::new(1, "choice", "Choice", FieldKind::CheckboxList.id())
                .with_options("x\ny\nz")
                .with_default_values("y\nz"),
        )
        .unwrap();
        let field = m.get(id).unwrap();
        assert!(field.properties.is_none());
        assert_eq!(field.options.unwrap().default_values, vec!["y", "z"]);
    }

    #[test]
    fn update_replaces_existing_options_and_properties() {
        let m = manager();
        let t = m.tables().clone();
        let id = m
            .create(
                &FieldInput::new(1, "sizes", "Sizes", FieldKind::Listbox.id())
                    .with_options("a\nb\nc")
                    .with_default_values("b")
                    .with_property("size", json!(3)),
            )
            .unwrap();
        assert_eq!(count(&m, &t.field_option_values), 4);

        m.update(
            id,
            &FieldInput::new(1, "sizes", "Sizes", FieldKind::Listbox.id())
                .with_options("x")
                .with_default_values("x")
                .with_property("size", json!(9)),
        )
        .unwrap();

        let field = m.get(id).unwrap();
        let options = field.options.unwrap();
        assert_eq!(options.options, vec!["x"]);
        assert_eq!(options.default_values, vec!["x"]);
        let properties = field.properties.unwrap();
        assert_eq!(properties.len(), 1);
        assert_eq!(properties["size"], json!(9));

        assert_eq!(count(&m, &t.field_options), 1);
        assert_eq!(count(&m, &t.field_option_values), 2);
        assert_eq!(count(&m, &t.field_properties), 1);
    }

    #[test]
    fn update_without_css_clears_it() {
        let m = manager();
        let id = m
            .create(&FieldInput::new(1, "c", "C", 1).with_css("big"))
            .unwrap();
        m.update(id, &FieldInput::new(1, "c", "C", 1)).unwrap();
        assert!(m.get(id).unwrap().definition.css.is_none());
    }

    #[test]
    fn update_missing_field_writes_nothing() {
        let m = manager();
        let err = m.update(12, &FieldInput::new(1, "c", "C", 1)).unwrap_err();
        assert!(matches!(err, FieldsError::FieldNotFound { id: 12 }));
        assert_eq!(count(&m, &m.tables().group_fields.clone()), 0);
    }

    #[test]
    fn fields_in_group_follow_display_order() {
        let m = manager();
        m.create(&FieldInput::new(3, "second", "Second", 1).with_order(2)).unwrap();
        m.create(&FieldInput::new(3, "first", "First", 1).with_order(1)).unwrap();
        m.create(&FieldInput::new(4, "elsewhere", "Elsewhere", 1)).unwrap();

        let names: Vec<String> = m
            .fields_in_group(3)
            .unwrap()
            .into_iter()
            .map(|f| f.definition.name)
            .collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn field_type_lookup() {
        let m = manager();
        assert_eq!(m.field_types().len(), 16);
        assert_eq!(m.field_type(10).map(|t| t.name), Some("Date"));
        assert!(m.field_type(0).is_none());
    }
}
