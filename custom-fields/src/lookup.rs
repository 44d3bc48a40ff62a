//! Resolving fields by name for the post being edited.
//!
//! A field belongs to a group, the group to a panel, and a post is edited with
//! the panel stored under the panel meta key. Fields in groups of the global
//! panel are also visible on every post when reading live data.

use rusqlite::{params, OptionalExtension};
use tracing::debug;

use crate::error::Result;
use crate::manager::CustomFieldManager;
use crate::registry::FieldKind;
use crate::sanitize::lookup_name;
use crate::types::{FieldData, FieldInfo, FieldProperties, FieldValue, MetaSlot};
use crate::values::decode_stored_list;

impl CustomFieldManager {
    /// Metadata of a named field in the panel the post is assigned to.
    ///
    /// Properties are only returned for date and image fields.
    pub fn get_info_by_name(&self, field_name: &str, post_id: i64) -> Result<Option<FieldInfo>> {
        let field_name = lookup_name(field_name);
        let panel_key = self.panels.panel_meta_key.as_str();

        let row = self.with_conn(|conn, tables| {
            let row = conn
                .query_row(
                    &format!(
                        "SELECT cf.id, cf.type, cf.CSS, fp.properties, cf.description \
                         FROM {fields} cf \
                         LEFT JOIN {props} fp ON fp.custom_field_id = cf.id \
                         WHERE cf.name = ?1 \
                         AND cf.group_id IN ( \
                             SELECT mg.id FROM {groups} mg, {postmeta} pm \
                             WHERE mg.panel_id = CAST(pm.meta_value AS INTEGER) \
                             AND pm.meta_key = ?2 AND pm.post_id = ?3) \
                         ORDER BY cf.id LIMIT 1",
                        fields = tables.group_fields,
                        props = tables.field_properties,
                        groups = tables.panel_groups,
                        postmeta = tables.postmeta,
                    ),
                    params![field_name, panel_key, post_id],
                    |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, i64>(1)?,
                            row.get::<_, Option<String>>(2)?,
                            row.get::<_, Option<String>>(3)?,
                            row.get::<_, String>(4)?,
                        ))
                    },
                )
                .optional()?;
            Ok(row)
        })?;

        let Some((id, type_id, css, properties, label)) = row else {
            debug!(field = %field_name, post_id, "field not found for post");
            return Ok(None);
        };

        let properties = match FieldKind::from_id(type_id) {
            Some(kind) if kind.exposes_properties_by_name() => decode_properties(properties)?,
            _ => None,
        };
        Ok(Some(FieldInfo {
            id,
            type_id,
            css,
            label,
            properties,
        }))
    }

    /// Live value and metadata of a field slot on a post.
    ///
    /// The field must belong to the post's panel or to the global panel.
    /// Values of checkbox list and listbox fields are decoded into lists.
    pub fn get_data_field(&self, slot: &MetaSlot) -> Result<Option<FieldData>> {
        slot.validate()?;
        let field_name = lookup_name(&slot.field_name);
        let panel_key = self.panels.panel_meta_key.as_str();
        let global_panel = self.panels.global_panel.as_str();

        let row = self.with_conn(|conn, tables| {
            let row = conn
                .query_row(
                    &format!(
                        "SELECT pm.meta_id, pm.meta_value, cf.id, cf.type, cf.CSS, fp.properties, cf.description \
                         FROM {index} pm_mf \
                         JOIN {postmeta} pm ON pm.meta_id = pm_mf.id \
                         JOIN {fields} cf ON cf.name = pm_mf.field_name \
                         LEFT JOIN {props} fp ON fp.custom_field_id = cf.id \
                         WHERE cf.name = ?1 AND pm_mf.group_count = ?2 AND pm_mf.field_count = ?3 \
                         AND pm_mf.post_id = ?4 \
                         AND (cf.group_id IN ( \
                                 SELECT mg.id FROM {groups} mg, {postmeta} ppm \
                                 WHERE mg.panel_id = CAST(ppm.meta_value AS INTEGER) \
                                 AND ppm.meta_key = ?5 AND ppm.post_id = ?4) \
                              OR cf.group_id IN ( \
                                 SELECT mg.id FROM {groups} mg \
                                 JOIN {panels} wp ON mg.panel_id = wp.id \
                                 WHERE wp.name = ?6)) \
                         ORDER BY cf.id LIMIT 1",
                        index = tables.post_meta_index,
                        postmeta = tables.postmeta,
                        fields = tables.group_fields,
                        props = tables.field_properties,
                        groups = tables.panel_groups,
                        panels = tables.panels,
                    ),
                    params![
                        field_name,
                        slot.group_index,
                        slot.field_index,
                        slot.post_id,
                        panel_key,
                        global_panel
                    ],
                    |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, Option<String>>(1)?,
                            row.get::<_, i64>(2)?,
                            row.get::<_, i64>(3)?,
                            row.get::<_, Option<String>>(4)?,
                            row.get::<_, Option<String>>(5)?,
                            row.get::<_, String>(6)?,
                        ))
                    },
                )
                .optional()?;
            Ok(row)
        })?;

        let Some((meta_id, raw, id, type_id, css, properties, label)) = row else {
            return Ok(None);
        };

        let raw = raw.unwrap_or_default();
        let value = match FieldKind::from_id(type_id) {
            Some(kind) if kind.stores_list() => FieldValue::List(decode_stored_list(&raw)),
            _ => FieldValue::Text(raw),
        };
        Ok(Some(FieldData {
            meta_id,
            value,
            id,
            type_id,
            css,
            label,
            properties: decode_properties(properties)?,
        }))
    }
}

fn decode_properties(json: Option<String>) -> Result<Option<FieldProperties>> {
    Ok(json
        .map(|json| serde_json::from_str::<FieldProperties>(&json))
        .transpose()?)
}
