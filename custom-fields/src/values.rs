//! Reading and writing field values on posts.
//!
//! A value is addressed by a [`MetaSlot`]: post, field name, group index and
//! field index. Indexed values are found through `mf_post_meta`; values
//! written before the index existed are read straight from `postmeta` by key.

use rusqlite::params;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::manager::CustomFieldManager;
use crate::post_meta::PostMeta;
use crate::sanitize::lookup_name;
use crate::types::{validate_index, FieldValue, MetaSlot, ValueMode};

impl CustomFieldManager {
    /// Id of the native meta row holding the value of a slot.
    pub fn get_meta_id(&self, slot: &MetaSlot) -> Result<Option<i64>> {
        slot.validate()?;
        let slot = normalized(slot);
        self.with_conn(|conn, tables| PostMeta::new(conn, tables).find_meta_id(&slot))
    }

    /// Value of a slot.
    ///
    /// Falls back to the legacy key lookup when the slot has no index row.
    /// In single mode a missing value is the empty string; in multiple mode
    /// the legacy path returns every value stored under the key, with values
    /// that hold a JSON list expanded in place.
    pub fn get_custom_field_values(&self, slot: &MetaSlot, mode: ValueMode) -> Result<FieldValue> {
        slot.validate()?;
        let slot = normalized(slot);

        self.with_conn(|conn, tables| {
            let meta = PostMeta::new(conn, tables);
            if let Some(meta_id) = meta.find_meta_id(&slot)? {
                let raw = meta.value_by_id(meta_id)?.unwrap_or_default();
                return Ok(match mode {
                    ValueMode::Single => FieldValue::Text(raw),
                    ValueMode::Multiple => FieldValue::List(decode_stored_list(&raw)),
                });
            }

            debug!(
                post_id = slot.post_id,
                field = %slot.field_name,
                "no indexed value, reading legacy post meta"
            );
            let values = meta.values_for_key(slot.post_id, &slot.field_name)?;
            Ok(match mode {
                ValueMode::Single => {
                    FieldValue::Text(values.into_iter().next().unwrap_or_default())
                }
                ValueMode::Multiple => FieldValue::List(
                    values.into_iter().flat_map(expand_legacy_value).collect(),
                ),
            })
        })
    }

    /// Number of distinct group instances holding a value of the field.
    pub fn get_field_group_duplicates(&self, post_id: i64, field_name: &str) -> Result<i64> {
        let field_name = lookup_name(field_name);
        self.with_conn(|conn, tables| {
            let count = conn.query_row(
                &format!(
                    "SELECT COUNT(DISTINCT group_count) FROM {} WHERE field_name = ?1 AND post_id = ?2",
                    tables.post_meta_index
                ),
                params![field_name, post_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    /// Number of distinct field instances inside one group instance.
    pub fn get_field_duplicates(&self, post_id: i64, field_name: &str, group_index: i64) -> Result<i64> {
        validate_index("group", group_index)?;
        let field_name = lookup_name(field_name);
        self.with_conn(|conn, tables| {
            let count = conn.query_row(
                &format!(
                    "SELECT COUNT(DISTINCT field_count) FROM {} \
                     WHERE field_name = ?1 AND post_id = ?2 AND group_count = ?3",
                    tables.post_meta_index
                ),
                params![field_name, post_id, group_index],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    /// Field indexes present in a group instance, ascending. `[1]` when none.
    pub fn get_fields_order(&self, post_id: i64, field_name: &str, group_index: i64) -> Result<Vec<i64>> {
        validate_index("group", group_index)?;
        let field_name = lookup_name(field_name);
        let order = self.with_conn(|conn, tables| {
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT field_count FROM {} \
                 WHERE field_name = ?1 AND post_id = ?2 AND group_count = ?3 \
                 GROUP BY field_count ORDER BY field_count ASC",
                tables.post_meta_index
            ))?;
            let rows = stmt.query_map(params![field_name, post_id, group_index], |row| row.get(0))?;
            Ok(rows.collect::<rusqlite::Result<Vec<i64>>>()?)
        })?;
        Ok(or_first_index(order))
    }

    /// Group indexes present for the field, in display order. `[1]` when none.
    pub fn get_order_duplicates(&self, post_id: i64, field_name: &str) -> Result<Vec<i64>> {
        let field_name = lookup_name(field_name);
        let order = self.with_conn(|conn, tables| {
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT group_count FROM {} WHERE field_name = ?1 AND post_id = ?2 \
                 GROUP BY group_count ORDER BY MIN(order_id) ASC, group_count ASC",
                tables.post_meta_index
            ))?;
            let rows = stmt.query_map(params![field_name, post_id], |row| row.get(0))?;
            Ok(rows.collect::<rusqlite::Result<Vec<i64>>>()?)
        })?;
        Ok(or_first_index(order))
    }

    /// Store a value in a slot, creating the native and index rows on first
    /// write. Lists are stored as JSON arrays. Returns the meta id.
    ///
    /// A new value joins its group instance's existing order, or takes the
    /// group index as its order when the instance is new.
    pub fn set_field_value(&self, slot: &MetaSlot, value: &FieldValue) -> Result<i64> {
        slot.validate()?;
        let slot = normalized(slot);
        let encoded = value.encode()?;

        let meta_id = self.with_transaction(|conn, tables| {
            let meta = PostMeta::new(conn, tables);
            match meta.find_meta_id(&slot)? {
                Some(meta_id) => {
                    meta.update_value(meta_id, &encoded)?;
                    Ok(meta_id)
                }
                None => {
                    let order = meta
                        .group_order(slot.post_id, &slot.field_name, slot.group_index)?
                        .unwrap_or(slot.group_index);
                    meta.insert_indexed(&slot, &encoded, order)
                }
            }
        })?;

        debug!(
            post_id = slot.post_id,
            field = %slot.field_name,
            group = slot.group_index,
            index = slot.field_index,
            meta_id,
            "stored field value"
        );
        Ok(meta_id)
    }

    /// Set the display order of one group instance of a field.
    pub fn set_group_order(
        &self,
        post_id: i64,
        field_name: &str,
        group_index: i64,
        order_id: i64,
    ) -> Result<usize> {
        validate_index("group", group_index)?;
        let field_name = lookup_name(field_name);
        self.with_conn(|conn, tables| {
            let updated = conn.execute(
                &format!(
                    "UPDATE {} SET order_id = ?1 WHERE post_id = ?2 AND field_name = ?3 AND group_count = ?4",
                    tables.post_meta_index
                ),
                params![order_id, post_id, field_name, group_index],
            )?;
            Ok(updated)
        })
    }

    /// Add a native meta row without an index row, as pre-index data was stored.
    pub fn add_legacy_meta(&self, post_id: i64, key: &str, value: &str) -> Result<i64> {
        self.with_conn(|conn, tables| PostMeta::new(conn, tables).add_meta(post_id, key, value))
    }

    /// Remove every value of a field on a post.
    pub fn delete_field_values(&self, post_id: i64, field_name: &str) -> Result<usize> {
        let field_name = lookup_name(field_name);
        let deleted = self.with_transaction(|conn, tables| {
            PostMeta::new(conn, tables).delete_field(post_id, &field_name)
        })?;
        info!(post_id, field = %field_name, deleted, "deleted field values");
        Ok(deleted)
    }
}

fn normalized(slot: &MetaSlot) -> MetaSlot {
    MetaSlot {
        field_name: lookup_name(&slot.field_name).into_owned(),
        ..slot.clone()
    }
}

fn or_first_index(indexes: Vec<i64>) -> Vec<i64> {
    if indexes.is_empty() {
        vec![1]
    } else {
        indexes
    }
}

/// Legacy values are plain strings unless they hold an encoded list.
fn expand_legacy_value(raw: String) -> Vec<String> {
    match serde_json::from_str::<Vec<String>>(&raw) {
        Ok(items) => items,
        Err(_) => vec![raw],
    }
}

pub(crate) fn decode_stored_list(raw: &str) -> Vec<String> {
    if !raw.is_empty() && serde_json::from_str::<Vec<String>>(raw).is_err() {
        warn!(value = raw, "stored value is not a JSON list, using it as a single item");
    }
    FieldValue::decode_list(raw)
}
