//! Bridge to the native per-post key/value store and its repetition index.
//!
//! Native rows live in `postmeta`. Values written through the field manager
//! also get an index row in `mf_post_meta`, keyed by the native `meta_id`,
//! which records the group and field repetition indexes of the value.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::db::TableNames;
use crate::error::Result;
use crate::types::MetaSlot;

/// Statements against `postmeta` and `mf_post_meta` over one connection.
///
/// Works with a plain connection or with a transaction, which derefs to one.
pub(crate) struct PostMeta<'c> {
    conn: &'c Connection,
    tables: &'c TableNames,
}

impl<'c> PostMeta<'c> {
    pub(crate) fn new(conn: &'c Connection, tables: &'c TableNames) -> Self {
        Self { conn, tables }
    }

    /// Insert an unindexed native meta row and return its id.
    pub(crate) fn add_meta(&self, post_id: i64, key: &str, value: &str) -> Result<i64> {
        self.conn.execute(
            &format!(
                "INSERT INTO {} (post_id, meta_key, meta_value) VALUES (?1, ?2, ?3)",
                self.tables.postmeta
            ),
            params![post_id, key, value],
        )?;
        let meta_id = self.conn.last_insert_rowid();
        debug!(post_id, key, meta_id, "added post meta");
        Ok(meta_id)
    }

    /// Every value stored under `key` for a post, oldest first.
    pub(crate) fn values_for_key(&self, post_id: i64, key: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT meta_value FROM {} WHERE post_id = ?1 AND meta_key = ?2 ORDER BY meta_id",
            self.tables.postmeta
        ))?;
        let rows = stmt.query_map(params![post_id, key], |row| {
            row.get::<_, Option<String>>(0)
                .map(Option::unwrap_or_default)
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub(crate) fn value_by_id(&self, meta_id: i64) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                &format!(
                    "SELECT meta_value FROM {} WHERE meta_id = ?1",
                    self.tables.postmeta
                ),
                [meta_id],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?;
        Ok(value.map(Option::unwrap_or_default))
    }

    /// Move every native row and index row from `old` to `new`.
    pub(crate) fn rename_key(&self, old: &str, new: &str) -> Result<usize> {
        let renamed = self.conn.execute(
            &format!(
                "UPDATE {} SET meta_key = ?1 WHERE meta_key = ?2",
                self.tables.postmeta
            ),
            params![new, old],
        )?;
        self.conn.execute(
            &format!(
                "UPDATE {} SET field_name = ?1 WHERE field_name = ?2",
                self.tables.post_meta_index
            ),
            params![new, old],
        )?;
        debug!(old, new, renamed, "renamed post meta key");
        Ok(renamed)
    }

    /// Resolve a slot to the id of its native meta row.
    pub(crate) fn find_meta_id(&self, slot: &MetaSlot) -> Result<Option<i64>> {
        let id = self
            .conn
            .query_row(
                &format!(
                    "SELECT id FROM {} \
                     WHERE field_name = ?1 AND group_count = ?2 AND field_count = ?3 AND post_id = ?4",
                    self.tables.post_meta_index
                ),
                params![
                    slot.field_name,
                    slot.group_index,
                    slot.field_index,
                    slot.post_id
                ],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// Insert a native row plus its index row for a slot.
    pub(crate) fn insert_indexed(&self, slot: &MetaSlot, value: &str, order_id: i64) -> Result<i64> {
        let meta_id = self.add_meta(slot.post_id, &slot.field_name, value)?;
        self.conn.execute(
            &format!(
                "INSERT INTO {} (id, field_name, group_count, field_count, post_id, order_id) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                self.tables.post_meta_index
            ),
            params![
                meta_id,
                slot.field_name,
                slot.group_index,
                slot.field_index,
                slot.post_id,
                order_id
            ],
        )?;
        Ok(meta_id)
    }

    pub(crate) fn update_value(&self, meta_id: i64, value: &str) -> Result<()> {
        self.conn.execute(
            &format!(
                "UPDATE {} SET meta_value = ?1 WHERE meta_id = ?2",
                self.tables.postmeta
            ),
            params![value, meta_id],
        )?;
        Ok(())
    }

    /// Order id already used by a group instance, if any value exists in it.
    pub(crate) fn group_order(&self, post_id: i64, field_name: &str, group_index: i64) -> Result<Option<i64>> {
        let order = self
            .conn
            .query_row(
                &format!(
                    "SELECT MIN(order_id) FROM {} \
                     WHERE post_id = ?1 AND field_name = ?2 AND group_count = ?3",
                    self.tables.post_meta_index
                ),
                params![post_id, field_name, group_index],
                |row| row.get::<_, Option<i64>>(0),
            )?;
        Ok(order)
    }

    /// Remove every native and index row of a field on a post.
    pub(crate) fn delete_field(&self, post_id: i64, field_name: &str) -> Result<usize> {
        self.conn.execute(
            &format!(
                "DELETE FROM {} WHERE post_id = ?1 AND field_name = ?2",
                self.tables.post_meta_index
            ),
            params![post_id, field_name],
        )?;
        let deleted = self.conn.execute(
            &format!(
                "DELETE FROM {} WHERE post_id = ?1 AND meta_key = ?2",
                self.tables.postmeta
            ),
            params![post_id, field_name],
        )?;
        debug!(post_id, field_name, deleted, "deleted post meta");
        Ok(deleted)
    }
}
