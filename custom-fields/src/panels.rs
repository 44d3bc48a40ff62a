//! Panels, their groups, and which panel a post is edited with.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use crate::db::TableNames;
use crate::error::{FieldsError, Result};
use crate::manager::CustomFieldManager;
use crate::post_meta::PostMeta;
use crate::types::{Panel, PanelGroup};

impl CustomFieldManager {
    pub fn create_panel(&self, name: &str) -> Result<Panel> {
        let id = self.with_conn(|conn, tables| {
            conn.execute(
                &format!("INSERT INTO {} (name) VALUES (?1)", tables.panels),
                [name],
            )?;
            Ok(conn.last_insert_rowid())
        })?;
        info!(id, name, "created panel");
        Ok(Panel {
            id,
            name: name.to_string(),
        })
    }

    pub fn panel(&self, id: i64) -> Result<Panel> {
        self.with_conn(|conn, tables| find_panel(conn, tables, id))
    }

    /// All panels ordered by id.
    pub fn panels(&self) -> Result<Vec<Panel>> {
        self.with_conn(|conn, tables| {
            let mut stmt =
                conn.prepare_cached(&format!("SELECT id, name FROM {} ORDER BY id", tables.panels))?;
            let rows = stmt.query_map([], |row| {
                Ok(Panel {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
    }

    /// Add a group to an existing panel.
    pub fn create_group(&self, panel_id: i64, name: &str, duplicate: bool) -> Result<PanelGroup> {
        let id = self.with_transaction(|conn, tables| {
            find_panel(conn, tables, panel_id)?;
            conn.execute(
                &format!(
                    "INSERT INTO {} (panel_id, name, duplicate) VALUES (?1, ?2, ?3)",
                    tables.panel_groups
                ),
                params![panel_id, name, duplicate],
            )?;
            Ok(conn.last_insert_rowid())
        })?;
        info!(id, panel_id, name, "created group");
        Ok(PanelGroup {
            id,
            panel_id,
            name: name.to_string(),
            duplicate,
        })
    }

    pub fn groups(&self, panel_id: i64) -> Result<Vec<PanelGroup>> {
        self.with_conn(|conn, tables| {
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT id, panel_id, name, duplicate FROM {} WHERE panel_id = ?1 ORDER BY id",
                tables.panel_groups
            ))?;
            let rows = stmt.query_map([panel_id], |row| {
                Ok(PanelGroup {
                    id: row.get(0)?,
                    panel_id: row.get(1)?,
                    name: row.get(2)?,
                    duplicate: row.get(3)?,
                })
            })?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
    }

    /// Edit a post with the given panel, replacing any earlier assignment.
    pub fn assign_post_to_panel(&self, post_id: i64, panel_id: i64) -> Result<()> {
        let key = self.panels.panel_meta_key.as_str();
        self.with_transaction(|conn, tables| {
            find_panel(conn, tables, panel_id)?;
            conn.execute(
                &format!(
                    "DELETE FROM {} WHERE post_id = ?1 AND meta_key = ?2",
                    tables.postmeta
                ),
                params![post_id, key],
            )?;
            PostMeta::new(conn, tables).add_meta(post_id, key, &panel_id.to_string())?;
            Ok(())
        })?;
        info!(post_id, panel_id, "assigned post to panel");
        Ok(())
    }

    /// Panel a post is edited with, if it has been assigned one.
    pub fn panel_for_post(&self, post_id: i64) -> Result<Option<Panel>> {
        let key = self.panels.panel_meta_key.as_str();
        self.with_conn(|conn, tables| {
            let panel = conn
                .query_row(
                    &format!(
                        "SELECT wp.id, wp.name FROM {panels} wp \
                         JOIN {postmeta} pm ON wp.id = CAST(pm.meta_value AS INTEGER) \
                         WHERE pm.post_id = ?1 AND pm.meta_key = ?2 \
                         ORDER BY pm.meta_id DESC LIMIT 1",
                        panels = tables.panels,
                        postmeta = tables.postmeta,
                    ),
                    params![post_id, key],
                    |row| {
                        Ok(Panel {
                            id: row.get(0)?,
                            name: row.get(1)?,
                        })
                    },
                )
                .optional()?;
            Ok(panel)
        })
    }
}

fn find_panel(conn: &Connection, tables: &TableNames, id: i64) -> Result<Panel> {
    conn.query_row(
        &format!("SELECT id, name FROM {} WHERE id = ?1", tables.panels),
        [id],
        |row| {
            Ok(Panel {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        },
    )
    .optional()?
    .ok_or(FieldsError::PanelNotFound { id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldInput, FieldValue, MetaSlot, ValueMode};

    #[test]
    fn panels_and_groups() {
        let m = CustomFieldManager::in_memory().unwrap();
        let panel = m.create_panel("Products").unwrap();
        let group = m.create_group(panel.id, "Gallery", true).unwrap();

        assert_eq!(m.panel(panel.id).unwrap(), panel);
        assert_eq!(m.panels().unwrap(), vec![panel.clone()]);
        assert_eq!(m.groups(panel.id).unwrap(), vec![group.clone()]);
        assert!(group.duplicate);
    }

    #[test]
    fn group_needs_existing_panel() {
        let m = CustomFieldManager::in_memory().unwrap();
        let err = m.create_group(42, "Orphan", false).unwrap_err();
        assert!(matches!(err, FieldsError::PanelNotFound { id: 42 }));
        assert!(matches!(m.panel(42), Err(FieldsError::PanelNotFound { .. })));
    }

    #[test]
    fn duplicate_panel_name_is_rejected() {
        let m = CustomFieldManager::in_memory().unwrap();
        m.create_panel("Products").unwrap();
        assert!(matches!(
            m.create_panel("Products"),
            Err(FieldsError::Database(_))
        ));
    }

    #[test]
    fn reassigning_a_post_replaces_the_panel() {
        let m = CustomFieldManager::in_memory().unwrap();
        let first = m.create_panel("First").unwrap();
        let second = m.create_panel("Second").unwrap();

        assert!(m.panel_for_post(7).unwrap().is_none());
        m.assign_post_to_panel(7, first.id).unwrap();
        m.assign_post_to_panel(7, second.id).unwrap();
        assert_eq!(m.panel_for_post(7).unwrap(), Some(second));

        let stored = m
            .get_custom_field_values(&MetaSlot::new(7, "_mf_write_panel_id"), ValueMode::Multiple)
            .unwrap();
        assert_eq!(stored, FieldValue::List(vec!["2".to_string()]));
    }

    #[test]
    fn assigning_to_missing_panel_fails() {
        let m = CustomFieldManager::in_memory().unwrap();
        assert!(matches!(
            m.assign_post_to_panel(7, 3),
            Err(FieldsError::PanelNotFound { id: 3 })
        ));
    }

    #[test]
    fn group_fields_are_listed_in_order() {
        let m = CustomFieldManager::in_memory().unwrap();
        let panel = m.create_panel("P").unwrap();
        let group = m.create_group(panel.id, "G", false).unwrap();
        m.create(&FieldInput::new(group.id, "b", "B", 1).with_order(2)).unwrap();
        m.create(&FieldInput::new(group.id, "a", "A", 1).with_order(1)).unwrap();

        let fields = m.fields_in_group(group.id).unwrap();
        assert_eq!(fields[0].name(), "a");
        assert_eq!(fields[1].name(), "b");
    }
}
