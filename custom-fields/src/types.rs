//! Records and inputs for custom fields and their values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{FieldsError, Result};
use crate::registry::FieldType;

/// Extra configuration of a field, e.g. `{"format": "d/m/Y"}` for a date.
pub type FieldProperties = BTreeMap<String, serde_json::Value>;

/// A stored field definition row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldDefinition {
    pub id: i64,
    pub group_id: i64,
    pub name: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    pub display_order: i64,
    pub required: bool,
    pub type_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css: Option<String>,
    /// Field may be repeated inside its group.
    pub duplicate: bool,
}

/// Selectable options and default selection of a list-like field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FieldOptions {
    pub options: Vec<String>,
    pub default_values: Vec<String>,
}

/// A field definition joined with its type, options and properties.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CustomField {
    #[serde(flatten)]
    pub definition: FieldDefinition,
    pub field_type: FieldType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<FieldOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<FieldProperties>,
}

impl CustomField {
    pub fn id(&self) -> i64 {
        self.definition.id
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }
}

/// Option or default-value input: either newline separated text or a list.
#[derive(Debug, Clone, PartialEq)]
pub enum ListInput {
    Text(String),
    List(Vec<String>),
}

impl ListInput {
    /// Trimmed entries in input order. Blank entries are dropped.
    pub fn normalize(&self) -> Vec<String> {
        let entries: Vec<&str> = match self {
            ListInput::Text(text) => text.split('\n').collect(),
            ListInput::List(items) => items.iter().map(String::as_str).collect(),
        };
        entries
            .into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl Default for ListInput {
    fn default() -> Self {
        ListInput::List(Vec::new())
    }
}

impl From<&str> for ListInput {
    fn from(text: &str) -> Self {
        ListInput::Text(text.to_string())
    }
}

impl From<String> for ListInput {
    fn from(text: String) -> Self {
        ListInput::Text(text)
    }
}

impl From<Vec<String>> for ListInput {
    fn from(items: Vec<String>) -> Self {
        ListInput::List(items)
    }
}

impl From<Vec<&str>> for ListInput {
    fn from(items: Vec<&str>) -> Self {
        ListInput::List(items.into_iter().map(str::to_string).collect())
    }
}

/// Everything needed to create or update a field.
///
/// ```rust,ignore
/// let input = FieldInput::new(group_id, "color", "Colour", FieldKind::DropdownList.id())
///     .with_options("Red\nGreen\nBlue")
///     .with_default_values(vec!["Green"]);
/// let id = manager.create(&input)?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInput {
    pub group_id: i64,
    pub name: String,
    pub label: String,
    pub display_order: i64,
    pub required: bool,
    pub type_id: i64,
    pub options: ListInput,
    pub default_values: ListInput,
    pub properties: FieldProperties,
    pub duplicate: bool,
    pub help_text: Option<String>,
    pub css: Option<String>,
}

impl FieldInput {
    pub fn new(
        group_id: i64,
        name: impl Into<String>,
        label: impl Into<String>,
        type_id: i64,
    ) -> Self {
        Self {
            group_id,
            name: name.into(),
            label: label.into(),
            display_order: 1,
            required: false,
            type_id,
            options: ListInput::default(),
            default_values: ListInput::default(),
            properties: FieldProperties::new(),
            duplicate: false,
            help_text: None,
            css: None,
        }
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.display_order = order;
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_options(mut self, options: impl Into<ListInput>) -> Self {
        self.options = options.into();
        self
    }

    pub fn with_default_values(mut self, defaults: impl Into<ListInput>) -> Self {
        self.default_values = defaults.into();
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    pub fn duplicate(mut self, duplicate: bool) -> Self {
        self.duplicate = duplicate;
        self
    }

    pub fn with_help_text(mut self, help: impl Into<String>) -> Self {
        self.help_text = Some(help.into());
        self
    }

    pub fn with_css(mut self, css: impl Into<String>) -> Self {
        self.css = Some(css.into());
        self
    }

    pub(crate) fn normalized_options(&self) -> FieldOptions {
        FieldOptions {
            options: self.options.normalize(),
            default_values: self.default_values.normalize(),
        }
    }
}

/// How a stored value should be returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueMode {
    /// The raw stored string.
    Single,
    /// The decoded list of values.
    Multiple,
}

/// A value stored for a field on a post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    /// Encode for the meta value column. Lists are stored as JSON arrays.
    pub fn encode(&self) -> Result<String> {
        match self {
            FieldValue::Text(text) => Ok(text.clone()),
            FieldValue::List(items) => Ok(serde_json::to_string(items)?),
        }
    }

    /// Decode a stored meta value as a list. Anything that is not a JSON
    /// array of strings is treated as a single-item list.
    pub fn decode_list(raw: &str) -> Vec<String> {
        match serde_json::from_str::<Vec<String>>(raw) {
            Ok(items) => items,
            Err(_) if raw.is_empty() => Vec::new(),
            Err(_) => vec![raw.to_string()],
        }
    }

    /// Text of a single value, `None` for a list.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            FieldValue::List(_) => None,
        }
    }

    /// Items of the value. An empty text is an empty list.
    pub fn into_list(self) -> Vec<String> {
        match self {
            FieldValue::Text(text) if text.is_empty() => Vec::new(),
            FieldValue::Text(text) => vec![text],
            FieldValue::List(items) => items,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(text: &str) -> Self {
        FieldValue::Text(text.to_string())
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(items: Vec<&str>) -> Self {
        FieldValue::List(items.into_iter().map(str::to_string).collect())
    }
}

/// Address of one value: a field on a post, inside a repeated group instance.
///
/// Indexes start at 1; a fresh slot points at the first group and first field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaSlot {
    pub post_id: i64,
    pub field_name: String,
    pub group_index: i64,
    pub field_index: i64,
}

impl MetaSlot {
    pub fn new(post_id: i64, field_name: impl Into<String>) -> Self {
        Self {
            post_id,
            field_name: field_name.into(),
            group_index: 1,
            field_index: 1,
        }
    }

    pub fn group(mut self, index: i64) -> Self {
        self.group_index = index;
        self
    }

    pub fn field(mut self, index: i64) -> Self {
        self.field_index = index;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        validate_index("group", self.group_index)?;
        validate_index("field", self.field_index)
    }
}

pub(crate) fn validate_index(kind: &'static str, index: i64) -> Result<()> {
    if index < 1 {
        return Err(FieldsError::InvalidIndex { kind, index });
    }
    Ok(())
}

/// Field metadata resolved by name for a post.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldInfo {
    pub id: i64,
    pub type_id: i64,
    pub css: Option<String>,
    pub label: String,
    /// Only populated for date and image fields.
    pub properties: Option<FieldProperties>,
}

/// A field's live value on a post together with its metadata.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldData {
    pub meta_id: i64,
    pub value: FieldValue,
    pub id: i64,
    pub type_id: i64,
    pub css: Option<String>,
    pub label: String,
    pub properties: Option<FieldProperties>,
}

/// An edit-screen panel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Panel {
    pub id: i64,
    pub name: String,
}

/// A group of fields inside a panel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PanelGroup {
    pub id: i64,
    pub panel_id: i64,
    pub name: String,
    /// Group may be repeated on a post.
    pub duplicate: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_input_splits_and_trims() {
        let input = ListInput::from("  Red \r\nGreen\n\n Blue\n");
        assert_eq!(input.normalize(), vec!["Red", "Green", "Blue"]);
    }

    #[test]
    fn list_input_trims_and_keeps_order() {
        let input = ListInput::from(vec![" b", "a ", "  ", "c"]);
        assert_eq!(input.normalize(), vec!["b", "a", "c"]);
    }

    #[test]
    fn field_value_encodes_lists_as_json() {
        let value = FieldValue::from(vec!["one", "two"]);
        assert_eq!(value.encode().unwrap(), r#"["one","two"]"#);
        assert_eq!(FieldValue::from("plain").encode().unwrap(), "plain");
    }

    #[test]
    fn decode_list_handles_non_json() {
        assert_eq!(FieldValue::decode_list(r#"["a","b"]"#), vec!["a", "b"]);
        assert_eq!(FieldValue::decode_list("legacy"), vec!["legacy"]);
        assert!(FieldValue::decode_list("").is_empty());
    }

    #[test]
    fn field_value_accessors() {
        let text = FieldValue::from("red");
        assert_eq!(text.as_text(), Some("red"));
        assert_eq!(text.into_list(), vec!["red"]);

        assert!(FieldValue::from("").into_list().is_empty());

        let list = FieldValue::from(vec!["S", "M"]);
        assert_eq!(list.as_text(), None);
        assert_eq!(list.into_list(), vec!["S", "M"]);
    }

    #[test]
    fn meta_slot_defaults_to_first_instance() {
        let slot = MetaSlot::new(7, "price");
        assert_eq!(slot.group_index, 1);
        assert_eq!(slot.field_index, 1);
        assert!(slot.validate().is_ok());
    }

    #[test]
    fn meta_slot_rejects_zero_index() {
        let err = MetaSlot::new(7, "price").group(0).validate().unwrap_err();
        assert!(matches!(err, FieldsError::InvalidIndex { kind: "group", index: 0 }));
        assert!(MetaSlot::new(7, "price").field(-1).validate().is_err());
    }

    #[test]
    fn field_input_builder_defaults() {
        let input = FieldInput::new(3, "title", "Title", 1);
        assert_eq!(input.display_order, 1);
        assert!(!input.required);
        assert!(input.properties.is_empty());
        assert_eq!(input.options, ListInput::List(Vec::new()));
    }
}
