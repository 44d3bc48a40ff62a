//! Static registry of custom field types.
//!
//! Every field definition stores a numeric type id. The registry maps that id
//! to the type's name and to the flags that decide whether the field carries
//! an options list, a property map, or multiple default values.

use serde::Serialize;

/// Metadata for one field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldType {
    pub id: i64,
    pub name: &'static str,
    /// Field keeps a list of selectable options plus default value(s).
    pub has_options: bool,
    /// Field keeps an extra property map (size, format, constraints...).
    pub has_properties: bool,
    /// More than one default value may be selected.
    pub allow_multiple_values: bool,
}

/// The built-in field types, addressable by variant instead of raw id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Textbox,
    MultilineTextbox,
    Checkbox,
    CheckboxList,
    RadiobuttonList,
    DropdownList,
    Listbox,
    File,
    Image,
    Date,
    Audio,
    ColorPicker,
    Slider,
    RelatedType,
    MarkdownTextbox,
    ImageMedia,
}

const fn field_type(
    id: i64,
    name: &'static str,
    has_options: bool,
    has_properties: bool,
    allow_multiple_values: bool,
) -> FieldType {
    FieldType {
        id,
        name,
        has_options,
        has_properties,
        allow_multiple_values,
    }
}

static FIELD_TYPES: [FieldType; 16] = [
    field_type(1, "Textbox", false, true, false),
    field_type(2, "Multiline Textbox", false, true, false),
    field_type(3, "Checkbox", false, false, false),
    field_type(4, "Checkbox List", true, false, true),
    field_type(5, "Radiobutton List", true, false, false),
    field_type(6, "Dropdown List", true, false, false),
    field_type(7, "Listbox", true, true, true),
    field_type(8, "File", false, false, false),
    field_type(9, "Image", false, true, false),
    field_type(10, "Date", false, true, false),
    field_type(11, "Audio", false, false, false),
    field_type(12, "Color Picker", false, false, false),
    field_type(13, "Slider", false, true, false),
    field_type(14, "Related Type", false, true, false),
    field_type(15, "Markdown Textbox", false, true, false),
    field_type(16, "Image (Media)", false, true, false),
];

const ALL_KINDS: [FieldKind; 16] = [
    FieldKind::Textbox,
    FieldKind::MultilineTextbox,
    FieldKind::Checkbox,
    FieldKind::CheckboxList,
    FieldKind::RadiobuttonList,
    FieldKind::DropdownList,
    FieldKind::Listbox,
    FieldKind::File,
    FieldKind::Image,
    FieldKind::Date,
    FieldKind::Audio,
    FieldKind::ColorPicker,
    FieldKind::Slider,
    FieldKind::RelatedType,
    FieldKind::MarkdownTextbox,
    FieldKind::ImageMedia,
];

impl FieldKind {
    /// Numeric id stored in the field definition row.
    pub fn id(self) -> i64 {
        match self {
            FieldKind::Textbox => 1,
            FieldKind::MultilineTextbox => 2,
            FieldKind::Checkbox => 3,
            FieldKind::CheckboxList => 4,
            FieldKind::RadiobuttonList => 5,
            FieldKind::DropdownList => 6,
            FieldKind::Listbox => 7,
            FieldKind::File => 8,
            FieldKind::Image => 9,
            FieldKind::Date => 10,
            FieldKind::Audio => 11,
            FieldKind::ColorPicker => 12,
            FieldKind::Slider => 13,
            FieldKind::RelatedType => 14,
            FieldKind::MarkdownTextbox => 15,
            FieldKind::ImageMedia => 16,
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        ALL_KINDS.iter().copied().find(|k| k.id() == id)
    }

    /// Snake-case key, e.g. `checkbox_list`.
    pub fn key(self) -> &'static str {
        match self {
            FieldKind::Textbox => "textbox",
            FieldKind::MultilineTextbox => "multiline_textbox",
            FieldKind::Checkbox => "checkbox",
            FieldKind::CheckboxList => "checkbox_list",
            FieldKind::RadiobuttonList => "radiobutton_list",
            FieldKind::DropdownList => "dropdown_list",
            FieldKind::Listbox => "listbox",
            FieldKind::File => "file",
            FieldKind::Image => "image",
            FieldKind::Date => "date",
            FieldKind::Audio => "audio",
            FieldKind::ColorPicker => "color_picker",
            FieldKind::Slider => "slider",
            FieldKind::RelatedType => "related_type",
            FieldKind::MarkdownTextbox => "markdown_textbox",
            FieldKind::ImageMedia => "image_media",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        ALL_KINDS.iter().copied().find(|k| k.key() == key)
    }

    pub fn field_type(self) -> &'static FieldType {
        // ids are 1-based and dense
        &FIELD_TYPES[(self.id() - 1) as usize]
    }

    /// Stored values of this kind are lists rather than plain text.
    pub fn stores_list(self) -> bool {
        matches!(self, FieldKind::CheckboxList | FieldKind::Listbox)
    }

    /// Property maps of this kind are surfaced by name lookups.
    pub fn exposes_properties_by_name(self) -> bool {
        matches!(self, FieldKind::Date | FieldKind::Image)
    }
}

/// All registered field types, ordered by id.
pub fn field_types() -> &'static [FieldType] {
    &FIELD_TYPES
}

/// Look up a single field type. Returns `None` for ids outside the registry.
pub fn lookup(id: i64) -> Option<&'static FieldType> {
    FieldKind::from_id(id).map(FieldKind::field_type)
}

/// Resolve either a numeric id or a snake-case key such as `dropdown_list`.
pub fn resolve(id_or_key: &str) -> Option<&'static FieldType> {
    match id_or_key.trim().parse::<i64>() {
        Ok(id) => lookup(id),
        Err(_) => FieldKind::from_key(id_or_key.trim()).map(FieldKind::field_type),
    }
}
