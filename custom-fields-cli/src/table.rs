//! Table output helpers.

use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

/// Create a table that wraps to the terminal width.
pub fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Truncate a string to `max` characters, appending "..." if truncated.
pub fn truncate_str(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

/// Render a yes/no column.
pub fn flag(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        ""
    }
}
