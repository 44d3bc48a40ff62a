//! Normalization of user-supplied field text before it is stored.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

static TABLE_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]*$").expect("valid table prefix regex"));

/// HTML-escape text including both quote characters.
pub fn escape_text(text: &str) -> String {
    html_escape::encode_quoted_attribute(text).into_owned()
}

/// Field names are stored escaped, with spaces turned into underscores.
pub fn normalize_field_name(name: &str) -> String {
    escape_text(name).replace(' ', "_")
}

/// Normalize a name used to look values up. Lookups only fold spaces.
pub fn lookup_name(name: &str) -> Cow<'_, str> {
    if name.contains(' ') {
        Cow::Owned(name.replace(' ', "_"))
    } else {
        Cow::Borrowed(name)
    }
}

/// Escape special characters in a CSS class string.
///
/// Quotes, `<`, `>` and `&` are entity-encoded and ASCII control characters
/// become numeric entities.
pub fn sanitize_css(css: &str) -> String {
    let escaped = html_escape::encode_quoted_attribute(css);
    let mut out = String::with_capacity(escaped.len());
    for c in escaped.chars() {
        if (c as u32) < 0x20 {
            out.push_str(&format!("&#{};", c as u32));
        } else {
            out.push(c);
        }
    }
    out
}

/// Table prefixes are spliced into SQL, so they must be plain identifiers.
pub fn is_valid_table_prefix(prefix: &str) -> bool {
    TABLE_PREFIX_RE.is_match(prefix)
}
