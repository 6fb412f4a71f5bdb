use regex::Regex;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

/// Control and format characters other than whitespace
static INVISIBLE: OnceLock<Regex> = OnceLock::new();

/// Runs of whitespace or Unicode separators
static SEPARATORS: OnceLock<Regex> = OnceLock::new();

fn invisible() -> &'static Regex {
    INVISIBLE.get_or_init(|| Regex::new(r"[[\p{Cc}\p{Cf}]&&[^\s]]").expect("valid regex"))
}

fn separators() -> &'static Regex {
    SEPARATORS.get_or_init(|| Regex::new(r"[\s\p{Z}]+").expect("valid regex"))
}

/// Normalize user-entered source text before it is sent to PanLex.
///
/// Strips invisible control/format characters, collapses separator runs to a
/// single space, trims, and composes to NFC. Composition runs last because
/// removing a format character can leave a decomposable sequence behind.
pub fn normalize_text(input: &str) -> String {
    let visible = invisible().replace_all(input, "");
    let collapsed = separators().replace_all(&visible, " ");
    collapsed.trim().nfc().collect()
}

/// Trim a submitted form field, treating an empty result as absent
pub fn trimmed(field: Option<&str>) -> Option<&str> {
    field.map(str::trim).filter(|s| !s.is_empty())
}
