use std::sync::LazyLock;

use regex::Regex;

use crate::error::ValidationError;

pub const MIN_NAME_LENGTH: usize = 3;
pub const MAX_NAME_LENGTH: usize = 50;

/// Suffix carried by every stored transcript file.
pub const FILE_SUFFIX: &str = ".txt";

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)script").expect("valid regex"));
static DISALLOWED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9\s.,-]").expect("valid regex"));

/// Strip tags, the word "script" and anything outside `[A-Za-z0-9\s.,-]`, then trim.
pub fn sanitize_name(raw: &str) -> String {
    let without_tags = TAG_RE.replace_all(raw, "");
    let without_script = SCRIPT_RE.replace_all(&without_tags, "");
    let allowed = DISALLOWED_RE.replace_all(&without_script, "");
    allowed.trim().to_string()
}

/// Sanitize and enforce the length bounds. The result never carries the file suffix.
pub fn validated_name(raw: &str) -> Result<String, ValidationError> {
    let name = sanitize_name(raw);
    let len = name.chars().count();
    if !(MIN_NAME_LENGTH..=MAX_NAME_LENGTH).contains(&len) {
        return Err(ValidationError::InvalidLength {
            len,
            min: MIN_NAME_LENGTH,
            max: MAX_NAME_LENGTH,
        });
    }
    Ok(name)
}

/// Stored name for a file with the given (already sanitized) base name.
pub fn file_name(base: &str) -> String {
    format!("{}{}", base, FILE_SUFFIX)
}

/// Base name of a stored file, as offered for editing on rename.
pub fn file_base_name(name: &str) -> &str {
    name.strip_suffix(FILE_SUFFIX).unwrap_or(name)
}

pub fn names_match(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}
