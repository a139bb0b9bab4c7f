/// Parse a length limit; empty strings are treated as unset.
pub fn parse_limit(raw: &str) -> Option<usize> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        trimmed.parse().ok()
    }
}

/// Drop blank values so `FOO=` behaves like an unset variable.
pub fn non_blank(raw: String) -> Option<String> {
    if raw.trim().is_empty() {
        None
    } else {
        Some(raw.trim().to_string())
    }
}
