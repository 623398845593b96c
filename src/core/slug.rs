//! Slugifier: author-supplied names to identifier keys.

/// Returned by [`slugify`] when the input has no usable characters.
pub const FALLBACK_SLUG: &str = "new-item";

/// Lowercase, trim, and collapse every run of characters outside
/// `[a-z0-9]` into a single hyphen. Returns `None` when nothing usable
/// remains.
pub fn try_slugify(raw: &str) -> Option<String> {
    let mut slug = String::with_capacity(raw.len());
    let mut pending_dash = false;

    for ch in raw.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(ch);
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        None
    } else {
        Some(slug)
    }
}

/// Total variant of [`try_slugify`]: falls back to `"new-item"`.
pub fn slugify(raw: &str) -> String {
    try_slugify(raw).unwrap_or_else(|| FALLBACK_SLUG.to_string())
}
