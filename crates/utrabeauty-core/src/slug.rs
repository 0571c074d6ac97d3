//! URL slug generation shared by CMS documents and the category catalog.

/// Upper bound on slug length, matching the CMS slug field's default `maxLength`.
pub const MAX_SLUG_LEN: usize = 96;

/// Generate a URL-safe slug.
///
/// ASCII letters and digits are kept (lowercased). Whitespace, `-` and `_`
/// become a single `-` separator. Every other character is dropped without
/// inserting a separator, so `"Uncle Arnie's"` becomes `"uncle-arnies"`.
/// Leading and trailing separators never appear and the result is capped at
/// [`MAX_SLUG_LEN`] bytes.
///
/// Applying `slugify` to its own output returns the same string.
#[must_use]
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len().min(MAX_SLUG_LEN));
    let mut pending_separator = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_separator = true;
        }
    }

    if slug.len() > MAX_SLUG_LEN {
        // Slug is pure ASCII at this point, so byte truncation is char-safe.
        slug.truncate(MAX_SLUG_LEN);
        while slug.ends_with('-') {
            slug.pop();
        }
    }

    slug
}
