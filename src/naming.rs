//! Album identifier derivation.
//!
//! Directory names are human-facing ("Paris Trip 2024"); manifest entries,
//! storage keys, and content stub filenames need a URL-safe form. The slug
//! rules match what the published site already links to, so they must not
//! change shape between runs:
//!
//! - lowercase
//! - keep alphanumerics, underscore, whitespace, and hyphens; drop the rest
//! - collapse runs of whitespace/hyphens into a single hyphen
//! - strip leading and trailing hyphens
//!
//! Two differently named directories can slugify identically ("Paris!" and
//! "Paris"); the reconciler resolves that collision last-write-wins.

/// Convert an album directory name to a URL-safe identifier.
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();

    let mut slug = String::with_capacity(lowered.len());
    let mut pending_hyphen = false;
    for c in lowered.chars() {
        if c.is_alphanumeric() || c == '_' {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else if c.is_whitespace() || c == '-' {
            pending_hyphen = true;
        }
        // Anything else (punctuation, symbols) is dropped without
        // introducing a separator.
    }
    slug
}
