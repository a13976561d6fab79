//! Slug derivation for portfolio and testimonial titles.

/// Derive a slug from a title.
///
/// Lowercases the title and replaces every space with a hyphen. Nothing else
/// is touched, so `"Villa  Rosa"` becomes `"villa--rosa"`; the backend keys
/// media folders on this exact form.
#[must_use]
pub fn slugify(title: &str) -> String {
    title.to_lowercase().replace(' ', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_lowercases_and_hyphenates() {
        assert_eq!(slugify("Lake House Interior"), "lake-house-interior");
    }

    #[test]
    fn test_slugify_keeps_each_space() {
        assert_eq!(slugify("Villa  Rosa"), "villa--rosa");
    }

    #[test]
    fn test_slugify_leaves_punctuation() {
        assert_eq!(slugify("Café & Bar"), "café-&-bar");
    }
}
