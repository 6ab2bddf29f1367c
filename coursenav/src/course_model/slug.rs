//! Slug generation and heading title cleanup

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// `Section 1:`, `Module 2 -`, `Lesson 1.1:`, `Part IV.`, or a bare `3.` / `2.1)` prefix
static NUMBERING_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:(?:section|module|chapter|part|unit|lesson|step)\s+(?:\d+(?:\.\d+)*|[ivxlc]+)\b\s*[:.)\-–—]?|\d+(?:\.\d+)*\s*[:.)\-–—])\s*",
    )
    .expect("numbering prefix pattern is valid")
});

/// Generate a URL-safe slug from a title
///
/// Lowercases, collapses every run of non-alphanumeric characters into a
/// single hyphen and trims leading/trailing hyphens.
///
/// # Examples
/// * `"Getting Started"` -> `"getting-started"`
/// * `"  HTML & CSS: Basics!  "` -> `"html-css-basics"`
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Remove a leading numbering prefix from a heading title
///
/// Returns the title unchanged when stripping would leave nothing.
pub fn strip_numbering(title: &str) -> &str {
    let trimmed = title.trim();
    match NUMBERING_PREFIX.find(trimmed) {
        Some(m) if m.end() < trimmed.len() => trimmed[m.end()..].trim(),
        _ => trimmed,
    }
}

/// Hands out slugs that are unique within one scope
///
/// A repeated slug receives a numeric suffix (`intro`, `intro-2`, `intro-3`).
/// Titles without any alphanumeric characters fall back to `{fallback}`.
#[derive(Debug, Default)]
pub struct SlugRegistry {
    taken: HashSet<String>,
}

impl SlugRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a unique slug for `title`
    pub fn claim(&mut self, title: &str, fallback: &str) -> String {
        let base = match slugify(title) {
            slug if slug.is_empty() => fallback.to_string(),
            slug => slug,
        };

        let mut candidate = base.clone();
        let mut suffix = 2;
        while self.taken.contains(&candidate) {
            candidate = format!("{}-{}", base, suffix);
            suffix += 1;
        }

        self.taken.insert(candidate.clone());
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Getting Started", "getting-started")]
    #[case("  HTML & CSS: Basics!  ", "html-css-basics")]
    #[case("Setup Development Environment", "setup-development-environment")]
    #[case("--Already--Hyphenated--", "already-hyphenated")]
    #[case("Café Menu 2", "caf-menu-2")]
    #[case("!!!", "")]
    fn test_slugify(#[case] title: &str, #[case] expected: &str) {
        assert_eq!(slugify(title), expected);
    }

    #[rstest]
    #[case("Section 1: Getting Started", "Getting Started")]
    #[case("Module 2 - Styling", "Styling")]
    #[case("Lesson 1.1: Setup Development Environment", "Setup Development Environment")]
    #[case("3. Forms", "Forms")]
    #[case("Part IV. Deployment", "Deployment")]
    #[case("HTML5 Semantics", "HTML5 Semantics")]
    #[case("Section 1:", "Section 1:")]
    fn test_strip_numbering(#[case] title: &str, #[case] expected: &str) {
        assert_eq!(strip_numbering(title), expected);
    }

    #[test]
    fn test_registry_suffixes_duplicates() {
        // Arrange: A registry for one scope
        let mut registry = SlugRegistry::new();

        // Act: Claim the same title three times
        let first = registry.claim("Intro", "lesson-1");
        let second = registry.claim("Intro", "lesson-2");
        let third = registry.claim("intro!", "lesson-3");

        // Assert: Later claims get numeric suffixes
        assert_eq!(first, "intro");
        assert_eq!(second, "intro-2");
        assert_eq!(third, "intro-3");
    }

    #[test]
    fn test_registry_uses_fallback_for_symbol_titles() {
        let mut registry = SlugRegistry::new();
        assert_eq!(registry.claim("???", "module-4"), "module-4");
    }
}
