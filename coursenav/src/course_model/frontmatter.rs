//! Course frontmatter
//!
//! A course document may start with a `+++` delimited TOML block that
//! overrides the title and description discovered from the markdown:
//!
//! ```markdown
//! +++
//! title = "Modern Web Development"
//! description = "From first page to production deploy"
//! +++
//! ```

use serde::Deserialize;

/// Metadata parsed from a course frontmatter block
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CourseFrontmatter {
    /// Course title, wins over the leading h1
    pub title: Option<String>,

    /// Course description, wins over the first paragraph
    pub description: Option<String>,
}

impl CourseFrontmatter {
    /// Parse frontmatter from TOML content
    ///
    /// # Parameters
    /// * `content` - TOML string to parse (without the `+++` delimiters)
    ///
    /// # Returns
    /// * `Ok(CourseFrontmatter)` - Successfully parsed frontmatter
    /// * `Err(toml::de::Error)` - Parse error
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Non-blank title, if any
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// Non-blank description, if any
    pub fn description(&self) -> Option<&str> {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }
}
