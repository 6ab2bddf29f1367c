//! Course model for the parsing stage
//!
//! This module defines the module/lesson/content-block tree produced from a
//! course markdown document, the parser that builds it and the validator
//! that checks it before it is adopted by the course store.

use serde::{Deserialize, Serialize};

// Submodules
mod blocks;
mod error;
mod frontmatter;
mod metadata;
mod parser;
mod plain_text;
mod slug;
mod validation;

// Re-export public types
pub use blocks::{media_kind_for, BlockKind, BlockMetadata, CalloutKind, ContentBlock};
pub use error::CourseParseError;
pub use frontmatter::CourseFrontmatter;
pub use metadata::{format_minutes, parse_duration_minutes};
pub use parser::{parse_course, CourseParser, ParserOptions};
pub use plain_text::{markdown_to_plain_text, truncate_words};
pub use slug::{slugify, strip_numbering, SlugRegistry};
pub use validation::{validate_module, validate_modules, ValidationResult};

/// Difficulty of a module
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Complexity {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Complexity {
    /// All levels, easiest first
    pub const ALL: [Complexity; 3] = [
        Complexity::Beginner,
        Complexity::Intermediate,
        Complexity::Advanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Beginner => "Beginner",
            Complexity::Intermediate => "Intermediate",
            Complexity::Advanced => "Advanced",
        }
    }

    /// Recognize a complexity from free text ("beginner", "Advanced level", "intermediate-friendly")
    pub fn from_label(label: &str) -> Option<Self> {
        let lower = label.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| lower.contains(&c.as_str().to_lowercase()))
    }
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Complexity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown complexity '{}'", s))
    }
}

/// A top-level course unit containing an ordered list of lessons
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: u32,
    pub title: String,
    /// Unique across the course
    pub slug: String,
    pub description: String,
    pub estimated_time: String,
    pub complexity: Complexity,
    /// Titles of modules that should be taken first
    pub prerequisites: Vec<String>,
    pub lessons: Vec<Lesson>,
    /// 1-based position in the course
    pub order: u32,
}

impl Module {
    /// Ids of all lessons, in order
    pub fn lesson_ids(&self) -> Vec<u32> {
        self.lessons.iter().map(|lesson| lesson.id).collect()
    }

    pub fn lesson_by_slug(&self, slug: &str) -> Option<&Lesson> {
        self.lessons.iter().find(|lesson| lesson.slug == slug)
    }

    /// Union of the tools used by every lesson, first occurrence wins
    pub fn tools(&self) -> Vec<&str> {
        let mut tools: Vec<&str> = Vec::new();
        for tool in self.lessons.iter().flat_map(|lesson| &lesson.tools) {
            if !tools.iter().any(|t| t.eq_ignore_ascii_case(tool)) {
                tools.push(tool);
            }
        }
        tools
    }
}

/// A single teachable unit containing ordered content blocks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: u32,
    /// Id of the owning module
    pub module_id: u32,
    pub title: String,
    /// Unique within the owning module
    pub slug: String,
    pub description: String,
    pub estimated_time: String,
    pub tools: Vec<String>,
    pub complexity: String,
    pub prerequisites: Vec<String>,
    pub content: Vec<ContentBlock>,
    /// 1-based position within the owning module
    pub order: u32,
}

impl Lesson {
    /// Number of blocks of the given kind
    pub fn count_blocks(&self, kind: BlockKind) -> usize {
        self.content.iter().filter(|block| block.kind == kind).count()
    }

    /// Number of callouts of the given flavour
    pub fn count_callouts(&self, callout: CalloutKind) -> usize {
        self.content
            .iter()
            .filter(|block| block.callout_kind() == Some(callout))
            .count()
    }
}

/// Parser output before validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedCourse {
    pub title: String,
    pub description: String,
    pub modules: Vec<Module>,
}

impl ParsedCourse {
    pub fn lesson_count(&self) -> usize {
        self.modules.iter().map(|module| module.lessons.len()).sum()
    }

    /// Validate the parsed modules
    pub fn validate(&self) -> ValidationResult {
        validate_modules(&self.modules)
    }
}
