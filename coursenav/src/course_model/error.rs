//! Error types for course document parsing

use thiserror::Error;

/// Errors that make a course document unusable as a whole
///
/// Anything less severe than these is tolerated by the parser and
/// reported through logging or the validator instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CourseParseError {
    /// The document is empty or whitespace only
    #[error("Course document is empty")]
    EmptyDocument,

    /// No frontmatter title, leading h1 or bold title line was found
    #[error("Course document has no title (expected frontmatter `title`, a leading h1, or a bold title line)")]
    MissingTitle,
}
