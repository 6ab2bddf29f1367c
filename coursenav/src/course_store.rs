//! Course data store
//!
//! Holds the one authoritative module list. Initialization runs
//! load -> parse -> validate -> adopt, and this is the only place that
//! decides to fall back to the built-in sample course.

use crate::course_model::{
    parse_duration_minutes, BlockKind, CalloutKind, CourseParseError, CourseParser, Lesson,
    Module, ParsedCourse, ParserOptions,
};
use crate::sample_data::{sample_modules, SAMPLE_DESCRIPTION, SAMPLE_TITLE};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that prevent a course document from being adopted
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read course document {path}: {source}", path = .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse course document: {0}")]
    Parse(#[from] CourseParseError),

    #[error("course failed validation: {}", .errors.join("; "))]
    Invalid { errors: Vec<String> },
}

/// Supplies the course markdown
pub trait CourseSource {
    fn load(&self) -> Result<String, LoadError>;

    /// Human readable origin, for log messages
    fn describe(&self) -> String;
}

/// Reads the course from a file on every load
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CourseSource for FileSource {
    fn load(&self) -> Result<String, LoadError> {
        fs::read_to_string(&self.path).map_err(|source| LoadError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Serves a fixed markdown string
#[derive(Debug, Clone)]
pub struct StaticSource {
    markdown: String,
}

impl StaticSource {
    pub fn new(markdown: impl Into<String>) -> Self {
        Self {
            markdown: markdown.into(),
        }
    }
}

impl CourseSource for StaticSource {
    fn load(&self) -> Result<String, LoadError> {
        Ok(self.markdown.clone())
    }

    fn describe(&self) -> String {
        format!("in-memory document ({} bytes)", self.markdown.len())
    }
}

/// What `initialize` / `refresh` ended up adopting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    /// The course document was adopted; warnings are from validation
    Loaded { warnings: Vec<String> },
    /// The sample course was adopted instead
    Fallback { reason: String },
}

impl InitOutcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self, InitOutcome::Fallback { .. })
    }
}

/// Aggregate counts over the current course
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseStats {
    pub module_count: usize,
    pub lesson_count: usize,
    pub content_block_count: usize,
    pub code_block_count: usize,
    pub callout_count: usize,
    pub video_script_count: usize,
    pub slide_deck_count: usize,
    /// Sum of every lesson's parseable estimated time
    pub total_minutes: u32,
}

/// Owner of the authoritative module list
pub struct CourseStore {
    source: Box<dyn CourseSource>,
    options: ParserOptions,
    title: String,
    description: String,
    modules: Vec<Module>,
    outcome: Option<InitOutcome>,
}

impl CourseStore {
    /// Create an empty store; call `initialize` before reading modules
    pub fn new(source: impl CourseSource + 'static, options: ParserOptions) -> Self {
        Self {
            source: Box::new(source),
            options,
            title: String::new(),
            description: String::new(),
            modules: Vec::new(),
            outcome: None,
        }
    }

    /// Load, parse and validate the course, falling back to the sample course
    ///
    /// Always leaves a non-empty, valid module list in place.
    pub fn initialize(&mut self) -> InitOutcome {
        let outcome = match self.load_course() {
            Ok((course, warnings)) => {
                log::info!(
                    "Loaded course '{}' from {}: {} modules, {} lessons",
                    course.title,
                    self.source.describe(),
                    course.modules.len(),
                    course.lesson_count()
                );
                for warning in &warnings {
                    log::warn!("{}", warning);
                }
                self.title = course.title;
                self.description = course.description;
                self.modules = course.modules;
                InitOutcome::Loaded { warnings }
            }
            Err(e) => {
                log::warn!(
                    "Using the sample course, {} could not be adopted: {}",
                    self.source.describe(),
                    e
                );
                self.title = SAMPLE_TITLE.to_string();
                self.description = SAMPLE_DESCRIPTION.to_string();
                self.modules = sample_modules();
                InitOutcome::Fallback {
                    reason: e.to_string(),
                }
            }
        };

        self.outcome = Some(outcome.clone());
        outcome
    }

    /// Repeat the initialization sequence; the newest result wins
    pub fn refresh(&mut self) -> InitOutcome {
        log::debug!("Refreshing course from {}", self.source.describe());
        self.initialize()
    }

    /// Load, parse and validate without adopting anything
    pub fn load_course(&self) -> Result<(ParsedCourse, Vec<String>), LoadError> {
        let markdown = self.source.load()?;
        let course = CourseParser::parse(&markdown, self.options)?;
        let validation = course.validate();
        if !validation.is_valid {
            return Err(LoadError::Invalid {
                errors: validation.errors,
            });
        }
        Ok((course, validation.warnings))
    }

    /// Outcome of the last `initialize` / `refresh`
    pub fn outcome(&self) -> Option<&InitOutcome> {
        self.outcome.as_ref()
    }

    pub fn is_fallback(&self) -> bool {
        self.outcome.as_ref().is_some_and(InitOutcome::is_fallback)
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// Replace the module list, bypassing the source
    pub fn set_modules(&mut self, modules: Vec<Module>) {
        log::debug!("Module list replaced ({} modules)", modules.len());
        self.modules = modules;
    }

    pub fn course_title(&self) -> &str {
        &self.title
    }

    pub fn course_description(&self) -> &str {
        &self.description
    }

    pub fn module(&self, id: u32) -> Option<&Module> {
        self.modules.iter().find(|module| module.id == id)
    }

    pub fn module_by_slug(&self, slug: &str) -> Option<&Module> {
        self.modules.iter().find(|module| module.slug == slug)
    }

    pub fn lesson(&self, id: u32) -> Option<&Lesson> {
        self.modules
            .iter()
            .flat_map(|module| &module.lessons)
            .find(|lesson| lesson.id == id)
    }

    pub fn lesson_by_slug(&self, module_id: u32, slug: &str) -> Option<&Lesson> {
        self.module(module_id)?.lesson_by_slug(slug)
    }

    pub fn course_stats(&self) -> CourseStats {
        let lessons = || self.modules.iter().flat_map(|module| &module.lessons);

        CourseStats {
            module_count: self.modules.len(),
            lesson_count: lessons().count(),
            content_block_count: lessons().map(|lesson| lesson.content.len()).sum(),
            code_block_count: lessons()
                .map(|lesson| lesson.count_blocks(BlockKind::Code))
                .sum(),
            callout_count: lessons()
                .map(|lesson| lesson.count_blocks(BlockKind::Callout))
                .sum(),
            video_script_count: lessons()
                .map(|lesson| lesson.count_callouts(CalloutKind::VideoScript))
                .sum(),
            slide_deck_count: lessons()
                .map(|lesson| lesson.count_callouts(CalloutKind::SlideDeck))
                .sum(),
            total_minutes: lessons()
                .filter_map(|lesson| parse_duration_minutes(&lesson.estimated_time))
                .fold(0, u32::saturating_add),
        }
    }
}

impl std::fmt::Debug for CourseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CourseStore")
            .field("source", &self.source.describe())
            .field("title", &self.title)
            .field("modules", &self.modules.len())
            .field("outcome", &self.outcome)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const COURSE: &str = "# Tiny Course\n\nLearn one thing.\n\n## Basics\n\nThe basics.\n\n### First Steps\n\n**Estimated Time:** 20 minutes\n**Tools:** Git\n\nDo the thing.\n";

    #[test]
    fn test_initialize_adopts_parsed_course() {
        // Arrange: Store over a valid document
        let mut store = CourseStore::new(StaticSource::new(COURSE), ParserOptions::default());

        // Act: Initialize
        let outcome = store.initialize();

        // Assert: Parsed modules adopted
        assert_eq!(outcome, InitOutcome::Loaded { warnings: vec![] });
        assert_eq!(store.course_title(), "Tiny Course");
        assert_eq!(store.modules().len(), 1);
        assert!(!store.is_fallback());
    }

    #[test]
    fn test_empty_document_falls_back_to_sample() {
        let mut store = CourseStore::new(StaticSource::new(""), ParserOptions::default());

        let outcome = store.initialize();

        assert!(outcome.is_fallback());
        assert_eq!(store.modules().len(), 3);
        assert_eq!(store.course_title(), SAMPLE_TITLE);
    }

    #[test]
    fn test_invalid_course_falls_back() {
        // Arrange: A module without lessons fails validation
        let markdown = "# Course\n\n## Lonely Module\n\nNo lessons here.\n";
        let mut store = CourseStore::new(StaticSource::new(markdown), ParserOptions::default());

        // Act: Initialize
        let outcome = store.initialize();

        // Assert: Reason mentions validation
        match outcome {
            InitOutcome::Fallback { reason } => assert!(reason.contains("has no lessons")),
            other => panic!("expected fallback, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_falls_back() {
        let temp = TempDir::new().unwrap();
        let mut store = CourseStore::new(
            FileSource::new(temp.path().join("Course.md")),
            ParserOptions::default(),
        );

        assert!(store.initialize().is_fallback());
        assert!(matches!(store.load_course(), Err(LoadError::Io { .. })));
    }

    #[test]
    fn test_refresh_picks_up_file_changes() {
        // Arrange: Start from a broken file
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("Course.md");
        fs::write(&path, "").unwrap();
        let mut store = CourseStore::new(FileSource::new(&path), ParserOptions::default());
        assert!(store.initialize().is_fallback());

        // Act: Fix the file and refresh
        fs::write(&path, COURSE).unwrap();
        let outcome = store.refresh();

        // Assert: Latest result wins
        assert!(!outcome.is_fallback());
        assert_eq!(store.modules()[0].title, "Basics");
    }

    #[test]
    fn test_accessors() {
        let mut store = CourseStore::new(StaticSource::new(""), ParserOptions::default());
        store.initialize();

        assert_eq!(store.module(2).map(|m| m.slug.as_str()), Some("html-fundamentals"));
        assert_eq!(store.module_by_slug("css-styling").map(|m| m.id), Some(3));
        assert_eq!(store.lesson(4).map(|l| l.slug.as_str()), Some("links-and-forms"));
        assert_eq!(
            store.lesson_by_slug(1, "setup-development-environment").map(|l| l.id),
            Some(1)
        );
        assert!(store.lesson_by_slug(2, "setup-development-environment").is_none());
        assert!(store.module(99).is_none());
    }

    #[test]
    fn test_course_stats() {
        let mut store = CourseStore::new(StaticSource::new(""), ParserOptions::default());
        store.initialize();

        let stats = store.course_stats();

        assert_eq!(stats.module_count, 3);
        assert_eq!(stats.lesson_count, 6);
        assert_eq!(stats.code_block_count, 6);
        assert_eq!(stats.callout_count, 5);
        assert_eq!(stats.video_script_count, 1);
        assert_eq!(stats.slide_deck_count, 0);
        assert_eq!(stats.total_minutes, 30 + 45 + 60 + 60 + 60 + 90);
    }

    #[test]
    fn test_course_stats_skip_oversized_estimates() {
        // Arrange: Sample modules with two lessons claiming absurd durations
        let mut store = CourseStore::new(StaticSource::new(""), ParserOptions::default());
        store.initialize();
        let mut modules = store.modules().to_vec();
        modules[0].lessons[0].estimated_time = "99999999 hours".to_string();
        modules[0].lessons[1].estimated_time = "99999999 hours".to_string();
        store.set_modules(modules);

        // Act: Compute statistics
        let stats = store.course_stats();

        // Assert: Only the sane estimates are summed
        assert_eq!(stats.total_minutes, 60 + 60 + 60 + 90);
    }

    #[test]
    fn test_set_modules_overrides() {
        let mut store = CourseStore::new(StaticSource::new(""), ParserOptions::default());
        store.initialize();

        store.set_modules(sample_modules().into_iter().take(1).collect());

        assert_eq!(store.modules().len(), 1);
    }
}
