//! Structural validation of a parsed module tree
//!
//! Validation never fails: problems are reported through
//! [`ValidationResult`] and callers decide whether to adopt the data.

use super::Module;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Outcome of validating one module or a whole course
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// True when `errors` is empty
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl ValidationResult {
    fn error(&mut self, message: String) {
        self.errors.push(message);
        self.is_valid = false;
    }

    fn warning(&mut self, message: String) {
        self.warnings.push(message);
    }

    /// Fold another result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        self.is_valid &= other.is_valid;
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// Validate a single module and its lessons
pub fn validate_module(module: &Module) -> ValidationResult {
    let mut result = ValidationResult::default();
    let name = display_title(&module.title, module.id, "Module");

    if module.title.trim().is_empty() {
        result.error(format!("Module {} has an empty title", module.id));
    }
    if module.lessons.is_empty() {
        result.error(format!("{} has no lessons", name));
    }
    if module.description.trim().is_empty() {
        result.warning(format!("{} has no description", name));
    }

    let mut slugs = HashSet::new();
    for (index, lesson) in module.lessons.iter().enumerate() {
        let lesson_name = format!(
            "{} in {}",
            display_title(&lesson.title, lesson.id, "Lesson"),
            name
        );

        if lesson.title.trim().is_empty() {
            result.error(format!(
                "Lesson {} in {} has an empty title",
                lesson.id, name
            ));
        }
        if lesson.module_id != module.id {
            result.error(format!(
                "{} belongs to module {} but is listed under module {}",
                lesson_name, lesson.module_id, module.id
            ));
        }
        if !slugs.insert(lesson.slug.as_str()) {
            result.error(format!(
                "{} reuses the slug '{}'",
                lesson_name, lesson.slug
            ));
        }
        if lesson.order != index as u32 + 1 {
            result.warning(format!(
                "{} has order {} but is at position {}",
                lesson_name,
                lesson.order,
                index + 1
            ));
        }

        if lesson.content.is_empty() {
            result.warning(format!("{} has no content", lesson_name));
        }
        if lesson.estimated_time.trim().is_empty() {
            result.warning(format!("{} has no estimated time", lesson_name));
        }
        if lesson.tools.is_empty() {
            result.warning(format!("{} lists no tools", lesson_name));
        }
    }

    result
}

/// Validate a whole course
///
/// An empty module list is an error. Otherwise the per-module results are
/// concatenated, plus course-wide checks on module slugs and ordering.
pub fn validate_modules(modules: &[Module]) -> ValidationResult {
    let mut result = ValidationResult::default();

    if modules.is_empty() {
        result.error("Course has no modules".to_string());
        return result;
    }

    let mut slugs = HashSet::new();
    for (index, module) in modules.iter().enumerate() {
        let name = display_title(&module.title, module.id, "Module");
        if !slugs.insert(module.slug.as_str()) {
            result.error(format!("{} reuses the slug '{}'", name, module.slug));
        }
        if module.order != index as u32 + 1 {
            result.warning(format!(
                "{} has order {} but is at position {}",
                name,
                module.order,
                index + 1
            ));
        }
        result.merge(validate_module(module));
    }

    log::debug!(
        "Validated {} modules: {} errors, {} warnings",
        modules.len(),
        result.errors.len(),
        result.warnings.len()
    );
    result
}

fn display_title(title: &str, id: u32, kind: &str) -> String {
    if title.trim().is_empty() {
        format!("{} {}", kind, id)
    } else {
        format!("{} '{}'", kind, title)
    }
}
