//! Full-text search over modules and lessons
//!
//! The index is a flat list with one entry per module and per lesson. Each
//! entry keeps a lowercased body made of title, description, complexity,
//! tools, prerequisites and (for lessons) the plain text of text and callout
//! blocks.
//!
//! Scoring, per whitespace-separated query term:
//!
//! | match                          | points                                   |
//! |--------------------------------|------------------------------------------|
//! | title equals term              | 100                                      |
//! | otherwise title contains term  | 50                                       |
//! | body contains term             | 10, plus 2 per extra occurrence (max 5)  |

use crate::course_model::{markdown_to_plain_text, BlockKind, Complexity, Lesson, Module};
use itertools::Itertools;
use serde::Serialize;

const EXACT_TITLE_SCORE: u32 = 100;
const TITLE_CONTAINS_SCORE: u32 = 50;
const BODY_SCORE: u32 = 10;
const REPEAT_BONUS: u32 = 2;
const MAX_REPEATS: usize = 5;

/// Words of context kept on each side of the first hit
const EXCERPT_WORDS_BEFORE: usize = 6;
const EXCERPT_WORDS_AFTER: usize = 14;

/// Whether a result is a module or a lesson
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchItemKind {
    Module,
    Lesson,
}

/// Restrictions applied before scoring
///
/// Dimensions combine with AND; values within a dimension combine with OR.
/// An empty dimension does not restrict.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    pub complexity: Vec<Complexity>,
    /// Tool names, compared case-insensitively
    pub tools: Vec<String>,
    pub module_ids: Vec<u32>,
}

impl SearchFilters {
    pub fn is_empty(&self) -> bool {
        self.complexity.is_empty() && self.tools.is_empty() && self.module_ids.is_empty()
    }

    fn accepts(&self, entry: &IndexEntry) -> bool {
        let complexity_ok =
            self.complexity.is_empty() || self.complexity.contains(&entry.complexity);
        let tools_ok = self.tools.is_empty()
            || self.tools.iter().any(|wanted| {
                entry
                    .tools
                    .iter()
                    .any(|tool| tool.eq_ignore_ascii_case(wanted.trim()))
            });
        let module_ok = self.module_ids.is_empty() || self.module_ids.contains(&entry.module_id);

        complexity_ok && tools_ok && module_ok
    }
}

/// One ranked hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub kind: SearchItemKind,
    pub title: String,
    pub module_id: u32,
    pub module_slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_slug: Option<String>,
    pub score: u32,
    /// Plain text around the first body hit
    pub excerpt: String,
}

#[derive(Debug, Clone)]
struct IndexEntry {
    kind: SearchItemKind,
    title: String,
    title_lower: String,
    module_id: u32,
    module_slug: String,
    lesson_id: Option<u32>,
    lesson_slug: Option<String>,
    complexity: Complexity,
    tools: Vec<String>,
    /// Readable text used for excerpts
    text: String,
    body_lower: String,
}

/// Searchable snapshot of a course
#[derive(Debug, Clone, Default)]
pub struct SearchEngine {
    entries: Vec<IndexEntry>,
}

impl SearchEngine {
    pub fn new(modules: &[Module]) -> Self {
        let mut engine = Self::default();
        engine.update_index(modules);
        engine
    }

    /// Rebuild the index from a new module list
    pub fn update_index(&mut self, modules: &[Module]) {
        self.entries = modules
            .iter()
            .flat_map(|module| {
                std::iter::once(module_entry(module))
                    .chain(module.lessons.iter().map(|lesson| lesson_entry(module, lesson)))
            })
            .collect();
        log::debug!("Search index rebuilt with {} entries", self.entries.len());
    }

    /// Number of indexed modules and lessons
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rank entries against `query`
    ///
    /// A blank query returns no results. Entries scoring zero are dropped;
    /// equal scores keep index order.
    pub fn search(&self, query: &str, filters: &SearchFilters) -> Vec<SearchResult> {
        let terms: Vec<String> = query
            .split_whitespace()
            .map(str::to_lowercase)
            .unique()
            .collect();
        if terms.is_empty() {
            return Vec::new();
        }

        let mut results: Vec<SearchResult> = self
            .entries
            .iter()
            .filter(|entry| filters.accepts(entry))
            .filter_map(|entry| {
                let score = score_entry(entry, &terms);
                (score > 0).then(|| SearchResult {
                    kind: entry.kind,
                    title: entry.title.clone(),
                    module_id: entry.module_id,
                    module_slug: entry.module_slug.clone(),
                    lesson_id: entry.lesson_id,
                    lesson_slug: entry.lesson_slug.clone(),
                    score,
                    excerpt: excerpt(&entry.text, &terms),
                })
            })
            .collect();

        // sort_by is stable, so ties stay in index order
        results.sort_by(|a, b| b.score.cmp(&a.score));
        log::debug!("Search '{}' matched {} entries", query, results.len());
        results
    }

    /// Titles and tool names containing `query`, deduplicated, at most `limit`
    pub fn suggestions(&self, query: &str, limit: usize) -> Vec<String> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() || limit == 0 {
            return Vec::new();
        }

        self.entries
            .iter()
            .flat_map(|entry| std::iter::once(&entry.title).chain(entry.tools.iter()))
            .filter(|candidate| candidate.to_lowercase().contains(&needle))
            .unique_by(|candidate| candidate.to_lowercase())
            .take(limit)
            .cloned()
            .collect()
    }
}

fn module_entry(module: &Module) -> IndexEntry {
    let tools: Vec<String> = module.tools().into_iter().map(str::to_string).collect();
    let text = format!(
        "{} {} {} {} {}",
        module.title,
        module.description,
        module.complexity,
        tools.join(" "),
        module.prerequisites.join(" ")
    );

    IndexEntry {
        kind: SearchItemKind::Module,
        title: module.title.clone(),
        title_lower: module.title.to_lowercase(),
        module_id: module.id,
        module_slug: module.slug.clone(),
        lesson_id: None,
        lesson_slug: None,
        complexity: module.complexity,
        tools,
        body_lower: text.to_lowercase(),
        text,
    }
}

fn lesson_entry(module: &Module, lesson: &Lesson) -> IndexEntry {
    let content = lesson
        .content
        .iter()
        .filter(|block| matches!(block.kind, BlockKind::Text | BlockKind::Callout))
        .map(|block| markdown_to_plain_text(&block.content))
        .join(" ");
    let text = format!(
        "{} {} {} {} {} {}",
        lesson.title,
        lesson.description,
        lesson.complexity,
        lesson.tools.join(" "),
        lesson.prerequisites.join(" "),
        content
    );

    IndexEntry {
        kind: SearchItemKind::Lesson,
        title: lesson.title.clone(),
        title_lower: lesson.title.to_lowercase(),
        module_id: module.id,
        module_slug: module.slug.clone(),
        lesson_id: Some(lesson.id),
        lesson_slug: Some(lesson.slug.clone()),
        complexity: lesson.complexity.parse().unwrap_or(module.complexity),
        tools: lesson.tools.clone(),
        body_lower: text.to_lowercase(),
        text,
    }
}

fn score_entry(entry: &IndexEntry, terms: &[String]) -> u32 {
    terms
        .iter()
        .map(|term| {
            let title = if entry.title_lower == *term {
                EXACT_TITLE_SCORE
            } else if entry.title_lower.contains(term.as_str()) {
                TITLE_CONTAINS_SCORE
            } else {
                0
            };

            let occurrences = entry.body_lower.matches(term.as_str()).count();
            let body = match occurrences {
                0 => 0,
                n => BODY_SCORE + REPEAT_BONUS * (n - 1).min(MAX_REPEATS) as u32,
            };

            title + body
        })
        .sum()
}

fn excerpt(text: &str, terms: &[String]) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let hit = words.iter().position(|word| {
        let word = word.to_lowercase();
        terms.iter().any(|term| word.contains(term.as_str()))
    });

    let Some(hit) = hit else {
        return words.iter().take(EXCERPT_WORDS_AFTER).join(" ");
    };

    let start = hit.saturating_sub(EXCERPT_WORDS_BEFORE);
    let end = (hit + EXCERPT_WORDS_AFTER).min(words.len());
    let mut excerpt = words[start..end].join(" ");
    if start > 0 {
        excerpt.insert_str(0, "… ");
    }
    if end < words.len() {
        excerpt.push_str(" …");
    }
    excerpt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course_model::{parse_course, ContentBlock};

    fn lesson(id: u32, module_id: u32, title: &str, body: &str, tools: &[&str]) -> Lesson {
        Lesson {
            id,
            module_id,
            title: title.to_string(),
            slug: crate::course_model::slugify(title),
            description: String::new(),
            estimated_time: String::new(),
            tools: tools.iter().map(|t| t.to_string()).collect(),
            complexity: "Beginner".to_string(),
            prerequisites: Vec::new(),
            content: vec![ContentBlock::text(format!("lesson-{}-block-1", id), body)],
            order: id,
        }
    }

    fn course() -> Vec<Module> {
        vec![
            Module {
                id: 1,
                title: "HTML Basics".to_string(),
                slug: "html-basics".to_string(),
                description: "Structure pages with semantic markup.".to_string(),
                estimated_time: String::new(),
                complexity: Complexity::Beginner,
                prerequisites: Vec::new(),
                lessons: vec![lesson(1, 1, "Tags", "Every page starts with a doctype.", &["VS Code"])],
                order: 1,
            },
            Module {
                id: 2,
                title: "Styling".to_string(),
                slug: "styling".to_string(),
                description: "Make pages look good.".to_string(),
                estimated_time: String::new(),
                complexity: Complexity::Intermediate,
                prerequisites: vec!["HTML Basics".to_string()],
                lessons: vec![lesson(
                    2,
                    2,
                    "Introduction to CSS",
                    "CSS styles the HTML you wrote. Link a stylesheet from your html head.",
                    &["Chrome DevTools"],
                )],
                order: 2,
            },
        ]
    }

    #[test]
    fn test_title_match_ranks_first() {
        // Arrange: Index a module titled "HTML Basics" and a CSS lesson mentioning HTML
        let engine = SearchEngine::new(&course());

        // Act: Search for "HTML"
        let results = engine.search("HTML", &SearchFilters::default());

        // Assert: The module comes first with at least the title-contains score
        assert_eq!(results[0].title, "HTML Basics");
        assert_eq!(results[0].kind, SearchItemKind::Module);
        assert!(results[0].score >= 50);
        assert!(results[1..]
            .iter()
            .filter(|r| !r.title.to_lowercase().contains("html"))
            .all(|r| r.score < results[0].score));
    }

    #[test]
    fn test_score_components() {
        let engine = SearchEngine::new(&course());

        let results = engine.search("styling", &SearchFilters::default());

        // Exact title (100) plus one body occurrence (10)
        assert_eq!(results[0].title, "Styling");
        assert_eq!(results[0].score, 110);
    }

    #[test]
    fn test_repeated_body_hits_add_capped_bonus() {
        // Arrange: A lesson repeating the term many times
        let body = "grid ".repeat(20);
        let module = Module {
            id: 1,
            title: "Layout".to_string(),
            slug: "layout".to_string(),
            description: String::new(),
            estimated_time: String::new(),
            complexity: Complexity::Advanced,
            prerequisites: Vec::new(),
            lessons: vec![lesson(1, 1, "Flow", &body, &[])],
            order: 1,
        };
        let engine = SearchEngine::new(&[module]);

        // Act: Search the repeated term
        let results = engine.search("grid", &SearchFilters::default());

        // Assert: 10 base plus the capped 5 x 2 bonus
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 20);
    }

    #[test]
    fn test_blank_query_returns_nothing() {
        let engine = SearchEngine::new(&course());
        assert!(engine.search("   ", &SearchFilters::default()).is_empty());
    }

    #[test]
    fn test_filters_combine_with_and() {
        let engine = SearchEngine::new(&course());

        let by_module = SearchFilters {
            module_ids: vec![2],
            ..SearchFilters::default()
        };
        let results = engine.search("html", &by_module);
        assert!(results.iter().all(|r| r.module_id == 2));
        assert!(!results.is_empty());

        let impossible = SearchFilters {
            module_ids: vec![2],
            tools: vec!["vs code".to_string()],
            ..SearchFilters::default()
        };
        assert!(engine.search("html", &impossible).is_empty());

        let by_complexity = SearchFilters {
            complexity: vec![Complexity::Intermediate, Complexity::Advanced],
            ..SearchFilters::default()
        };
        let results = engine.search("pages", &by_complexity);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Styling");
    }

    #[test]
    fn test_suggestions_deduplicate_and_cap() {
        let engine = SearchEngine::new(&course());

        assert_eq!(engine.suggestions("c", 10).len(), 4);
        assert_eq!(
            engine.suggestions("code", 10),
            vec!["VS Code".to_string()]
        );
        assert_eq!(engine.suggestions("s", 2).len(), 2);
        assert!(engine.suggestions("", 5).is_empty());
    }

    #[test]
    fn test_update_index() {
        let mut engine = SearchEngine::new(&[]);
        assert!(engine.is_empty());

        let course = parse_course("# C\n\n## Flexbox\n\n### Axes\n\nMain and cross axis.").unwrap();
        engine.update_index(&course.modules);

        assert_eq!(engine.len(), 2);
        assert_eq!(
            engine.search("axis", &SearchFilters::default())[0].lesson_slug.as_deref(),
            Some("axes")
        );
    }

    #[test]
    fn test_excerpt_centers_on_hit() {
        let text = "one two three four five six seven eight nine ten eleven twelve target thirteen";
        let excerpt = excerpt(text, &["target".to_string()]);
        assert!(excerpt.starts_with("… "));
        assert!(excerpt.contains("target"));
    }
}
