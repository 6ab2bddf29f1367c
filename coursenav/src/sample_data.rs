//! Built-in sample course
//!
//! Adopted by the course store whenever the real course document cannot be
//! loaded, parsed or validated. It must always pass validation.

use crate::course_model::{
    BlockKind, CalloutKind, Complexity, ContentBlock, Lesson, Module,
};

pub const SAMPLE_TITLE: &str = "Web Development Foundations";
pub const SAMPLE_DESCRIPTION: &str =
    "A short starter course covering tooling, HTML structure and CSS styling.";

struct LessonSeed<'a> {
    id: u32,
    title: &'a str,
    slug: &'a str,
    description: &'a str,
    estimated_time: &'a str,
    tools: &'a [&'a str],
    blocks: Vec<(BlockKind, &'a str, Option<&'a str>)>,
}

fn build_lesson(module_id: u32, order: u32, complexity: Complexity, seed: LessonSeed<'_>) -> Lesson {
    let content = seed
        .blocks
        .into_iter()
        .enumerate()
        .map(|(index, (kind, content, extra))| {
            let id = format!("lesson-{}-block-{}", seed.id, index + 1);
            match kind {
                BlockKind::Code => ContentBlock::code(id, content, extra.map(str::to_string)),
                BlockKind::Callout => {
                    let callout = match extra {
                        Some("warning") => CalloutKind::Warning,
                        Some("video-script") => CalloutKind::VideoScript,
                        Some("note") => CalloutKind::Note,
                        _ => CalloutKind::Tip,
                    };
                    ContentBlock::callout(id, callout, content)
                }
                _ => ContentBlock::text(id, content),
            }
        })
        .collect();

    Lesson {
        id: seed.id,
        module_id,
        title: seed.title.to_string(),
        slug: seed.slug.to_string(),
        description: seed.description.to_string(),
        estimated_time: seed.estimated_time.to_string(),
        tools: seed.tools.iter().map(|tool| tool.to_string()).collect(),
        complexity: complexity.to_string(),
        prerequisites: Vec::new(),
        content,
        order,
    }
}

/// The three sample modules, ids and orders starting at 1
pub fn sample_modules() -> Vec<Module> {
    vec![
        Module {
            id: 1,
            title: "Getting Started".to_string(),
            slug: "getting-started".to_string(),
            description: "Set up your tools and publish your first page.".to_string(),
            estimated_time: "1 hour 15 minutes".to_string(),
            complexity: Complexity::Beginner,
            prerequisites: Vec::new(),
            lessons: vec![
                build_lesson(1, 1, Complexity::Beginner, LessonSeed {
                    id: 1,
                    title: "Setup Development Environment",
                    slug: "setup-development-environment",
                    description: "Install an editor, a browser and Git.",
                    estimated_time: "30 minutes",
                    tools: &["VS Code", "Chrome", "Git"],
                    blocks: vec![
                        (BlockKind::Text, "Install **VS Code**, a modern browser and Git before writing any code.", None),
                        (BlockKind::Code, "git --version\ncode --version", Some("bash")),
                        (BlockKind::Callout, "Install the Live Server extension for instant reloads.", Some("tip")),
                    ],
                }),
                build_lesson(1, 2, Complexity::Beginner, LessonSeed {
                    id: 2,
                    title: "Your First Web Page",
                    slug: "your-first-web-page",
                    description: "Write an HTML document by hand and open it in the browser.",
                    estimated_time: "45 minutes",
                    tools: &["VS Code", "Chrome"],
                    blocks: vec![
                        (BlockKind::Text, "Every page starts with a doctype and an `html` element.", None),
                        (BlockKind::Code, "<!DOCTYPE html>\n<html lang=\"en\">\n  <head><title>Hello</title></head>\n  <body><h1>Hello, web!</h1></body>\n</html>", Some("html")),
                        (BlockKind::Callout, "Hi everyone! Today we write our very first web page from scratch.", Some("video-script")),
                    ],
                }),
            ],
            order: 1,
        },
        Module {
            id: 2,
            title: "HTML Fundamentals".to_string(),
            slug: "html-fundamentals".to_string(),
            description: "Structure content with semantic elements, links and forms.".to_string(),
            estimated_time: "2 hours".to_string(),
            complexity: Complexity::Beginner,
            prerequisites: vec!["Getting Started".to_string()],
            lessons: vec![
                build_lesson(2, 1, Complexity::Beginner, LessonSeed {
                    id: 3,
                    title: "Semantic Markup",
                    slug: "semantic-markup",
                    description: "Choose elements by meaning, not by looks.",
                    estimated_time: "1 hour",
                    tools: &["VS Code"],
                    blocks: vec![
                        (BlockKind::Text, "Use `header`, `main`, `nav` and `footer` to describe the page outline.", None),
                        (BlockKind::Code, "<main>\n  <article>\n    <h2>News</h2>\n  </article>\n</main>", Some("html")),
                        (BlockKind::Callout, "Screen readers rely on landmarks to navigate.", Some("note")),
                    ],
                }),
                build_lesson(2, 2, Complexity::Beginner, LessonSeed {
                    id: 4,
                    title: "Links and Forms",
                    slug: "links-and-forms",
                    description: "Connect pages together and collect input.",
                    estimated_time: "1 hour",
                    tools: &["VS Code", "Chrome DevTools"],
                    blocks: vec![
                        (BlockKind::Text, "Anchors connect documents; forms send data back.", None),
                        (BlockKind::Code, "<form action=\"/subscribe\">\n  <label>Email <input type=\"email\" name=\"email\"></label>\n  <button>Join</button>\n</form>", Some("html")),
                        (BlockKind::Callout, "Never trust input validated only in the browser.", Some("warning")),
                    ],
                }),
            ],
            order: 2,
        },
        Module {
            id: 3,
            title: "CSS Styling".to_string(),
            slug: "css-styling".to_string(),
            description: "Control colour, spacing and layout with CSS.".to_string(),
            estimated_time: "2 hours 30 minutes".to_string(),
            complexity: Complexity::Intermediate,
            prerequisites: vec!["HTML Fundamentals".to_string()],
            lessons: vec![
                build_lesson(3, 1, Complexity::Intermediate, LessonSeed {
                    id: 5,
                    title: "Selectors and the Cascade",
                    slug: "selectors-and-the-cascade",
                    description: "Target elements and understand which rule wins.",
                    estimated_time: "1 hour",
                    tools: &["VS Code", "Chrome DevTools"],
                    blocks: vec![
                        (BlockKind::Text, "Specificity decides between competing rules; source order breaks ties.", None),
                        (BlockKind::Code, "main p {\n  color: #333;\n}\n\n.lead {\n  font-size: 1.25rem;\n}", Some("css")),
                    ],
                }),
                build_lesson(3, 2, Complexity::Intermediate, LessonSeed {
                    id: 6,
                    title: "Flexbox Layout",
                    slug: "flexbox-layout",
                    description: "Lay out components along one axis.",
                    estimated_time: "1 hour 30 minutes",
                    tools: &["VS Code", "Chrome DevTools"],
                    blocks: vec![
                        (BlockKind::Text, "Flexbox distributes space along a main axis and aligns items on the cross axis.", None),
                        (BlockKind::Code, ".toolbar {\n  display: flex;\n  gap: 1rem;\n  align-items: center;\n}", Some("css")),
                        (BlockKind::Callout, "Toggle the flex overlay in DevTools to see the axes.", Some("tip")),
                    ],
                }),
            ],
            order: 3,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course_model::validate_modules;

    #[test]
    fn test_sample_modules_are_valid() {
        let modules = sample_modules();
        let result = validate_modules(&modules);

        assert_eq!(modules.len(), 3);
        assert!(result.is_valid, "errors: {:?}", result.errors);
        assert!(result.warnings.is_empty(), "warnings: {:?}", result.warnings);
    }

    #[test]
    fn test_first_module_matches_known_routes() {
        let modules = sample_modules();
        let first = &modules[0];

        assert_eq!(first.slug, "getting-started");
        assert_eq!(first.id, 1);
        assert_eq!(
            first.lesson_by_slug("setup-development-environment").map(|l| l.id),
            Some(1)
        );
    }

    #[test]
    fn test_lesson_ids_unique_across_course() {
        let modules = sample_modules();
        let mut ids: Vec<u32> = modules.iter().flat_map(|m| m.lesson_ids()).collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }
}
