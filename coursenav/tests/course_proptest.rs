//! Property-based tests for course parsing and URL routing
//!
//! Generated documents mix ordinary titles, colliding titles and titles made
//! only of symbols, so ordering and slug uniqueness are checked well beyond
//! the hand-written fixtures.

use coursenav::course_model::{parse_course, ParsedCourse};
use coursenav::navigation::{generate_url, parse_url, NavigationState, RouteTable, RoutingMode};
use proptest::prelude::*;
use std::collections::HashSet;

/// Heading titles, including ones that slugify to the same or to nothing
fn title_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        // Words whose first letter group cannot read as "Section 1:" numbering
        "[B-DF-HJ-NP-TV-Z][b-df-hj-np-tv-z]{2,7}( [a-z]{2,6}){0,2}",
        // Titles that collide after slugging
        prop::sample::select(vec!["Intro", "intro", "INTRO!", "Intro 2", "Module 3", "Basics"])
            .prop_map(str::to_string),
        // No alphanumerics at all
        "[!?%$@]{1,4}",
    ]
}

/// Module titles, each with its lesson titles
fn outline_strategy() -> impl Strategy<Value = Vec<(String, Vec<String>)>> {
    prop::collection::vec(
        (
            title_strategy(),
            prop::collection::vec(title_strategy(), 1..5),
        ),
        1..7,
    )
}

fn render(outline: &[(String, Vec<String>)]) -> String {
    let mut markdown = String::from("# Generated Course\n\nA course built from an outline.\n\n");
    for (module, lessons) in outline {
        markdown.push_str(&format!("## {}\n\nAbout this module.\n\n", module));
        for lesson in lessons {
            markdown.push_str(&format!("### {}\n\nLesson body.\n\n", lesson));
        }
    }
    markdown
}

fn parse_outline(outline: &[(String, Vec<String>)]) -> ParsedCourse {
    parse_course(&render(outline)).expect("generated course should parse")
}

/// Non-empty path segment or query value; `index.html` is the one segment
/// the parser deliberately strips
fn raw_slug_strategy() -> impl Strategy<Value = String> {
    "[ -~]{1,16}".prop_filter("index.html is stripped from paths", |slug| slug != "index.html")
}

fn mode_strategy() -> impl Strategy<Value = RoutingMode> {
    prop_oneof![Just(RoutingMode::Path), Just(RoutingMode::Query)]
}

#[cfg(test)]
mod proptest_tests {
    use super::*;

    proptest! {
        #[test]
        fn test_modules_and_lessons_are_ordered(outline in outline_strategy()) {
            let course = parse_outline(&outline);

            prop_assert_eq!(course.modules.len(), outline.len());
            let mut next_lesson_id = 1;
            for (index, (module, (_, lessons))) in course.modules.iter().zip(&outline).enumerate() {
                prop_assert_eq!(module.order as usize, index + 1);
                prop_assert_eq!(module.id as usize, index + 1);
                prop_assert_eq!(module.lessons.len(), lessons.len());
                for (lesson_index, lesson) in module.lessons.iter().enumerate() {
                    prop_assert_eq!(lesson.order as usize, lesson_index + 1);
                    prop_assert_eq!(lesson.id, next_lesson_id);
                    prop_assert_eq!(lesson.module_id, module.id);
                    next_lesson_id += 1;
                }
            }
        }

        #[test]
        fn test_module_slugs_are_unique(outline in outline_strategy()) {
            let course = parse_outline(&outline);

            let slugs: HashSet<&str> = course.modules.iter().map(|m| m.slug.as_str()).collect();
            prop_assert_eq!(slugs.len(), course.modules.len());
            prop_assert!(course.modules.iter().all(|m| !m.slug.is_empty()));
        }

        #[test]
        fn test_lesson_slugs_are_unique_per_module(outline in outline_strategy()) {
            let course = parse_outline(&outline);

            for module in &course.modules {
                let slugs: HashSet<&str> = module.lessons.iter().map(|l| l.slug.as_str()).collect();
                prop_assert_eq!(slugs.len(), module.lessons.len(), "module {}", &module.slug);
                prop_assert!(module.lessons.iter().all(|l| !l.slug.is_empty()));
            }
            prop_assert!(course.validate().errors.is_empty(), "{:?}", course.validate().errors);
        }

        #[test]
        fn test_course_urls_round_trip(outline in outline_strategy(), mode in mode_strategy()) {
            let course = parse_outline(&outline);
            let routes = RouteTable::from_modules(&course.modules);

            for module in &course.modules {
                let state = NavigationState::module(&module.slug, Some(module.id));
                let url = generate_url(&state, mode);
                prop_assert_eq!(parse_url(&url, &routes), state, "url {}", url);

                for lesson in &module.lessons {
                    let state = NavigationState::lesson(
                        &module.slug,
                        &lesson.slug,
                        Some(module.id),
                        Some(lesson.id),
                    );
                    let url = generate_url(&state, mode);
                    prop_assert_eq!(parse_url(&url, &routes), state, "url {}", url);
                }
            }
        }

        #[test]
        fn test_encoded_slugs_round_trip(
            module in raw_slug_strategy(),
            lesson in raw_slug_strategy(),
            mode in mode_strategy(),
        ) {
            let routes = RouteTable::new();

            let module_state = NavigationState::module(module.clone(), None);
            let url = generate_url(&module_state, mode);
            prop_assert_eq!(parse_url(&url, &routes), module_state, "url {}", url);

            let lesson_state = NavigationState::lesson(module, lesson, None, None);
            let url = generate_url(&lesson_state, mode);
            prop_assert_eq!(parse_url(&url, &routes), lesson_state, "url {}", url);
        }
    }
}
