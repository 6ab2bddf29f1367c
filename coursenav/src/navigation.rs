//! Navigation state manager
//!
//! Keeps the current page (home, module or lesson) in step with a
//! [`History`]. Every programmatic transition updates the state, writes a
//! history entry and notifies subscribers; history traversal re-derives the
//! state from the current location alone.
//!
//! URL scheme:
//!
//! ```text
//! /                                   home
//! /module/{slug}                      module
//! /module/{slug}/lesson/{slug}        lesson
//! /?module={slug}&lesson={slug}       query form of the same three pages
//! ```
//!
//! Ids never appear in URLs. A [`RouteTable`] built from the current course
//! maps slugs back to ids.

use crate::course_model::Module;
use crate::events::{ListenerResult, Subscribers, SubscriptionId};
use crate::history::{History, MemoryHistory};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Characters kept verbatim in a path segment or query value
const SEGMENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Kind of page being shown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    #[default]
    Home,
    Module,
    Lesson,
}

/// Which page, module and lesson are active
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationState {
    pub page: Page,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson_slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson_id: Option<u32>,
}

impl NavigationState {
    pub fn home() -> Self {
        Self::default()
    }

    pub fn module(slug: impl Into<String>, id: Option<u32>) -> Self {
        Self {
            page: Page::Module,
            module_slug: Some(slug.into()),
            module_id: id,
            ..Self::default()
        }
    }

    pub fn lesson(
        module_slug: impl Into<String>,
        lesson_slug: impl Into<String>,
        module_id: Option<u32>,
        lesson_id: Option<u32>,
    ) -> Self {
        Self {
            page: Page::Lesson,
            module_slug: Some(module_slug.into()),
            lesson_slug: Some(lesson_slug.into()),
            module_id,
            lesson_id,
        }
    }

    /// Drop fields the page kind does not use; pages missing a slug degrade
    /// to the next page up
    fn normalized(self) -> Self {
        match (self.page, self.module_slug, self.lesson_slug) {
            (Page::Lesson, Some(module), Some(lesson)) => {
                Self::lesson(module, lesson, self.module_id, self.lesson_id)
            }
            (Page::Lesson | Page::Module, Some(module), _) => Self::module(module, self.module_id),
            _ => Self::home(),
        }
    }
}

/// Payload delivered to navigation subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationEvent {
    pub state: NavigationState,
    pub url: String,
    /// True when the change came from history traversal
    pub is_pop_state: bool,
}

/// URL shape produced for new history entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RoutingMode {
    /// `/module/{slug}/lesson/{slug}`
    #[default]
    Path,
    /// `/?module={slug}&lesson={slug}`
    Query,
}

/// Whether a transition adds a history entry or overwrites the current one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HistoryMode {
    #[default]
    Push,
    Replace,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ModuleRoute {
    id: u32,
    lessons: HashMap<String, u32>,
}

/// Slug to id lookup for the current course
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    modules: HashMap<String, ModuleRoute>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_modules(modules: &[Module]) -> Self {
        let modules = modules
            .iter()
            .map(|module| {
                let lessons = module
                    .lessons
                    .iter()
                    .map(|lesson| (lesson.slug.clone(), lesson.id))
                    .collect();
                (
                    module.slug.clone(),
                    ModuleRoute {
                        id: module.id,
                        lessons,
                    },
                )
            })
            .collect();
        Self { modules }
    }

    pub fn module_id(&self, module_slug: &str) -> Option<u32> {
        self.modules.get(module_slug).map(|route| route.id)
    }

    pub fn lesson_id(&self, module_slug: &str, lesson_slug: &str) -> Option<u32> {
        self.modules
            .get(module_slug)?
            .lessons
            .get(lesson_slug)
            .copied()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Fill in ids the state does not carry
    pub fn resolve(&self, mut state: NavigationState) -> NavigationState {
        if let Some(module_slug) = state.module_slug.as_deref() {
            if state.module_id.is_none() {
                state.module_id = self.module_id(module_slug);
            }
            if let (Some(lesson_slug), None) = (state.lesson_slug.as_deref(), state.lesson_id) {
                state.lesson_id = self.lesson_id(module_slug, lesson_slug);
            }
        }
        state
    }
}

/// Build the canonical URL for a state
///
/// # Examples
/// * home -> `/`
/// * module `basics`, path mode -> `/module/basics`
/// * lesson `basics`/`intro`, query mode -> `/?module=basics&lesson=intro`
pub fn generate_url(state: &NavigationState, mode: RoutingMode) -> String {
    let module = state.module_slug.as_deref().map(encode_segment);
    let lesson = state.lesson_slug.as_deref().map(encode_segment);

    match (state.page, module, lesson, mode) {
        (Page::Lesson, Some(module), Some(lesson), RoutingMode::Path) => {
            format!("/module/{}/lesson/{}", module, lesson)
        }
        (Page::Lesson, Some(module), Some(lesson), RoutingMode::Query) => {
            format!("/?module={}&lesson={}", module, lesson)
        }
        (Page::Module | Page::Lesson, Some(module), _, RoutingMode::Path) => {
            format!("/module/{}", module)
        }
        (Page::Module | Page::Lesson, Some(module), _, RoutingMode::Query) => {
            format!("/?module={}", module)
        }
        _ => "/".to_string(),
    }
}

/// Derive a state from a URL
///
/// Both URL shapes are accepted regardless of routing mode. A scheme and
/// host prefix, a trailing slash and a trailing `/index.html` are ignored.
/// Anything unrecognized is the home page.
pub fn parse_url(url: &str, routes: &RouteTable) -> NavigationState {
    let without_origin = strip_origin(url);
    let without_fragment = without_origin
        .split_once('#')
        .map_or(without_origin, |(before, _)| before);
    let (path, query) = without_fragment
        .split_once('?')
        .unwrap_or((without_fragment, ""));

    let path = match path.strip_suffix("/index.html") {
        Some(rest) => rest,
        None if path == "index.html" => "",
        None => path,
    };
    let segments: Vec<String> = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(decode_segment)
        .collect();

    let state = match segments.as_slice() {
        [] => parse_query(query),
        [module, slug] if module == "module" => NavigationState::module(slug.clone(), None),
        [module, module_slug, lesson, lesson_slug] if module == "module" && lesson == "lesson" => {
            NavigationState::lesson(module_slug.clone(), lesson_slug.clone(), None, None)
        }
        _ => {
            log::debug!("Unrecognized location '{}', showing home", url);
            NavigationState::home()
        }
    };

    routes.resolve(state)
}

fn parse_query(query: &str) -> NavigationState {
    let mut module = None;
    let mut lesson = None;

    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let value = decode_segment(&value.replace('+', " "));
        if value.is_empty() {
            continue;
        }
        match key {
            "module" => module = Some(value),
            "lesson" => lesson = Some(value),
            _ => {}
        }
    }

    match (module, lesson) {
        (Some(module), Some(lesson)) => NavigationState::lesson(module, lesson, None, None),
        (Some(module), None) => NavigationState::module(module, None),
        _ => NavigationState::home(),
    }
}

fn strip_origin(url: &str) -> &str {
    match url.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("/", |slash| &rest[slash..]),
        None => url,
    }
}

fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT_ENCODE_SET).to_string()
}

fn decode_segment(segment: &str) -> String {
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}

/// Owns the navigation state, the history and the subscriber list
pub struct NavigationManager<H: History = MemoryHistory> {
    history: H,
    routes: RouteTable,
    mode: RoutingMode,
    base_url: String,
    state: NavigationState,
    subscribers: Subscribers<NavigationEvent>,
}

impl<H: History> NavigationManager<H> {
    /// Create a manager whose initial state is parsed from the history's location
    pub fn new(history: H, routes: RouteTable, mode: RoutingMode) -> Self {
        let state = parse_url(&history.location(), &routes);
        log::debug!("Navigation starts at {:?}", state.page);
        Self {
            history,
            routes,
            mode,
            base_url: String::new(),
            state,
            subscribers: Subscribers::new("navigation"),
        }
    }

    /// Origin used by `shareable_url`
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn routing_mode(&self) -> RoutingMode {
        self.mode
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    /// Direct history access, for driving traversal from outside
    pub fn history_mut(&mut self) -> &mut H {
        &mut self.history
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Install a new route table and re-derive ids for the current location
    pub fn set_routes(&mut self, routes: RouteTable) {
        self.routes = routes;
        self.state = parse_url(&self.history.location(), &self.routes);
    }

    /// Canonical URL of the current state
    pub fn current_url(&self) -> String {
        generate_url(&self.state, self.mode)
    }

    /// Canonical URL of any state, in this manager's routing mode
    pub fn generate_url(&self, state: &NavigationState) -> String {
        generate_url(state, self.mode)
    }

    /// Current URL with the configured base URL in front
    pub fn shareable_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.current_url())
    }

    pub fn is_home(&self) -> bool {
        self.state.page == Page::Home
    }

    pub fn is_module_page(&self) -> bool {
        self.state.page == Page::Module
    }

    pub fn is_lesson_page(&self) -> bool {
        self.state.page == Page::Lesson
    }

    pub fn current_module_slug(&self) -> Option<&str> {
        self.state.module_slug.as_deref()
    }

    pub fn current_lesson_slug(&self) -> Option<&str> {
        self.state.lesson_slug.as_deref()
    }

    pub fn navigate_to_home(&mut self) -> &NavigationState {
        self.navigate(NavigationState::home(), HistoryMode::Push)
    }

    pub fn navigate_to_module(&mut self, slug: &str, id: Option<u32>) -> &NavigationState {
        self.navigate(NavigationState::module(slug, id), HistoryMode::Push)
    }

    pub fn navigate_to_lesson(
        &mut self,
        module_slug: &str,
        lesson_slug: &str,
        module_id: Option<u32>,
        lesson_id: Option<u32>,
    ) -> &NavigationState {
        self.navigate(
            NavigationState::lesson(module_slug, lesson_slug, module_id, lesson_id),
            HistoryMode::Push,
        )
    }

    /// Navigate using the query URL form, whatever the routing mode
    pub fn navigate_with_query(
        &mut self,
        module_slug: Option<&str>,
        lesson_slug: Option<&str>,
    ) -> &NavigationState {
        let state = match (module_slug, lesson_slug) {
            (Some(module), Some(lesson)) => NavigationState::lesson(module, lesson, None, None),
            (Some(module), None) => NavigationState::module(module, None),
            _ => NavigationState::home(),
        };
        let state = self.routes.resolve(state);
        let url = generate_url(&state, RoutingMode::Query);
        self.commit(state, url, HistoryMode::Push)
    }

    /// Move to `state`, writing a history entry
    ///
    /// Ids missing from `state` are looked up in the route table. When the
    /// resulting URL equals the current location the entry is replaced
    /// rather than pushed.
    pub fn navigate(&mut self, state: NavigationState, mode: HistoryMode) -> &NavigationState {
        let state = self.routes.resolve(state.normalized());
        let url = generate_url(&state, self.mode);
        self.commit(state, url, mode)
    }

    fn commit(&mut self, state: NavigationState, url: String, mode: HistoryMode) -> &NavigationState {
        let mode = if url == self.history.location() {
            HistoryMode::Replace
        } else {
            mode
        };
        match mode {
            HistoryMode::Push => self.history.push(&url),
            HistoryMode::Replace => self.history.replace(&url),
        }

        log::debug!("Navigated to {} ({:?})", url, mode);
        self.state = state;
        self.subscribers.notify(&NavigationEvent {
            state: self.state.clone(),
            url,
            is_pop_state: false,
        });
        &self.state
    }

    /// Re-derive the state from the history's current location
    ///
    /// Call this after the history cursor moved by any means.
    pub fn handle_pop_state(&mut self) -> &NavigationState {
        let url = self.history.location();
        self.state = parse_url(&url, &self.routes);
        log::debug!("History moved to {}", url);
        self.subscribers.notify(&NavigationEvent {
            state: self.state.clone(),
            url,
            is_pop_state: true,
        });
        &self.state
    }

    /// Step back one entry; false when already at the oldest entry
    pub fn back(&mut self) -> bool {
        self.traverse(-1)
    }

    /// Step forward one entry; false when already at the newest entry
    pub fn forward(&mut self) -> bool {
        self.traverse(1)
    }

    fn traverse(&mut self, delta: isize) -> bool {
        if self.history.go(delta) {
            self.handle_pop_state();
            true
        } else {
            false
        }
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&NavigationEvent) + 'static) -> SubscriptionId {
        self.subscribers.subscribe(listener)
    }

    pub fn subscribe_fallible(
        &mut self,
        listener: impl FnMut(&NavigationEvent) -> ListenerResult + 'static,
    ) -> SubscriptionId {
        self.subscribers.subscribe_fallible(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// Drop every subscriber
    pub fn clear_subscribers(&mut self) {
        self.subscribers.clear();
    }
}

impl<H: History + std::fmt::Debug> std::fmt::Debug for NavigationManager<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationManager")
            .field("history", &self.history)
            .field("mode", &self.mode)
            .field("state", &self.state)
            .field("subscribers", &self.subscribers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample_data::sample_modules;
    use rstest::rstest;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn routes() -> RouteTable {
        RouteTable::from_modules(&sample_modules())
    }

    fn manager() -> NavigationManager {
        NavigationManager::new(MemoryHistory::new("/"), routes(), RoutingMode::Path)
    }

    #[rstest]
    #[case("/", NavigationState::home())]
    #[case("", NavigationState::home())]
    #[case("/index.html", NavigationState::home())]
    #[case("index.html?module=getting-started", NavigationState::module("getting-started", Some(1)))]
    #[case(
        "/module/getting-started/index.html",
        NavigationState::module("getting-started", Some(1))
    )]
    #[case("/module/myindex.html", NavigationState::module("myindex.html", None))]
    #[case("/module/getting-started", NavigationState::module("getting-started", Some(1)))]
    #[case("/module/getting-started/", NavigationState::module("getting-started", Some(1)))]
    #[case(
        "/module/getting-started/lesson/setup-development-environment",
        NavigationState::lesson("getting-started", "setup-development-environment", Some(1), Some(1))
    )]
    #[case(
        "https://learn.example.com/module/getting-started?ref=mail#top",
        NavigationState::module("getting-started", Some(1))
    )]
    #[case("/?module=getting-started", NavigationState::module("getting-started", Some(1)))]
    #[case(
        "/?module=getting-started&lesson=setup-development-environment",
        NavigationState::lesson("getting-started", "setup-development-environment", Some(1), Some(1))
    )]
    #[case("/module/unknown-slug", NavigationState::module("unknown-slug", None))]
    #[case("/courses/42", NavigationState::home())]
    #[case("/module", NavigationState::home())]
    #[case("/?lesson=orphan", NavigationState::home())]
    fn test_parse_url(#[case] url: &str, #[case] expected: NavigationState) {
        assert_eq!(parse_url(url, &routes()), expected);
    }

    #[rstest]
    #[case(RoutingMode::Path)]
    #[case(RoutingMode::Query)]
    fn test_url_round_trip(#[case] mode: RoutingMode) {
        // Arrange: Every reachable state of the sample course
        let modules = sample_modules();
        let table = RouteTable::from_modules(&modules);
        let mut states = vec![NavigationState::home()];
        for module in &modules {
            states.push(NavigationState::module(&module.slug, Some(module.id)));
            for lesson in &module.lessons {
                states.push(NavigationState::lesson(
                    &module.slug,
                    &lesson.slug,
                    Some(module.id),
                    Some(lesson.id),
                ));
            }
        }

        // Act / Assert: parse(generate(s)) == s
        for state in states {
            let url = generate_url(&state, mode);
            assert_eq!(parse_url(&url, &table), state, "round trip of {}", url);
        }
    }

    #[test]
    fn test_generate_url_encodes_segments() {
        let state = NavigationState::module("c++ & you", None);
        assert_eq!(
            generate_url(&state, RoutingMode::Path),
            "/module/c%2B%2B%20%26%20you"
        );
        assert_eq!(
            parse_url("/module/c%2B%2B%20%26%20you", &RouteTable::new()),
            state
        );
    }

    #[test]
    fn test_navigation_then_back() {
        // Arrange: Manager at home with a recording subscriber
        let mut nav = manager();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        nav.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        // Act: Module, then lesson, then back
        nav.navigate_to_module("getting-started", Some(1));
        nav.navigate_to_lesson(
            "getting-started",
            "setup-development-environment",
            Some(1),
            Some(1),
        );
        assert!(nav.back());

        // Assert: Module state restored from the URL alone
        assert_eq!(
            nav.state(),
            &NavigationState::module("getting-started", Some(1))
        );
        assert_eq!(nav.state().lesson_slug, None);

        let events = events.borrow();
        assert_eq!(events.len(), 3);
        assert!(!events[0].is_pop_state);
        assert_eq!(events[1].url, "/module/getting-started/lesson/setup-development-environment");
        assert!(events[2].is_pop_state);
        assert_eq!(events[2].url, "/module/getting-started");
    }

    #[test]
    fn test_forward_after_back() {
        let mut nav = manager();
        nav.navigate_to_module("getting-started", None);

        assert!(nav.back());
        assert!(nav.is_home());
        assert!(nav.forward());
        assert_eq!(nav.current_module_slug(), Some("getting-started"));
        assert!(!nav.forward());
    }

    #[test]
    fn test_missing_ids_are_resolved() {
        let mut nav = manager();

        nav.navigate_to_lesson("getting-started", "setup-development-environment", None, None);

        assert_eq!(nav.state().module_id, Some(1));
        assert_eq!(nav.state().lesson_id, Some(1));
        assert!(nav.is_lesson_page());
    }

    #[test]
    fn test_same_url_replaces_entry() {
        // Arrange: Manager already on a module page
        let mut nav = manager();
        nav.navigate_to_module("getting-started", Some(1));

        // Act: Navigate to the same module again, then home twice
        nav.navigate_to_module("getting-started", Some(1));
        nav.navigate_to_home();
        nav.navigate_to_home();

        // Assert: No duplicate entries
        assert_eq!(
            nav.history().entries(),
            &["/", "/module/getting-started", "/"]
        );
    }

    #[test]
    fn test_replace_mode() {
        let mut nav = manager();
        nav.navigate(
            NavigationState::module("getting-started", None),
            HistoryMode::Replace,
        );

        assert_eq!(nav.history().len(), 1);
        assert_eq!(nav.history().location(), "/module/getting-started");
    }

    #[test]
    fn test_query_mode_and_navigate_with_query() {
        let mut nav = NavigationManager::new(MemoryHistory::new("/"), routes(), RoutingMode::Query);

        nav.navigate_to_module("getting-started", None);
        assert_eq!(nav.history().location(), "/?module=getting-started");

        let mut path_nav = manager();
        path_nav.navigate_with_query(Some("getting-started"), Some("setup-development-environment"));
        assert_eq!(
            path_nav.history().location(),
            "/?module=getting-started&lesson=setup-development-environment"
        );
        assert_eq!(path_nav.state().lesson_id, Some(1));
    }

    #[test]
    fn test_initial_state_from_location() {
        let nav = NavigationManager::new(
            MemoryHistory::new("/module/getting-started"),
            routes(),
            RoutingMode::Path,
        );
        assert!(nav.is_module_page());
        assert_eq!(nav.state().module_id, Some(1));
    }

    #[test]
    fn test_shareable_url() {
        let mut nav = manager().with_base_url("https://learn.example.com/");
        nav.navigate_to_module("getting-started", None);

        assert_eq!(
            nav.shareable_url(),
            "https://learn.example.com/module/getting-started"
        );
    }

    #[test]
    fn test_pop_state_on_unrecognized_location_goes_home() {
        let mut nav = manager();
        nav.navigate_to_module("getting-started", None);
        nav.history_mut().push("/totally/unknown/place");

        nav.handle_pop_state();

        assert!(nav.is_home());
    }

    #[test]
    fn test_lesson_without_slug_degrades_to_module() {
        let mut nav = manager();
        let state = NavigationState {
            page: Page::Lesson,
            module_slug: Some("getting-started".to_string()),
            ..NavigationState::default()
        };

        nav.navigate(state, HistoryMode::Push);

        assert!(nav.is_module_page());
    }

    #[test]
    fn test_unsubscribe_stops_events() {
        let mut nav = manager();
        let count = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&count);
        let id = nav.subscribe(move |_| *counter.borrow_mut() += 1);

        nav.navigate_to_module("getting-started", None);
        assert!(nav.unsubscribe(id));
        nav.navigate_to_home();

        assert_eq!(*count.borrow(), 1);
    }
}
