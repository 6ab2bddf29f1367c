//! Application context
//!
//! Composes one course store, navigation manager, progress tracker and
//! search engine, and keeps the derived pieces (route table, search index)
//! in step with the course store.
//!
//! Lifecycle: `new` -> `initialize` -> (`refresh` ...) -> `destroy`.

use crate::config::AppConfig;
use crate::course_model::{Lesson, Module, ParserOptions};
use crate::course_store::{CourseSource, CourseStore, FileSource, InitOutcome};
use crate::history::{History, MemoryHistory};
use crate::navigation::{NavigationManager, NavigationState, Page, RouteTable};
use crate::progress::ProgressTracker;
use crate::search::{SearchEngine, SearchFilters, SearchResult};
use crate::storage::{FileStorage, Storage, StorageEvent};

/// Everything a front end needs, wired together
pub struct AppContext<S: Storage = FileStorage, H: History = MemoryHistory> {
    config: AppConfig,
    store: CourseStore,
    navigation: NavigationManager<H>,
    progress: ProgressTracker<S>,
    search: SearchEngine,
    initialized: bool,
}

impl AppContext<FileStorage, MemoryHistory> {
    /// Context reading the course file and storage directory named in `config`
    pub fn from_config(config: AppConfig) -> Self {
        let source = FileSource::new(&config.course_path);
        let storage = FileStorage::new(&config.storage_dir);
        Self::new(config, source, storage, MemoryHistory::default())
    }
}

impl<S: Storage, H: History> AppContext<S, H> {
    pub fn new(
        config: AppConfig,
        source: impl CourseSource + 'static,
        storage: S,
        history: H,
    ) -> Self {
        let options = ParserOptions {
            module_level: config.module_heading_level,
        };
        let navigation = NavigationManager::new(history, RouteTable::new(), config.routing_mode)
            .with_base_url(config.base_url.clone());
        let progress = ProgressTracker::new(storage, config.progress_key.clone());

        Self {
            store: CourseStore::new(source, options),
            navigation,
            progress,
            search: SearchEngine::default(),
            config,
            initialized: false,
        }
    }

    /// Load the course and build the route table and search index
    pub fn initialize(&mut self) -> InitOutcome {
        let outcome = self.store.initialize();
        self.sync_course();
        self.initialized = true;
        log::info!(
            "Application ready: '{}' with {} modules",
            self.store.course_title(),
            self.store.modules().len()
        );
        outcome
    }

    /// Reload the course; derived state follows the newest result
    pub fn refresh(&mut self) -> InitOutcome {
        let outcome = self.store.refresh();
        self.sync_course();
        outcome
    }

    /// Drop every subscriber and mark the context uninitialized
    pub fn destroy(&mut self) {
        self.navigation.clear_subscribers();
        self.progress.clear_subscribers();
        self.initialized = false;
        log::info!("Application context destroyed");
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &CourseStore {
        &self.store
    }

    pub fn navigation(&self) -> &NavigationManager<H> {
        &self.navigation
    }

    pub fn navigation_mut(&mut self) -> &mut NavigationManager<H> {
        &mut self.navigation
    }

    pub fn progress(&self) -> &ProgressTracker<S> {
        &self.progress
    }

    pub fn progress_mut(&mut self) -> &mut ProgressTracker<S> {
        &mut self.progress
    }

    pub fn search_engine(&self) -> &SearchEngine {
        &self.search
    }

    pub fn search(&self, query: &str, filters: &SearchFilters) -> Vec<SearchResult> {
        self.search.search(query, filters)
    }

    /// Module shown by the current navigation state
    pub fn current_module(&self) -> Option<&Module> {
        let state = self.navigation.state();
        match state.module_id {
            Some(id) => self.store.module(id),
            None => self.store.module_by_slug(state.module_slug.as_deref()?),
        }
    }

    /// Lesson shown by the current navigation state
    pub fn current_lesson(&self) -> Option<&Lesson> {
        let state = self.navigation.state();
        if state.page != Page::Lesson {
            return None;
        }
        let module = self.current_module()?;
        module.lesson_by_slug(state.lesson_slug.as_deref()?)
    }

    /// Navigate to a lesson and record it as the learner's position
    pub fn open_lesson(&mut self, module_slug: &str, lesson_slug: &str) -> NavigationState {
        let state = self
            .navigation
            .navigate_to_lesson(module_slug, lesson_slug, None, None)
            .clone();
        if state.lesson_id.is_some() {
            self.progress
                .set_current_position(state.module_id, state.lesson_id);
        } else {
            log::warn!(
                "Lesson '{}/{}' is not part of the current course",
                module_slug,
                lesson_slug
            );
        }
        state
    }

    /// Navigate to a module page
    pub fn open_module(&mut self, module_slug: &str) -> NavigationState {
        self.navigation
            .navigate_to_module(module_slug, None)
            .clone()
    }

    /// Forward a storage change made by another writer to the progress tracker
    pub fn handle_storage_event(&mut self, event: &StorageEvent) -> bool {
        self.progress.handle_storage_event(event)
    }

    fn sync_course(&mut self) {
        let modules = self.store.modules();
        self.navigation.set_routes(RouteTable::from_modules(modules));
        self.search.update_index(modules);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course_store::StaticSource;
    use crate::storage::MemoryStorage;

    fn context(markdown: &str) -> AppContext<MemoryStorage, MemoryHistory> {
        AppContext::new(
            AppConfig::default(),
            StaticSource::new(markdown),
            MemoryStorage::new(),
            MemoryHistory::default(),
        )
    }

    #[test]
    fn test_initialize_wires_routes_and_search() {
        // Arrange: Context over a document that cannot be parsed
        let mut app = context("");

        // Act: Initialize
        let outcome = app.initialize();

        // Assert: Sample course drives routes and search
        assert!(outcome.is_fallback());
        assert!(app.is_initialized());
        assert_eq!(app.navigation().routes().module_id("getting-started"), Some(1));
        assert!(!app.search("flexbox", &SearchFilters::default()).is_empty());
    }

    #[test]
    fn test_open_lesson_records_position() {
        let mut app = context("");
        app.initialize();

        let state = app.open_lesson("html-fundamentals", "links-and-forms");

        assert_eq!(state.lesson_id, Some(4));
        assert_eq!(app.progress().state().current_module, Some(2));
        assert_eq!(app.progress().state().current_lesson, Some(4));
        assert_eq!(app.current_lesson().map(|l| l.id), Some(4));
        assert_eq!(app.current_module().map(|m| m.id), Some(2));
    }

    #[test]
    fn test_open_unknown_lesson_leaves_position() {
        let mut app = context("");
        app.initialize();

        let state = app.open_lesson("getting-started", "no-such-lesson");

        assert_eq!(state.lesson_id, None);
        assert_eq!(app.progress().state().current_lesson, None);
        assert!(app.current_lesson().is_none());
    }

    #[test]
    fn test_destroy_clears_subscribers() {
        let mut app = context("");
        app.initialize();
        let calls = std::rc::Rc::new(std::cell::RefCell::new(0));
        let counter = std::rc::Rc::clone(&calls);
        app.navigation_mut()
            .subscribe(move |_| *counter.borrow_mut() += 1);

        app.destroy();
        app.open_module("getting-started");

        assert!(!app.is_initialized());
        assert_eq!(*calls.borrow(), 0);
    }
}
