//! Learner progress tracking
//!
//! The tracker owns the set of completed lesson ids plus the learner's
//! current position. Every mutation is written to [`Storage`] as one JSON
//! record under a single key:
//!
//! ```json
//! {"completedLessons":[1,2],"currentModule":1,"currentLesson":2,"lastVisited":"2026-01-05T09:30:00Z"}
//! ```
//!
//! Storage trouble never escapes the tracker. A failed read starts from an
//! empty record, a failed write leaves the change in memory only; both are
//! logged as warnings.

use crate::course_model::Module;
use crate::events::{ListenerResult, Subscribers, SubscriptionId};
use crate::storage::{MemoryStorage, Storage, StorageEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Default storage key for the progress record
pub const DEFAULT_PROGRESS_KEY: &str = "course-progress";

/// Persisted learner progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressState {
    #[serde(default)]
    pub completed_lessons: BTreeSet<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_module: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_lesson: Option<u32>,
    #[serde(default = "Utc::now")]
    pub last_visited: DateTime<Utc>,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            completed_lessons: BTreeSet::new(),
            current_module: None,
            current_lesson: None,
            last_visited: Utc::now(),
        }
    }
}

/// Export file layout: the state plus when it was exported
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressExport {
    #[serde(flatten)]
    pub state: ProgressState,
    pub exported_at: DateTime<Utc>,
}

/// What caused a progress notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressChange {
    Completed(u32),
    Incomplete(u32),
    Position,
    Reset,
    Imported,
    /// Another writer updated the stored record
    Synced,
}

/// Payload delivered to progress subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub change: ProgressChange,
    pub state: ProgressState,
}

/// Tracks completed lessons and persists them under one storage key
pub struct ProgressTracker<S: Storage = MemoryStorage> {
    storage: S,
    key: String,
    state: ProgressState,
    subscribers: Subscribers<ProgressEvent>,
}

impl<S: Storage> ProgressTracker<S> {
    /// Create a tracker, rehydrating from `storage` under `key`
    pub fn new(storage: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let state = load_state(&storage, &key);
        log::debug!(
            "Progress '{}' loaded with {} completed lessons",
            key,
            state.completed_lessons.len()
        );
        Self {
            storage,
            key,
            state,
            subscribers: Subscribers::new("progress"),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    /// Completed lesson ids, ascending
    pub fn completed_lessons(&self) -> Vec<u32> {
        self.state.completed_lessons.iter().copied().collect()
    }

    pub fn completed_count(&self) -> usize {
        self.state.completed_lessons.len()
    }

    pub fn is_lesson_completed(&self, lesson_id: u32) -> bool {
        self.state.completed_lessons.contains(&lesson_id)
    }

    /// Mark a lesson completed
    ///
    /// # Returns
    /// * `true` - The lesson was newly completed (state persisted, subscribers notified)
    /// * `false` - It was already completed; nothing happened
    pub fn mark_lesson_completed(&mut self, lesson_id: u32) -> bool {
        if !self.state.completed_lessons.insert(lesson_id) {
            return false;
        }
        self.commit(ProgressChange::Completed(lesson_id));
        true
    }

    /// Mark a lesson not completed; false when it was not completed
    pub fn mark_lesson_incomplete(&mut self, lesson_id: u32) -> bool {
        if !self.state.completed_lessons.remove(&lesson_id) {
            return false;
        }
        self.commit(ProgressChange::Incomplete(lesson_id));
        true
    }

    /// Record where the learner is
    pub fn set_current_position(&mut self, module_id: Option<u32>, lesson_id: Option<u32>) {
        self.state.current_module = module_id;
        self.state.current_lesson = lesson_id;
        self.commit(ProgressChange::Position);
    }

    /// Forget everything and remove the stored record
    pub fn reset_progress(&mut self) {
        self.state = ProgressState::default();
        if let Err(e) = self.storage.remove_item(&self.key) {
            log::warn!("Could not remove stored progress '{}': {}", self.key, e);
        }
        log::info!("Progress '{}' reset", self.key);
        self.notify(ProgressChange::Reset);
    }

    /// Rounded percentage of `lesson_ids` that are completed
    ///
    /// Returns 0 when `total_lessons` is 0.
    pub fn calculate_module_progress(
        &self,
        module_id: u32,
        total_lessons: usize,
        lesson_ids: &[u32],
    ) -> u32 {
        if total_lessons == 0 {
            log::trace!("Module {} has no lessons, progress is 0", module_id);
            return 0;
        }
        let completed = lesson_ids
            .iter()
            .filter(|id| self.state.completed_lessons.contains(*id))
            .count();
        percentage(completed, total_lessons)
    }

    /// Progress through one module
    pub fn module_progress(&self, module: &Module) -> u32 {
        self.calculate_module_progress(module.id, module.lessons.len(), &module.lesson_ids())
    }

    /// Progress through a whole course, weighted by lesson
    pub fn course_progress(&self, modules: &[Module]) -> u32 {
        let ids: Vec<u32> = modules.iter().flat_map(Module::lesson_ids).collect();
        if ids.is_empty() {
            return 0;
        }
        let completed = ids
            .iter()
            .filter(|id| self.state.completed_lessons.contains(*id))
            .count();
        percentage(completed, ids.len())
    }

    /// Serialize the state plus an export timestamp
    pub fn export_progress(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&ProgressExport {
            state: self.state.clone(),
            exported_at: Utc::now(),
        })
    }

    /// Replace the state with an exported record
    ///
    /// # Returns
    /// * `true` - The record parsed and was adopted
    /// * `false` - The record was malformed; state is unchanged
    pub fn import_progress(&mut self, json: &str) -> bool {
        match serde_json::from_str::<ProgressState>(json) {
            Ok(state) => {
                log::info!(
                    "Imported progress with {} completed lessons",
                    state.completed_lessons.len()
                );
                self.state = state;
                self.persist();
                self.notify(ProgressChange::Imported);
                true
            }
            Err(e) => {
                log::warn!("Rejected progress import: {}", e);
                false
            }
        }
    }

    /// Adopt a record written to the same key by another writer
    ///
    /// Events for other keys are ignored. A removed key means empty progress.
    /// The record is not written back.
    ///
    /// # Returns
    /// * `true` - The state was replaced and subscribers notified
    /// * `false` - The event was for another key or held a corrupt record
    pub fn handle_storage_event(&mut self, event: &StorageEvent) -> bool {
        if event.key != self.key {
            return false;
        }

        let state = match event.new_value.as_deref() {
            None => ProgressState::default(),
            Some(json) => match serde_json::from_str::<ProgressState>(json) {
                Ok(state) => state,
                Err(e) => {
                    log::warn!("Ignoring corrupt progress from another writer: {}", e);
                    return false;
                }
            },
        };

        log::debug!(
            "Progress synced: {} completed lessons",
            state.completed_lessons.len()
        );
        self.state = state;
        self.notify(ProgressChange::Synced);
        true
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&ProgressEvent) + 'static) -> SubscriptionId {
        self.subscribers.subscribe(listener)
    }

    pub fn subscribe_fallible(
        &mut self,
        listener: impl FnMut(&ProgressEvent) -> ListenerResult + 'static,
    ) -> SubscriptionId {
        self.subscribers.subscribe_fallible(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    pub fn clear_subscribers(&mut self) {
        self.subscribers.clear();
    }

    fn commit(&mut self, change: ProgressChange) {
        self.state.last_visited = Utc::now();
        self.persist();
        self.notify(change);
    }

    fn persist(&self) {
        let json = match serde_json::to_string(&self.state) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Could not serialize progress: {}", e);
                return;
            }
        };
        if let Err(e) = self.storage.set_item(&self.key, &json) {
            log::warn!(
                "Could not persist progress '{}', keeping it in memory: {}",
                self.key,
                e
            );
        }
    }

    fn notify(&mut self, change: ProgressChange) {
        let event = ProgressEvent {
            change,
            state: self.state.clone(),
        };
        self.subscribers.notify(&event);
    }
}

impl<S: Storage + std::fmt::Debug> std::fmt::Debug for ProgressTracker<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("storage", &self.storage)
            .field("key", &self.key)
            .field("state", &self.state)
            .finish()
    }
}

fn load_state<S: Storage>(storage: &S, key: &str) -> ProgressState {
    match storage.get_item(key) {
        Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
            log::warn!("Stored progress '{}' is corrupt, starting fresh: {}", key, e);
            ProgressState::default()
        }),
        Ok(None) => ProgressState::default(),
        Err(e) => {
            log::warn!("Could not read stored progress '{}', starting fresh: {}", key, e);
            ProgressState::default()
        }
    }
}

fn percentage(part: usize, whole: usize) -> u32 {
    ((part as f64 * 100.0) / whole as f64).round() as u32
}
