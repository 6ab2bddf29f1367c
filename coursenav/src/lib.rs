//! coursenav - course navigator core
//!
//! Parses a course markdown document into modules, lessons and content
//! blocks, and provides the navigation, progress and search state that a
//! course front end is built on.

#![deny(unsafe_code)]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::all))]
// Allow some pedantic lints that are too strict for this project
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

pub mod app;
pub mod config;
pub mod course_model;
pub mod course_store;
pub mod events;
pub mod history;
pub mod navigation;
pub mod progress;
pub mod sample_data;
pub mod search;
pub mod storage;

pub use app::AppContext;
pub use config::{AppConfig, ConfigError};
pub use course_model::{parse_course, CourseParseError, Lesson, Module, ParsedCourse};
pub use course_store::{CourseStore, InitOutcome, LoadError};
pub use navigation::{NavigationManager, NavigationState, RoutingMode};
pub use progress::ProgressTracker;
pub use search::{SearchEngine, SearchFilters};
