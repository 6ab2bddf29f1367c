//! Command-line interface definitions for coursenav

use clap::{Parser, Subcommand};
use coursenav::course_model::Complexity;
use std::path::PathBuf;

/// CLI structure for the coursenav application
#[derive(Parser)]
#[command(name = "coursenav")]
#[command(version)]
#[command(about = "Course navigator: parse, browse, search and track progress through a markdown course", long_about = None)]
pub struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = "coursenav.toml")]
    pub config: PathBuf,

    /// Course document, overriding the configured course_path
    #[arg(long, global = true)]
    pub course: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for coursenav
#[derive(Subcommand)]
pub enum Commands {
    /// Parse the course document and print its structure
    Parse {
        /// Print the parsed course as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse and validate the course document
    Validate {
        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },

    /// Print course statistics (uses the sample course if the document is unusable)
    Stats {
        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search modules and lessons
    Search {
        /// Search terms
        #[arg(required = true)]
        query: Vec<String>,

        /// Only items of this complexity (repeatable)
        #[arg(long)]
        complexity: Vec<Complexity>,

        /// Only items using this tool (repeatable)
        #[arg(long)]
        tool: Vec<String>,

        /// Only items in this module id (repeatable)
        #[arg(long = "module")]
        module_ids: Vec<u32>,

        /// Maximum number of results
        #[arg(short, long, default_value_t = 10)]
        limit: usize,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Suggest titles and tool names matching a prefix
    Suggest {
        /// Text to complete
        query: String,

        /// Maximum number of suggestions
        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },

    /// Resolve a URL to a navigation state
    Route {
        /// URL or path, e.g. /module/getting-started
        url: String,
    },

    /// Build the URL for a module or lesson
    Url {
        /// Module slug (omit for the home page)
        #[arg(long)]
        module: Option<String>,

        /// Lesson slug (requires --module)
        #[arg(long, requires = "module")]
        lesson: Option<String>,
    },

    /// Inspect or change stored learner progress
    Progress {
        #[command(subcommand)]
        action: ProgressAction,
    },
}

/// Progress subcommands
#[derive(Subcommand)]
pub enum ProgressAction {
    /// Show overall and per-module progress
    Show,

    /// Mark a lesson completed
    Complete {
        /// Lesson id
        lesson_id: u32,
    },

    /// Mark a lesson not completed
    Incomplete {
        /// Lesson id
        lesson_id: u32,
    },

    /// Forget all progress
    Reset,

    /// Write progress as JSON
    Export {
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace progress with a previously exported file
    Import {
        /// Exported progress file
        input: PathBuf,
    },
}
