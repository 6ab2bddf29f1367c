//! coursenav - course navigator CLI
//!
//! Parses a course markdown document and exposes navigation, search and
//! progress tracking from the command line.

#![deny(unsafe_code)]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::all))]

mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::{Cli, Commands, ProgressAction};
use coursenav::config::AppConfig;
use coursenav::course_model::{BlockKind, CourseParser, ParsedCourse, ParserOptions};
use coursenav::navigation::{generate_url, parse_url, NavigationState};
use coursenav::search::SearchFilters;
use coursenav::AppContext;
use std::fs;
use std::path::Path;

/// Main entry point for the coursenav CLI application
fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

/// Run the CLI application
fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if cli.verbose {
        logger.filter_level(log::LevelFilter::Info);
    }
    logger.init();

    let config = load_config(&cli.config, cli.course.as_deref())?;

    match cli.command {
        Commands::Parse { json } => handle_parse_command(&config, json)?,
        Commands::Validate { strict } => handle_validate_command(&config, strict)?,
        Commands::Stats { json } => handle_stats_command(config, json)?,
        Commands::Search {
            query,
            complexity,
            tool,
            module_ids,
            limit,
            json,
        } => {
            let filters = SearchFilters {
                complexity,
                tools: tool,
                module_ids,
            };
            handle_search_command(config, &query.join(" "), &filters, limit, json)?;
        }
        Commands::Suggest { query, limit } => handle_suggest_command(config, &query, limit),
        Commands::Route { url } => handle_route_command(config, &url)?,
        Commands::Url { module, lesson } => handle_url_command(&config, module, lesson),
        Commands::Progress { action } => handle_progress_command(config, action)?,
    }

    Ok(())
}

/// Load the configuration file (if present) and apply command-line overrides
fn load_config(path: &Path, course: Option<&Path>) -> Result<AppConfig> {
    let config = AppConfig::load_or_default(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    let config_dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut config = config.resolve_paths(config_dir);

    if let Some(course) = course {
        config.course_path = course.to_path_buf();
    }
    Ok(config)
}

fn parse_document(config: &AppConfig) -> Result<ParsedCourse> {
    let markdown = fs::read_to_string(&config.course_path).with_context(|| {
        format!(
            "Failed to read course document {}",
            config.course_path.display()
        )
    })?;
    let options = ParserOptions {
        module_level: config.module_heading_level,
    };
    CourseParser::parse(&markdown, options).with_context(|| {
        format!(
            "Failed to parse course document {}",
            config.course_path.display()
        )
    })
}

/// Build an initialized context; unusable documents fall back to the sample course
fn open_context(config: AppConfig) -> AppContext {
    let mut app = AppContext::from_config(config);
    let outcome = app.initialize();
    if outcome.is_fallback() {
        eprintln!(
            "Note: using the built-in sample course ({} could not be loaded)",
            app.config().course_path.display()
        );
    }
    app
}

fn handle_parse_command(config: &AppConfig, json: bool) -> Result<()> {
    let course = parse_document(config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&course)?);
        return Ok(());
    }

    println!("{}", course.title);
    if !course.description.is_empty() {
        println!("{}", course.description);
    }
    println!();
    for module in &course.modules {
        println!(
            "{}. {} [{}] ({}, {})",
            module.order,
            module.title,
            module.slug,
            module.complexity,
            display_or(&module.estimated_time, "no estimate")
        );
        for lesson in &module.lessons {
            println!(
                "   {}.{} {} [{}] - {} blocks ({} code, {} callouts)",
                module.order,
                lesson.order,
                lesson.title,
                lesson.slug,
                lesson.content.len(),
                lesson.count_blocks(BlockKind::Code),
                lesson.count_blocks(BlockKind::Callout)
            );
        }
    }
    Ok(())
}

fn handle_validate_command(config: &AppConfig, strict: bool) -> Result<()> {
    let course = parse_document(config)?;
    let result = course.validate();

    for error in &result.errors {
        println!("error: {}", error);
    }
    for warning in &result.warnings {
        println!("warning: {}", warning);
    }

    if !result.is_valid {
        bail!("Validation failed with {} errors", result.errors.len());
    }
    if strict && !result.warnings.is_empty() {
        bail!(
            "Validation failed with {} warnings (--strict)",
            result.warnings.len()
        );
    }

    println!(
        "✓ {} modules, {} lessons are valid ({} warnings)",
        course.modules.len(),
        course.lesson_count(),
        result.warnings.len()
    );
    Ok(())
}

fn handle_stats_command(config: AppConfig, json: bool) -> Result<()> {
    let app = open_context(config);
    let stats = app.store().course_stats();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Course: {}", app.store().course_title());
    println!("Modules:        {}", stats.module_count);
    println!("Lessons:        {}", stats.lesson_count);
    println!("Content blocks: {}", stats.content_block_count);
    println!("Code blocks:    {}", stats.code_block_count);
    println!("Callouts:       {}", stats.callout_count);
    println!("Video scripts:  {}", stats.video_script_count);
    println!("Slide decks:    {}", stats.slide_deck_count);
    println!(
        "Total time:     {}",
        coursenav::course_model::format_minutes(stats.total_minutes)
    );
    Ok(())
}

fn handle_search_command(
    config: AppConfig,
    query: &str,
    filters: &SearchFilters,
    limit: usize,
    json: bool,
) -> Result<()> {
    let app = open_context(config);
    let results: Vec<_> = app.search(query, filters).into_iter().take(limit).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results for '{}'", query);
        return Ok(());
    }
    for result in &results {
        let state = match &result.lesson_slug {
            Some(lesson) => NavigationState::lesson(&result.module_slug, lesson, None, None),
            None => NavigationState::module(&result.module_slug, None),
        };
        println!(
            "{:>4}  {}  {}",
            result.score,
            result.title,
            app.navigation().generate_url(&state)
        );
        if !result.excerpt.is_empty() {
            println!("      {}", result.excerpt);
        }
    }
    Ok(())
}

fn handle_suggest_command(config: AppConfig, query: &str, limit: usize) {
    let app = open_context(config);
    for suggestion in app.search_engine().suggestions(query, limit) {
        println!("{}", suggestion);
    }
}

fn handle_route_command(config: AppConfig, url: &str) -> Result<()> {
    let app = open_context(config);
    let state = parse_url(url, app.navigation().routes());
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}

fn handle_url_command(config: &AppConfig, module: Option<String>, lesson: Option<String>) {
    let state = match (module, lesson) {
        (Some(module), Some(lesson)) => NavigationState::lesson(module, lesson, None, None),
        (Some(module), None) => NavigationState::module(module, None),
        _ => NavigationState::home(),
    };
    let url = generate_url(&state, config.routing_mode);
    println!("{}{}", config.base_url.trim_end_matches('/'), url);
}

fn handle_progress_command(config: AppConfig, action: ProgressAction) -> Result<()> {
    let mut app = open_context(config);

    match action {
        ProgressAction::Show => {
            let modules = app.store().modules();
            let progress = app.progress();
            println!(
                "Overall: {}% ({} lessons completed)",
                progress.course_progress(modules),
                progress.completed_count()
            );
            for module in modules {
                println!(
                    "  {:>3}%  {}",
                    progress.module_progress(module),
                    module.title
                );
            }
            if let Some(lesson) = progress
                .state()
                .current_lesson
                .and_then(|id| app.store().lesson(id))
            {
                println!("Last lesson: {}", lesson.title);
            }
        }
        ProgressAction::Complete { lesson_id } => {
            let title = lesson_title(&app, lesson_id)?;
            if app.progress_mut().mark_lesson_completed(lesson_id) {
                println!("✓ Completed '{}'", title);
            } else {
                println!("'{}' was already completed", title);
            }
        }
        ProgressAction::Incomplete { lesson_id } => {
            let title = lesson_title(&app, lesson_id)?;
            if app.progress_mut().mark_lesson_incomplete(lesson_id) {
                println!("'{}' marked as not completed", title);
            } else {
                println!("'{}' was not completed", title);
            }
        }
        ProgressAction::Reset => {
            app.progress_mut().reset_progress();
            println!("Progress reset");
        }
        ProgressAction::Export { output } => {
            let json = app
                .progress()
                .export_progress()
                .context("Failed to serialize progress")?;
            match output {
                Some(path) => {
                    fs::write(&path, json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("✓ Progress exported to {}", path.display());
                }
                None => println!("{}", json),
            }
        }
        ProgressAction::Import { input } => {
            let json = fs::read_to_string(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            if !app.progress_mut().import_progress(&json) {
                bail!("{} is not a valid progress export", input.display());
            }
            println!(
                "✓ Imported {} completed lessons",
                app.progress().completed_count()
            );
        }
    }

    Ok(())
}

fn lesson_title(app: &AppContext, lesson_id: u32) -> Result<String> {
    match app.store().lesson(lesson_id) {
        Some(lesson) => Ok(lesson.title.clone()),
        None => bail!("No lesson with id {} in '{}'", lesson_id, app.store().course_title()),
    }
}

fn display_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}
