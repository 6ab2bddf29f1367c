//! Best-effort extraction of lesson/module metadata from free text
//!
//! Course documents describe estimated time, complexity, tools and
//! prerequisites in loosely formatted `Key: value` lines, for example:
//!
//! ```markdown
//! **Estimated Time:** 45 minutes
//! - **Tools:** [VS Code, Chrome DevTools]
//! Prerequisites: HTML Basics, CSS Fundamentals
//! ```
//!
//! Nothing here is strict. Unknown keys mean the line is not metadata and
//! the surrounding paragraph is kept as prose.

use super::Complexity;
use regex::Regex;
use std::sync::LazyLock;

/// `Key: value`, tolerating list markers, bold/italic wrappers and a leading emoji
static METADATA_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*+]\s+)?[^\p{L}\p{N}\[]*?([\p{L}][\p{L} ]*?)\s*(?:[*_]{1,2})?\s*:\s*(?:[*_]{1,2})?\s*(.*)$")
        .expect("metadata line pattern is valid")
});

/// `90 minutes`, `1.5 hours`, `2h`, `45 min`
static DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(hours?|hrs?|h|minutes?|mins?|m)\b")
        .expect("duration pattern is valid")
});

/// Longest duration accepted for one lesson or module (1000 hours)
pub const MAX_DURATION_MINUTES: u32 = 60_000;

/// A single recognized metadata entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataField {
    EstimatedTime(String),
    Complexity(Complexity),
    Tools(Vec<String>),
    Prerequisites(Vec<String>),
}

/// Metadata collected for one module or lesson
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectedMetadata {
    pub estimated_time: Option<String>,
    pub complexity: Option<Complexity>,
    pub tools: Vec<String>,
    pub prerequisites: Vec<String>,
}

impl CollectedMetadata {
    /// Merge one field; later values for scalar fields win, list fields accumulate
    pub fn apply(&mut self, field: MetadataField) {
        match field {
            MetadataField::EstimatedTime(time) => self.estimated_time = Some(time),
            MetadataField::Complexity(complexity) => self.complexity = Some(complexity),
            MetadataField::Tools(tools) => extend_unique(&mut self.tools, tools),
            MetadataField::Prerequisites(prereqs) => extend_unique(&mut self.prerequisites, prereqs),
        }
    }
}

fn extend_unique(target: &mut Vec<String>, items: Vec<String>) {
    for item in items {
        if !target.iter().any(|existing| existing.eq_ignore_ascii_case(&item)) {
            target.push(item);
        }
    }
}

/// Parse a single line as a metadata entry
pub fn parse_metadata_line(line: &str) -> Option<MetadataField> {
    let captures = METADATA_LINE.captures(line)?;
    let key = captures.get(1)?.as_str().trim().to_lowercase();
    let value = clean_value(captures.get(2)?.as_str());

    if value.is_empty() {
        return None;
    }

    match key.as_str() {
        "estimated time" | "time" | "duration" | "time required" | "estimated duration" => {
            Some(MetadataField::EstimatedTime(value))
        }
        "complexity" | "difficulty" | "level" => {
            Complexity::from_label(&value).map(MetadataField::Complexity)
        }
        "tools" | "tools needed" | "required tools" | "tools used" => {
            Some(MetadataField::Tools(parse_list(&value)))
        }
        "prerequisites" | "prerequisite" | "prereqs" | "requires" => {
            let items = parse_list(&value);
            if items.len() == 1 && items[0].eq_ignore_ascii_case("none") {
                Some(MetadataField::Prerequisites(Vec::new()))
            } else {
                Some(MetadataField::Prerequisites(items))
            }
        }
        _ => None,
    }
}

/// Parse a block of text whose every non-empty line is a metadata entry
///
/// # Returns
/// * `Some(fields)` - All lines were metadata
/// * `None` - At least one line was prose, so the block is not metadata
pub fn parse_metadata_block(text: &str) -> Option<Vec<MetadataField>> {
    let fields: Option<Vec<MetadataField>> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_metadata_line)
        .collect();

    fields.filter(|fields| !fields.is_empty())
}

/// Split a `[a, b]` or `a, b; c` list into trimmed items
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split([',', ';'])
        .map(|item| {
            item.trim()
                .trim_matches(|c| matches!(c, '"' | '\'' | '`' | '*' | '_'))
                .trim()
                .to_string()
        })
        .filter(|item| !item.is_empty())
        .collect()
}

/// Parse a free-text duration into whole minutes
///
/// # Examples
/// * `"45 minutes"` -> `Some(45)`
/// * `"1.5 hours"` -> `Some(90)`
/// * `"1 hour 30 minutes"` -> `Some(90)`
/// * `"a while"` -> `None`
/// * `"99999999 hours"` -> `None` (longer than [`MAX_DURATION_MINUTES`])
pub fn parse_duration_minutes(text: &str) -> Option<u32> {
    let mut total = 0.0_f64;
    let mut found = false;

    for captures in DURATION.captures_iter(text) {
        let Ok(amount) = captures[1].parse::<f64>() else {
            continue;
        };
        let unit = captures[2].to_lowercase();
        total += if unit.starts_with('h') {
            amount * 60.0
        } else {
            amount
        };
        found = true;
    }

    if !found || !(0.0..=f64::from(MAX_DURATION_MINUTES)).contains(&total) {
        return None;
    }
    Some(total.round() as u32)
}

/// Format whole minutes back into a readable duration
pub fn format_minutes(minutes: u32) -> String {
    let hours = minutes / 60;
    let rest = minutes % 60;
    let plural = |n: u32, unit: &str| {
        if n == 1 {
            format!("1 {}", unit)
        } else {
            format!("{} {}s", n, unit)
        }
    };

    match (hours, rest) {
        (0, m) => plural(m, "minute"),
        (h, 0) => plural(h, "hour"),
        (h, m) => format!("{} {}", plural(h, "hour"), plural(m, "minute")),
    }
}

fn clean_value(raw: &str) -> String {
    raw.trim()
        .trim_start_matches(['*', '_'])
        .trim_end_matches(['*', '_'])
        .trim()
        .to_string()
}
