//! Course document parser
//!
//! Converts one course markdown document into a [`ParsedCourse`]. The
//! pulldown-cmark event stream (with source offsets) drives an explicit
//! state machine:
//!
//! ```text
//! SeekingModule --module heading--> InModulePrelude --first paragraph--> SeekingLesson
//!       ^                                 |                                  |
//!       |                                 +---------lesson heading-----------+
//!       |                                                  |
//!       +--shallower heading--  InLessonBody  <------------+
//!                                  |    ^
//!                      fence open  v    |  fence close
//!                                InCodeFence
//! ```
//!
//! Module headings sit at one level (auto-detected as the shallowest level
//! below the title heading) and lesson headings at the next level down.

use super::blocks::{media_kind_for, CalloutKind, ContentBlock};
use super::error::CourseParseError;
use super::frontmatter::CourseFrontmatter;
use super::metadata::{self, CollectedMetadata, MetadataField};
use super::plain_text::{markdown_to_plain_text, truncate_words};
use super::slug::{strip_numbering, SlugRegistry};
use super::{BlockKind, Complexity, Lesson, Module, ParsedCourse};
use pulldown_cmark::{CodeBlockKind, Event, MetadataBlockKind, Options, Parser, Tag, TagEnd};
use std::ops::Range;

/// Maximum length of a derived lesson description
const DESCRIPTION_CHARS: usize = 160;

/// Tuning knobs for the course parser
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserOptions {
    /// Heading level of module headings; auto-detected when `None`
    pub module_level: Option<usize>,
}

/// Parse a course document with default options
///
/// # Returns
/// * `Ok(ParsedCourse)` - The module tree (not yet validated)
/// * `Err(CourseParseError)` - The document is empty or has no title
pub fn parse_course(markdown: &str) -> Result<ParsedCourse, CourseParseError> {
    CourseParser::parse(markdown, ParserOptions::default())
}

/// Parser states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    /// Before the first module heading (title and course description live here)
    SeekingModule,
    /// Right after a module heading, waiting for the module description
    InModulePrelude,
    /// Module description taken, waiting for the first lesson heading
    SeekingLesson,
    /// Inside a lesson body, producing content blocks
    InLessonBody,
    /// Inside a code block; returns to the saved state on the closing fence
    InCodeFence,
}

/// Kind of the top-level block currently being collected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingKind {
    Heading(usize),
    /// `toml` is false for YAML style blocks
    Frontmatter { toml: bool },
    Paragraph,
    List,
    BlockQuote,
    Table,
    Html,
    Other,
}

/// An image reference found inside a paragraph
#[derive(Debug, Default)]
struct ImageRef {
    url: String,
    title: String,
    alt: String,
}

/// A bold span that opens its paragraph
#[derive(Debug)]
struct LeadingStrong {
    text: String,
    /// Source offset right after the closing `**`
    end: usize,
}

/// Top-level block being collected from the event stream
#[derive(Debug)]
struct PendingBlock {
    kind: PendingKind,
    range: Range<usize>,
    /// Concatenated text events
    text: String,
    images: Vec<ImageRef>,
    image_depth: usize,
    strong_depth: usize,
    strong_text: String,
    leading_strong: Option<LeadingStrong>,
    /// Any non-whitespace text outside bold spans and images
    loose_text: bool,
}

impl PendingBlock {
    fn new(kind: PendingKind, range: Range<usize>) -> Self {
        Self {
            kind,
            range,
            text: String::new(),
            images: Vec::new(),
            image_depth: 0,
            strong_depth: 0,
            strong_text: String::new(),
            leading_strong: None,
            loose_text: false,
        }
    }

    /// Paragraph consisting of nothing but bold text
    fn is_bold_only(&self) -> bool {
        self.leading_strong.is_some() && !self.loose_text && self.images.is_empty()
    }

    /// Paragraph consisting of exactly one image
    fn single_image(&self) -> Option<&ImageRef> {
        match self.images.as_slice() {
            [image] if !self.loose_text && self.leading_strong.is_none() => Some(image),
            _ => None,
        }
    }
}

/// Fenced or indented code being collected
#[derive(Debug)]
struct FenceBuilder {
    language: Option<String>,
    code: String,
    range: Range<usize>,
}

/// A "Video Script" / "Slide Deck Example" sub-section being collected
#[derive(Debug)]
struct SpecialSection {
    kind: CalloutKind,
    /// Headings at this level or shallower end the section
    closes_at: usize,
    start: usize,
    end: usize,
}

/// Module under construction
#[derive(Debug)]
struct ModuleBuilder {
    id: u32,
    order: u32,
    title: String,
    slug: String,
    description: String,
    heading_complexity: Option<Complexity>,
    metadata: CollectedMetadata,
    lessons: Vec<Lesson>,
    lesson_slugs: SlugRegistry,
}

/// Lesson under construction
#[derive(Debug)]
struct LessonBuilder {
    id: u32,
    title: String,
    slug: String,
    heading_complexity: Option<Complexity>,
    metadata: CollectedMetadata,
    blocks: Vec<ContentBlock>,
    special: Option<SpecialSection>,
}

/// Parser state for converting a course document into modules and lessons
pub struct CourseParser<'src> {
    source: &'src str,
    module_level: usize,
    state: ParserState,
    /// State to return to when the current code fence closes
    resume_state: ParserState,
    /// Nesting depth of open tags; 0 means between top-level blocks
    depth: usize,
    pending: Option<PendingBlock>,
    fence: Option<FenceBuilder>,
    headings_seen: usize,

    title: Option<String>,
    bold_title: Option<String>,
    description: Option<String>,
    frontmatter: CourseFrontmatter,

    module: Option<ModuleBuilder>,
    lesson: Option<LessonBuilder>,
    modules: Vec<Module>,
    module_slugs: SlugRegistry,
    next_module_id: u32,
    next_lesson_id: u32,
}

impl<'src> CourseParser<'src> {
    fn new(source: &'src str, module_level: usize) -> Self {
        Self {
            source,
            module_level,
            state: ParserState::SeekingModule,
            resume_state: ParserState::SeekingModule,
            depth: 0,
            pending: None,
            fence: None,
            headings_seen: 0,
            title: None,
            bold_title: None,
            description: None,
            frontmatter: CourseFrontmatter::default(),
            module: None,
            lesson: None,
            modules: Vec::new(),
            module_slugs: SlugRegistry::new(),
            next_module_id: 1,
            next_lesson_id: 1,
        }
    }

    /// Parse a course document
    ///
    /// # Parameters
    /// * `markdown` - The whole course document
    /// * `options` - Heading level overrides
    ///
    /// # Returns
    /// * `Ok(ParsedCourse)` - Modules in document order with `order` 1..N
    /// * `Err(CourseParseError)` - No usable title was found
    pub fn parse(
        markdown: &str,
        options: ParserOptions,
    ) -> Result<ParsedCourse, CourseParseError> {
        if markdown.trim().is_empty() {
            return Err(CourseParseError::EmptyDocument);
        }

        let events: Vec<(Event<'_>, Range<usize>)> =
            Parser::new_ext(markdown, parser_options()).into_offset_iter().collect();

        let module_level = options
            .module_level
            .unwrap_or_else(|| detect_module_level(&events));
        log::debug!(
            "Parsing course: module headings at h{}, lessons at h{}",
            module_level,
            module_level + 1
        );

        let mut parser = CourseParser::new(markdown, module_level);
        for (event, range) in events {
            parser.process_event(event, range);
        }
        parser.finish()
    }

    fn lesson_level(&self) -> usize {
        self.module_level + 1
    }

    fn transition(&mut self, next: ParserState) {
        if self.state != next {
            log::trace!("Parser state {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    /// Process a single markdown event
    fn process_event(&mut self, event: Event<'_>, range: Range<usize>) {
        match event {
            Event::Start(tag) => {
                if self.depth == 0 {
                    self.open_block(tag, range);
                } else {
                    self.open_inline(tag, range);
                }
                self.depth += 1;
            }
            Event::End(tag_end) => {
                self.depth = self.depth.saturating_sub(1);
                if self.depth == 0 {
                    self.close_block();
                } else {
                    self.close_inline(tag_end, range);
                }
            }
            Event::Text(text) | Event::Code(text) | Event::InlineMath(text) => {
                self.handle_text(&text)
            }
            Event::DisplayMath(text) | Event::Html(text) | Event::InlineHtml(text) => {
                self.handle_text(&text)
            }
            Event::SoftBreak | Event::HardBreak => self.handle_text(" "),
            Event::Rule => {
                if self.depth == 0 {
                    log::trace!("Ignoring thematic break at {:?}", range);
                }
            }
            Event::FootnoteReference(_) | Event::TaskListMarker(_) => {}
        }
    }

    /// Handle the opening tag of a top-level block
    fn open_block(&mut self, tag: Tag<'_>, range: Range<usize>) {
        let kind = match tag {
            Tag::CodeBlock(kind) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(str::to_string)
                        .filter(|lang| !lang.is_empty()),
                    CodeBlockKind::Indented => None,
                };
                self.fence = Some(FenceBuilder {
                    language,
                    code: String::new(),
                    range,
                });
                self.resume_state = self.state;
                self.transition(ParserState::InCodeFence);
                return;
            }
            Tag::Heading { level, .. } => PendingKind::Heading(level as usize),
            Tag::MetadataBlock(kind) => PendingKind::Frontmatter {
                toml: matches!(kind, MetadataBlockKind::PlusesStyle),
            },
            Tag::Paragraph => PendingKind::Paragraph,
            Tag::List(_) => PendingKind::List,
            Tag::BlockQuote(_) => PendingKind::BlockQuote,
            Tag::Table(_) => PendingKind::Table,
            Tag::HtmlBlock => PendingKind::Html,
            _ => PendingKind::Other,
        };
        self.pending = Some(PendingBlock::new(kind, range));
    }

    /// Handle an opening tag nested inside a top-level block
    fn open_inline(&mut self, tag: Tag<'_>, _range: Range<usize>) {
        let Some(pending) = self.pending.as_mut() else {
            return;
        };

        match tag {
            Tag::Strong => {
                if pending.strong_depth == 0 {
                    pending.strong_text.clear();
                }
                pending.strong_depth += 1;
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                pending.images.push(ImageRef {
                    url: dest_url.to_string(),
                    title: title.to_string(),
                    alt: String::new(),
                });
                pending.image_depth += 1;
            }
            _ => {}
        }
    }

    /// Handle a closing tag nested inside a top-level block
    fn close_inline(&mut self, tag_end: TagEnd, range: Range<usize>) {
        let Some(pending) = self.pending.as_mut() else {
            return;
        };

        match tag_end {
            TagEnd::Strong => {
                pending.strong_depth = pending.strong_depth.saturating_sub(1);
                let opens_paragraph = pending.leading_strong.is_none()
                    && !pending.loose_text
                    && pending.images.is_empty();
                if pending.strong_depth == 0 && opens_paragraph {
                    pending.leading_strong = Some(LeadingStrong {
                        text: std::mem::take(&mut pending.strong_text),
                        end: range.end,
                    });
                }
            }
            TagEnd::Image => {
                pending.image_depth = pending.image_depth.saturating_sub(1);
            }
            _ => {}
        }
    }

    /// Handle text content
    fn handle_text(&mut self, text: &str) {
        if self.state == ParserState::InCodeFence {
            if let Some(fence) = self.fence.as_mut() {
                fence.code.push_str(text);
            }
            return;
        }

        let Some(pending) = self.pending.as_mut() else {
            return;
        };

        if pending.image_depth > 0 {
            if let Some(image) = pending.images.last_mut() {
                image.alt.push_str(text);
            }
        } else if pending.strong_depth > 0 {
            pending.strong_text.push_str(text);
        } else if !text.trim().is_empty() {
            pending.loose_text = true;
        }
        pending.text.push_str(text);
    }

    /// Dispatch a completed top-level block
    fn close_block(&mut self) {
        if self.state == ParserState::InCodeFence {
            self.transition(self.resume_state);
            if let Some(fence) = self.fence.take() {
                self.on_code(fence);
            }
            return;
        }

        let Some(block) = self.pending.take() else {
            return;
        };

        match block.kind {
            PendingKind::Heading(level) => self.on_heading(level, &block),
            PendingKind::Frontmatter { toml } => self.on_frontmatter(toml, &block.text),
            _ => self.on_prose(block),
        }
    }

    fn on_frontmatter(&mut self, toml: bool, content: &str) {
        if !toml {
            log::warn!("Ignoring YAML frontmatter; use a +++ TOML block instead");
            return;
        }
        match CourseFrontmatter::parse(content) {
            Ok(frontmatter) => self.frontmatter = frontmatter,
            Err(e) => log::warn!("Ignoring malformed course frontmatter: {}", e),
        }
    }

    fn on_heading(&mut self, level: usize, block: &PendingBlock) {
        let text = block.text.trim().to_string();
        let first_heading = self.headings_seen == 0;
        self.headings_seen += 1;

        if first_heading && level == 1 {
            self.title = Some(text);
            return;
        }

        // Sub-sections inside a lesson, including ones written at lesson level
        if self.state == ParserState::InLessonBody && level >= self.lesson_level() {
            if let Some(kind) = CalloutKind::from_section_label(&text) {
                self.open_special(kind, level, block.range.end);
                return;
            }
        }

        self.close_special_at(level);
        if self.extend_special(&block.range) {
            return;
        }

        if level == self.module_level {
            self.finish_module();
            self.start_module(&text);
            self.transition(ParserState::InModulePrelude);
        } else if level == self.lesson_level() {
            if self.module.is_none() {
                log::warn!("Skipping lesson '{}' that appears before any module", text);
                self.transition(ParserState::SeekingModule);
                return;
            }
            self.finish_lesson();
            self.start_lesson(&text);
            self.transition(ParserState::InLessonBody);
        } else if level < self.module_level {
            log::debug!("Heading '{}' (h{}) closes the current module", text, level);
            self.finish_module();
            self.transition(ParserState::SeekingModule);
        } else if self.state == ParserState::InLessonBody {
            let raw = self.slice(&block.range).trim().to_string();
            self.push_block(|id| ContentBlock::text(id, raw));
        } else {
            log::debug!("Ignoring sub-heading '{}' outside a lesson", text);
        }
    }

    fn on_prose(&mut self, block: PendingBlock) {
        if self.extend_special(&block.range) {
            return;
        }

        let raw = self.slice(&block.range).trim();

        // Bold "**Video Script**" label paragraphs open a sub-section too
        if self.state == ParserState::InLessonBody {
            if let Some(kind) = block
                .leading_strong
                .as_ref()
                .and_then(|strong| CalloutKind::from_section_label(&strong.text))
            {
                let start = block
                    .leading_strong
                    .as_ref()
                    .map_or(block.range.end, |strong| strong.end);
                self.open_special(kind, usize::MAX, start);
                if let Some(special) = self.current_special_mut() {
                    special.end = block.range.end;
                }
                return;
            }
        }

        let metadata = match block.kind {
            PendingKind::Paragraph | PendingKind::List => metadata::parse_metadata_block(raw),
            _ => None,
        };

        match self.state {
            ParserState::SeekingModule => self.on_course_prose(&block),
            ParserState::InModulePrelude | ParserState::SeekingLesson => {
                self.on_module_prose(&block, metadata)
            }
            ParserState::InLessonBody => self.on_lesson_prose(&block, metadata),
            ParserState::InCodeFence => {}
        }
    }

    fn on_course_prose(&mut self, block: &PendingBlock) {
        if self.headings_seen == 0 && self.bold_title.is_none() && block.is_bold_only() {
            self.bold_title = Some(block.text.trim().to_string());
            return;
        }

        if self.description.is_none() && block.kind == PendingKind::Paragraph {
            self.description = Some(markdown_to_plain_text(self.slice(&block.range)));
            return;
        }

        log::trace!("Ignoring course-level block at {:?}", block.range);
    }

    fn on_module_prose(&mut self, block: &PendingBlock, metadata: Option<Vec<MetadataField>>) {
        let Some(module) = self.module.as_mut() else {
            return;
        };

        if let Some(fields) = metadata {
            fields
                .into_iter()
                .for_each(|field| module.metadata.apply(field));
            return;
        }

        if self.state == ParserState::InModulePrelude && block.kind == PendingKind::Paragraph {
            module.description = markdown_to_plain_text(&self.source[block.range.clone()]);
            self.transition(ParserState::SeekingLesson);
            return;
        }

        log::debug!(
            "Ignoring content in module '{}' before its first lesson",
            module.title
        );
    }

    fn on_lesson_prose(&mut self, block: &PendingBlock, metadata: Option<Vec<MetadataField>>) {
        if let Some(fields) = metadata {
            if let Some(lesson) = self.lesson.as_mut() {
                fields
                    .into_iter()
                    .for_each(|field| lesson.metadata.apply(field));
            }
            return;
        }

        let raw = self.slice(&block.range).trim().to_string();

        if let Some((kind, rest)) = callout_text(block.kind, &raw) {
            self.push_block(|id| ContentBlock::callout(id, kind, rest));
            return;
        }

        if let Some(image) = block.single_image() {
            let kind = media_kind_for(&image.url);
            let src = image.url.clone();
            let alt = non_empty(&image.alt);
            let caption = non_empty(&image.title);
            self.push_block(|id| ContentBlock::media(id, kind, src, alt, caption));
            return;
        }

        if matches!(block.kind, PendingKind::Html | PendingKind::Other) {
            log::warn!(
                "Unrecognized block at bytes {}..{} kept as text",
                block.range.start,
                block.range.end
            );
        }
        self.push_block(|id| ContentBlock::text(id, raw));
    }

    fn on_code(&mut self, fence: FenceBuilder) {
        if self.extend_special(&fence.range) {
            return;
        }

        if self.state != ParserState::InLessonBody {
            log::debug!("Ignoring code block outside a lesson at {:?}", fence.range);
            return;
        }

        let code = fence.code.trim_end_matches('\n').to_string();
        let language = fence.language;
        self.push_block(|id| ContentBlock::code(id, code, language));
    }

    fn start_module(&mut self, heading: &str) {
        let (title, heading_complexity) = split_heading(heading);
        let id = self.next_module_id;
        self.next_module_id += 1;

        let slug = self.module_slugs.claim(&title, &format!("module-{}", id));
        self.module = Some(ModuleBuilder {
            id,
            order: self.modules.len() as u32 + 1,
            title,
            slug,
            description: String::new(),
            heading_complexity,
            metadata: CollectedMetadata::default(),
            lessons: Vec::new(),
            lesson_slugs: SlugRegistry::new(),
        });
    }

    fn start_lesson(&mut self, heading: &str) {
        let Some(module) = self.module.as_mut() else {
            return;
        };

        let (title, heading_complexity) = split_heading(heading);
        let id = self.next_lesson_id;
        self.next_lesson_id += 1;

        let slug = module.lesson_slugs.claim(&title, &format!("lesson-{}", id));
        self.lesson = Some(LessonBuilder {
            id,
            title,
            slug,
            heading_complexity,
            metadata: CollectedMetadata::default(),
            blocks: Vec::new(),
            special: None,
        });
    }

    fn finish_lesson(&mut self) {
        self.close_special_at(0);

        let Some(lesson) = self.lesson.take() else {
            return;
        };
        let Some(module) = self.module.as_mut() else {
            return;
        };

        let description = lesson
            .blocks
            .iter()
            .find(|block| block.kind == BlockKind::Text)
            .map(|block| truncate_words(&markdown_to_plain_text(&block.content), DESCRIPTION_CHARS))
            .unwrap_or_default();

        let complexity = lesson
            .metadata
            .complexity
            .or(lesson.heading_complexity)
            .or(module.metadata.complexity)
            .or(module.heading_complexity)
            .unwrap_or_default();

        if lesson.blocks.is_empty() {
            log::debug!("Lesson '{}' has no content blocks", lesson.title);
        }

        module.lessons.push(Lesson {
            id: lesson.id,
            module_id: module.id,
            title: lesson.title,
            slug: lesson.slug,
            description,
            estimated_time: lesson.metadata.estimated_time.unwrap_or_default(),
            tools: lesson.metadata.tools,
            complexity: complexity.to_string(),
            prerequisites: lesson.metadata.prerequisites,
            content: lesson.blocks,
            order: module.lessons.len() as u32 + 1,
        });
    }

    fn finish_module(&mut self) {
        self.finish_lesson();

        let Some(module) = self.module.take() else {
            return;
        };

        let estimated_time = module
            .metadata
            .estimated_time
            .clone()
            .unwrap_or_else(|| sum_lesson_durations(&module.lessons));

        self.modules.push(Module {
            id: module.id,
            title: module.title,
            slug: module.slug,
            description: module.description,
            estimated_time,
            complexity: module
                .metadata
                .complexity
                .or(module.heading_complexity)
                .unwrap_or_default(),
            prerequisites: module.metadata.prerequisites,
            lessons: module.lessons,
            order: module.order,
        });
    }

    fn open_special(&mut self, kind: CalloutKind, closes_at: usize, start: usize) {
        self.close_special_at(0);
        if let Some(lesson) = self.lesson.as_mut() {
            log::trace!("Opening {} section in '{}'", kind.label(), lesson.title);
            lesson.special = Some(SpecialSection {
                kind,
                closes_at,
                start,
                end: start,
            });
        }
    }

    fn current_special_mut(&mut self) -> Option<&mut SpecialSection> {
        self.lesson.as_mut()?.special.as_mut()
    }

    /// Grow the open sub-section to cover `range`; false when none is open
    fn extend_special(&mut self, range: &Range<usize>) -> bool {
        match self.current_special_mut() {
            Some(special) => {
                special.end = special.end.max(range.end);
                true
            }
            None => false,
        }
    }

    /// Close the open sub-section if a heading at `level` ends it (0 always closes)
    fn close_special_at(&mut self, level: usize) {
        let source = self.source;
        let Some(lesson) = self.lesson.as_mut() else {
            return;
        };
        let closes = lesson
            .special
            .as_ref()
            .is_some_and(|special| level == 0 || level <= special.closes_at);
        if !closes {
            return;
        }
        let Some(special) = lesson.special.take() else {
            return;
        };

        let content = source
            .get(special.start..special.end)
            .unwrap_or_default()
            .trim()
            .trim_start_matches(':')
            .trim_start()
            .to_string();
        if content.is_empty() {
            log::debug!("Dropping empty {} section in '{}'", special.kind.label(), lesson.title);
            return;
        }

        let id = format!("lesson-{}-block-{}", lesson.id, lesson.blocks.len() + 1);
        lesson
            .blocks
            .push(ContentBlock::callout(id, special.kind, content));
    }

    /// Append a block to the current lesson, assigning the next block id
    fn push_block(&mut self, make: impl FnOnce(String) -> ContentBlock) {
        if let Some(lesson) = self.lesson.as_mut() {
            let id = format!("lesson-{}-block-{}", lesson.id, lesson.blocks.len() + 1);
            lesson.blocks.push(make(id));
        }
    }

    fn slice(&self, range: &Range<usize>) -> &'src str {
        self.source.get(range.clone()).unwrap_or_default()
    }

    /// Finalize parsing
    fn finish(mut self) -> Result<ParsedCourse, CourseParseError> {
        self.finish_module();

        let title = self
            .frontmatter
            .title()
            .map(str::to_string)
            .or(self.title.filter(|t| !t.is_empty()))
            .or(self.bold_title.filter(|t| !t.is_empty()))
            .ok_or(CourseParseError::MissingTitle)?;

        let description = self
            .frontmatter
            .description()
            .map(str::to_string)
            .or(self.description)
            .unwrap_or_default();

        log::debug!(
            "Parsed course '{}': {} modules, {} lessons",
            title,
            self.modules.len(),
            self.modules.iter().map(|m| m.lessons.len()).sum::<usize>()
        );

        Ok(ParsedCourse {
            title,
            description,
            modules: self.modules,
        })
    }
}

fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_YAML_STYLE_METADATA_BLOCKS
        | Options::ENABLE_PLUSES_DELIMITED_METADATA_BLOCKS
}

/// Heading level that delimits modules, not counting a leading h1 title
///
/// A level qualifies when its headings are followed by headings exactly one
/// level deeper (their lessons). The shallowest level where at least two
/// headings qualify wins, so a lone `## Introduction` above `### Section`
/// modules is not taken for the only module. Failing that, the shallowest
/// level with any qualifying heading, then the shallowest level overall.
/// `Video Script` style sub-sections never count as lessons.
fn detect_module_level(events: &[(Event<'_>, Range<usize>)]) -> usize {
    let mut depth = 0usize;
    let mut headings: Vec<(usize, String)> = Vec::new();
    let mut in_heading = false;

    for (event, _) in events {
        match event {
            Event::Start(tag) => {
                if depth == 0 {
                    if let Tag::Heading { level, .. } = tag {
                        headings.push((*level as usize, String::new()));
                        in_heading = true;
                    }
                }
                depth += 1;
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    in_heading = false;
                }
            }
            Event::Text(text) | Event::Code(text) if in_heading => {
                if let Some((_, heading)) = headings.last_mut() {
                    heading.push_str(text);
                }
            }
            _ => {}
        }
    }

    let candidates = match headings.first() {
        Some((1, _)) => &headings[1..],
        _ => &headings[..],
    };

    // parents[l] = number of level-l headings followed by level l+1 children
    let mut parents = [0usize; 7];
    for (index, (level, _)) in candidates.iter().enumerate() {
        let has_child = candidates[index + 1..]
            .iter()
            .take_while(|(next, _)| next > level)
            .any(|(next, text)| {
                *next == level + 1 && CalloutKind::from_section_label(text).is_none()
            });
        if has_child && *level < parents.len() {
            parents[*level] += 1;
        }
    }

    let shallowest = |min_parents: usize| (1..parents.len()).find(|&l| parents[l] >= min_parents);
    shallowest(2)
        .or_else(|| shallowest(1))
        .or_else(|| candidates.iter().map(|(level, _)| *level).min())
        .unwrap_or(2)
}

/// Strip numbering and a trailing `(Beginner)` style tag from a heading
fn split_heading(heading: &str) -> (String, Option<Complexity>) {
    let title = strip_numbering(heading);

    if let Some(open) = title.rfind('(') {
        let tag = &title[open..];
        if tag.ends_with(')') {
            let inner = &tag[1..tag.len() - 1];
            if let Ok(complexity) = inner.parse::<Complexity>() {
                return (title[..open].trim().to_string(), Some(complexity));
            }
        }
    }

    (title.to_string(), None)
}

/// Callout marker detection for paragraphs and block quotes
fn callout_text(kind: PendingKind, raw: &str) -> Option<(CalloutKind, String)> {
    match kind {
        PendingKind::Paragraph => {
            CalloutKind::strip_marker(raw).map(|(kind, rest)| (kind, rest.to_string()))
        }
        PendingKind::BlockQuote => {
            let unquoted = raw
                .lines()
                .map(|line| {
                    let line = line.trim_start();
                    line.strip_prefix('>')
                        .map(|rest| rest.strip_prefix(' ').unwrap_or(rest))
                        .unwrap_or(line)
                })
                .collect::<Vec<_>>()
                .join("\n");
            CalloutKind::strip_marker(&unquoted).map(|(kind, rest)| (kind, rest.to_string()))
        }
        _ => None,
    }
}

/// Total of the lessons' parseable durations, or empty when none parse
fn sum_lesson_durations(lessons: &[Lesson]) -> String {
    let minutes: Vec<u32> = lessons
        .iter()
        .filter_map(|lesson| metadata::parse_duration_minutes(&lesson.estimated_time))
        .collect();

    if minutes.is_empty() {
        String::new()
    } else {
        metadata::format_minutes(minutes.into_iter().fold(0, u32::saturating_add))
    }
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
