//! Lesson content blocks
//!
//! This module defines the typed units a lesson body is split into
//! (prose, code, media and callouts).

use serde::{Deserialize, Serialize};

/// Kind of a content block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    /// Markdown prose
    Text,
    /// Still image (asset path or URL)
    Image,
    /// Video asset or hosted video URL
    Video,
    /// Animated gif
    Gif,
    /// Source code with a language hint
    Code,
    /// Visually distinguished aside
    Callout,
}

impl BlockKind {
    /// Lowercase name as used in serialized output
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Text => "text",
            BlockKind::Image => "image",
            BlockKind::Video => "video",
            BlockKind::Gif => "gif",
            BlockKind::Code => "code",
            BlockKind::Callout => "callout",
        }
    }
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flavour of a callout block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CalloutKind {
    /// 💡
    Tip,
    /// ⚠️
    Warning,
    /// 📝
    Note,
    /// ❗
    Important,
    /// A "Video Script" sub-section
    VideoScript,
    /// A "Slide Deck Example" sub-section
    SlideDeck,
}

/// Leading markers recognized as callouts, longest variants first.
///
/// The warning sign is matched with and without the emoji variation selector.
const CALLOUT_MARKERS: &[(&str, CalloutKind)] = &[
    ("💡", CalloutKind::Tip),
    ("⚠️", CalloutKind::Warning),
    ("⚠", CalloutKind::Warning),
    ("📝", CalloutKind::Note),
    ("❗", CalloutKind::Important),
];

impl CalloutKind {
    /// Human readable label, used as the block caption
    pub fn label(&self) -> &'static str {
        match self {
            CalloutKind::Tip => "Tip",
            CalloutKind::Warning => "Warning",
            CalloutKind::Note => "Note",
            CalloutKind::Important => "Important",
            CalloutKind::VideoScript => "Video Script",
            CalloutKind::SlideDeck => "Slide Deck Example",
        }
    }

    /// Whether this callout wraps a whole labelled sub-section
    pub fn is_section(&self) -> bool {
        matches!(self, CalloutKind::VideoScript | CalloutKind::SlideDeck)
    }

    /// Split a leading emoji marker off `text`
    ///
    /// # Returns
    /// * `Some((kind, rest))` - The marker kind and the text after the marker, trimmed
    /// * `None` - The first non-whitespace characters are not a callout marker
    pub fn strip_marker(text: &str) -> Option<(CalloutKind, &str)> {
        let trimmed = text.trim_start();
        CALLOUT_MARKERS.iter().find_map(|(marker, kind)| {
            trimmed
                .strip_prefix(marker)
                .map(|rest| (*kind, rest.trim_start_matches('\u{FE0F}').trim()))
        })
    }

    /// Recognize a sub-section label such as "Video Script" or "Slide Deck Example:"
    pub fn from_section_label(label: &str) -> Option<CalloutKind> {
        let normalized = label
            .trim()
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();

        match normalized.as_str() {
            "video script" => Some(CalloutKind::VideoScript),
            "slide deck example" | "slide deck" => Some(CalloutKind::SlideDeck),
            _ => None,
        }
    }
}

/// Optional rendering hints attached to a block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,

    /// Language hint for code blocks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoplay: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none", rename = "loop")]
    pub loop_playback: Option<bool>,

    /// Callout flavour for callout blocks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callout: Option<CalloutKind>,
}

/// One renderable unit of lesson material
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    /// Identifier, unique within the owning lesson
    pub id: String,

    #[serde(rename = "type")]
    pub kind: BlockKind,

    /// Raw payload: markdown prose, source code, or an asset path/URL depending on `kind`
    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BlockMetadata>,
}

impl ContentBlock {
    /// Create a text block
    pub fn text(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: BlockKind::Text,
            content: content.into(),
            metadata: None,
        }
    }

    /// Create a code block with an optional language hint
    pub fn code(id: impl Into<String>, code: impl Into<String>, language: Option<String>) -> Self {
        Self {
            id: id.into(),
            kind: BlockKind::Code,
            content: code.into(),
            metadata: language.map(|language| BlockMetadata {
                language: Some(language),
                ..Default::default()
            }),
        }
    }

    /// Create a callout block
    ///
    /// Section callouts (video scripts, slide decks) carry their label as caption.
    pub fn callout(id: impl Into<String>, kind: CalloutKind, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: BlockKind::Callout,
            content: content.into(),
            metadata: Some(BlockMetadata {
                caption: kind.is_section().then(|| kind.label().to_string()),
                callout: Some(kind),
                ..Default::default()
            }),
        }
    }

    /// Create a media block (image, gif or video) pointing at `src`
    pub fn media(
        id: impl Into<String>,
        kind: BlockKind,
        src: impl Into<String>,
        alt: Option<String>,
        caption: Option<String>,
    ) -> Self {
        let animated = kind == BlockKind::Gif;
        Self {
            id: id.into(),
            kind,
            content: src.into(),
            metadata: Some(BlockMetadata {
                caption,
                alt,
                autoplay: animated.then_some(true),
                loop_playback: animated.then_some(true),
                ..Default::default()
            }),
        }
    }

    /// Language hint of a code block
    pub fn language(&self) -> Option<&str> {
        self.metadata.as_ref()?.language.as_deref()
    }

    /// Callout flavour of a callout block
    pub fn callout_kind(&self) -> Option<CalloutKind> {
        self.metadata.as_ref()?.callout
    }
}

/// Decide which media kind an asset path or URL refers to
pub fn media_kind_for(src: &str) -> BlockKind {
    let lower = src.to_lowercase();
    let path = lower.split(['?', '#']).next().unwrap_or_default();

    if path.ends_with(".gif") {
        return BlockKind::Gif;
    }

    const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".webm", ".ogg", ".ogv", ".mov"];
    const VIDEO_HOSTS: &[&str] = &["youtube.com/", "youtu.be/", "vimeo.com/"];

    if VIDEO_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
        || VIDEO_HOSTS.iter().any(|host| lower.contains(host))
    {
        BlockKind::Video
    } else {
        BlockKind::Image
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("💡 Use semantic tags", CalloutKind::Tip, "Use semantic tags")]
    #[case("⚠️ Never commit secrets", CalloutKind::Warning, "Never commit secrets")]
    #[case("⚠ Bare warning sign", CalloutKind::Warning, "Bare warning sign")]
    #[case("  📝 Indented note", CalloutKind::Note, "Indented note")]
    #[case("❗Important without space", CalloutKind::Important, "Important without space")]
    fn test_strip_marker(#[case] input: &str, #[case] kind: CalloutKind, #[case] rest: &str) {
        assert_eq!(CalloutKind::strip_marker(input), Some((kind, rest)));
    }

    #[test]
    fn test_strip_marker_rejects_plain_text() {
        assert_eq!(CalloutKind::strip_marker("Plain paragraph 💡"), None);
    }

    #[rstest]
    #[case("Video Script", Some(CalloutKind::VideoScript))]
    #[case("video script:", Some(CalloutKind::VideoScript))]
    #[case("🎬 Video Script", Some(CalloutKind::VideoScript))]
    #[case("Slide Deck Example", Some(CalloutKind::SlideDeck))]
    #[case("Exercises", None)]
    fn test_from_section_label(#[case] label: &str, #[case] expected: Option<CalloutKind>) {
        assert_eq!(CalloutKind::from_section_label(label), expected);
    }

    #[rstest]
    #[case("images/diagram.png", BlockKind::Image)]
    #[case("demo/Loop.GIF", BlockKind::Gif)]
    #[case("media/intro.mp4?t=3", BlockKind::Video)]
    #[case("https://www.youtube.com/watch?v=abc", BlockKind::Video)]
    fn test_media_kind_for(#[case] src: &str, #[case] expected: BlockKind) {
        assert_eq!(media_kind_for(src), expected);
    }

    #[test]
    fn test_block_serializes_type_tag_and_skips_empty_metadata() {
        // Arrange: A plain text block
        let block = ContentBlock::text("intro-block-1", "Hello");

        // Act: Serialize to JSON
        let json = serde_json::to_value(&block).unwrap();

        // Assert: `type` is lowercase and metadata is omitted
        assert_eq!(json["type"], "text");
        assert!(json.get("metadata").is_none());
    }

    #[test]
    fn test_section_callout_carries_label_as_caption() {
        let block = ContentBlock::callout("b1", CalloutKind::VideoScript, "Narration");

        assert_eq!(block.callout_kind(), Some(CalloutKind::VideoScript));
        assert_eq!(
            block.metadata.unwrap().caption.as_deref(),
            Some("Video Script")
        );
    }

    #[test]
    fn test_gif_autoplays_and_loops() {
        let block = ContentBlock::media("b1", BlockKind::Gif, "a.gif", None, None);
        let metadata = block.metadata.unwrap();

        assert_eq!(metadata.autoplay, Some(true));
        assert_eq!(metadata.loop_playback, Some(true));
    }
}
