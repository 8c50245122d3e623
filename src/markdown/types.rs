//! Core document and render buffer types.

use crate::terminal::ansi;
use crate::ui::style::{style_for_inline, style_for_line_type};

/// The raw text of the watched file.
///
/// Documents are immutable; a file change produces a new document with a
/// higher version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    source: String,
    version: u64,
}

impl Document {
    pub fn new(source: impl Into<String>, version: u64) -> Self {
        Self {
            source: source.into(),
            version,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Whitespace-separated word count of the source.
    pub fn word_count(&self) -> usize {
        self.source.split_whitespace().count()
    }
}

/// All rendered lines of a document at one width.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderBuffer {
    lines: Vec<RenderedLine>,
}

impl RenderBuffer {
    pub const fn new(lines: Vec<RenderedLine>) -> Self {
        Self { lines }
    }

    /// Unstyled, unwrapped lines. Used when markdown rendering fails.
    pub fn plain(text: &str) -> Self {
        let lines = text
            .lines()
            .map(|line| RenderedLine::new(line.to_string(), LineType::Paragraph))
            .collect();
        Self { lines }
    }

    pub fn lines(&self) -> &[RenderedLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RenderedLine> {
        self.lines.get(index)
    }

    /// All lines SGR-encoded and joined with `\n`.
    ///
    /// Splitting the result on `\n` yields exactly one entry per line.
    pub fn to_ansi_string(&self) -> String {
        self.lines
            .iter()
            .map(RenderedLine::to_ansi)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A single rendered line with styling information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    /// The text content of the line
    content: String,
    /// The type of line (for styling)
    line_type: LineType,
    /// Inline-styled spans; empty when the line is a single run
    spans: Vec<InlineSpan>,
}

impl RenderedLine {
    /// Create a new rendered line.
    pub const fn new(content: String, line_type: LineType) -> Self {
        Self {
            content,
            line_type,
            spans: Vec::new(),
        }
    }

    /// Create a new rendered line with inline spans.
    pub const fn with_spans(content: String, line_type: LineType, spans: Vec<InlineSpan>) -> Self {
        Self {
            content,
            line_type,
            spans,
        }
    }

    pub const fn empty() -> Self {
        Self::new(String::new(), LineType::Empty)
    }

    /// Get the text content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Get the line type.
    pub const fn line_type(&self) -> &LineType {
        &self.line_type
    }

    /// Get inline spans, if present.
    pub fn spans(&self) -> Option<&[InlineSpan]> {
        if self.spans.is_empty() {
            None
        } else {
            Some(&self.spans)
        }
    }

    /// Encode the line with SGR codes.
    pub fn to_ansi(&self) -> String {
        let base = style_for_line_type(&self.line_type);
        match self.spans() {
            Some(spans) => spans
                .iter()
                .map(|span| ansi::styled(span.text(), style_for_inline(base, span.style())))
                .collect(),
            None => ansi::styled(&self.content, base),
        }
    }
}

/// Inline style flags for a text span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InlineStyle {
    pub emphasis: bool,
    pub strong: bool,
    pub code: bool,
    pub strikethrough: bool,
    pub link: bool,
}

/// A styled inline span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSpan {
    text: String,
    style: InlineStyle,
}

impl InlineSpan {
    pub const fn new(text: String, style: InlineStyle) -> Self {
        Self { text, style }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text.into(), InlineStyle::default())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub const fn style(&self) -> InlineStyle {
        self.style
    }
}

/// Type of a rendered line, used for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineType {
    /// Normal paragraph text
    Paragraph,
    /// Heading with level (1-6)
    Heading(u8),
    /// Code block line
    CodeBlock,
    /// Block quote line
    BlockQuote,
    /// List item with nesting level
    ListItem(usize),
    /// Table row or border
    Table,
    /// Horizontal rule
    HorizontalRule,
    /// Empty line
    Empty,
}
