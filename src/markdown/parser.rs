//! Markdown rendering with comrak.

use comrak::nodes::{AstNode, ListType, NodeValue, TableAlignment};
use comrak::{Arena, Options, parse_document};
use thiserror::Error;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::types::{InlineSpan, InlineStyle, LineType, RenderBuffer, RenderedLine};

/// Deepest container or inline nesting the renderer walks.
pub const MAX_NESTING: usize = 48;

const CODE_RIGHT_PADDING: usize = 3;
/// Frame columns around code: `│ ` + padding + ` │`.
const CODE_FRAME_WIDTH: usize = 4 + CODE_RIGHT_PADDING;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("markdown nesting exceeds {limit} levels")]
    NestingTooDeep { limit: usize },
}

/// Options that change the rendered output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Append ` (url)` after link text.
    pub show_link_urls: bool,
}

/// Render markdown text at `width` columns.
///
/// Never fails: if the document cannot be rendered, its raw lines are
/// returned unstyled.
///
/// # Example
///
/// ```
/// use canvas_tui::markdown::render;
///
/// let buffer = render("# Hello\n\nWorld", 40);
/// assert_eq!(buffer.lines()[0].content(), "Hello");
/// assert_eq!(buffer.len(), 3);
/// ```
pub fn render(text: &str, width: u16) -> RenderBuffer {
    render_with_options(text, width, RenderOptions::default())
}

/// [`render`] with explicit options.
pub fn render_with_options(text: &str, width: u16, options: RenderOptions) -> RenderBuffer {
    let source = normalize_newlines(text);
    match try_render(&source, width, options) {
        Ok(buffer) => buffer,
        Err(err) => {
            tracing::warn!(%err, "markdown render failed, showing raw text");
            RenderBuffer::plain(&source)
        }
    }
}

/// Render markdown, reporting failures instead of falling back.
///
/// # Errors
///
/// Returns [`RenderError::NestingTooDeep`] when lists, quotes or inline
/// markup nest deeper than [`MAX_NESTING`].
pub fn try_render(
    text: &str,
    width: u16,
    options: RenderOptions,
) -> Result<RenderBuffer, RenderError> {
    let source = normalize_newlines(text);
    let arena = Arena::new();
    let root = parse_document(&arena, &source, &create_options());

    let mut renderer = Renderer {
        lines: Vec::new(),
        width: usize::from(width.max(1)),
        options,
    };
    for child in root.children() {
        renderer.block(child, 0)?;
    }
    while renderer
        .lines
        .last()
        .is_some_and(|line| matches!(line.line_type(), LineType::Empty))
    {
        renderer.lines.pop();
    }
    Ok(RenderBuffer::new(renderer.lines))
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

fn create_options() -> Options {
    let mut options = Options::default();

    // GFM extensions
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;

    options
}

struct Renderer {
    lines: Vec<RenderedLine>,
    width: usize,
    options: RenderOptions,
}

impl Renderer {
    /// Start a new top-level block: exactly one blank line after any
    /// previous output.
    fn separate(&mut self) {
        if self
            .lines
            .last()
            .is_some_and(|line| !matches!(line.line_type(), LineType::Empty))
        {
            self.lines.push(RenderedLine::empty());
        }
    }

    fn push_wrapped(
        &mut self,
        spans: &[InlineSpan],
        line_type: LineType,
        prefix_first: &str,
        prefix_next: &str,
    ) {
        for line_spans in wrap_spans(spans, self.width, prefix_first, prefix_next) {
            let content = spans_to_string(&line_spans);
            self.lines
                .push(RenderedLine::with_spans(content, line_type, line_spans));
        }
    }

    fn block<'a>(&mut self, node: &'a AstNode<'a>, depth: usize) -> Result<(), RenderError> {
        check_depth(depth)?;
        match &node.data.borrow().value {
            NodeValue::Heading(heading) => {
                self.separate();
                let spans = self.inline_spans(node)?;
                self.push_wrapped(&spans, LineType::Heading(heading.level), "", "");
            }
            NodeValue::Paragraph => {
                self.separate();
                let spans = self.inline_spans(node)?;
                self.push_wrapped(&spans, LineType::Paragraph, "", "");
            }
            NodeValue::List(_) => {
                self.separate();
                self.list(node, 1, depth + 1)?;
            }
            NodeValue::CodeBlock(code_block) => {
                self.separate();
                let language = code_block.info.split_whitespace().next();
                self.code_block(&code_block.literal, language, "");
            }
            NodeValue::BlockQuote => {
                self.separate();
                self.blockquote(node, 1, depth + 1)?;
            }
            NodeValue::ThematicBreak => {
                self.separate();
                self.lines.push(RenderedLine::new(
                    "─".repeat(self.width),
                    LineType::HorizontalRule,
                ));
            }
            NodeValue::Table(_) => {
                self.separate();
                for line in render_table(node, self.width)? {
                    self.lines.push(RenderedLine::new(line, LineType::Table));
                }
            }
            NodeValue::HtmlBlock(html) => {
                self.separate();
                for raw_line in html.literal.lines() {
                    self.lines
                        .push(RenderedLine::new(raw_line.to_string(), LineType::Paragraph));
                }
            }
            _ => {
                for child in node.children() {
                    self.block(child, depth + 1)?;
                }
            }
        }
        Ok(())
    }

    /// Render the items of a list node. `level` is the list nesting used
    /// for indentation.
    fn list<'a>(
        &mut self,
        node: &'a AstNode<'a>,
        level: usize,
        depth: usize,
    ) -> Result<(), RenderError> {
        check_depth(depth)?;
        let ordered = match &node.data.borrow().value {
            NodeValue::List(list) => list.list_type == ListType::Ordered,
            _ => false,
        };
        let count = node.children().count();
        let number_width = count.to_string().len();
        let indent = "  ".repeat(level.saturating_sub(1));

        for (index, item) in node.children().enumerate() {
            let marker = match &item.data.borrow().value {
                NodeValue::TaskItem(symbol) => {
                    if symbol.is_some() {
                        "✓ ".to_string()
                    } else {
                        "□ ".to_string()
                    }
                }
                _ if ordered => format!("{:>number_width$}. ", index + 1),
                _ => "• ".to_string(),
            };
            let prefix_first = format!("{indent}{marker}");
            let prefix_next = " ".repeat(display_width(&prefix_first));
            self.list_item(item, level, depth + 1, &prefix_first, &prefix_next)?;
        }
        Ok(())
    }

    fn list_item<'a>(
        &mut self,
        item: &'a AstNode<'a>,
        level: usize,
        depth: usize,
        prefix_first: &str,
        prefix_next: &str,
    ) -> Result<(), RenderError> {
        check_depth(depth)?;
        let line_type = LineType::ListItem(level);
        let mut rendered_any = false;

        for child in item.children() {
            let prefix = if rendered_any { prefix_next } else { prefix_first };
            match &child.data.borrow().value {
                NodeValue::Paragraph => {
                    if rendered_any {
                        self.lines
                            .push(RenderedLine::new(String::new(), line_type));
                    }
                    let spans = self.inline_spans(child)?;
                    self.push_wrapped(&spans, line_type, prefix, prefix_next);
                }
                NodeValue::List(_) => {
                    if !rendered_any {
                        self.lines
                            .push(RenderedLine::new(prefix_first.to_string(), line_type));
                    }
                    self.list(child, level + 1, depth + 1)?;
                }
                NodeValue::CodeBlock(code_block) => {
                    if !rendered_any {
                        self.lines
                            .push(RenderedLine::new(prefix_first.to_string(), line_type));
                    }
                    let language = code_block.info.split_whitespace().next();
                    self.code_block(&code_block.literal, language, prefix_next);
                }
                _ => {
                    if rendered_any {
                        self.lines
                            .push(RenderedLine::new(String::new(), line_type));
                    }
                    self.nested_block(child, prefix, prefix_next, None, depth + 1)?;
                }
            }
            rendered_any = true;
        }

        if !rendered_any {
            self.lines
                .push(RenderedLine::new(prefix_first.trim_end().to_string(), line_type));
        }
        Ok(())
    }

    fn blockquote<'a>(
        &mut self,
        node: &'a AstNode<'a>,
        quote_depth: usize,
        depth: usize,
    ) -> Result<(), RenderError> {
        check_depth(depth)?;
        let prefix = quote_prefix(quote_depth);

        for (index, child) in node.children().enumerate() {
            if index > 0 {
                self.lines.push(RenderedLine::new(
                    prefix.trim_end().to_string(),
                    LineType::BlockQuote,
                ));
            }
            match &child.data.borrow().value {
                NodeValue::BlockQuote => {
                    self.blockquote(child, quote_depth + 1, depth + 1)?;
                }
                NodeValue::Paragraph | NodeValue::Heading(_) => {
                    let spans = self.inline_spans(child)?;
                    self.push_wrapped(&spans, LineType::BlockQuote, &prefix, &prefix);
                }
                NodeValue::CodeBlock(code_block) => {
                    for raw_line in code_block.literal.lines() {
                        let text = truncate_text(
                            raw_line,
                            self.width.saturating_sub(display_width(&prefix)),
                        );
                        self.lines.push(RenderedLine::new(
                            format!("{prefix}{text}"),
                            LineType::BlockQuote,
                        ));
                    }
                }
                _ => {
                    self.nested_block(
                        child,
                        &prefix,
                        &prefix,
                        Some(LineType::BlockQuote),
                        depth + 1,
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Render `node` as a block at the width left beside the prefixes and
    /// indent the result. `line_type` replaces the inner line types when
    /// given.
    fn nested_block<'a>(
        &mut self,
        node: &'a AstNode<'a>,
        prefix_first: &str,
        prefix_next: &str,
        line_type: Option<LineType>,
        depth: usize,
    ) -> Result<(), RenderError> {
        let prefix_width = display_width(prefix_first).max(display_width(prefix_next));
        let mut inner = Self {
            lines: Vec::new(),
            width: self.width.saturating_sub(prefix_width).max(1),
            options: self.options,
        };
        inner.block(node, depth)?;

        let is_blank = |line: &RenderedLine| matches!(line.line_type(), LineType::Empty);
        let start = inner
            .lines
            .iter()
            .position(|line| !is_blank(line))
            .unwrap_or(inner.lines.len());
        let end = inner
            .lines
            .iter()
            .rposition(|line| !is_blank(line))
            .map_or(start, |last| last + 1);

        for (index, line) in inner.lines[start..end].iter().enumerate() {
            let prefix = if index == 0 { prefix_first } else { prefix_next };
            if line.content().is_empty() {
                let blank_type = line_type.unwrap_or(LineType::Paragraph);
                self.lines
                    .push(RenderedLine::new(prefix.trim_end().to_string(), blank_type));
                continue;
            }
            let mut spans = vec![InlineSpan::plain(prefix)];
            match line.spans() {
                Some(inner_spans) => spans.extend(inner_spans.iter().cloned()),
                None => spans.push(InlineSpan::plain(line.content())),
            }
            let content = spans_to_string(&spans);
            self.lines.push(RenderedLine::with_spans(
                content,
                line_type.unwrap_or(*line.line_type()),
                spans,
            ));
        }
        Ok(())
    }

    /// Framed code block. Content is neither styled inline nor reflowed;
    /// long lines are cut at the frame.
    fn code_block(&mut self, literal: &str, language: Option<&str>, indent: &str) {
        let available = self
            .width
            .saturating_sub(display_width(indent) + CODE_FRAME_WIDTH)
            .max(1);
        let content_width = literal
            .lines()
            .map(display_width)
            .max()
            .unwrap_or(0)
            .min(available);
        let frame_inner_width = content_width + 2 + CODE_RIGHT_PADDING;

        let label = format!(" {} ", language.unwrap_or("code"));
        let visible_label = truncate_text(&label, frame_inner_width);
        let top = format!(
            "{indent}┌{}{}┐",
            visible_label,
            "─".repeat(frame_inner_width.saturating_sub(display_width(&visible_label)))
        );
        self.lines.push(RenderedLine::new(top, LineType::CodeBlock));

        for raw_line in literal.lines() {
            let text = truncate_text(&raw_line.replace('\t', "    "), content_width);
            let padding =
                " ".repeat(content_width.saturating_sub(display_width(&text)) + CODE_RIGHT_PADDING);
            let line_spans = vec![
                InlineSpan::plain(format!("{indent}│ ")),
                InlineSpan::plain(text),
                InlineSpan::plain(format!("{padding} │")),
            ];
            let content = spans_to_string(&line_spans);
            self.lines
                .push(RenderedLine::with_spans(content, LineType::CodeBlock, line_spans));
        }

        self.lines.push(RenderedLine::new(
            format!("{indent}└{}┘", "─".repeat(frame_inner_width)),
            LineType::CodeBlock,
        ));
    }

    fn inline_spans<'a>(&self, node: &'a AstNode<'a>) -> Result<Vec<InlineSpan>, RenderError> {
        let mut spans = Vec::new();
        for child in node.children() {
            collect_inline_spans_recursive(
                child,
                InlineStyle::default(),
                &mut spans,
                self.options,
                0,
            )?;
        }
        Ok(merge_adjacent(spans))
    }
}

const fn check_depth(depth: usize) -> Result<(), RenderError> {
    if depth > MAX_NESTING {
        Err(RenderError::NestingTooDeep { limit: MAX_NESTING })
    } else {
        Ok(())
    }
}

fn quote_prefix(depth: usize) -> String {
    let mut prefix = String::from("  ");
    for _ in 0..depth {
        prefix.push('│');
        prefix.push(' ');
    }
    prefix
}

fn collect_inline_spans_recursive<'a>(
    node: &'a AstNode<'a>,
    style: InlineStyle,
    spans: &mut Vec<InlineSpan>,
    options: RenderOptions,
    depth: usize,
) -> Result<(), RenderError> {
    check_depth(depth)?;
    let children_with = |next: InlineStyle, spans: &mut Vec<InlineSpan>| -> Result<(), RenderError> {
        for child in node.children() {
            collect_inline_spans_recursive(child, next, spans, options, depth + 1)?;
        }
        Ok(())
    };

    match &node.data.borrow().value {
        NodeValue::List(_) | NodeValue::Item(_) => {}
        NodeValue::Text(t) => {
            spans.push(InlineSpan::new(t.to_string(), style));
        }
        NodeValue::Code(code) => {
            let code_style = InlineStyle {
                code: true,
                link: style.link,
                ..InlineStyle::default()
            };
            spans.push(InlineSpan::new(code.literal.clone(), code_style));
        }
        NodeValue::Emph => {
            children_with(
                InlineStyle {
                    emphasis: true,
                    ..style
                },
                spans,
            )?;
        }
        NodeValue::Strong => {
            children_with(
                InlineStyle {
                    strong: true,
                    ..style
                },
                spans,
            )?;
        }
        NodeValue::Strikethrough => {
            children_with(
                InlineStyle {
                    strikethrough: true,
                    ..style
                },
                spans,
            )?;
        }
        NodeValue::Link(link) => {
            let start = spans.len();
            children_with(InlineStyle { link: true, ..style }, spans)?;
            let label = spans_to_string(&spans[start..]);
            if options.show_link_urls && !link.url.is_empty() && label != link.url {
                spans.push(InlineSpan::new(format!(" ({})", link.url), style));
            }
        }
        NodeValue::Image(image) => {
            let start = spans.len();
            children_with(
                InlineStyle {
                    emphasis: true,
                    ..style
                },
                spans,
            )?;
            if spans.len() == start {
                spans.push(InlineSpan::new(
                    image.url.clone(),
                    InlineStyle {
                        emphasis: true,
                        ..style
                    },
                ));
            }
        }
        NodeValue::HtmlInline(html) => {
            spans.push(InlineSpan::new(html.clone(), style));
        }
        NodeValue::SoftBreak | NodeValue::LineBreak => {
            spans.push(InlineSpan::new(" ".to_string(), style));
        }
        _ => {
            children_with(style, spans)?;
        }
    }
    Ok(())
}

/// Join neighbouring spans that share a style.
fn merge_adjacent(spans: Vec<InlineSpan>) -> Vec<InlineSpan> {
    let mut merged: Vec<InlineSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        if span.text().is_empty() {
            continue;
        }
        match merged.last_mut() {
            Some(last) if last.style() == span.style() => {
                let text = format!("{}{}", last.text(), span.text());
                *last = InlineSpan::new(text, span.style());
            }
            _ => merged.push(span),
        }
    }
    merged
}

fn render_table<'a>(
    table_node: &'a AstNode<'a>,
    wrap_width: usize,
) -> Result<Vec<String>, RenderError> {
    let (alignments, mut rows, has_header) = collect_table_rows(table_node)?;
    let num_cols = rows.iter().map(Vec::len).max().unwrap_or(0);
    if num_cols == 0 {
        return Ok(Vec::new());
    }

    for row in &mut rows {
        row.resize(num_cols, String::new());
    }

    let mut col_widths = vec![1_usize; num_cols];
    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            col_widths[idx] = col_widths[idx].max(display_width(cell));
        }
    }

    // Row width is 1 + sum(col_width + 3).
    let max_table_width = wrap_width.max(4);
    while 1 + col_widths.iter().sum::<usize>() + (3 * num_cols) > max_table_width {
        let Some((widest_idx, &widest)) = col_widths.iter().enumerate().max_by_key(|(_, w)| **w)
        else {
            break;
        };
        if widest <= 1 {
            break;
        }
        col_widths[widest_idx] -= 1;
    }

    let top = render_table_border(&col_widths, '┌', '┬', '┐');
    let mid = render_table_border(&col_widths, '├', '┼', '┤');
    let bottom = render_table_border(&col_widths, '└', '┴', '┘');

    let mut lines = vec![top];
    for (idx, row) in rows.iter().enumerate() {
        lines.push(render_table_row(row, &col_widths, &alignments));
        if has_header && idx == 0 {
            lines.push(mid.clone());
        }
    }
    lines.push(bottom);
    Ok(lines)
}

type TableRows = (Vec<TableAlignment>, Vec<Vec<String>>, bool);

fn collect_table_rows<'a>(table_node: &'a AstNode<'a>) -> Result<TableRows, RenderError> {
    let alignments = match &table_node.data.borrow().value {
        NodeValue::Table(table) => table.alignments.clone(),
        _ => Vec::new(),
    };

    let mut rows = Vec::new();
    let mut has_header = false;
    for row_node in table_node.children() {
        match row_node.data.borrow().value {
            NodeValue::TableRow(header) => has_header |= header,
            _ => continue,
        }

        let mut row_cells = Vec::new();
        for cell_node in row_node.children() {
            if !matches!(cell_node.data.borrow().value, NodeValue::TableCell) {
                continue;
            }
            let mut spans = Vec::new();
            for child in cell_node.children() {
                collect_inline_spans_recursive(
                    child,
                    InlineStyle::default(),
                    &mut spans,
                    RenderOptions::default(),
                    0,
                )?;
            }
            row_cells.push(
                spans_to_string(&spans)
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" "),
            );
        }
        rows.push(row_cells);
    }

    Ok((alignments, rows, has_header))
}

fn render_table_border(widths: &[usize], left: char, middle: char, right: char) -> String {
    let mut out = String::new();
    out.push(left);
    for (idx, width) in widths.iter().enumerate() {
        out.push_str(&"─".repeat(width + 2));
        if idx + 1 < widths.len() {
            out.push(middle);
        }
    }
    out.push(right);
    out
}

fn render_table_row(cells: &[String], widths: &[usize], alignments: &[TableAlignment]) -> String {
    let mut out = String::new();
    out.push('│');
    for (idx, width) in widths.iter().copied().enumerate() {
        let content = truncate_text(cells.get(idx).map_or("", String::as_str), width);
        let padding = width.saturating_sub(display_width(&content));

        out.push(' ');
        match alignments.get(idx).copied().unwrap_or(TableAlignment::None) {
            TableAlignment::Right => {
                out.push_str(&" ".repeat(padding));
                out.push_str(&content);
            }
            TableAlignment::Center => {
                let left = padding / 2;
                out.push_str(&" ".repeat(left));
                out.push_str(&content);
                out.push_str(&" ".repeat(padding - left));
            }
            TableAlignment::Left | TableAlignment::None => {
                out.push_str(&content);
                out.push_str(&" ".repeat(padding));
            }
        }
        out.push_str(" │");
    }
    out
}

fn truncate_text(text: &str, max_width: usize) -> String {
    let mut out = String::new();
    let mut width = 0usize;
    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > max_width {
            break;
        }
        out.push(ch);
        width += ch_width;
    }
    out
}

fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Word-wrap spans to `width` cells, with hanging prefixes.
fn wrap_spans(
    spans: &[InlineSpan],
    width: usize,
    prefix_first: &str,
    prefix_next: &str,
) -> Vec<Vec<InlineSpan>> {
    let tokens: Vec<InlineSpan> = spans.iter().flat_map(split_inline_tokens).collect();

    let mut lines: Vec<Vec<InlineSpan>> = Vec::new();
    let mut current: Vec<InlineSpan> = Vec::new();
    let mut current_len = 0usize;
    let mut has_word = false;

    let start_new_line = |prefix: &str,
                          current: &mut Vec<InlineSpan>,
                          current_len: &mut usize,
                          has_word: &mut bool| {
        current.clear();
        if prefix.is_empty() {
            *current_len = 0;
        } else {
            current.push(InlineSpan::plain(prefix));
            *current_len = display_width(prefix);
        }
        *has_word = false;
    };

    start_new_line(prefix_first, &mut current, &mut current_len, &mut has_word);

    for token in tokens {
        let token_len = display_width(token.text());
        let token_is_ws = token.text().chars().all(char::is_whitespace);

        if current_len + token_len > width && has_word {
            lines.push(std::mem::take(&mut current));
            start_new_line(prefix_next, &mut current, &mut current_len, &mut has_word);
        }

        if token_is_ws {
            if has_word {
                current_len += token_len;
                current.push(token);
            }
            continue;
        }

        // A word longer than a whole line is split across lines.
        let mut rest = token.text().to_string();
        while current_len + display_width(&rest) > width {
            let room = width.saturating_sub(current_len);
            let head = truncate_text(&rest, room);
            if head.is_empty() {
                if !has_word && current_len == display_width(prefix_next) {
                    break;
                }
                lines.push(std::mem::take(&mut current));
                start_new_line(prefix_next, &mut current, &mut current_len, &mut has_word);
                continue;
            }
            rest = rest[head.len()..].to_string();
            current.push(InlineSpan::new(head, token.style()));
            lines.push(std::mem::take(&mut current));
            start_new_line(prefix_next, &mut current, &mut current_len, &mut has_word);
        }
        if !rest.is_empty() {
            current_len += display_width(&rest);
            current.push(InlineSpan::new(rest, token.style()));
            has_word = true;
        }
    }

    // Trailing whitespace never ends a line.
    while current
        .last()
        .is_some_and(|span| has_word && span.text().chars().all(char::is_whitespace))
    {
        current.pop();
    }
    for line in &mut lines {
        while line.len() > 1
            && line
                .last()
                .is_some_and(|span| span.text().chars().all(char::is_whitespace))
        {
            line.pop();
        }
    }

    lines.push(current);
    lines
}

fn split_inline_tokens(span: &InlineSpan) -> Vec<InlineSpan> {
    let mut out = Vec::new();
    let mut buf = String::new();
    let mut ws_state: Option<bool> = None;

    for ch in span.text().chars() {
        let is_ws = ch.is_whitespace();
        match ws_state {
            Some(state) if state == is_ws => buf.push(ch),
            Some(_) => {
                out.push(InlineSpan::new(std::mem::take(&mut buf), span.style()));
                buf.push(ch);
                ws_state = Some(is_ws);
            }
            None => {
                buf.push(ch);
                ws_state = Some(is_ws);
            }
        }
    }

    if !buf.is_empty() {
        out.push(InlineSpan::new(buf, span.style()));
    }

    out
}

fn spans_to_string(spans: &[InlineSpan]) -> String {
    spans.iter().map(InlineSpan::text).collect()
}
