use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph};

use crate::app::{Model, Overlay};
use crate::files::truncate_filename;
use crate::markdown::RenderedLine;

use super::style::{
    dim_style, muted_style, rule_style, style_for_inline, style_for_line_type, title_style,
};
use super::{DOCUMENT_LEFT_PADDING, HEADER_ROWS, status};

/// Widest file name shown in the header selector label.
pub const SELECTOR_LABEL_WIDTH: usize = 20;

/// Rows of the fixed screen layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenRows {
    pub header: Rect,
    pub rule: Rect,
    pub above: Rect,
    pub document: Rect,
    pub below: Rect,
    pub status: Rect,
}

/// Split the screen into header, rule, indicator, document and status rows.
///
/// On very short terminals the rows overlap rather than panic; the
/// status bar always keeps the last row.
pub fn screen_rows(area: Rect) -> ScreenRows {
    let row = |offset: u16| Rect {
        y: area.y + offset.min(area.height.saturating_sub(1)),
        height: area.height.min(1),
        ..area
    };
    let doc_top = HEADER_ROWS + 1;
    let bottom = area.height.saturating_sub(1);
    ScreenRows {
        header: row(0),
        rule: row(1),
        above: row(HEADER_ROWS),
        document: Rect {
            y: area.y + doc_top.min(area.height),
            height: area.height.saturating_sub(doc_top + 2),
            ..area
        },
        below: row(bottom.saturating_sub(1)),
        status: row(bottom),
    }
}

/// Render the base screen. Overlays are painted afterwards by the
/// compositor.
pub fn render(model: &Model, frame: &mut Frame) {
    let rows = screen_rows(frame.area());

    render_header(model, frame, rows.header);
    render_rule(frame, rows.rule);
    render_document(model, frame, rows);

    if model.active_toast().is_some() {
        status::render_toast_bar(model, frame, rows.below);
    }
    status::render_status_bar(model, frame, rows.status);
}

fn render_header(model: &Model, frame: &mut Frame, area: Rect) {
    let open = matches!(model.overlay, Overlay::Selector { .. });
    let arrow = if open { "\u{25b2}" } else { "\u{25bc}" };
    let label = format!(
        " {} {arrow} ",
        truncate_filename(&model.file_name(), SELECTOR_LABEL_WIDTH)
    );
    let label_style = if open {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        muted_style()
    };

    let title = Span::styled(" Canvas ", title_style());
    let selector = Span::styled(label, label_style);
    let kind = Span::styled(format!(" {} ", model.meta.content_type.label()), muted_style());

    let used = title.width() + selector.width() + kind.width();
    let gap = usize::from(area.width).saturating_sub(used);
    let header = Line::from(vec![title, Span::raw(" ".repeat(gap)), selector, kind]);
    frame.render_widget(Paragraph::new(header), area);
}

fn render_rule(frame: &mut Frame, area: Rect) {
    let rule = "\u{2500}".repeat(usize::from(area.width));
    frame.render_widget(Paragraph::new(Line::styled(rule, rule_style())), area);
}

fn render_document(model: &Model, frame: &mut Frame, rows: ScreenRows) {
    let doc_block = Block::default()
        .borders(Borders::NONE)
        .padding(Padding::left(DOCUMENT_LEFT_PADDING));
    frame.render_widget(Clear, rows.document);

    let Some(buffer) = model.buffer() else {
        frame.render_widget(Paragraph::new(placeholder(model)).block(doc_block), rows.document);
        return;
    };

    let view = model.viewport.view(buffer);
    if view.has_more_above {
        render_indicator(frame, rows.above, "above", view.lines_above());
    }

    let content: Vec<Line> = view.visible_lines.iter().map(styled_line).collect();
    frame.render_widget(Paragraph::new(content).block(doc_block), rows.document);

    // The toast takes the lower indicator row while it is shown.
    if view.has_more_below && model.active_toast().is_none() {
        let below = buffer
            .len()
            .saturating_sub(view.effective_offset + view.visible_lines.len());
        render_indicator(frame, rows.below, "below", below);
    }
}

fn render_indicator(frame: &mut Frame, area: Rect, direction: &str, lines: usize) {
    let text = format!("--- more {direction} ({lines} lines) ---");
    let indicator = Paragraph::new(Line::styled(text, dim_style()))
        .block(Block::default().padding(Padding::left(DOCUMENT_LEFT_PADDING)));
    frame.render_widget(indicator, area);
}

/// Convert a rendered line into a styled ratatui line.
pub fn styled_line(line: &RenderedLine) -> Line<'_> {
    let line_style = style_for_line_type(line.line_type());
    match line.spans() {
        Some(spans) => Line::from(
            spans
                .iter()
                .map(|span| Span::styled(span.text(), style_for_inline(line_style, span.style())))
                .collect::<Vec<_>>(),
        ),
        None => Line::styled(line.content(), line_style),
    }
}

fn placeholder(model: &Model) -> Vec<Line<'static>> {
    if let Some(err) = &model.load_error {
        return vec![Line::styled(err.clone(), Style::default().fg(Color::Red))];
    }
    vec![
        Line::styled(
            format!("Watching {} for changes...", model.file_path.display()),
            muted_style(),
        ),
        Line::raw(""),
        Line::styled("Press tab to pick a draft or e to start writing.", dim_style()),
    ]
}
