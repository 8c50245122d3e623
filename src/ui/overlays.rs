//! Overlay panels painted by the compositor on top of the base screen.
//!
//! Panels are built as pre-styled text lines rather than ratatui widgets;
//! the base renderer never sees them.

use std::time::SystemTime;

use unicode_width::UnicodeWidthChar;

use crate::app::{Model, Overlay};
use crate::files::{format_relative_time, truncate_filename};
use crate::markdown::{Document, RenderBuffer};
use crate::terminal::OverlayPanel;
use crate::terminal::ansi::{pad_visible, styled, visible_width};

use super::HEADER_ROWS;
use super::style::{dim_style, panel_border_style, panel_label_style, selector_item_style};

/// Entries shown in the file selector before `+N more`.
pub const MAX_SELECTOR_ITEMS: usize = 6;

/// Widest file name in the selector.
pub const SELECTOR_NAME_WIDTH: usize = 20;

const INFO_LABEL_WIDTH: usize = 12;

/// The panel for the model's open overlay, if any.
pub fn overlay_panel(model: &Model, width: u16, height: u16) -> Option<OverlayPanel> {
    match model.overlay {
        Overlay::Closed => None,
        Overlay::Selector { index } => Some(selector_panel(model, index, width, height)),
        Overlay::Info => Some(info_panel(model, width, height)),
    }
}

/// File selector dropdown, right-aligned under the header.
///
/// The window of entries follows `index` so the highlighted row stays
/// visible in long lists. The panel is clipped to the screen.
pub fn selector_panel(model: &Model, index: usize, width: u16, height: u16) -> OverlayPanel {
    let now = SystemTime::now();
    let mut lines = Vec::new();

    if model.files.is_empty() {
        lines.push(styled("(no files)", dim_style()));
    } else {
        let start = (index + 1).saturating_sub(MAX_SELECTOR_ITEMS);
        let end = (start + MAX_SELECTOR_ITEMS).min(model.files.len());
        for (i, entry) in model.files.iter().enumerate().take(end).skip(start) {
            let selected = i == index;
            let marker = if selected { "\u{203a} " } else { "  " };
            let name = pad_visible(
                &truncate_filename(&entry.name, SELECTOR_NAME_WIDTH),
                SELECTOR_NAME_WIDTH,
            );
            let item = styled(
                &format!("{marker}{name}"),
                selector_item_style(selected, model.is_current_file(&entry.path)),
            );
            let age = format_relative_time(entry.modified, now);
            lines.push(format!("{item} {}", styled(&format!("{age:>3}"), dim_style())));
        }
        let hidden = model.files.len() - (end - start);
        if hidden > 0 {
            lines.push(styled(&format!("  +{hidden} more"), dim_style()));
        }
    }

    let padding = 1;
    let panel_width = content_width(&lines) + 2 * usize::from(padding);
    let col = usize::from(width).saturating_sub(panel_width);
    OverlayPanel::new(lines, HEADER_ROWS, u16::try_from(col).unwrap_or(0))
        .with_padding(padding)
        .clip_to(width, height)
}

/// Details about the current file and canvas in a centered box, clipped
/// to the screen.
pub fn info_panel(model: &Model, width: u16, height: u16) -> OverlayPanel {
    let fields = info_fields(model);

    // Border and one space each side.
    let max_value = usize::from(width).saturating_sub(INFO_LABEL_WIDTH + 5).max(8);
    let rows: Vec<(String, String)> = fields
        .into_iter()
        .map(|(label, value)| (label.to_string(), fit_left(&value, max_value)))
        .collect();
    let value_width = rows
        .iter()
        .map(|(_, value)| visible_width(value))
        .max()
        .unwrap_or(0);
    let inner = INFO_LABEL_WIDTH + 1 + value_width;

    let border = panel_border_style();
    let side = styled("\u{2502}", border);
    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(styled(&framed_rule('\u{250c}', " Info ", inner + 2, '\u{2510}'), border));
    for (label, value) in &rows {
        let label = styled(&pad_visible(label, INFO_LABEL_WIDTH), panel_label_style());
        lines.push(format!("{side} {label} {} {side}", pad_visible(value, value_width)));
    }
    lines.push(styled(
        &framed_rule('\u{2514}', " i/esc close ", inner + 2, '\u{2518}'),
        border,
    ));

    let box_width = u16::try_from(inner + 4).unwrap_or(u16::MAX);
    let box_height = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    let col = width.saturating_sub(box_width) / 2;
    let row = (height.saturating_sub(box_height) / 2).max(HEADER_ROWS);
    OverlayPanel::new(lines, row, col).clip_to(width, height)
}

fn info_fields(model: &Model) -> Vec<(&'static str, String)> {
    let meta = &model.meta;
    let or_dash = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
    let on_off = |enabled: bool| if enabled { "on" } else { "off" }.to_string();

    vec![
        ("File", model.file_name()),
        ("Path", model.file_path.display().to_string()),
        ("Type", meta.content_type.label().to_string()),
        ("Mode", meta.mode.to_string()),
        ("Title", or_dash(&meta.title)),
        ("Claude wrote", or_dash(&meta.claude_last_write)),
        ("You edited", or_dash(&meta.user_last_edit)),
        ("Lines", model.buffer().map_or(0, RenderBuffer::len).to_string()),
        (
            "Words",
            model
                .document
                .as_ref()
                .map_or(0, Document::word_count)
                .to_string(),
        ),
        ("Mouse", on_off(model.mouse_capture)),
        ("Watching", model.watch_dir.display().to_string()),
    ]
}

/// `┌─ title ───┐` spanning `width` cells.
fn framed_rule(left: char, title: &str, width: usize, right: char) -> String {
    let fill = width.saturating_sub(visible_width(title) + 1);
    format!("{left}\u{2500}{title}{}{right}", "\u{2500}".repeat(fill))
}

/// Keep the tail of `text` within `max` cells, marking the cut with `…`.
fn fit_left(text: &str, max: usize) -> String {
    if visible_width(text) <= max {
        return text.to_string();
    }
    let mut tail: Vec<char> = Vec::new();
    let mut used = 1;
    for ch in text.chars().rev() {
        let w = ch.width().unwrap_or(0);
        if used + w > max {
            break;
        }
        used += w;
        tail.push(ch);
    }
    std::iter::once('\u{2026}').chain(tail.into_iter().rev()).collect()
}

fn content_width(lines: &[String]) -> usize {
    lines.iter().map(|line| visible_width(line)).max().unwrap_or(0)
}
