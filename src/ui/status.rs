use std::fmt::Write as _;
use std::time::SystemTime;

use chrono::{DateTime, Local};

use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::{Model, Overlay, ToastLevel};

use super::style::{status_bar_style, sync_color, toast_style};

pub fn render_status_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let icon = Span::styled(
        format!(" [{}]", model.sync.icon()),
        status_bar_style().fg(sync_color(model.sync)),
    );
    let mut summary = format!(" {}: {}", model.sync.label(), model.file_name());
    if let Some(updated) = model.last_update {
        let _ = write!(summary, " {}", format_clock(updated));
    }
    if model.viewport.total_lines() > usize::from(model.viewport.height()) {
        let _ = write!(summary, "  {}%", model.viewport.scroll_percent());
    }
    let summary = Span::raw(summary);
    let hints = Span::raw(format!("{} ", key_hints(model.overlay)));

    let used = icon.width() + summary.width() + hints.width();
    let gap = usize::from(area.width).saturating_sub(used).max(1);
    let line = Line::from(vec![icon, summary, Span::raw(" ".repeat(gap)), hints]);

    frame.render_widget(Paragraph::new(line).style(status_bar_style()), area);
}

pub fn render_toast_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let Some((message, level)) = model.active_toast() else {
        return;
    };
    let prefix = match level {
        ToastLevel::Info => "[info]",
        ToastLevel::Warning => "[warn]",
        ToastLevel::Error => "[error]",
    };
    let toast = Paragraph::new(format!(" {prefix} {message}")).style(toast_style(level));
    frame.render_widget(toast, area);
}

const fn key_hints(overlay: Overlay) -> &'static str {
    match overlay {
        Overlay::Closed => "q quit | \u{2191}\u{2193} scroll | tab files | i info | e edit",
        Overlay::Selector { .. } => "\u{2191}\u{2193} select | enter open | esc close",
        Overlay::Info => "m mouse | i/esc close | q quit",
    }
}

/// Local wall-clock time of `time` as `HH:MM:SS`.
///
/// # Example
///
/// ```
/// use std::time::SystemTime;
/// use canvas_tui::ui::format_clock;
///
/// let clock = format_clock(SystemTime::now());
/// assert_eq!(clock.len(), 8);
/// assert_eq!(clock.matches(':').count(), 2);
/// ```
pub fn format_clock(time: SystemTime) -> String {
    DateTime::<Local>::from(time).format("%H:%M:%S").to_string()
}
