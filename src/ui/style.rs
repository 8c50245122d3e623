//! Colors and text attributes.
//!
//! Uses the terminal's named palette so the output follows the user's
//! color scheme. The same styles feed both the ratatui base screen and the
//! raw SGR encoding used by overlays.

use ratatui::style::{Color, Modifier, Style};

use crate::app::{SyncStatus, ToastLevel};
use crate::markdown::{InlineStyle, LineType};

/// Get the style for a given line type.
pub fn style_for_line_type(line_type: &LineType) -> Style {
    match line_type {
        // Headings - bold with distinct colors per level
        LineType::Heading(1) => Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        LineType::Heading(2) => Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
        LineType::Heading(3) => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
        LineType::Heading(4) => Style::default()
            .fg(Color::Blue)
            .add_modifier(Modifier::BOLD),
        LineType::Heading(5) => Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD),
        LineType::Heading(_) => Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),

        LineType::CodeBlock => Style::default()
            .fg(Color::Indexed(245))
            .add_modifier(Modifier::DIM),

        LineType::BlockQuote => Style::default()
            .fg(Color::Blue)
            .add_modifier(Modifier::ITALIC),

        LineType::HorizontalRule => Style::default()
            .fg(Color::Indexed(240))
            .add_modifier(Modifier::DIM),

        LineType::ListItem(_) | LineType::Table | LineType::Paragraph | LineType::Empty => {
            Style::default()
        }
    }
}

/// Get the style for an inline span, merged with a base line style.
pub fn style_for_inline(base: Style, inline: InlineStyle) -> Style {
    let mut style = base;

    if inline.emphasis {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if inline.strong {
        style = style.add_modifier(Modifier::BOLD);
    }
    if inline.strikethrough {
        style = style.add_modifier(Modifier::CROSSED_OUT);
    }
    if inline.link {
        style = style.add_modifier(Modifier::UNDERLINED).fg(Color::LightBlue);
    }
    if inline.code {
        style = style.fg(Color::Red).add_modifier(Modifier::BOLD);
    }

    style
}

pub fn title_style() -> Style {
    Style::default()
        .fg(Color::Blue)
        .add_modifier(Modifier::BOLD)
}

pub fn muted_style() -> Style {
    Style::default().fg(Color::Gray)
}

pub fn dim_style() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

pub fn rule_style() -> Style {
    Style::default()
        .fg(Color::Indexed(240))
        .add_modifier(Modifier::DIM)
}

pub fn status_bar_style() -> Style {
    Style::default().bg(Color::DarkGray).fg(Color::White)
}

pub const fn sync_color(status: SyncStatus) -> Color {
    match status {
        SyncStatus::Waiting => Color::Yellow,
        SyncStatus::Synced => Color::Green,
        SyncStatus::Watching => Color::Cyan,
    }
}

pub fn toast_style(level: ToastLevel) -> Style {
    match level {
        ToastLevel::Info => Style::default().bg(Color::DarkGray).fg(Color::White),
        ToastLevel::Warning => Style::default().bg(Color::Yellow).fg(Color::Black),
        ToastLevel::Error => Style::default().bg(Color::Red).fg(Color::White),
    }
}

/// Row style in the file selector.
pub fn selector_item_style(selected: bool, current: bool) -> Style {
    if selected {
        Style::default().add_modifier(Modifier::REVERSED)
    } else if current {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

pub fn panel_border_style() -> Style {
    Style::default().fg(Color::Blue)
}

pub fn panel_label_style() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_styles_are_bold() {
        for level in 1..=6 {
            let style = style_for_line_type(&LineType::Heading(level));
            assert!(style.add_modifier.contains(Modifier::BOLD));
        }
    }

    #[test]
    fn test_h1_is_underlined() {
        let style = style_for_line_type(&LineType::Heading(1));
        assert!(style.add_modifier.contains(Modifier::UNDERLINED));
        let style = style_for_line_type(&LineType::Heading(2));
        assert!(!style.add_modifier.contains(Modifier::UNDERLINED));
    }

    #[test]
    fn test_heading_levels_have_distinct_colors() {
        let colors: Vec<_> = (1..=5)
            .map(|level| style_for_line_type(&LineType::Heading(level)).fg)
            .collect();
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_paragraph_is_unstyled() {
        assert_eq!(style_for_line_type(&LineType::Paragraph), Style::default());
    }

    #[test]
    fn test_inline_flags_add_modifiers() {
        let inline = InlineStyle {
            emphasis: true,
            strong: true,
            ..InlineStyle::default()
        };
        let style = style_for_inline(Style::default(), inline);
        assert!(style.add_modifier.contains(Modifier::ITALIC | Modifier::BOLD));
        assert_eq!(style.fg, None);
    }

    #[test]
    fn test_inline_code_overrides_line_color() {
        let base = style_for_line_type(&LineType::Heading(2));
        let inline = InlineStyle {
            code: true,
            ..InlineStyle::default()
        };
        assert_eq!(style_for_inline(base, inline).fg, Some(Color::Red));
    }
}
