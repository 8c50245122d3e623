use std::path::PathBuf;

use canvas_tui::app::{Message, Model, Overlay, update};
use canvas_tui::files::FileEntry;
use canvas_tui::input::{Command, KeyContext, decode_mouse_bytes};
use canvas_tui::markdown::{LineType, render};
use canvas_tui::terminal::{Compositor, OverlayPanel};
use canvas_tui::ui::{self, viewport::compute_view};
use canvas_tui::watcher::FileEvent;
use proptest::prelude::*;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::{Terminal, TerminalOptions};
use unicode_width::UnicodeWidthStr;

type TestTerminal = Terminal<CrosstermBackend<Compositor<Vec<u8>>>>;

fn fixed_terminal(width: u16, height: u16) -> TestTerminal {
    let backend = CrosstermBackend::new(Compositor::new(Vec::new()));
    Terminal::with_options(
        backend,
        TerminalOptions {
            viewport: ratatui::Viewport::Fixed(Rect::new(0, 0, width, height)),
        },
    )
    .unwrap()
}

fn take_output(terminal: &mut TestTerminal) -> String {
    let bytes = std::mem::take(terminal.backend_mut().writer_mut().get_mut());
    String::from_utf8_lossy(&bytes).into_owned()
}

fn model_with_drafts() -> Model {
    let mut model = Model::new(
        PathBuf::from("/canvas/content.md"),
        PathBuf::from("/canvas"),
        (80, 24),
    );
    model.set_content("# Canvas\n\nHello from the canvas.".to_string());
    model.files = ["alpha.md", "beta.md", "gamma.txt"]
        .iter()
        .map(|name| FileEntry {
            name: (*name).to_string(),
            path: PathBuf::from("/canvas/drafts").join(name),
            modified: std::time::SystemTime::now(),
        })
        .collect();
    model
}

#[test]
fn test_title_and_emphasis_render() {
    let buffer = render("# Title\n\nSome *italic* and **bold** text.", 40);
    let first = &buffer.lines()[0];
    assert_eq!(first.content(), "Title");
    assert_eq!(first.line_type(), &LineType::Heading(1));

    let body = buffer
        .lines()
        .iter()
        .find(|line| line.content().contains("italic"))
        .unwrap();
    assert!(!body.content().contains('*'));
    let spans = body.spans().unwrap();
    assert!(spans.iter().any(|span| span.text() == "italic" && span.style().emphasis));
    assert!(spans.iter().any(|span| span.text() == "bold" && span.style().strong));
}

#[test]
fn test_ordered_list_renumbers_from_one() {
    let buffer = render("5. a\n9. b\n1. c", 40);
    let contents: Vec<&str> = buffer.lines().iter().map(|line| line.content()).collect();
    assert!(contents[0].trim_start().starts_with("1."));
    assert!(contents[1].trim_start().starts_with("2."));
    assert!(contents[2].trim_start().starts_with("3."));
}

#[test]
fn test_blank_lines_collapse() {
    let buffer = render("one\n\n\n\ntwo", 40);
    let contents: Vec<&str> = buffer.lines().iter().map(|line| line.content()).collect();
    assert_eq!(contents, vec!["one", "", "two"]);
}

#[test]
fn test_view_clamps_requested_offsets() {
    let text: String = (0..100).map(|i| format!("line {i}\n\n")).collect();
    let buffer = render(&text, 40);
    let total = buffer.len();

    assert_eq!(compute_view(&buffer, -5, 20).effective_offset, 0);
    assert_eq!(compute_view(&buffer, 999_999, 20).effective_offset, total - 20);
}

#[test]
fn test_raw_wheel_reports_decode_to_scrolls() {
    assert_eq!(
        decode_mouse_bytes(KeyContext::Normal, b"\x1b[<64;10;5M"),
        vec![Command::ScrollUp(3)]
    );
    assert_eq!(
        decode_mouse_bytes(KeyContext::Normal, b"\x1b[<65;10;5M"),
        vec![Command::ScrollDown(3)]
    );
    assert!(decode_mouse_bytes(KeyContext::Normal, b"\x1b[<2;10;5M").is_empty());
}

#[test]
fn test_closing_panel_blanks_last_painted_rect() {
    let mut compositor = Compositor::new(Vec::new());
    let wide = OverlayPanel::new(
        vec!["first line".into(), "second".into(), "third".into()],
        5,
        10,
    );
    compositor.paint(wide).unwrap();
    // A narrower panel is scheduled but never painted before closing.
    compositor.set_panel(OverlayPanel::new(vec!["x".into()], 5, 10));
    compositor.get_mut().clear();

    let rect = compositor.clear().unwrap().unwrap();
    assert_eq!((rect.row, rect.col, rect.width, rect.height), (5, 10, 10, 3));

    let out = String::from_utf8(compositor.get_ref().clone()).unwrap();
    let blank = " ".repeat(10);
    let expected = format!(
        "\x1b7\x1b[6;11H\x1b[0m{blank}\x1b[7;11H\x1b[0m{blank}\x1b[8;11H\x1b[0m{blank}\x1b8"
    );
    assert_eq!(out, expected);
}

#[test]
fn test_overlay_painted_after_base_frame() {
    let mut terminal = fixed_terminal(80, 24);
    let mut model = model_with_drafts();
    model = update(model, Message::Command(Command::ToggleSelector));

    terminal.draw(|frame| ui::render(&model, frame)).unwrap();
    let panel = ui::overlay_panel(&model, 80, 24).unwrap();
    let compositor = terminal.backend_mut().writer_mut();
    compositor.set_panel(panel);
    compositor.tick().unwrap();

    let out = take_output(&mut terminal);
    let frame_text = out.find("Hello from the canvas.").unwrap();
    let panel_text = out.rfind("alpha.md").unwrap();
    assert!(panel_text > frame_text);
}

#[test]
fn test_base_redraw_schedules_one_repaint() {
    let mut terminal = fixed_terminal(80, 24);
    let mut model = model_with_drafts();
    model.overlay = Overlay::Info;

    terminal.draw(|frame| ui::render(&model, frame)).unwrap();
    let panel = ui::overlay_panel(&model, 80, 24).unwrap();
    terminal.backend_mut().writer_mut().paint(panel).unwrap();
    take_output(&mut terminal);

    let changed = FileEvent::Changed("# Update\n\nNew body".to_string());
    model = update(model, Message::File(changed));
    terminal.draw(|frame| ui::render(&model, frame)).unwrap();
    assert!(terminal.backend().writer().repaint_pending());

    terminal.backend_mut().writer_mut().tick().unwrap();
    assert!(!terminal.backend().writer().repaint_pending());
    let out = take_output(&mut terminal);
    assert!(out.rfind(" Info ").unwrap() > out.find("Update").unwrap());
}

#[test]
fn test_closing_overlay_reports_region_to_restore() {
    let mut terminal = fixed_terminal(80, 24);
    let mut model = model_with_drafts();
    model.overlay = Overlay::Selector { index: 0 };

    terminal.draw(|frame| ui::render(&model, frame)).unwrap();
    let panel = ui::overlay_panel(&model, 80, 24).unwrap();
    let expected = panel.rect();
    terminal.backend_mut().writer_mut().paint(panel).unwrap();

    model = update(model, Message::Command(Command::CloseOverlay));
    assert!(ui::overlay_panel(&model, 80, 24).is_none());
    let stale = terminal.backend_mut().writer_mut().clear().unwrap();
    assert_eq!(stale, Some(expected));
}

proptest! {
    #[test]
    fn prop_render_is_deterministic_and_fits(
        words in proptest::collection::vec("[a-z]{1,15}", 1..80),
        width in 20u16..100,
    ) {
        let text = words.join(" ");
        let first = render(&text, width);
        let second = render(&text, width);
        prop_assert_eq!(&first, &second);
        for line in first.lines() {
            prop_assert!(line.content().width() <= usize::from(width));
        }
    }

    #[test]
    fn prop_effective_offset_in_range(
        lines in 0usize..200,
        height in 1usize..60,
        offset in any::<isize>(),
    ) {
        let text: String = (0..lines).map(|i| format!("l{i}\n\n")).collect();
        let buffer = render(&text, 40);
        let view = compute_view(&buffer, offset, height);
        prop_assert!(view.effective_offset <= buffer.len().saturating_sub(height));
        prop_assert!(view.visible_lines.len() <= height);
    }
}
