use crate::app::{Model, Overlay, SyncStatus, ToastLevel};
use crate::files::FileEntry;
use crate::input::Command;
use crate::watcher::FileEvent;

/// All possible events and actions in the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A decoded key or mouse command
    Command(Command),
    /// The watched file settled after a change
    File(FileEvent),
    /// The drafts directory was rescanned
    FilesScanned(Vec<FileEntry>),
    /// Terminal resized
    Resize(u16, u16),
}

/// Pure function that updates the model based on a message.
///
/// This is the core of TEA - all state transitions happen here. Disk and
/// terminal work triggered by a message happens afterwards in the effect
/// handlers.
pub fn update(mut model: Model, msg: Message) -> Model {
    match msg {
        Message::Command(command) => apply_command(&mut model, command),
        // Spurious events re-deliver the same text; keep the scroll position.
        Message::File(FileEvent::Changed(text))
            if model
                .document
                .as_ref()
                .is_some_and(|document| document.source() == text) =>
        {
            model.sync = SyncStatus::Synced;
        }
        Message::File(FileEvent::Changed(text)) => model.set_content(text),
        Message::File(FileEvent::Deleted) => {
            model.clear_document(Some("File was deleted".to_string()));
            model.show_toast(ToastLevel::Error, "File was deleted");
        }
        Message::File(FileEvent::Error(err)) => {
            model.show_toast(ToastLevel::Warning, format!("Watch error: {err}"));
        }
        Message::FilesScanned(files) => model.set_files(files),
        Message::Resize(width, height) => model.resize(width, height),
    }
    model
}

fn apply_command(model: &mut Model, command: Command) {
    match command {
        // Navigation
        Command::ScrollUp(n) => model.viewport.scroll_up(n),
        Command::ScrollDown(n) => model.viewport.scroll_down(n),
        Command::PageUp => model.viewport.page_up(),
        Command::PageDown => model.viewport.page_down(),
        Command::GotoTop => model.viewport.go_to_top(),
        Command::GotoBottom => model.viewport.go_to_bottom(),

        // Overlays
        Command::ToggleSelector => {
            model.overlay = match model.overlay {
                Overlay::Selector { .. } => Overlay::Closed,
                Overlay::Closed | Overlay::Info => Overlay::Selector {
                    index: model.current_file_index().unwrap_or(0),
                },
            };
        }
        Command::SelectorUp => {
            if let Overlay::Selector { index } = &mut model.overlay {
                *index = index.saturating_sub(1);
            }
        }
        Command::SelectorDown => {
            let last = model.files.len().saturating_sub(1);
            if let Overlay::Selector { index } = &mut model.overlay {
                *index = (*index + 1).min(last);
            }
        }
        Command::SelectorConfirm => {
            if let Overlay::Selector { index } = model.overlay {
                if let Some(entry) = model.files.get(index) {
                    if entry.path != model.file_path {
                        model.file_path = entry.path.clone();
                        model.clear_document(None);
                    }
                    model.viewport.go_to_top();
                }
                model.overlay = Overlay::Closed;
            }
        }
        Command::CloseOverlay => model.overlay = Overlay::Closed,
        Command::ToggleInfo => {
            model.overlay = if model.overlay == Overlay::Info {
                Overlay::Closed
            } else {
                Overlay::Info
            };
        }

        Command::ToggleMouseCapture => {
            model.mouse_capture = !model.mouse_capture;
            let state = if model.mouse_capture { "on" } else { "off" };
            model.show_toast(ToastLevel::Info, format!("Mouse scrolling {state}"));
        }
        Command::Refresh => model.sync = SyncStatus::Watching,
        Command::Quit => model.should_quit = true,
        // Edit: handled in effects (needs the terminal)
        Command::Edit => {}
    }
}
