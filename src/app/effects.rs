use std::time::Duration;

use anyhow::Result;
use crossterm::cursor::{Hide, Show};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};

use crate::app::{App, CanvasTerminal, Message, Model, ToastLevel};
use crate::files::{drafts_dir, scan_files};
use crate::input::Command;
use crate::watcher::{FileEvent, FileWatcher};

const WATCH_DEBOUNCE: Duration = Duration::from_millis(200);

impl App {
    pub(super) fn make_file_watcher(path: &std::path::Path) -> notify::Result<FileWatcher> {
        FileWatcher::new(path, WATCH_DEBOUNCE)
    }

    /// Watch the model's file, reporting failure as a toast.
    pub(super) fn watch_current_file(model: &mut Model) -> Option<FileWatcher> {
        match Self::make_file_watcher(&model.file_path) {
            Ok(watcher) => Some(watcher),
            Err(err) => {
                tracing::warn!(path = %model.file_path.display(), %err, "watch unavailable");
                model.show_toast(ToastLevel::Warning, format!("Watch unavailable: {err}"));
                None
            }
        }
    }

    /// Read the current file and its metadata, keeping the last good
    /// document when the read fails.
    pub(super) fn load_current(model: &mut Model) {
        if let Err(err) = model.load_file() {
            tracing::warn!(path = %model.file_path.display(), "{err:#}");
            model.show_toast(ToastLevel::Error, format!("Reload failed: {err}"));
        }
        model.reload_meta();
    }

    /// Scan the drafts directory. Returns a message only when the list
    /// differs from the model's.
    pub(super) fn rescan_files(model: &Model) -> Option<Message> {
        let dir = drafts_dir(&model.watch_dir);
        let files = scan_files(&dir).unwrap_or_else(|err| {
            tracing::debug!(dir = %dir.display(), %err, "drafts scan failed");
            Vec::new()
        });
        (files != model.files).then_some(Message::FilesScanned(files))
    }

    /// Disk work that follows a message. The watcher itself is re-created
    /// by the event loop when the model's file changes.
    pub(super) fn handle_message_side_effects(model: &mut Model, msg: &Message) {
        match msg {
            Message::Command(Command::SelectorConfirm) => {
                Self::load_current(model);
            }
            Message::Command(Command::Refresh) => {
                Self::load_current(model);
                model.show_toast(ToastLevel::Info, "Refreshed");
            }
            Message::File(FileEvent::Changed(_)) => {
                model.reload_meta();
            }
            _ => {}
        }
    }

    /// Hand the terminal to the external editor and take it back.
    ///
    /// The terminal is resumed even when suspending or the editor fails.
    ///
    /// # Errors
    ///
    /// Returns an error only if the terminal cannot be restored.
    pub(super) fn run_editor(&self, terminal: &mut CanvasTerminal, model: &mut Model) -> Result<()> {
        let suspended = suspend_terminal(terminal);
        match &suspended {
            Ok(()) => self.edit_current_file(model),
            Err(err) => {
                tracing::warn!(%err, "failed to suspend terminal");
                model.show_toast(ToastLevel::Error, format!("Cannot open editor: {err}"));
            }
        }
        resume_terminal(terminal)?;
        Ok(())
    }

    /// Run the editor on the current file and reload it afterwards.
    pub(super) fn edit_current_file(&self, model: &mut Model) {
        model.editing = true;
        let result = self.editor.edit(&model.file_path);
        model.editing = false;

        match result {
            Ok(status) if status.success() => {}
            Ok(status) => {
                model.show_toast(ToastLevel::Warning, format!("Editor exited with {status}"));
            }
            Err(err) => {
                tracing::warn!(%err, "failed to launch editor");
                model.show_toast(ToastLevel::Error, format!("Failed to open editor: {err}"));
            }
        }
        Self::load_current(model);
    }
}

fn suspend_terminal(terminal: &mut CanvasTerminal) -> Result<()> {
    let compositor = terminal.backend_mut().writer_mut();
    compositor.clear()?;
    compositor.set_mouse_capture(false)?;
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, Show)?;
    Ok(())
}

fn resume_terminal(terminal: &mut CanvasTerminal) -> Result<()> {
    enable_raw_mode()?;
    execute!(terminal.backend_mut(), EnterAlternateScreen, Hide)?;
    terminal.clear()?;
    Ok(())
}
