//! Application state and main event loop.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete application state
//! - [`Message`]: All possible events and actions
//! - [`update`]: Pure function for state transitions
//! - [`App::run`]: Main event loop with rendering

mod effects;
mod event_loop;
mod input;
mod model;
mod update;

pub use event_loop::{CanvasTerminal, terminal_active};
pub use model::{Model, Overlay, SyncStatus, ToastLevel};
pub use update::{Message, update};

use std::path::PathBuf;

use crate::editor::{EditorLauncher, SystemEditor};
use crate::markdown::RenderOptions;

/// Main application struct that owns the terminal and runs the event loop.
pub struct App {
    file_path: PathBuf,
    watch_dir: PathBuf,
    mouse_capture: bool,
    render_options: RenderOptions,
    editor: Box<dyn EditorLauncher>,
}

impl App {
    /// Create an application showing `file_path` from the canvas
    /// directory `watch_dir`.
    pub fn new(file_path: PathBuf, watch_dir: PathBuf) -> Self {
        Self {
            file_path,
            watch_dir,
            mouse_capture: false,
            render_options: RenderOptions::default(),
            editor: Box::new(SystemEditor::from_env()),
        }
    }

    /// Start with wheel reporting enabled.
    #[must_use]
    pub const fn with_mouse_capture(mut self, enabled: bool) -> Self {
        self.mouse_capture = enabled;
        self
    }

    #[must_use]
    pub const fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render_options = options;
        self
    }

    /// Replace the editor used by the `e` key.
    #[must_use]
    pub fn with_editor(mut self, editor: impl EditorLauncher + 'static) -> Self {
        self.editor = Box::new(editor);
        self
    }
}
