use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use anyhow::{Context, Result};

use crate::files::FileEntry;
use crate::input::KeyContext;
use crate::markdown::{Document, RenderBuffer, RenderCache, RenderOptions};
use crate::meta::{CanvasMeta, meta_path, read_meta};
use crate::ui::viewport::Viewport;
use crate::ui::{document_content_width, document_height};

const TOAST_DURATION: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

/// The single overlay that may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Overlay {
    #[default]
    Closed,
    /// File selector with the highlighted row.
    Selector { index: usize },
    Info,
}

/// Freshness of the displayed content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncStatus {
    /// Nothing loaded yet.
    #[default]
    Waiting,
    /// Content loaded.
    Synced,
    /// A refresh was requested and has not completed.
    Watching,
}

impl SyncStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Waiting => "Waiting",
            Self::Synced => "Synced",
            Self::Watching => "Watching",
        }
    }

    pub const fn icon(self) -> &'static str {
        match self {
            Self::Waiting | Self::Watching => "...",
            Self::Synced => "***",
        }
    }
}

/// The complete application state.
///
/// All state lives here - no global or scattered state. Only
/// [`update`](super::update) and the effect handlers mutate it.
#[derive(Debug)]
pub struct Model {
    /// File currently shown and watched
    pub file_path: PathBuf,
    /// Canvas directory holding `meta.json` and `drafts/`
    pub watch_dir: PathBuf,
    /// Loaded content, `None` until the first successful read
    pub document: Option<Document>,
    render_cache: RenderCache,
    pub render_options: RenderOptions,
    /// Scroll position over the rendered document
    pub viewport: Viewport,
    pub overlay: Overlay,
    /// Whether the user wants wheel reporting
    pub mouse_capture: bool,
    /// True while the external editor owns the terminal
    pub editing: bool,
    /// Drafts offered by the selector, newest first
    pub files: Vec<FileEntry>,
    pub meta: CanvasMeta,
    pub sync: SyncStatus,
    pub last_update: Option<SystemTime>,
    /// Shown in place of the document when there is nothing to render
    pub load_error: Option<String>,
    toast: Option<Toast>,
    /// Whether the app should quit
    pub should_quit: bool,
    next_version: u64,
}

impl Model {
    /// Create a model for `file_path` with nothing loaded.
    pub fn new(file_path: PathBuf, watch_dir: PathBuf, terminal_size: (u16, u16)) -> Self {
        Self {
            file_path,
            watch_dir,
            viewport: Viewport::new(
                document_content_width(terminal_size.0),
                document_height(terminal_size.1),
                0,
            ),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render_options = options;
        self
    }

    /// Replace the document with `text`, scrolled to the top.
    pub fn set_content(&mut self, text: String) {
        self.next_version += 1;
        self.document = Some(Document::new(text, self.next_version));
        self.sync = SyncStatus::Synced;
        self.last_update = Some(SystemTime::now());
        self.load_error = None;
        self.viewport.go_to_top();
        self.reflow();
    }

    /// Drop the document, optionally explaining why.
    pub fn clear_document(&mut self, reason: Option<String>) {
        self.document = None;
        self.render_cache.invalidate();
        self.sync = SyncStatus::Waiting;
        self.load_error = reason;
        self.viewport.go_to_top();
        self.viewport.set_total_lines(0);
    }

    /// Re-render if needed and update the viewport's line count.
    pub(super) fn reflow(&mut self) {
        let total = match &self.document {
            Some(document) => self
                .render_cache
                .get(document, self.viewport.width(), self.render_options)
                .len(),
            None => 0,
        };
        self.viewport.set_total_lines(total);
    }

    pub(super) fn resize(&mut self, width: u16, height: u16) {
        self.viewport
            .resize(document_content_width(width), document_height(height));
        self.reflow();
    }

    /// The render of the current document at the current width.
    pub fn buffer(&self) -> Option<&RenderBuffer> {
        self.document.as_ref().and(self.render_cache.last())
    }

    /// Binding table for the current overlay.
    pub const fn key_context(&self) -> KeyContext {
        match self.overlay {
            Overlay::Closed => KeyContext::Normal,
            Overlay::Selector { .. } => KeyContext::Selector,
            Overlay::Info => KeyContext::Info,
        }
    }

    /// Mouse reporting is forced off while the editor runs.
    pub const fn wants_mouse_capture(&self) -> bool {
        self.mouse_capture && !self.editing
    }

    pub fn file_name(&self) -> String {
        self.file_path.file_name().map_or_else(
            || "No file".to_string(),
            |name| name.to_string_lossy().into_owned(),
        )
    }

    /// Index of the shown file in the drafts list.
    pub fn current_file_index(&self) -> Option<usize> {
        self.files.iter().position(|entry| entry.path == self.file_path)
    }

    /// Replace the drafts list, keeping the selector row in range.
    pub(super) fn set_files(&mut self, files: Vec<FileEntry>) {
        self.files = files;
        if let Overlay::Selector { index } = &mut self.overlay {
            *index = (*index).min(self.files.len().saturating_sub(1));
        }
    }

    pub fn meta_path(&self) -> PathBuf {
        meta_path(&self.watch_dir)
    }

    /// Read the current file from disk.
    ///
    /// A missing file clears the document and is not an error; the watcher
    /// delivers it once it appears.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read. The last
    /// loaded document is kept.
    pub fn load_file(&mut self) -> Result<()> {
        match std::fs::read_to_string(&self.file_path) {
            Ok(text) => {
                self.set_content(text);
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                self.clear_document(None);
                Ok(())
            }
            Err(err) => {
                Err(err).with_context(|| format!("Failed to read {}", self.file_path.display()))
            }
        }
    }

    pub fn reload_meta(&mut self) {
        self.meta = read_meta(&self.meta_path());
    }

    pub(super) fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + TOAST_DURATION,
        });
    }

    pub(super) fn expire_toast(&mut self, now: Instant) -> bool {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= now)
        {
            self.toast = None;
            return true;
        }
        false
    }

    pub fn active_toast(&self) -> Option<(&str, ToastLevel)> {
        self.toast
            .as_ref()
            .map(|toast| (toast.message.as_str(), toast.level))
    }

    pub fn is_current_file(&self, path: &Path) -> bool {
        self.file_path == path
    }
}

// Implement Default for Model to allow std::mem::take
impl Default for Model {
    fn default() -> Self {
        Self {
            file_path: PathBuf::new(),
            watch_dir: PathBuf::from("."),
            document: None,
            render_cache: RenderCache::new(),
            render_options: RenderOptions::default(),
            viewport: Viewport::default(),
            overlay: Overlay::Closed,
            mouse_capture: false,
            editing: false,
            files: Vec::new(),
            meta: CanvasMeta::default(),
            sync: SyncStatus::Waiting,
            last_update: None,
            load_error: None,
            toast: None,
            should_quit: false,
            next_version: 0,
        }
    }
}
