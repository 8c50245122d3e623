// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. files::FileEntry)
    clippy::module_name_repetitions
)]

//! # Canvas
//!
//! A live Markdown canvas for the terminal.
//!
//! Canvas shows one Markdown file from a canvas directory and re-renders
//! it whenever the file changes on disk. Other drafts are offered in a
//! dropdown selector, and an info panel shows the canvas metadata. Both
//! overlays are painted as raw ANSI on top of the ratatui frame, so the
//! base screen never has to know about them.
//!
//! ## Architecture
//!
//! Canvas uses The Elm Architecture (TEA) pattern:
//! - **Model**: Application state
//! - **Message**: Events and actions
//! - **Update**: Pure state transitions
//! - **View**: Render to terminal, then composite the open overlay
//!
//! ## Modules
//!
//! - [`app`]: Main application loop and state
//! - [`markdown`]: Markdown to styled lines
//! - [`ui`]: Screen layout, viewport and overlay panels
//! - [`terminal`]: ANSI encoding and the overlay compositor
//! - [`input`]: Key and mouse decoding
//! - [`watcher`]: File watching
//! - [`files`]: Canvas directory and drafts listing
//! - [`meta`]: Canvas metadata
//! - [`editor`]: External editor launch
//! - [`config`]: Saved default flags

pub mod app;
pub mod config;
pub mod editor;
pub mod files;
pub mod input;
pub mod markdown;
pub mod meta;
pub mod terminal;
pub mod ui;
pub mod watcher;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{App, Message, Model};
    pub use crate::markdown::{Document, RenderBuffer, render};
    pub use crate::terminal::{Compositor, OverlayPanel};
    pub use crate::ui::viewport::Viewport;
}
