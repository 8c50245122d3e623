//! Terminal output: escape sequences and the overlay compositor.

pub mod ansi;
pub mod compositor;

pub use compositor::{Compositor, OverlayPanel, PanelRect};
