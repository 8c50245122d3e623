//! Terminal UI components.
//!
//! This module contains all UI-related code including:
//! - [`viewport`]: Scroll position and visible range management
//! - [`style`]: Colors and text attributes
//! - the base screen drawn by ratatui each frame
//! - the overlay panels painted on top of it by the compositor

pub mod style;
pub mod viewport;

mod overlays;
mod render;
mod status;

pub use overlays::{info_panel, overlay_panel, selector_panel};
pub use render::{ScreenRows, render, screen_rows, styled_line};
pub use status::format_clock;

/// Blank columns left of the document text.
pub const DOCUMENT_LEFT_PADDING: u16 = 1;

/// Header, rule, two indicator rows and the status bar.
pub const CHROME_ROWS: u16 = 5;

/// First screen row below the header and its rule.
pub const HEADER_ROWS: u16 = 2;

/// Width the document is rendered at for a terminal `total_width` wide.
pub const fn document_content_width(total_width: u16) -> u16 {
    let width = total_width.saturating_sub(DOCUMENT_LEFT_PADDING * 2);
    if width == 0 { 1 } else { width }
}

/// Rows available to document lines for a terminal `total_height` tall.
pub const fn document_height(total_height: u16) -> u16 {
    let height = total_height.saturating_sub(CHROME_ROWS);
    if height == 0 { 1 } else { height }
}
