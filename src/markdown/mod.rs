//! Markdown to styled terminal lines.
//!
//! [`render`] turns raw text into a [`RenderBuffer`] for a target width.
//! Rendering is a pure function of its inputs; [`RenderCache`] keeps the
//! last result so a frame only re-renders when the document or the width
//! changes.

mod parser;
mod types;

pub use parser::{
    MAX_NESTING, RenderError, RenderOptions, render, render_with_options, try_render,
};
pub use types::{Document, InlineSpan, InlineStyle, LineType, RenderBuffer, RenderedLine};

/// Memoizes the render of one document at one width.
#[derive(Debug, Default)]
pub struct RenderCache {
    key: Option<(u64, u16, RenderOptions)>,
    buffer: RenderBuffer,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the buffer for `document` at `width`, rendering only when
    /// the version, width or options differ from the cached render.
    pub fn get(&mut self, document: &Document, width: u16, options: RenderOptions) -> &RenderBuffer {
        let key = (document.version(), width, options);
        if self.key != Some(key) {
            tracing::debug!(
                version = document.version(),
                width,
                "re-rendering document"
            );
            self.buffer = render_with_options(document.source(), width, options);
            self.key = Some(key);
        }
        &self.buffer
    }

    /// The most recent render, if any.
    pub fn last(&self) -> Option<&RenderBuffer> {
        self.key.map(|_| &self.buffer)
    }

    pub fn invalidate(&mut self) {
        self.key = None;
    }
}
