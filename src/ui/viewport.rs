//! Viewport management for scrolling.
//!
//! The [`Viewport`] stores the *requested* scroll offset exactly as the
//! last command left it and clamps it whenever it is read. Relative moves
//! start from the clamped offset, so holding "down" at the bottom never
//! builds up distance that has to be scrolled back.

use std::ops::Range;

use crate::markdown::{RenderBuffer, RenderedLine};

/// Requested offset meaning "last full page".
pub const BOTTOM: isize = isize::MAX;

/// The window of a [`RenderBuffer`] shown on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct View<'a> {
    pub visible_lines: &'a [RenderedLine],
    pub effective_offset: usize,
    pub has_more_above: bool,
    pub has_more_below: bool,
}

impl View<'_> {
    /// Number of lines hidden above the window.
    pub const fn lines_above(&self) -> usize {
        self.effective_offset
    }
}

/// Clamp a requested offset into `0..=max(0, total - height)`.
pub fn clamp_offset(offset: isize, total_lines: usize, height: usize) -> usize {
    let max_offset = total_lines.saturating_sub(height);
    usize::try_from(offset).map_or(0, |offset| offset.min(max_offset))
}

/// Window `buffer` at a requested `offset` for `height` rows.
///
/// # Example
///
/// ```
/// use canvas_tui::markdown::render;
/// use canvas_tui::ui::viewport::compute_view;
///
/// let text: String = (0..100).map(|i| format!("line {i}\n\n")).collect();
/// let buffer = render(&text, 40);
/// let view = compute_view(&buffer, -5, 20);
/// assert_eq!(view.effective_offset, 0);
/// assert!(!view.has_more_above);
/// ```
pub fn compute_view(buffer: &RenderBuffer, offset: isize, height: usize) -> View<'_> {
    let total = buffer.len();
    let effective_offset = clamp_offset(offset, total, height);
    let end = effective_offset.saturating_add(height).min(total);
    View {
        visible_lines: &buffer.lines()[effective_offset..end],
        effective_offset,
        has_more_above: effective_offset > 0,
        has_more_below: effective_offset.saturating_add(height) < total,
    }
}

/// Manages the visible portion of a document.
///
/// # Example
///
/// ```
/// use canvas_tui::ui::viewport::Viewport;
///
/// let mut vp = Viewport::new(80, 20, 100);
/// vp.go_to_bottom();
/// assert_eq!(vp.offset(), 80);
/// vp.scroll_down(5);
/// vp.scroll_up(1);
/// assert_eq!(vp.offset(), 79);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewport {
    width: u16,
    height: u16,
    requested: isize,
    total_lines: usize,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(80, 24, 0)
    }
}

impl Viewport {
    /// Create a viewport at the top of the document.
    ///
    /// * `width` - Content width in columns
    /// * `height` - Rows available for document lines
    /// * `total_lines` - Lines in the current render
    pub const fn new(width: u16, height: u16, total_lines: usize) -> Self {
        Self {
            width,
            height,
            requested: 0,
            total_lines,
        }
    }

    /// The effective (clamped) scroll offset.
    pub fn offset(&self) -> usize {
        clamp_offset(self.requested, self.total_lines, self.height as usize)
    }

    /// The offset as last requested, before clamping.
    pub const fn requested_offset(&self) -> isize {
        self.requested
    }

    /// Replace the requested offset verbatim.
    pub const fn request_offset(&mut self, offset: isize) {
        self.requested = offset;
    }

    pub const fn width(&self) -> u16 {
        self.width
    }

    pub const fn height(&self) -> u16 {
        self.height
    }

    pub const fn total_lines(&self) -> usize {
        self.total_lines
    }

    /// Range of line indices currently on screen.
    pub fn visible_range(&self) -> Range<usize> {
        let start = self.offset();
        let end = (start + self.height as usize).min(self.total_lines);
        start..end
    }

    /// Window `buffer` at the current requested offset.
    pub fn view<'a>(&self, buffer: &'a RenderBuffer) -> View<'a> {
        compute_view(buffer, self.requested, self.height as usize)
    }

    /// Get the scroll percentage (0-100).
    pub fn scroll_percent(&self) -> u8 {
        let max_offset = self.max_offset();
        if max_offset == 0 {
            return 100;
        }

        // Percentage value always 0-100
        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        {
            ((self.offset() as f64 / max_offset as f64) * 100.0).round() as u8
        }
    }

    pub fn can_scroll_up(&self) -> bool {
        self.offset() > 0
    }

    pub fn can_scroll_down(&self) -> bool {
        self.offset() < self.max_offset()
    }

    /// Scroll up by n lines from the effective offset.
    pub fn scroll_up(&mut self, n: usize) {
        self.requested = self.effective_isize().saturating_sub(to_isize(n));
    }

    /// Scroll down by n lines from the effective offset.
    pub fn scroll_down(&mut self, n: usize) {
        self.requested = self.effective_isize().saturating_add(to_isize(n));
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.height as usize);
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.height as usize);
    }

    pub const fn go_to_top(&mut self) {
        self.requested = 0;
    }

    /// Request the last full page; the clamp resolves the exact line.
    pub const fn go_to_bottom(&mut self) {
        self.requested = BOTTOM;
    }

    /// Resize the viewport. The requested offset is kept.
    pub const fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }

    /// Update the total number of lines (e.g., after a re-render).
    pub const fn set_total_lines(&mut self, total: usize) {
        self.total_lines = total;
    }

    const fn max_offset(&self) -> usize {
        self.total_lines.saturating_sub(self.height as usize)
    }

    fn effective_isize(&self) -> isize {
        to_isize(self.offset())
    }
}

fn to_isize(n: usize) -> isize {
    isize::try_from(n).unwrap_or(isize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::{LineType, RenderedLine};

    fn buffer_of(lines: usize) -> RenderBuffer {
        RenderBuffer::new(
            (0..lines)
                .map(|i| RenderedLine::new(format!("line {i}"), LineType::Paragraph))
                .collect(),
        )
    }

    #[test]
    fn test_negative_offset_clamps_to_zero() {
        let buffer = buffer_of(100);
        let view = compute_view(&buffer, -5, 20);
        assert_eq!(view.effective_offset, 0);
        assert!(!view.has_more_above);
        assert!(view.has_more_below);
        assert_eq!(view.visible_lines.len(), 20);
    }

    #[test]
    fn test_huge_offset_clamps_to_last_page() {
        let buffer = buffer_of(100);
        let view = compute_view(&buffer, 999_999, 20);
        assert_eq!(view.effective_offset, 80);
        assert!(view.has_more_above);
        assert!(!view.has_more_below);
        assert_eq!(view.visible_lines[0].content(), "line 80");
    }

    #[test]
    fn test_short_buffer_fits() {
        let buffer = buffer_of(5);
        let view = compute_view(&buffer, 3, 20);
        assert_eq!(view.effective_offset, 0);
        assert_eq!(view.visible_lines.len(), 5);
        assert!(!view.has_more_above && !view.has_more_below);
    }

    #[test]
    fn test_empty_buffer() {
        let buffer = buffer_of(0);
        let view = compute_view(&buffer, 10, 20);
        assert_eq!(view.effective_offset, 0);
        assert!(view.visible_lines.is_empty());
    }

    #[test]
    fn test_new_viewport_starts_at_top() {
        let vp = Viewport::new(80, 24, 100);
        assert_eq!(vp.offset(), 0);
        assert_eq!(vp.visible_range(), 0..24);
    }

    #[test]
    fn test_scroll_down_clamps_to_max() {
        let mut vp = Viewport::new(80, 24, 100);
        vp.scroll_down(1000);
        assert_eq!(vp.offset(), 76);
    }

    #[test]
    fn test_scroll_down_at_bottom_does_not_accumulate() {
        let mut vp = Viewport::new(80, 24, 100);
        vp.go_to_bottom();
        for _ in 0..10 {
            vp.scroll_down(1);
        }
        vp.scroll_up(1);
        assert_eq!(vp.offset(), 75);
    }

    #[test]
    fn test_scroll_up_clamps_to_zero() {
        let mut vp = Viewport::new(80, 24, 100);
        vp.scroll_down(10);
        vp.scroll_up(100);
        assert_eq!(vp.offset(), 0);
        vp.scroll_down(1);
        assert_eq!(vp.offset(), 1);
    }

    #[test]
    fn test_go_to_bottom_uses_sentinel() {
        let mut vp = Viewport::new(80, 24, 100);
        vp.go_to_bottom();
        assert_eq!(vp.requested_offset(), BOTTOM);
        assert_eq!(vp.visible_range(), 76..100);
    }

    #[test]
    fn test_bottom_follows_growing_document() {
        let mut vp = Viewport::new(80, 24, 100);
        vp.go_to_bottom();
        vp.set_total_lines(150);
        assert_eq!(vp.offset(), 126);
    }

    #[test]
    fn test_page_moves_by_height() {
        let mut vp = Viewport::new(80, 10, 100);
        vp.page_down();
        vp.page_down();
        assert_eq!(vp.offset(), 20);
        vp.page_up();
        assert_eq!(vp.offset(), 10);
    }

    #[test]
    fn test_resize_keeps_requested_offset() {
        let mut vp = Viewport::new(80, 24, 100);
        vp.scroll_down(50);
        vp.resize(80, 60);
        assert_eq!(vp.offset(), 40);
        vp.resize(80, 24);
        assert_eq!(vp.offset(), 50);
    }

    #[test]
    fn test_scroll_percent() {
        let mut vp = Viewport::new(80, 24, 100);
        assert_eq!(vp.scroll_percent(), 0);
        vp.go_to_bottom();
        assert_eq!(vp.scroll_percent(), 100);
        assert_eq!(Viewport::new(80, 24, 0).scroll_percent(), 100);
    }

    #[test]
    fn test_can_scroll_flags() {
        let mut vp = Viewport::new(80, 24, 100);
        assert!(!vp.can_scroll_up());
        assert!(vp.can_scroll_down());
        vp.go_to_bottom();
        assert!(vp.can_scroll_up());
        assert!(!vp.can_scroll_down());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn effective_offset_always_in_bounds(
                total_lines in 0..2000usize,
                height in 1..200usize,
                offset in any::<isize>(),
            ) {
                let buffer = buffer_of(total_lines);
                let view = compute_view(&buffer, offset, height);
                prop_assert!(view.effective_offset <= total_lines.saturating_sub(height));
                prop_assert!(view.visible_lines.len() <= height);
                prop_assert_eq!(view.has_more_above, view.effective_offset > 0);
                prop_assert_eq!(
                    view.has_more_below,
                    view.effective_offset + view.visible_lines.len() < total_lines
                );
            }

            #[test]
            fn scroll_sequences_stay_in_bounds(
                total_lines in 0..5000usize,
                height in 1..100u16,
                steps in proptest::collection::vec((any::<bool>(), 0..500usize), 0..50),
            ) {
                let mut vp = Viewport::new(80, height, total_lines);
                for (down, n) in steps {
                    if down {
                        vp.scroll_down(n);
                    } else {
                        vp.scroll_up(n);
                    }
                    prop_assert!(vp.offset() <= total_lines.saturating_sub(height as usize));
                }
            }

            #[test]
            fn percent_always_valid(
                total_lines in 0..10000usize,
                height in 1..100u16,
                offset in 0..10000usize,
            ) {
                let mut vp = Viewport::new(80, height, total_lines);
                vp.scroll_down(offset);
                prop_assert!(vp.scroll_percent() <= 100);
            }
        }
    }
}
