//! Raw overlay painting on top of a screen owned by another renderer.
//!
//! The [`Compositor`] owns the terminal output handle. The base renderer
//! (ratatui) is constructed over the compositor and writes every frame
//! through its [`Write`] impl; those bytes are forwarded untouched. Any
//! base write made while a panel is active schedules one re-paint, which
//! [`Compositor::tick`] performs after the frame is complete. The
//! compositor's own paints go straight to the inner sink, so they never
//! schedule another re-paint.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use super::ansi;

/// Screen rectangle covered by a painted panel, 0-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelRect {
    pub row: u16,
    pub col: u16,
    pub width: u16,
    pub height: u16,
}

/// A block of pre-styled lines painted at an absolute position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayPanel {
    lines: Vec<String>,
    row: u16,
    col: u16,
    padding: u16,
    width: u16,
}

impl OverlayPanel {
    /// Create a panel anchored at `(row, col)`. Lines may carry SGR codes.
    pub fn new(lines: Vec<String>, row: u16, col: u16) -> Self {
        let mut panel = Self {
            lines,
            row,
            col,
            padding: 0,
            width: 0,
        };
        panel.width = panel.measure();
        panel
    }

    /// Horizontal padding added on both sides of every line.
    #[must_use]
    pub fn with_padding(mut self, padding: u16) -> Self {
        self.padding = padding;
        self.width = self.measure();
        self
    }

    /// Fit the panel inside a `width` x `height` screen. Rows below the
    /// bottom edge are dropped and lines are cut at the right edge.
    #[must_use]
    pub fn clip_to(mut self, width: u16, height: u16) -> Self {
        self.lines
            .truncate(usize::from(height.saturating_sub(self.row)));
        let available = width.saturating_sub(self.col);
        if available == 0 {
            self.lines.clear();
        } else if self.width > available {
            self.padding = self.padding.min(available / 2);
            let inner = usize::from(available - self.padding * 2);
            for line in &mut self.lines {
                *line = ansi::truncate_visible(line, inner);
            }
        }
        self.width = self.measure();
        self
    }

    fn measure(&self) -> u16 {
        let content = self
            .lines
            .iter()
            .map(|line| ansi::visible_width(line))
            .max()
            .unwrap_or(0);
        u16::try_from(content)
            .unwrap_or(u16::MAX)
            .saturating_add(self.padding.saturating_mul(2))
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Full width including padding.
    pub const fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        u16::try_from(self.lines.len()).unwrap_or(u16::MAX)
    }

    pub fn rect(&self) -> PanelRect {
        PanelRect {
            row: self.row,
            col: self.col,
            width: self.width,
            height: self.height(),
        }
    }

    /// Line `index` padded to the panel width, with trailing SGR reset.
    fn padded_line(&self, index: usize) -> String {
        let pad = " ".repeat(usize::from(self.padding));
        let inner = usize::from(self.width.saturating_sub(self.padding.saturating_mul(2)));
        let line = self.lines.get(index).map_or("", String::as_str);
        format!("{pad}{}{}{pad}", ansi::pad_visible(line, inner), ansi::RESET)
    }
}

/// Owner of the terminal output sink and painter of the active overlay.
pub struct Compositor<W: Write> {
    out: W,
    active: Option<OverlayPanel>,
    painted: Option<PanelRect>,
    repaint_pending: bool,
    mouse_capture: bool,
    screen: Option<&'static AtomicBool>,
}

impl<W: Write> Compositor<W> {
    pub const fn new(out: W) -> Self {
        Self {
            out,
            active: None,
            painted: None,
            repaint_pending: false,
            mouse_capture: false,
            screen: None,
        }
    }

    /// Tie drop-time cleanup to `flag`, which is true while the screen the
    /// panel was painted on is still shown. Once it is false, dropping the
    /// compositor leaves the visible screen untouched.
    #[must_use]
    pub fn with_screen_flag(mut self, flag: &'static AtomicBool) -> Self {
        self.screen = Some(flag);
        self
    }

    fn screen_shown(&self) -> bool {
        self.screen.is_none_or(|flag| flag.load(Ordering::Relaxed))
    }

    pub const fn get_ref(&self) -> &W {
        &self.out
    }

    pub const fn get_mut(&mut self) -> &mut W {
        &mut self.out
    }

    /// The panel that is re-painted after each base frame.
    pub const fn active(&self) -> Option<&OverlayPanel> {
        self.active.as_ref()
    }

    /// Rectangle of the most recent paint still on screen.
    pub const fn painted_rect(&self) -> Option<PanelRect> {
        self.painted
    }

    pub const fn repaint_pending(&self) -> bool {
        self.repaint_pending
    }

    pub const fn mouse_capture(&self) -> bool {
        self.mouse_capture
    }

    /// Make `panel` active and paint it now.
    ///
    /// Returns the previously painted rectangle when it had to be blanked
    /// because the panel moved or changed shape; the base renderer must
    /// repaint that region.
    ///
    /// # Errors
    ///
    /// Returns any error from the output sink.
    pub fn paint(&mut self, panel: OverlayPanel) -> io::Result<Option<PanelRect>> {
        self.active = Some(panel);
        self.repaint_pending = false;
        self.draw_active()
    }

    /// Make `panel` active and defer painting to the next [`tick`].
    ///
    /// A panel equal to the active one is ignored.
    ///
    /// [`tick`]: Self::tick
    pub fn set_panel(&mut self, panel: OverlayPanel) {
        if self.active.as_ref() != Some(&panel) {
            self.active = Some(panel);
            self.repaint_pending = true;
        }
    }

    /// Remove the active panel, blank-filling the last painted rectangle.
    ///
    /// Returns that rectangle so the caller can have the base renderer
    /// restore it.
    ///
    /// # Errors
    ///
    /// Returns any error from the output sink.
    pub fn clear(&mut self) -> io::Result<Option<PanelRect>> {
        self.active = None;
        self.repaint_pending = false;
        let Some(rect) = self.painted.take() else {
            return Ok(None);
        };
        tracing::debug!(?rect, "clearing overlay");
        self.blank(rect)?;
        self.out.flush()?;
        Ok(Some(rect))
    }

    /// Perform a scheduled re-paint, if any.
    ///
    /// # Errors
    ///
    /// Returns any error from the output sink.
    pub fn tick(&mut self) -> io::Result<Option<PanelRect>> {
        if !self.repaint_pending {
            return Ok(None);
        }
        self.repaint_pending = false;
        self.draw_active()
    }

    /// Switch mouse reporting, emitting escape codes only on a transition.
    ///
    /// Returns whether anything was written.
    ///
    /// # Errors
    ///
    /// Returns any error from the output sink.
    pub fn set_mouse_capture(&mut self, enabled: bool) -> io::Result<bool> {
        if self.mouse_capture == enabled {
            return Ok(false);
        }
        if enabled {
            ansi::enable_mouse(&mut self.out)?;
        } else {
            ansi::disable_mouse(&mut self.out)?;
        }
        self.out.flush()?;
        self.mouse_capture = enabled;
        tracing::debug!(enabled, "mouse capture changed");
        Ok(true)
    }

    fn draw_active(&mut self) -> io::Result<Option<PanelRect>> {
        let Some(panel) = self.active.as_ref() else {
            return Ok(None);
        };
        let rect = panel.rect();
        let stale = self.painted.filter(|prev| *prev != rect);

        ansi::save_cursor(&mut self.out)?;
        if let Some(prev) = stale {
            blank_rows(&mut self.out, prev)?;
        }
        for index in 0..panel.lines().len() {
            let row = rect.row.saturating_add(u16::try_from(index).unwrap_or(u16::MAX));
            ansi::cursor_to(&mut self.out, row, rect.col)?;
            self.out.write_all(panel.padded_line(index).as_bytes())?;
        }
        ansi::restore_cursor(&mut self.out)?;
        self.out.flush()?;

        self.painted = Some(rect);
        Ok(stale)
    }

    fn blank(&mut self, rect: PanelRect) -> io::Result<()> {
        ansi::save_cursor(&mut self.out)?;
        blank_rows(&mut self.out, rect)?;
        ansi::restore_cursor(&mut self.out)
    }
}

fn blank_rows(out: &mut impl Write, rect: PanelRect) -> io::Result<()> {
    let blank = " ".repeat(usize::from(rect.width));
    for offset in 0..rect.height {
        ansi::cursor_to(out, rect.row.saturating_add(offset), rect.col)?;
        ansi::reset(out)?;
        out.write_all(blank.as_bytes())?;
    }
    Ok(())
}

impl<W: Write> Write for Compositor<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.active.is_some() {
            self.repaint_pending = true;
        }
        self.out.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

impl<W: Write> Drop for Compositor<W> {
    fn drop(&mut self) {
        if self.screen_shown() {
            let _ = self.clear();
        } else {
            self.active = None;
            self.painted = None;
        }
        let _ = self.set_mouse_capture(false);
    }
}
