use std::io::{self, Stdout, stdout};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::cursor::{Hide, Show};
use crossterm::event;
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::app::{App, Message, Model, update};
use crate::files::RescanTimer;
use crate::input::Command;
use crate::terminal::{Compositor, ansi};
use crate::watcher::{FileEvent, FileWatcher};

/// ratatui drawing through the overlay compositor.
pub type CanvasTerminal = Terminal<CrosstermBackend<Compositor<Stdout>>>;

static TERMINAL_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Whether the alternate screen is currently owned by the app.
pub fn terminal_active() -> bool {
    TERMINAL_ACTIVE.load(Ordering::Relaxed)
}

pub(super) struct ResizeDebouncer {
    delay_ms: u64,
    pending: Option<(u16, u16, u64)>,
}

impl ResizeDebouncer {
    pub(super) const fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    pub(super) const fn queue(&mut self, width: u16, height: u16, now_ms: u64) {
        self.pending = Some((width, height, now_ms));
    }

    pub(super) fn take_ready(&mut self, now_ms: u64) -> Option<(u16, u16)> {
        let (width, height, queued_at) = self.pending?;
        if now_ms.saturating_sub(queued_at) >= self.delay_ms {
            self.pending = None;
            Some((width, height))
        } else {
            None
        }
    }

    pub(super) const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

impl App {
    /// Run the main event loop.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal initialization fails or the terminal
    /// cannot be written to.
    pub fn run(&self) -> Result<()> {
        let mut terminal = init_terminal()
            .context("Failed to initialize terminal - canvas requires an interactive terminal")?;
        let size = terminal.size()?;

        let mut model = Model::new(
            self.file_path.clone(),
            self.watch_dir.clone(),
            (size.width, size.height),
        )
        .with_render_options(self.render_options);
        model.mouse_capture = self.mouse_capture;
        Self::load_current(&mut model);
        if let Some(msg) = Self::rescan_files(&model) {
            model = update(model, msg);
        }
        tracing::info!(
            file = %model.file_path.display(),
            dir = %model.watch_dir.display(),
            "canvas started"
        );

        let result = self.event_loop(&mut terminal, &mut model);

        let compositor = terminal.backend_mut().writer_mut();
        let _ = compositor.clear();
        let _ = compositor.set_mouse_capture(false);
        drop(terminal);
        restore_terminal()?;

        result
    }

    fn dispatch(&self, terminal: &mut CanvasTerminal, model: &mut Model, msg: Message) -> Result<()> {
        if msg == Message::Command(Command::Edit) {
            return self.run_editor(terminal, model);
        }
        let side_msg = msg.clone();
        *model = update(std::mem::take(model), msg);
        Self::handle_message_side_effects(model, &side_msg);
        Ok(())
    }

    fn event_loop(&self, terminal: &mut CanvasTerminal, model: &mut Model) -> Result<()> {
        let start = Instant::now();
        let mut resize_debouncer = ResizeDebouncer::new(100);
        let mut rescan_timer = RescanTimer::default();
        let mut watched_path = model.file_path.clone();
        let mut file_watcher = Self::watch_current_file(model);
        let mut needs_render = true;

        loop {
            // Follow the model to a newly selected file
            if model.file_path != watched_path {
                tracing::info!(path = %model.file_path.display(), "switching watched file");
                file_watcher = Self::watch_current_file(model);
                watched_path.clone_from(&model.file_path);
            }
            terminal
                .backend_mut()
                .writer_mut()
                .set_mouse_capture(model.wants_mouse_capture())?;

            if model.expire_toast(Instant::now()) {
                needs_render = true;
            }

            if let Some((width, height)) = resize_debouncer.take_ready(elapsed_ms(start)) {
                tracing::debug!(width, height, "resize applied");
                *model = update(std::mem::take(model), Message::Resize(width, height));
                // The panel may now be off screen; drop it and repaint from scratch.
                terminal.backend_mut().writer_mut().clear()?;
                terminal.autoresize()?;
                terminal.clear()?;
                needs_render = true;
            }

            if rescan_timer.take_due(Instant::now())
                && let Some(msg) = Self::rescan_files(model)
            {
                self.dispatch(terminal, model, msg)?;
                needs_render = true;
            }

            if let Some(file_event) = file_watcher.as_mut().and_then(FileWatcher::poll) {
                match &file_event {
                    FileEvent::Changed(text) => tracing::debug!(bytes = text.len(), "file changed"),
                    other => tracing::info!(event = ?other, "file event"),
                }
                self.dispatch(terminal, model, Message::File(file_event))?;
                needs_render = true;
            }

            let poll_ms = if needs_render {
                0
            } else if resize_debouncer.is_pending()
                || file_watcher.as_ref().is_some_and(FileWatcher::is_pending)
            {
                10
            } else {
                let until_rescan = rescan_timer.remaining(Instant::now()).as_millis();
                u64::try_from(until_rescan).unwrap_or(u64::MAX).clamp(10, 250)
            };
            if event::poll(Duration::from_millis(poll_ms))? {
                let event_ms = elapsed_ms(start);
                if let Some(msg) =
                    Self::handle_event(&event::read()?, model, event_ms, &mut resize_debouncer)
                {
                    tracing::trace!(?msg, "message");
                    self.dispatch(terminal, model, msg)?;
                    needs_render = true;
                }

                // Coalesce key repeat bursts into a single render.
                while !model.should_quit && event::poll(Duration::from_millis(0))? {
                    let drain_ms = elapsed_ms(start);
                    if let Some(msg) =
                        Self::handle_event(&event::read()?, model, drain_ms, &mut resize_debouncer)
                    {
                        self.dispatch(terminal, model, msg)?;
                        needs_render = true;
                    }
                }
            }

            if model.should_quit {
                break;
            }

            if needs_render {
                terminal.draw(|frame| crate::ui::render(model, frame))?;
                Self::paint_overlay(terminal, model)?;
                needs_render = false;
            }
        }
        Ok(())
    }

    /// Bring the compositor in line with the model after a base frame.
    ///
    /// When a panel was removed or changed shape, the blanked cells are
    /// unknown to ratatui, so the base screen is invalidated and redrawn
    /// before the panel is painted again.
    fn paint_overlay(terminal: &mut CanvasTerminal, model: &Model) -> Result<()> {
        let size = terminal.size()?;
        let panel = crate::ui::overlay_panel(model, size.width, size.height);
        let compositor = terminal.backend_mut().writer_mut();
        let stale = match panel {
            Some(panel) => {
                compositor.set_panel(panel);
                compositor.tick()?
            }
            None => compositor.clear()?,
        };
        if stale.is_some() {
            terminal.clear()?;
            terminal.draw(|frame| crate::ui::render(model, frame))?;
            terminal.backend_mut().writer_mut().tick()?;
        }
        Ok(())
    }
}

fn init_terminal() -> Result<CanvasTerminal> {
    install_panic_hook();
    enable_raw_mode()?;
    let setup = || -> Result<CanvasTerminal> {
        let mut out = Compositor::new(stdout()).with_screen_flag(&TERMINAL_ACTIVE);
        execute!(out, EnterAlternateScreen, Hide)?;
        Ok(Terminal::new(CrosstermBackend::new(out))?)
    };
    match setup() {
        Ok(terminal) => {
            TERMINAL_ACTIVE.store(true, Ordering::Relaxed);
            Ok(terminal)
        }
        Err(err) => {
            let _ = restore_terminal();
            Err(err)
        }
    }
}

fn restore_terminal() -> io::Result<()> {
    TERMINAL_ACTIVE.store(false, Ordering::Relaxed);
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen, Show)
}

fn install_panic_hook() {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if terminal_active() {
            let _ = ansi::disable_mouse(&mut stdout());
            let _ = restore_terminal();
        }
        hook(info);
    }));
}
