use crossterm::event::Event;

use crate::app::{App, Message, Model};
use crate::input::{decode_key, decode_mouse, report_from_event};

use super::event_loop::ResizeDebouncer;

impl App {
    /// Translate a terminal event into a message for the current context.
    ///
    /// Resizes are queued on the debouncer rather than returned.
    pub(super) fn handle_event(
        event: &Event,
        model: &Model,
        now_ms: u64,
        resize_debouncer: &mut ResizeDebouncer,
    ) -> Option<Message> {
        let context = model.key_context();
        match event {
            Event::Key(key) => decode_key(context, *key).map(Message::Command),
            Event::Mouse(mouse) => {
                decode_mouse(context, report_from_event(*mouse)).map(Message::Command)
            }
            Event::Resize(width, height) => {
                tracing::debug!(width, height, "resize queued");
                resize_debouncer.queue(*width, *height, now_ms);
                None
            }
            _ => None,
        }
    }
}
