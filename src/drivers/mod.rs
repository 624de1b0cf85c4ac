//! Terminal input for the demo loop.

pub mod console;

use ::crossterm::event::Event;
use std::io;
use std::time::Duration;

/// Source of terminal events feeding [`crate::event_loop::EventLoop`].
pub trait InputDriver {
    /// Whether an event is ready within `timeout`.
    fn poll(&mut self, timeout: Duration) -> io::Result<bool>;
    fn read(&mut self) -> io::Result<Event>;
    /// Mouse reports are needed for backdrop clicks.
    fn set_mouse_capture(&mut self, _enabled: bool) -> io::Result<()> {
        Ok(())
    }
}
