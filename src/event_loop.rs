use std::io;
use std::time::{Duration, Instant};

use crossterm::event::Event;

use crate::drivers::InputDriver;

pub enum ControlFlow {
    Continue,
    Quit,
}

/// What the loop hands to its handler on each call.
#[derive(Debug)]
pub enum Tick {
    /// Wall-clock time since the previous frame tick. Sent once per poll
    /// interval, before any input gathered in that interval.
    Frame(Duration),
    Input(Event),
}

/// Single-threaded loop that paces frames and forwards terminal input.
///
/// The handler is the only place that touches the layer coordinator, so
/// frame ticks and input can never interleave mid-operation.
pub struct EventLoop<D> {
    driver: D,
    poll_interval: Duration,
}

impl<D: InputDriver> EventLoop<D> {
    pub fn new(driver: D, poll_interval: Duration) -> Self {
        Self {
            driver,
            poll_interval,
        }
    }

    pub fn driver(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Run until the handler returns [`ControlFlow::Quit`].
    pub fn run<F>(&mut self, mut handler: F) -> io::Result<()>
    where
        F: FnMut(Tick) -> io::Result<ControlFlow>,
    {
        let mut last = Instant::now();
        loop {
            let now = Instant::now();
            let elapsed = now.saturating_duration_since(last);
            last = now;
            if let ControlFlow::Quit = handler(Tick::Frame(elapsed))? {
                return Ok(());
            }

            if self.driver.poll(self.poll_interval)? {
                // Drain bursts so a key repeat cannot outpace rendering.
                loop {
                    let event = self.driver.read()?;
                    if let ControlFlow::Quit = handler(Tick::Input(event))? {
                        return Ok(());
                    }
                    if !self.driver.poll(Duration::ZERO)? {
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::console::ConsoleInputDriver;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    #[test]
    fn frame_comes_before_injected_input_and_quit_stops() {
        let mut driver = ConsoleInputDriver::new();
        for c in ['a', 'b'] {
            driver.inject(Event::Key(KeyEvent::new(
                KeyCode::Char(c),
                KeyModifiers::NONE,
            )));
        }
        let mut event_loop = EventLoop::new(driver, Duration::ZERO);
        let mut seen = Vec::new();
        event_loop
            .run(|tick| {
                let flow = match &tick {
                    Tick::Input(Event::Key(k)) if k.code == KeyCode::Char('b') => {
                        ControlFlow::Quit
                    }
                    _ => ControlFlow::Continue,
                };
                seen.push(matches!(tick, Tick::Frame(_)));
                Ok(flow)
            })
            .unwrap();
        assert_eq!(seen, vec![true, false, false]);
    }
}
