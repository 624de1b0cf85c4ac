//! `tracing` output for the demo: into the on-screen log pane while the
//! terminal is in raw mode, stderr otherwise.

use std::io::{self, Write};

use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

use crate::log_buffer::{LogHandle, LogWriter, global_log};

/// Where one formatted event ends up.
pub enum LogSink {
    Pane(LogWriter),
    Stderr(io::Stderr),
}

impl LogSink {
    fn for_handle(handle: Option<LogHandle>) -> Self {
        match handle {
            Some(handle) => LogSink::Pane(handle.writer()),
            None => LogSink::Stderr(io::stderr()),
        }
    }
}

impl Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            LogSink::Pane(w) => w.write(buf),
            LogSink::Stderr(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            LogSink::Pane(w) => w.flush(),
            LogSink::Stderr(s) => s.flush(),
        }
    }
}

/// Picks the pane once [`crate::log_buffer::set_global_log`] has run.
#[derive(Clone, Copy, Debug)]
pub struct PaneMakeWriter;

impl<'a> MakeWriter<'a> for PaneMakeWriter {
    type Writer = LogSink;

    fn make_writer(&'a self) -> Self::Writer {
        LogSink::for_handle(global_log())
    }
}

/// Install the fmt subscriber at `level`. Later calls are no-ops.
pub fn init(level: Level) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(PaneMakeWriter)
        .with_target(false)
        .without_time()
        .with_ansi(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pane_sink_splits_lines_into_the_buffer() {
        let handle = LogHandle::new(8);
        let mut sink = LogSink::for_handle(Some(handle.clone()));
        sink.write_all(b"DEBUG opening\nDEBUG op").unwrap();
        sink.write_all(b"en\n").unwrap();
        assert_eq!(handle.tail(8), vec!["DEBUG opening", "DEBUG open"]);
    }
}
