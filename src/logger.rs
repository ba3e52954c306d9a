//! `log` backend
//!
//! Formats each record as `[LEVEL target] message` into a fixed line buffer
//! and hands the finished line to a byte sink in a single call. On the
//! target the sink is a `write(2, ..)` system call, so one record is one
//! write and lines from different processes never interleave mid-line.

use core::fmt::{self, Write};

use log::{LevelFilter, Log, Metadata, Record};
use spin::{Mutex, Once};

use crate::config::LOG_LINE;

/// Where finished lines go.
pub type Sink = fn(&[u8]);

/// Fixed-capacity line; output past the end is dropped.
pub struct LineBuffer<const N: usize> {
    buf: [u8; N],
    len: usize,
    truncated: bool,
}

impl<const N: usize> LineBuffer<N> {
    pub const fn new() -> Self {
        Self {
            buf: [0; N],
            len: 0,
            truncated: false,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Terminate with a newline, overwriting the last byte when full.
    pub fn finish(&mut self) -> &[u8] {
        if N == 0 {
            return &[];
        }
        if self.len < N {
            self.buf[self.len] = b'\n';
            self.len += 1;
        } else {
            self.buf[N - 1] = b'\n';
        }
        self.as_bytes()
    }
}

impl<const N: usize> Default for LineBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Write for LineBuffer<N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = N - self.len;
        let take = s.len().min(room);
        self.buf[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take;
        if take < s.len() {
            self.truncated = true;
        }
        // never report an error: a clipped log line beats a lost one
        Ok(())
    }
}

/// Render `record` into `line` without the trailing newline.
pub fn format_record<const N: usize>(record: &Record<'_>, line: &mut LineBuffer<N>) {
    let _ = write!(line, "[{} {}] {}", record.level(), record.target(), record.args());
}

struct SinkLogger {
    sink: Mutex<Option<Sink>>,
}

impl Log for SinkLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        // the guard is dropped here: formatting or the sink may log again
        let sink = *self.sink.lock();
        if let Some(sink) = sink {
            let mut line = LineBuffer::<LOG_LINE>::new();
            format_record(record, &mut line);
            sink(line.finish());
        }
    }

    fn flush(&self) {}
}

static LOGGER: SinkLogger = SinkLogger {
    sink: Mutex::new(None),
};

static INSTALLED: Once<bool> = Once::new();

/// Route `log` records to `sink` at `level` and above.
///
/// May be called again to swap the sink or change the level.
pub fn init(sink: Sink, level: LevelFilter) {
    *LOGGER.sink.lock() = Some(sink);
    let installed = *INSTALLED.call_once(|| log::set_logger(&LOGGER).is_ok());
    if installed {
        log::set_max_level(level);
    }
}
