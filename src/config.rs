//! Compile-time configuration
//!
//! Constants shared by the trampoline, the harness and the logger.

use log::LevelFilter;

/// Interrupt vector the kernel listens on for system calls.
pub const TRAP_VECTOR: u8 = 0x80;

/// Standard output descriptor.
pub const STDOUT: usize = 1;

/// Standard error descriptor (log lines go here).
pub const STDERR: usize = 2;

/// Sleep between two emissions of a looping process (milliseconds).
pub const LOOP_SLEEP: usize = 100;

/// Default log level installed by the binaries.
pub const LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Size of the per-record log line buffer.
pub const LOG_LINE: usize = 256;

/// Largest magnitude a kernel error return may have.
///
/// Returns in `-MAX_ERRNO..=-1` are errors, anything else is a value.
pub const MAX_ERRNO: usize = 4095;

/// Settings for the simulated kernel.
#[cfg(feature = "sim")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimConfig {
    /// Timer frequency; one tick lasts `1000 / hz` milliseconds.
    pub hz: u32,
    /// Upper bound on live processes; forks beyond it fail with EAGAIN.
    pub max_processes: usize,
    /// Pid given to the first process.
    pub first_pid: usize,
}

#[cfg(feature = "sim")]
impl SimConfig {
    /// Milliseconds covered by a single tick.
    pub const fn tick_ms(&self) -> u64 {
        let hz = if self.hz == 0 { 1 } else { self.hz };
        let ms = 1000 / hz as u64;
        if ms == 0 {
            1
        } else {
            ms
        }
    }

    /// Convert a sleep duration to ticks, never less than one.
    pub const fn ticks_for(&self, duration_ms: usize) -> u64 {
        let ticks = duration_ms as u64 / self.tick_ms();
        if ticks == 0 {
            1
        } else {
            ticks
        }
    }
}

#[cfg(feature = "sim")]
impl Default for SimConfig {
    fn default() -> Self {
        Self {
            hz: 100,
            max_processes: 64,
            first_pid: 1,
        }
    }
}
