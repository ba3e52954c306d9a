//! Bare-metal runtime for i386 user programs
//!
//! Wires the logger to standard error and hands control to a program. The
//! binaries call [`start`] from their `_start` symbol.

use core::panic::PanicInfo;

use crate::config::{LOG_LEVEL, STDERR};
use crate::process::{self, Program};
use crate::syscall::{Int80, Trampoline};

/// Exit status used when a program panics.
const PANIC_EXIT: i32 = 101;

fn stderr_sink(bytes: &[u8]) {
    Trampoline::new(Int80).write(STDERR, bytes);
}

/// Process entry: install logging, then run `program` until it exits.
pub fn start<P: Program>(program: P) -> ! {
    crate::logger::init(stderr_sink, LOG_LEVEL);
    let mut sys = Trampoline::new(Int80);
    process::run(program, &mut sys)
}

/// Panic handler - report and terminate the process
#[cfg(not(test))]
#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    let mut sys = Trampoline::new(Int80);
    if let Some(location) = info.location() {
        log::error!(
            "panic at {}:{}:{}: {}",
            location.file(),
            location.line(),
            location.column(),
            info.message()
        );
    } else {
        log::error!("panic: {}", info.message());
    }
    sys.exit(PANIC_EXIT)
}
