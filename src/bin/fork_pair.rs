//! Two-process fork
//!
//! Parent and child each print one line and exit with status 0.

#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

use forkshim::process::ForkPair;

#[cfg(all(target_os = "none", target_arch = "x86"))]
#[no_mangle]
pub extern "C" fn _start() -> ! {
    forkshim::rt::start(ForkPair::new())
}

/// Copy the simulated stdout to `out`, logging instead of dropping a failure.
#[cfg(not(target_os = "none"))]
fn emit<W: std::io::Write>(mut out: W, bytes: &[u8]) -> bool {
    match out.write_all(bytes).and_then(|()| out.flush()) {
        Ok(()) => true,
        Err(e) => {
            log::error!("failed to write program output: {}", e);
            false
        }
    }
}

#[cfg(not(target_os = "none"))]
fn main() {
    use std::io::Write;

    use forkshim::config::{SimConfig, LOG_LEVEL};
    use forkshim::sim::{Budget, Machine};

    forkshim::logger::init(
        |bytes| {
            let _ = std::io::stderr().write_all(bytes);
        },
        LOG_LEVEL,
    );

    let mut machine = Machine::new(ForkPair::new(), SimConfig::default());
    let halt = machine.run(Budget::unbounded());

    emit(std::io::stdout().lock(), &machine.stdout().bytes());
    for exit in machine.exits() {
        log::info!("pid {} exited with status {}", exit.pid, exit.code);
    }
    log::info!("stopped ({:?}) after {} syscalls", halt, machine.steps());
}
