//! Three-process fork tree
//!
//! "Parent", "Child 1" and "Child 2" each print their name and sleep,
//! forever. On the host the tree runs under the simulated kernel for a
//! bounded number of ticks.

#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

use forkshim::process::ForkTree;

#[cfg(all(target_os = "none", target_arch = "x86"))]
#[no_mangle]
pub extern "C" fn _start() -> ! {
    forkshim::rt::start(ForkTree::new())
}

/// Simulated time before the host run stops (ticks of 10 ms).
#[cfg(not(target_os = "none"))]
const HOST_TICKS: u64 = 300;

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

    let mut machine = Machine::new(ForkTree::new(), SimConfig::default());
    let halt = machine.run(Budget::ticks(HOST_TICKS));

    emit(std::io::stdout().lock(), &machine.stdout().bytes());
    log::info!(
        "stopped ({:?}) at tick {} after {} syscalls, {} processes live",
        halt,
        machine.now(),
        machine.steps(),
        machine.kernel().live()
    );
}
