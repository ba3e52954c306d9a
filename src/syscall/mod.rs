//! System Call Trampoline
//!
//! Thin user-space wrappers that encode each kernel service into the
//! i386 `int 0x80` register convention and decode the return register.
//!
//! # Calling Convention
//! - `eax`: operation code (in), return value (out)
//! - `ebx`, `ecx`, `edx`: arguments 1..3
//!
//! # Current Syscalls
//! - 1: exit(code) - terminate the calling process
//! - 2: write(fd, buf, len) - append bytes to a file descriptor
//! - 3: fork() - duplicate the calling process
//! - 4: sleep(duration) - yield for roughly `duration` milliseconds
//!
//! # Safety Model
//! - The trampoline never validates arguments; it encodes intent only
//! - Buffers are carried as [`UserBuffer`] so their length travels with them
//! - Validation lives at the kernel boundary ([`validate_user_read`])

mod error;
mod frame;
mod gate;
mod numbers;
mod trampoline;
mod validate;

pub use error::SyscallError;
pub use frame::{Request, Slots, TrapFrame};
#[cfg(target_arch = "x86")]
pub use gate::Int80;
pub use gate::Gate;
#[cfg(test)]
pub(crate) use gate::Recorder;
pub use numbers::{numbers as codes, Sysno};
pub use trampoline::{Fork, Pid, Reply, Trampoline};
pub use validate::{validate_user_read, UserBuffer};
