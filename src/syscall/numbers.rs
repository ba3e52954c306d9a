//! System call numbers
//!
//! The code-to-operation mapping is fixed by the kernel and must not change.

use core::fmt;

use super::frame::Slots;
use super::SyscallError;

/// Raw system call numbers, as placed in `eax`.
pub mod numbers {
    pub const SYS_EXIT: usize = 1;
    pub const SYS_WRITE: usize = 2;
    pub const SYS_FORK: usize = 3;
    pub const SYS_SLEEP: usize = 4;

    /// Size of the kernel's dispatch table; codes at or above it are never valid.
    pub const NUM_SYSCALLS: usize = 128;
}

/// A known system call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Sysno {
    Exit = numbers::SYS_EXIT,
    Write = numbers::SYS_WRITE,
    Fork = numbers::SYS_FORK,
    Sleep = numbers::SYS_SLEEP,
}

impl Sysno {
    /// Code placed in `eax`.
    #[inline]
    pub const fn code(self) -> usize {
        self as usize
    }

    /// Argument registers this call reads.
    pub const fn arg_slots(self) -> Slots {
        match self {
            Sysno::Exit | Sysno::Sleep => Slots::EBX,
            Sysno::Write => Slots::EBX.union(Slots::ECX).union(Slots::EDX),
            Sysno::Fork => Slots::empty(),
        }
    }

    /// Whether the caller consumes `eax` after the trap.
    #[inline]
    pub const fn returns_value(self) -> bool {
        matches!(self, Sysno::Fork)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Sysno::Exit => "exit",
            Sysno::Write => "write",
            Sysno::Fork => "fork",
            Sysno::Sleep => "sleep",
        }
    }
}

impl fmt::Display for Sysno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<usize> for Sysno {
    type Error = SyscallError;

    fn try_from(code: usize) -> Result<Self, Self::Error> {
        match code {
            numbers::SYS_EXIT => Ok(Sysno::Exit),
            numbers::SYS_WRITE => Ok(Sysno::Write),
            numbers::SYS_FORK => Ok(Sysno::Fork),
            numbers::SYS_SLEEP => Ok(Sysno::Sleep),
            _ => Err(SyscallError::Enosys),
        }
    }
}
