//! System call error codes
//!
//! Only the checked wrappers, the buffer validator and the simulated kernel
//! ever produce these. The default wrappers have no error path.

use core::fmt;

use crate::config::MAX_ERRNO;

/// System call error codes
#[repr(isize)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyscallError {
    /// Invalid system call number
    Enosys = -38,
    /// Bad file descriptor
    Ebadf = -9,
    /// Bad address (invalid pointer)
    Efault = -14,
    /// Invalid argument
    Einval = -22,
    /// Resource temporarily unavailable (process limit)
    Eagain = -11,
}

impl SyscallError {
    /// Interpret a raw `eax` value.
    ///
    /// Returns `None` when the value is not in the error range. Error
    /// values we do not know map to `Einval`.
    pub fn from_return(ret: usize) -> Option<Self> {
        let signed = ret as isize;
        if signed >= 0 || signed < -(MAX_ERRNO as isize) {
            return None;
        }
        Some(match signed {
            -38 => SyscallError::Enosys,
            -9 => SyscallError::Ebadf,
            -14 => SyscallError::Efault,
            -11 => SyscallError::Eagain,
            _ => SyscallError::Einval,
        })
    }

    /// Encode as the value the kernel leaves in `eax`.
    #[inline]
    pub const fn as_return(self) -> usize {
        self as isize as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            SyscallError::Enosys => "ENOSYS",
            SyscallError::Ebadf => "EBADF",
            SyscallError::Efault => "EFAULT",
            SyscallError::Einval => "EINVAL",
            SyscallError::Eagain => "EAGAIN",
        }
    }
}

impl fmt::Display for SyscallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), *self as isize)
    }
}
