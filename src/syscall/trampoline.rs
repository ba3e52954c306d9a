//! The syscall wrappers
//!
//! [`Trampoline`] owns a [`Gate`] and exposes one method per kernel
//! service. The unchecked methods are the default and have no error path;
//! `try_*` variants read the error range of `eax` for callers that care.

use core::fmt;
use core::num::NonZeroUsize;

use super::numbers::Sysno;
use super::{Gate, Request, SyscallError, UserBuffer};

/// Identifier of a process, as returned to the parent of a fork.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pid(NonZeroUsize);

impl Pid {
    /// `None` for 0, which is never a process identifier on the wire.
    #[inline]
    pub const fn new(raw: usize) -> Option<Self> {
        match NonZeroUsize::new(raw) {
            Some(raw) => Some(Self(raw)),
            None => None,
        }
    }

    #[inline]
    pub const fn get(self) -> usize {
        self.0.get()
    }
}

impl From<NonZeroUsize> for Pid {
    fn from(raw: NonZeroUsize) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pid({})", self.0)
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of a fork the caller is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fork {
    /// The new process; the discriminator was 0.
    Child,
    /// The original process; carries the new process's pid.
    Parent(Pid),
}

impl Fork {
    /// Zero means "new process", anything else names the child.
    #[inline]
    pub const fn from_discriminator(raw: usize) -> Self {
        match Pid::new(raw) {
            None => Fork::Child,
            Some(pid) => Fork::Parent(pid),
        }
    }

    #[inline]
    pub const fn discriminator(self) -> usize {
        match self {
            Fork::Child => 0,
            Fork::Parent(pid) => pid.get(),
        }
    }

    #[inline]
    pub const fn is_child(self) -> bool {
        matches!(self, Fork::Child)
    }
}

/// What a resumed program learns about its previous call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// First resumption; nothing has been issued yet.
    Start,
    /// The previous call produced no value.
    Done,
    /// The previous call was a fork.
    Forked(Fork),
}

impl Reply {
    /// Decode `eax` after `sysno` returned.
    #[inline]
    pub const fn decode(sysno: Sysno, ret: usize) -> Self {
        if sysno.returns_value() {
            Reply::Forked(Fork::from_discriminator(ret))
        } else {
            Reply::Done
        }
    }
}

/// System call wrappers over a gate.
#[derive(Debug)]
pub struct Trampoline<G> {
    gate: G,
}

impl<G: Gate> Trampoline<G> {
    pub const fn new(gate: G) -> Self {
        Self { gate }
    }

    pub fn gate(&self) -> &G {
        &self.gate
    }

    pub fn into_gate(self) -> G {
        self.gate
    }

    /// Encode `request`, trap, and return the raw `eax`.
    #[inline]
    pub fn issue(&mut self, request: &Request<'_>) -> usize {
        let frame = request.encode();
        // SAFETY: the only address a request carries is a UserBuffer, which
        // is valid for the request's lifetime
        unsafe { self.gate.trap(frame) }
    }

    /// Terminate the calling process.
    pub fn exit(&mut self, code: i32) -> ! {
        self.issue(&Request::Exit { code });
        // The kernel never resumes an exited process
        loop {
            core::hint::spin_loop();
        }
    }

    /// Append `bytes` to `fd`.
    #[inline]
    pub fn write(&mut self, fd: usize, bytes: &[u8]) {
        self.write_buffer(fd, UserBuffer::new(bytes));
    }

    /// Append a prebuilt buffer to `fd`.
    #[inline]
    pub fn write_buffer(&mut self, fd: usize, buf: UserBuffer<'_>) {
        self.issue(&Request::Write { fd, buf });
    }

    /// Duplicate the calling process. Returns in both processes.
    #[inline]
    pub fn fork(&mut self) -> Fork {
        Fork::from_discriminator(self.issue(&Request::Fork))
    }

    /// Yield for roughly `duration` milliseconds.
    #[inline]
    pub fn sleep(&mut self, duration: usize) {
        self.issue(&Request::Sleep { duration });
    }

    /// `write` that reports the byte count or the kernel's error.
    pub fn try_write(&mut self, fd: usize, bytes: &[u8]) -> Result<usize, SyscallError> {
        let ret = self.issue(&Request::write(fd, bytes));
        match SyscallError::from_return(ret) {
            Some(err) => Err(err),
            None => Ok(ret),
        }
    }

    /// `fork` that separates failure from "I am the parent".
    pub fn try_fork(&mut self) -> Result<Fork, SyscallError> {
        let ret = self.issue(&Request::Fork);
        match SyscallError::from_return(ret) {
            Some(err) => Err(err),
            None => Ok(Fork::from_discriminator(ret)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syscall::{Recorder, TrapFrame};

    #[test]
    fn test_discriminator_zero_is_child() {
        assert_eq!(Fork::from_discriminator(0), Fork::Child);
        assert!(Fork::from_discriminator(0).is_child());
        match Fork::from_discriminator(5) {
            Fork::Parent(pid) => assert_eq!(pid.get(), 5),
            Fork::Child => panic!("nonzero discriminator decoded as child"),
        }
    }

    #[test]
    fn test_discriminator_round_trip() {
        for raw in [0usize, 1, 2, 4096] {
            assert_eq!(Fork::from_discriminator(raw).discriminator(), raw);
        }
    }

    #[test]
    fn test_fork_issues_code_three() {
        let mut sys = Trampoline::new(Recorder::with_replies(&[0, 9]));
        assert_eq!(sys.fork(), Fork::Child);
        assert_eq!(sys.fork(), Fork::Parent(Pid::new(9).unwrap()));
        assert_eq!(sys.gate().frames, [TrapFrame { eax: 3, ..TrapFrame::default() }; 2]);
    }

    #[test]
    fn test_write_places_fd_buffer_length() {
        let message = b"Parent\n";
        let mut sys = Trampoline::new(Recorder::default());
        sys.write(1, message);
        let frame = sys.gate().frames[0];
        assert_eq!(frame.eax, 2);
        assert_eq!(frame.ebx, 1);
        assert_eq!(frame.ecx, message.as_ptr() as usize);
        assert_eq!(frame.edx, 7);
    }

    #[test]
    fn test_sleep_places_duration() {
        let mut sys = Trampoline::new(Recorder::default());
        sys.sleep(100);
        assert_eq!(sys.gate().frames, [TrapFrame { eax: 4, ebx: 100, ecx: 0, edx: 0 }]);
    }

    #[test]
    fn test_exit_frame_through_issue() {
        let mut sys = Trampoline::new(Recorder::default());
        sys.issue(&Request::Exit { code: 0 });
        assert_eq!(sys.into_gate().frames, [TrapFrame { eax: 1, ..TrapFrame::default() }]);
    }

    #[test]
    fn test_unchecked_fork_hides_failure() {
        let mut sys = Trampoline::new(Recorder::with_replies(&[SyscallError::Eagain.as_return()]));
        // the default wrapper has no error path: failure reads as "parent"
        assert!(matches!(sys.fork(), Fork::Parent(_)));
    }

    #[test]
    fn test_checked_variants() {
        let mut sys = Trampoline::new(Recorder::with_replies(&[
            SyscallError::Eagain.as_return(),
            4,
            7,
            SyscallError::Ebadf.as_return(),
        ]));
        assert_eq!(sys.try_fork(), Err(SyscallError::Eagain));
        assert_eq!(sys.try_fork(), Ok(Fork::Parent(Pid::new(4).unwrap())));
        assert_eq!(sys.try_write(1, b"Parent\n"), Ok(7));
        assert_eq!(sys.try_write(9, b"x"), Err(SyscallError::Ebadf));
    }

    #[test]
    fn test_reply_decode() {
        assert_eq!(Reply::decode(Sysno::Write, 7), Reply::Done);
        assert_eq!(Reply::decode(Sysno::Sleep, 0), Reply::Done);
        assert_eq!(Reply::decode(Sysno::Fork, 0), Reply::Forked(Fork::Child));
    }
}
