//! Trap frames
//!
//! Encoding a [`Request`] is a pure function of its arguments: the same
//! request always produces the same [`TrapFrame`], and registers the call
//! does not use are zero.

use core::fmt;

use bitflags::bitflags;

use super::numbers::Sysno;
use super::UserBuffer;

bitflags! {
    /// Argument registers of the `int 0x80` convention.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Slots: u8 {
        const EBX = 1 << 0;
        const ECX = 1 << 1;
        const EDX = 1 << 2;
    }
}

/// Register state handed across the trap.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TrapFrame {
    /// Operation code on entry, return value on exit
    pub eax: usize,
    /// Argument 1
    pub ebx: usize,
    /// Argument 2
    pub ecx: usize,
    /// Argument 3
    pub edx: usize,
}

impl TrapFrame {
    /// Build a frame from a code and up to three arguments, keeping only
    /// the slots in `used`.
    pub fn new(code: usize, used: Slots, args: [usize; 3]) -> Self {
        let pick = |slot: Slots, value: usize| if used.contains(slot) { value } else { 0 };
        Self {
            eax: code,
            ebx: pick(Slots::EBX, args[0]),
            ecx: pick(Slots::ECX, args[1]),
            edx: pick(Slots::EDX, args[2]),
        }
    }

    /// Arguments in slot order.
    #[inline]
    pub const fn args(&self) -> [usize; 3] {
        [self.ebx, self.ecx, self.edx]
    }
}

impl fmt::Debug for TrapFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TrapFrame(eax={:#x}, ebx={:#x}, ecx={:#x}, edx={:#x})",
            self.eax, self.ebx, self.ecx, self.edx
        )
    }
}

/// One logical system call.
#[derive(Debug, Clone, Copy)]
pub enum Request<'a> {
    Exit { code: i32 },
    Write { fd: usize, buf: UserBuffer<'a> },
    Fork,
    Sleep { duration: usize },
}

impl<'a> Request<'a> {
    /// Write a whole byte string.
    #[inline]
    pub const fn write(fd: usize, bytes: &'a [u8]) -> Self {
        Request::Write {
            fd,
            buf: UserBuffer::new(bytes),
        }
    }

    #[inline]
    pub const fn sysno(&self) -> Sysno {
        match self {
            Request::Exit { .. } => Sysno::Exit,
            Request::Write { .. } => Sysno::Write,
            Request::Fork => Sysno::Fork,
            Request::Sleep { .. } => Sysno::Sleep,
        }
    }

    /// Lay the request out in registers.
    pub fn encode(&self) -> TrapFrame {
        let sysno = self.sysno();
        let args = match *self {
            // exit codes are passed as the raw two's-complement word
            Request::Exit { code } => [code as isize as usize, 0, 0],
            Request::Write { fd, buf } => [fd, buf.addr(), buf.len()],
            Request::Fork => [0; 3],
            Request::Sleep { duration } => [duration, 0, 0],
        };
        TrapFrame::new(sysno.code(), sysno.arg_slots(), args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_layout() {
        let frame = Request::Exit { code: 0 }.encode();
        assert_eq!(frame, TrapFrame { eax: 1, ebx: 0, ecx: 0, edx: 0 });

        let frame = Request::Exit { code: -1 }.encode();
        assert_eq!(frame.ebx as isize, -1);
    }

    #[test]
    fn test_write_layout() {
        let message = b"Parent\n";
        let frame = Request::write(1, message).encode();
        assert_eq!(frame.eax, 2);
        assert_eq!(frame.ebx, 1);
        assert_eq!(frame.ecx, message.as_ptr() as usize);
        assert_eq!(frame.edx, 7);
    }

    #[test]
    fn test_fork_layout() {
        assert_eq!(Request::Fork.encode(), TrapFrame { eax: 3, ..TrapFrame::default() });
    }

    #[test]
    fn test_sleep_layout() {
        let frame = Request::Sleep { duration: 100 }.encode();
        assert_eq!(frame, TrapFrame { eax: 4, ebx: 100, ecx: 0, edx: 0 });
    }

    #[test]
    fn test_encoding_is_idempotent() {
        let message = b"Child 2\n";
        let requests = [
            Request::Exit { code: 3 },
            Request::write(1, message),
            Request::Fork,
            Request::Sleep { duration: 250 },
        ];
        for request in requests.iter() {
            assert_eq!(request.encode(), request.encode());
        }
    }

    #[test]
    fn test_unused_slots_are_masked() {
        let frame = TrapFrame::new(4, Slots::EBX, [9, 0xdead, 0xbeef]);
        assert_eq!(frame.args(), [9, 0, 0]);
    }
}
