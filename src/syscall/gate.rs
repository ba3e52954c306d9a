//! Transfer of control
//!
//! A [`Gate`] takes a fully encoded [`TrapFrame`] into the kernel and hands
//! back whatever the kernel left in `eax`. [`Int80`] is the real gate on
//! i386; tests use a recording gate instead.

use super::TrapFrame;

/// Something that can carry a trap frame into the kernel.
pub trait Gate {
    /// Trap with `frame` and return the value of `eax` afterwards.
    ///
    /// # Safety
    /// Any buffer address in the frame must be readable for the length in
    /// the frame for the duration of the call.
    unsafe fn trap(&mut self, frame: TrapFrame) -> usize;
}

impl<G: Gate + ?Sized> Gate for &mut G {
    #[inline]
    unsafe fn trap(&mut self, frame: TrapFrame) -> usize {
        // SAFETY: forwarded obligation
        unsafe { (**self).trap(frame) }
    }
}

/// The `int 0x80` software interrupt.
#[cfg(target_arch = "x86")]
#[derive(Debug, Default, Clone, Copy)]
pub struct Int80;

#[cfg(target_arch = "x86")]
impl Gate for Int80 {
    #[inline]
    unsafe fn trap(&mut self, frame: TrapFrame) -> usize {
        let ret: usize;
        // SAFETY:
        // - the kernel preserves every register except eax
        // - ebx may be reserved by LLVM, so it is swapped in and out by hand
        // - buffer validity is the caller's obligation
        unsafe {
            core::arch::asm!(
                "xchg {arg1}, ebx",
                "int 0x80",
                "xchg {arg1}, ebx",
                arg1 = inout(reg) frame.ebx => _,
                inlateout("eax") frame.eax => ret,
                in("ecx") frame.ecx,
                in("edx") frame.edx,
                options(nostack),
            );
        }
        ret
    }
}

/// Test gate: records every frame and answers from a script.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct Recorder {
    pub frames: std::vec::Vec<TrapFrame>,
    pub replies: std::collections::VecDeque<usize>,
}

#[cfg(test)]
impl Recorder {
    pub fn with_replies(replies: &[usize]) -> Self {
        Self {
            frames: std::vec::Vec::new(),
            replies: replies.iter().copied().collect(),
        }
    }
}

#[cfg(test)]
impl Gate for Recorder {
    unsafe fn trap(&mut self, frame: TrapFrame) -> usize {
        self.frames.push(frame);
        self.replies.pop_front().unwrap_or(0)
    }
}
