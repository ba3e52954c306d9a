//! Simulated kernel: system call handlers
//!
//! Decodes a [`TrapFrame`] the way the real kernel does and performs the
//! call against in-memory state.
//!
//! # Conventions
//! - Unknown syscall numbers return ENOSYS
//! - Handlers never panic; failures go back to the caller in `eax`
//! - Creating the child of a fork is left to the machine, which owns the
//!   programs; the kernel only admits the fork and hands out the pid

use alloc::vec::Vec;
use core::num::NonZeroUsize;

use log::{debug, info, trace, warn};

use crate::config::{SimConfig, STDERR, STDOUT, TRAP_VECTOR};
use crate::syscall::{codes, validate_user_read, Pid, Sysno, SyscallError, TrapFrame};

use super::stream::Stream;

/// A process that has called `exit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitRecord {
    pub pid: Pid,
    pub code: i32,
}

/// What the machine must do with the caller after a trap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Resume the caller with this `eax`.
    Return(usize),
    /// Park the caller for this many ticks, then resume with `eax = 0`.
    Sleep(u64),
    /// Clone the caller into `child`; the parent gets `child` in `eax`,
    /// the child gets 0.
    Fork { child: Pid },
    /// Drop the caller.
    Exit,
}

/// Kernel-side state shared by every simulated process.
///
/// Frames only enter through [`Machine`](super::Machine); a raw frame
/// cannot be dispatched from outside the crate:
///
/// ```compile_fail
/// use forkshim::config::SimConfig;
/// use forkshim::sim::Kernel;
/// use forkshim::syscall::TrapFrame;
///
/// let mut kernel = Kernel::new(SimConfig::default());
/// let pid = kernel.admit();
/// kernel.dispatch(pid, &TrapFrame { eax: 2, ebx: 1, ecx: 0x10, edx: 4 });
/// ```
#[derive(Debug)]
pub struct Kernel {
    config: SimConfig,
    next_pid: usize,
    live: usize,
    stdout: Stream,
    stderr: Stream,
    exits: Vec<ExitRecord>,
}

impl Kernel {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            next_pid: config.first_pid,
            live: 0,
            stdout: Stream::new(),
            stderr: Stream::new(),
            exits: Vec::new(),
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn stdout(&self) -> &Stream {
        &self.stdout
    }

    pub fn stderr(&self) -> &Stream {
        &self.stderr
    }

    pub fn exits(&self) -> &[ExitRecord] {
        &self.exits
    }

    /// Processes created and not yet exited.
    pub fn live(&self) -> usize {
        self.live
    }

    /// Hand out the next pid and count the process as live.
    pub fn admit(&mut self) -> Pid {
        let raw = NonZeroUsize::new(self.next_pid).unwrap_or(NonZeroUsize::MIN);
        self.next_pid = raw.get() + 1;
        self.live += 1;
        Pid::from(raw)
    }

    /// Dispatch a system call
    ///
    /// Crate-private: a write frame carries a raw address, and only frames
    /// built by [`Request::encode`](crate::syscall::Request::encode) from a
    /// live [`UserBuffer`](crate::syscall::UserBuffer) may reach it.
    ///
    /// # Arguments
    /// * `pid` - Calling process
    /// * `frame` - Registers at the trap
    pub(crate) fn dispatch(&mut self, pid: Pid, frame: &TrapFrame) -> Outcome {
        let sysno = Sysno::try_from(frame.eax);
        if let Ok(sysno) = sysno {
            trace!("[SYSCALL] int {:#x} pid {} {} {:?}", TRAP_VECTOR, pid, sysno, frame);
        }
        match sysno {
            Ok(Sysno::Exit) => self.sys_exit(pid, frame.ebx as isize as i32),
            Ok(Sysno::Write) => Outcome::Return(self.sys_write(
                pid,
                frame.ebx, // fd
                frame.ecx, // buf
                frame.edx, // len
            )),
            Ok(Sysno::Fork) => self.sys_fork(pid),
            Ok(Sysno::Sleep) => self.sys_sleep(pid, frame.ebx),
            Err(err) => {
                if frame.eax >= codes::NUM_SYSCALLS {
                    warn!("[SYSCALL] syscall number out of range: {}", frame.eax);
                } else {
                    warn!("[SYSCALL] unimplemented syscall, number={}", frame.eax);
                }
                Outcome::Return(err.as_return())
            }
        }
    }

    /// Exit system call
    ///
    /// Records the status; no validation needed, any code is acceptable.
    fn sys_exit(&mut self, pid: Pid, code: i32) -> Outcome {
        info!("[PROCESS] pid {} exited with status {}", pid, code);
        self.exits.push(ExitRecord { pid, code });
        self.live = self.live.saturating_sub(1);
        Outcome::Exit
    }

    /// Write system call
    ///
    /// # Returns
    /// Number of bytes written, or a negative error code
    ///
    /// # Checks
    /// - Only stdout and stderr exist
    /// - Buffer must pass the boundary checks
    fn sys_write(&mut self, pid: Pid, fd: usize, buf: usize, len: usize) -> usize {
        let stream = match fd {
            STDOUT => &mut self.stdout,
            STDERR => &mut self.stderr,
            _ => {
                debug!("[SYSCALL] write: invalid fd {}", fd);
                return SyscallError::Ebadf.as_return();
            }
        };

        // SAFETY: dispatch is only reached from Machine::step, whose frames
        // are encoded from a program's Request<'static>; a non-null buf is
        // then a 'static UserBuffer in the host address space
        let user_buf = match unsafe { validate_user_read(buf, len) } {
            Ok(buf) => buf,
            Err(e) => {
                debug!("[SYSCALL] write: buffer validation failed: {}", e);
                return e.as_return();
            }
        };

        stream.append(pid, user_buf.as_bytes());
        len
    }

    /// Fork system call
    ///
    /// Fails with EAGAIN when another process would exceed the limit.
    fn sys_fork(&mut self, pid: Pid) -> Outcome {
        if self.live >= self.config.max_processes {
            debug!(
                "[SYSCALL] fork: pid {} refused, {} processes live",
                pid, self.live
            );
            return Outcome::Return(SyscallError::Eagain.as_return());
        }
        let child = self.admit();
        debug!("[PROCESS] pid {} forked child {}", pid, child);
        Outcome::Fork { child }
    }

    /// Sleep system call
    ///
    /// Duration is in milliseconds, rounded down to whole ticks (at least one).
    fn sys_sleep(&mut self, pid: Pid, duration: usize) -> Outcome {
        let ticks = self.config.ticks_for(duration);
        trace!("[SYSCALL] pid {} sleeps {} ticks", pid, ticks);
        Outcome::Sleep(ticks)
    }
}
