//! Two-process fork
//!
//! Fork once; the child prints "Child", the parent prints "Parent", and both
//! exit with status 0.

use crate::config::STDOUT;
use crate::syscall::{Fork, Reply, Request};

use super::Program;

pub const CHILD: &[u8] = b"Child\n";
pub const PARENT: &[u8] = b"Parent\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PairState {
    Start,
    Forking,
    Reporting,
    Exiting,
}

/// The parent/child demonstration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForkPair {
    state: PairState,
    side: Option<Fork>,
}

impl ForkPair {
    pub const fn new() -> Self {
        Self {
            state: PairState::Start,
            side: None,
        }
    }

    /// Which side of the fork this process ended up on.
    pub const fn side(&self) -> Option<Fork> {
        self.side
    }

    pub const fn has_exited(&self) -> bool {
        matches!(self.state, PairState::Exiting)
    }
}

impl Default for ForkPair {
    fn default() -> Self {
        Self::new()
    }
}

impl Program for ForkPair {
    fn resume(&mut self, reply: Reply) -> Request<'static> {
        match (self.state, reply) {
            (PairState::Start, _) => {
                self.state = PairState::Forking;
                Request::Fork
            }
            (PairState::Forking, Reply::Forked(side)) => {
                self.side = Some(side);
                self.state = PairState::Reporting;
                let message = if side.is_child() { CHILD } else { PARENT };
                Request::write(STDOUT, message)
            }
            (PairState::Forking, _) => Request::Fork,
            (PairState::Reporting | PairState::Exiting, _) => {
                self.state = PairState::Exiting;
                Request::Exit { code: 0 }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syscall::Pid;

    #[test]
    fn test_child_path() {
        let mut pair = ForkPair::new();
        assert!(matches!(pair.resume(Reply::Start), Request::Fork));
        match pair.resume(Reply::Forked(Fork::Child)) {
            Request::Write { fd, buf } => {
                assert_eq!(fd, 1);
                assert_eq!(buf.len(), 6);
                assert_eq!(buf.as_bytes(), b"Child\n");
            }
            other => panic!("expected write, got {:?}", other),
        }
        assert!(matches!(pair.resume(Reply::Done), Request::Exit { code: 0 }));
        assert!(pair.has_exited());
        assert_eq!(pair.side(), Some(Fork::Child));
    }

    #[test]
    fn test_parent_path() {
        let mut pair = ForkPair::new();
        pair.resume(Reply::Start);
        let pid = Pid::new(2).unwrap();
        match pair.resume(Reply::Forked(Fork::Parent(pid))) {
            Request::Write { buf, .. } => {
                assert_eq!(buf.len(), 7);
                assert_eq!(buf.as_bytes(), b"Parent\n");
            }
            other => panic!("expected write, got {:?}", other),
        }
        assert!(matches!(pair.resume(Reply::Done), Request::Exit { code: 0 }));
    }

    #[test]
    fn test_exit_is_sticky() {
        let mut pair = ForkPair::new();
        pair.resume(Reply::Start);
        pair.resume(Reply::Forked(Fork::Child));
        pair.resume(Reply::Done);
        assert!(matches!(pair.resume(Reply::Done), Request::Exit { code: 0 }));
    }
}
