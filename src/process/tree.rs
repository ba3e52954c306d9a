//! Three-process fork tree
//!
//! ```text
//!            Root
//!             │ fork
//!     ┌───────┴────────┐
//!  parent            child
//!  "Parent"           │ fork
//!             ┌───────┴────────┐
//!          parent            child
//!         "Child 1"        "Child 2"
//! ```
//!
//! Every leaf loops forever: write its label to stdout, sleep, repeat.

use crate::config::{LOOP_SLEEP, STDOUT};
use crate::syscall::{Fork, Reply, Request};

use super::Program;

pub const PARENT: &[u8] = b"Parent\n";
pub const CHILD_1: &[u8] = b"Child 1\n";
pub const CHILD_2: &[u8] = b"Child 2\n";

/// Endless emit-then-suspend loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Looper {
    message: &'static [u8],
    /// Next call is a write when true, a sleep otherwise.
    emit_next: bool,
}

impl Looper {
    pub const fn new(message: &'static [u8]) -> Self {
        Self {
            message,
            emit_next: true,
        }
    }

    pub const fn message(&self) -> &'static [u8] {
        self.message
    }

    fn next(&mut self) -> Request<'static> {
        let emit = self.emit_next;
        self.emit_next = !emit;
        if emit {
            Request::write(STDOUT, self.message)
        } else {
            Request::Sleep {
                duration: LOOP_SLEEP,
            }
        }
    }
}

/// Where a tree process is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeState {
    /// Nothing issued yet.
    Root,
    /// Waiting on the first fork's discriminator.
    FirstFork,
    /// Waiting on the second fork's discriminator.
    SecondFork,
    /// A leaf.
    Looping(Looper),
}

/// The three-process demonstration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForkTree {
    state: TreeState,
}

impl ForkTree {
    pub const fn new() -> Self {
        Self {
            state: TreeState::Root,
        }
    }

    pub const fn state(&self) -> TreeState {
        self.state
    }

    /// Label of a leaf, `None` before the process has settled.
    pub fn label(&self) -> Option<&'static [u8]> {
        match self.state {
            TreeState::Looping(looper) => Some(looper.message()),
            _ => None,
        }
    }

    fn settle(&mut self, message: &'static [u8]) -> Request<'static> {
        let mut looper = Looper::new(message);
        let request = looper.next();
        self.state = TreeState::Looping(looper);
        request
    }
}

impl Default for ForkTree {
    fn default() -> Self {
        Self::new()
    }
}

impl Program for ForkTree {
    fn resume(&mut self, reply: Reply) -> Request<'static> {
        match (self.state, reply) {
            (TreeState::Root, _) => {
                self.state = TreeState::FirstFork;
                Request::Fork
            }
            (TreeState::FirstFork, Reply::Forked(Fork::Parent(_))) => self.settle(PARENT),
            (TreeState::FirstFork, Reply::Forked(Fork::Child)) => {
                self.state = TreeState::SecondFork;
                Request::Fork
            }
            (TreeState::SecondFork, Reply::Forked(Fork::Parent(_))) => self.settle(CHILD_1),
            (TreeState::SecondFork, Reply::Forked(Fork::Child)) => self.settle(CHILD_2),
            // A fork is outstanding but the reply is not a fork result:
            // ask again rather than guess a side
            (TreeState::FirstFork | TreeState::SecondFork, _) => Request::Fork,
            (TreeState::Looping(mut looper), _) => {
                let request = looper.next();
                self.state = TreeState::Looping(looper);
                request
            }
        }
    }
}
