//! Process Replication Harness
//!
//! Programs are resumable state machines. Every resumption hands the
//! program the [`Reply`] to its previous call and takes back exactly one
//! [`Request`]. Because all local state lives in the machine, a fork is
//! "clone the machine, answer each copy with its own discriminator".
//!
//! # Programs
//! - [`ForkTree`]: three processes looping forever ("Parent", "Child 1", "Child 2")
//! - [`ForkPair`]: parent and child each print one line and exit

mod pair;
mod tree;

pub use pair::ForkPair;
pub use tree::{ForkTree, Looper, TreeState};

use crate::syscall::{Gate, Reply, Request, Trampoline};

/// A user program driven one system call at a time.
pub trait Program {
    /// Consume the outcome of the last call and produce the next one.
    fn resume(&mut self, reply: Reply) -> Request<'static>;
}

/// Resume `program` once and carry its request through `sys`.
///
/// Returns the reply for the next resumption.
pub fn step<P, G>(program: &mut P, sys: &mut Trampoline<G>, reply: Reply) -> Reply
where
    P: Program + ?Sized,
    G: Gate,
{
    let request = program.resume(reply);
    let ret = sys.issue(&request);
    Reply::decode(request.sysno(), ret)
}

/// Run `program` against the real kernel. Never returns; the process ends
/// when the program issues `exit`.
pub fn run<P, G>(mut program: P, sys: &mut Trampoline<G>) -> !
where
    P: Program,
    G: Gate,
{
    let mut reply = Reply::Start;
    loop {
        reply = step(&mut program, sys, reply);
    }
}
