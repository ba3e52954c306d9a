//! Simulated kernel
//!
//! Runs [`Program`]s on the development host. Every call still goes through
//! [`Request::encode`] and is decoded from the [`TrapFrame`] on the kernel
//! side, so the register contract is exercised exactly as on hardware.
//!
//! # Replication
//! A fork clones the caller's program right after it issued the call. The
//! original resumes with the child's pid, the clone with 0; both continue
//! from the same state.
//!
//! # Bounding
//! Looping programs never exit, so [`Machine::run`] takes a [`Budget`] of
//! steps and/or ticks and reports why it stopped.

mod kernel;
mod scheduler;
mod stream;

pub use kernel::{ExitRecord, Kernel, Outcome};
pub use scheduler::Scheduler;
pub use stream::{Chunk, Stream};

use log::debug;

use crate::config::SimConfig;
use crate::process::Program;
use crate::syscall::{Fork, Pid, Reply, Request, TrapFrame};

/// A simulated process.
#[derive(Debug, Clone)]
pub struct Task<P> {
    pid: Pid,
    program: P,
    reply: Reply,
}

impl<P> Task<P> {
    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn program(&self) -> &P {
        &self.program
    }
}

/// Limits for one [`Machine::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Budget {
    /// Stop after this many system calls in total.
    pub max_steps: Option<u64>,
    /// Stop before the clock would pass this tick.
    ///
    /// The clock only moves when every process is asleep, so this alone
    /// never stops a program that does not sleep; pair it with `max_steps`.
    pub max_ticks: Option<u64>,
}

impl Budget {
    /// Run until every process has exited.
    pub const fn unbounded() -> Self {
        Self {
            max_steps: None,
            max_ticks: None,
        }
    }

    pub const fn steps(n: u64) -> Self {
        Self {
            max_steps: Some(n),
            max_ticks: None,
        }
    }

    /// Stop at tick `n`. See [`Budget::max_ticks`] for programs that never
    /// sleep.
    pub const fn ticks(n: u64) -> Self {
        Self {
            max_steps: None,
            max_ticks: Some(n),
        }
    }
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// No process is left.
    AllExited,
    StepLimit,
    TickLimit,
}

/// A kernel plus the programs it schedules.
pub struct Machine<P> {
    kernel: Kernel,
    sched: Scheduler<Task<P>>,
    steps: u64,
}

impl<P: Program + Clone> Machine<P> {
    /// Boot with `program` as the first process.
    pub fn new(program: P, config: SimConfig) -> Self {
        let mut kernel = Kernel::new(config);
        let pid = kernel.admit();
        let mut sched = Scheduler::new();
        sched.push(Task {
            pid,
            program,
            reply: Reply::Start,
        });
        debug!("[BOOT] first process is pid {}", pid);
        Self {
            kernel,
            sched,
            steps: 0,
        }
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    pub fn stdout(&self) -> &Stream {
        self.kernel.stdout()
    }

    pub fn exits(&self) -> &[ExitRecord] {
        self.kernel.exits()
    }

    /// Current tick.
    pub fn now(&self) -> u64 {
        self.sched.now()
    }

    /// System calls executed so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Live processes.
    pub fn tasks(&self) -> impl Iterator<Item = &Task<P>> + '_ {
        self.sched.iter()
    }

    /// Schedule until the budget runs out or nothing is left.
    pub fn run(&mut self, budget: Budget) -> Halt {
        let mut used = 0u64;
        loop {
            if budget.max_steps.map_or(false, |max| used >= max) {
                return Halt::StepLimit;
            }
            match self.sched.pop() {
                Some(task) => {
                    self.step(task);
                    used += 1;
                }
                None => match self.sched.next_wake() {
                    None => return Halt::AllExited,
                    Some(wake) => {
                        if budget.max_ticks.map_or(false, |max| wake > max) {
                            return Halt::TickLimit;
                        }
                        self.sched.advance_to(wake);
                    }
                },
            }
        }
    }

    /// Resume one task for exactly one system call.
    fn step(&mut self, mut task: Task<P>) {
        self.steps += 1;
        let request: Request<'static> = task.program.resume(task.reply);
        let sysno = request.sysno();
        let frame: TrapFrame = request.encode();

        match self.kernel.dispatch(task.pid, &frame) {
            Outcome::Return(ret) => {
                task.reply = Reply::decode(sysno, ret);
                self.sched.push(task);
            }
            Outcome::Sleep(ticks) => {
                task.reply = Reply::Done;
                self.sched.park(task, ticks);
            }
            Outcome::Fork { child } => {
                let replica = Task {
                    pid: child,
                    program: task.program.clone(),
                    reply: Reply::Forked(Fork::Child),
                };
                task.reply = Reply::Forked(Fork::Parent(child));
                self.sched.push(task);
                self.sched.push(replica);
            }
            Outcome::Exit => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{ForkPair, ForkTree};
    use std::collections::BTreeSet;
    use std::vec::Vec;

    /// Forks once, remembers what it saw, then sleeps forever.
    #[derive(Debug, Clone, Default)]
    struct Splitter {
        calls: u32,
        calls_at_fork: Option<u32>,
        side: Option<Fork>,
    }

    impl Program for Splitter {
        fn resume(&mut self, reply: Reply) -> Request<'static> {
            self.calls += 1;
            if let Reply::Forked(side) = reply {
                self.side = Some(side);
                self.calls_at_fork = Some(self.calls);
            }
            match (reply, self.side) {
                (Reply::Start, _) => Request::Fork,
                _ => Request::Sleep { duration: 1000 },
            }
        }
    }

    /// Sleeps once, then exits.
    #[derive(Debug, Clone, Default)]
    struct Nap {
        slept: bool,
    }

    impl Program for Nap {
        fn resume(&mut self, _reply: Reply) -> Request<'static> {
            if self.slept {
                Request::Exit { code: 0 }
            } else {
                self.slept = true;
                Request::Sleep { duration: 100 }
            }
        }
    }

    /// Writes to stderr without ever sleeping, then never stops.
    #[derive(Debug, Clone, Default)]
    struct Chatter;

    impl Program for Chatter {
        fn resume(&mut self, _reply: Reply) -> Request<'static> {
            Request::write(2, b"busy\n")
        }
    }

    fn labels(machine: &Machine<ForkTree>) -> BTreeSet<Vec<u8>> {
        machine
            .stdout()
            .chunks()
            .iter()
            .map(|c| c.bytes.clone())
            .collect()
    }

    #[test]
    fn test_discriminator_exclusivity() {
        let mut machine = Machine::new(Splitter::default(), SimConfig::default());
        machine.run(Budget::steps(10));

        let tasks: Vec<_> = machine.tasks().collect();
        assert_eq!(tasks.len(), 2);
        let children: Vec<_> = tasks
            .iter()
            .filter(|t| t.program().side == Some(Fork::Child))
            .collect();
        let parents: Vec<_> = tasks
            .iter()
            .filter_map(|t| match t.program().side {
                Some(Fork::Parent(pid)) => Some(pid),
                _ => None,
            })
            .collect();
        assert_eq!(children.len(), 1);
        assert_eq!(parents.len(), 1);
        // the parent's discriminator names the child
        assert_eq!(parents[0], children[0].pid());
    }

    #[test]
    fn test_continuation_symmetry() {
        let mut machine = Machine::new(Splitter::default(), SimConfig::default());
        machine.run(Budget::steps(10));

        let at_fork: Vec<_> = machine
            .tasks()
            .map(|t| t.program().calls_at_fork)
            .collect();
        assert_eq!(at_fork, [Some(2), Some(2)]);
    }

    #[test]
    fn test_tree_shape() {
        let mut machine = Machine::new(ForkTree::new(), SimConfig::default());
        assert_eq!(machine.run(Budget::ticks(1000)), Halt::TickLimit);

        let mut live: Vec<_> = machine
            .tasks()
            .filter_map(|t| t.program().label())
            .collect();
        live.sort();
        assert_eq!(live, [&b"Child 1\n"[..], b"Child 2\n", b"Parent\n"]);

        let expected: BTreeSet<Vec<u8>> = [&b"Parent\n"[..], b"Child 1\n", b"Child 2\n"]
            .iter()
            .map(|l| l.to_vec())
            .collect();
        assert_eq!(labels(&machine), expected);
        for label in expected.iter() {
            assert!(machine.stdout().count(label) >= 50);
        }
        assert!(machine.exits().is_empty());
    }

    #[test]
    fn test_tree_writers_keep_their_label() {
        let mut machine = Machine::new(ForkTree::new(), SimConfig::default());
        machine.run(Budget::steps(200));

        for task in machine.tasks() {
            let label = task.program().label().unwrap();
            assert!(machine.stdout().by(task.pid()).all(|c| c.bytes == label));
        }
    }

    #[test]
    fn test_pair_terminates() {
        let mut machine = Machine::new(ForkPair::new(), SimConfig::default());
        assert_eq!(machine.run(Budget::unbounded()), Halt::AllExited);

        let stdout = machine.stdout();
        assert_eq!(stdout.chunks().len(), 2);
        assert_eq!(stdout.count(b"Child\n"), 1);
        assert_eq!(stdout.count(b"Parent\n"), 1);

        let root = Pid::new(1).unwrap();
        let child = Pid::new(2).unwrap();
        assert!(stdout.by(root).all(|c| c.bytes == b"Parent\n"));
        assert!(stdout.by(child).all(|c| c.bytes == b"Child\n"));

        let mut exits: Vec<_> = machine.exits().iter().map(|e| (e.pid, e.code)).collect();
        exits.sort();
        assert_eq!(exits, [(root, 0), (child, 0)]);
        assert_eq!(machine.kernel().live(), 0);
    }

    #[test]
    fn test_failed_fork_is_invisible() {
        let config = SimConfig {
            max_processes: 1,
            ..SimConfig::default()
        };
        let mut machine = Machine::new(ForkPair::new(), config);
        assert_eq!(machine.run(Budget::unbounded()), Halt::AllExited);

        // the lone process believes it is the parent
        assert_eq!(machine.stdout().bytes(), b"Parent\n");
        assert_eq!(machine.exits().len(), 1);
    }

    #[test]
    fn test_tree_with_process_limit() {
        let config = SimConfig {
            max_processes: 2,
            ..SimConfig::default()
        };
        let mut machine = Machine::new(ForkTree::new(), config);
        machine.run(Budget::ticks(100));

        let expected: BTreeSet<Vec<u8>> = [&b"Parent\n"[..], b"Child 1\n"]
            .iter()
            .map(|l| l.to_vec())
            .collect();
        assert_eq!(labels(&machine), expected);
        assert_eq!(machine.tasks().count(), 2);
    }

    #[test]
    fn test_sleep_advances_clock() {
        let mut machine = Machine::new(Nap::default(), SimConfig::default());
        assert_eq!(machine.run(Budget::unbounded()), Halt::AllExited);
        assert_eq!(machine.now(), 10);
        assert_eq!(machine.steps(), 2);
    }

    #[test]
    fn test_step_budget() {
        let mut machine = Machine::new(ForkTree::new(), SimConfig::default());
        assert_eq!(machine.run(Budget::steps(3)), Halt::StepLimit);
        assert_eq!(machine.steps(), 3);
        // resuming continues where the previous run stopped
        assert_eq!(machine.run(Budget::steps(2)), Halt::StepLimit);
        assert_eq!(machine.steps(), 5);
    }

    #[test]
    fn test_writes_reach_kernel_through_encoded_frames() {
        let mut machine = Machine::new(Chatter, SimConfig::default());
        machine.run(Budget::steps(3));
        assert_eq!(machine.kernel().stderr().bytes(), b"busy\nbusy\nbusy\n");
        assert!(machine.stdout().is_empty());
    }

    #[test]
    fn test_tick_budget_needs_steps_without_sleepers() {
        let mut machine = Machine::new(Chatter, SimConfig::default());
        let budget = Budget {
            max_steps: Some(50),
            ..Budget::ticks(10)
        };
        // the clock never moves for a process that does not sleep
        assert_eq!(machine.run(budget), Halt::StepLimit);
        assert_eq!(machine.now(), 0);
        assert_eq!(machine.steps(), 50);
    }
}
