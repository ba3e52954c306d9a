//! Round-robin run queue with a tick clock
//!
//! Ready tasks run in FIFO order. Sleeping tasks are kept sorted by wake
//! tick (ties broken by the order they went to sleep) and rejoin the back of
//! the ready queue once the clock reaches their tick. The clock only moves
//! when nothing is ready.

use alloc::collections::VecDeque;

struct Sleeper<T> {
    wake: u64,
    seq: u64,
    task: T,
}

pub struct Scheduler<T> {
    ready: VecDeque<T>,
    sleeping: VecDeque<Sleeper<T>>,
    now: u64,
    seq: u64,
}

impl<T> Scheduler<T> {
    pub const fn new() -> Self {
        Self {
            ready: VecDeque::new(),
            sleeping: VecDeque::new(),
            now: 0,
            seq: 0,
        }
    }

    /// Current tick.
    #[inline]
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Tasks known to the scheduler, ready or asleep.
    pub fn len(&self) -> usize {
        self.ready.len() + self.sleeping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Queue a runnable task at the back.
    pub fn push(&mut self, task: T) {
        self.ready.push_back(task);
    }

    /// Put a task to sleep for `ticks` from now.
    pub fn park(&mut self, task: T, ticks: u64) {
        let wake = self.now.saturating_add(ticks);
        let seq = self.seq;
        self.seq += 1;
        let at = self
            .sleeping
            .partition_point(|s| (s.wake, s.seq) <= (wake, seq));
        self.sleeping.insert(at, Sleeper { wake, seq, task });
    }

    /// Next runnable task, waking any sleeper that is due first.
    pub fn pop(&mut self) -> Option<T> {
        self.wake_due();
        self.ready.pop_front()
    }

    /// Tick at which the earliest sleeper wakes.
    pub fn next_wake(&self) -> Option<u64> {
        self.sleeping.front().map(|s| s.wake)
    }

    /// Move the clock forward; it never goes back.
    pub fn advance_to(&mut self, tick: u64) {
        if tick > self.now {
            self.now = tick;
        }
    }

    /// All tasks, ready ones first.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.ready
            .iter()
            .chain(self.sleeping.iter().map(|s| &s.task))
    }

    fn wake_due(&mut self) {
        while self.sleeping.front().map_or(false, |s| s.wake <= self.now) {
            if let Some(sleeper) = self.sleeping.pop_front() {
                self.ready.push_back(sleeper.task);
            }
        }
    }
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}
