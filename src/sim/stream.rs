//! Recording output streams
//!
//! Each `write` lands as one [`Chunk`]; chunks are never split or merged, so
//! the bytes of a single write are always contiguous.

use alloc::vec::Vec;

use crate::syscall::Pid;

/// The bytes of one write, tagged with the writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub pid: Pid,
    pub bytes: Vec<u8>,
}

/// An append-only descriptor target.
#[derive(Debug, Default, Clone)]
pub struct Stream {
    chunks: Vec<Chunk>,
}

impl Stream {
    pub const fn new() -> Self {
        Self { chunks: Vec::new() }
    }

    pub fn append(&mut self, pid: Pid, bytes: &[u8]) {
        self.chunks.push(Chunk {
            pid,
            bytes: bytes.to_vec(),
        });
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Everything written so far, in arrival order.
    pub fn bytes(&self) -> Vec<u8> {
        self.chunks.iter().flat_map(|c| c.bytes.iter().copied()).collect()
    }

    /// Number of writes whose bytes are exactly `message`.
    pub fn count(&self, message: &[u8]) -> usize {
        self.chunks.iter().filter(|c| c.bytes == message).count()
    }

    /// Writes issued by `pid`.
    pub fn by(&self, pid: Pid) -> impl Iterator<Item = &Chunk> + '_ {
        self.chunks.iter().filter(move |c| c.pid == pid)
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}
