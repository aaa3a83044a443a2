//! Non-blocking output drainer.
//!
//! Reads whatever bytes are available on a channel right now and stops as
//! soon as nothing is pending. The result is a point-in-time snapshot: bytes
//! still in flight are picked up by a later drain, not waited for.

use std::collections::VecDeque;

/// Maximum number of bytes taken per read
pub const DRAIN_CHUNK_SIZE: usize = 4096;

/// A byte source that can be polled without blocking
pub trait ChunkSource {
    /// Returns up to `max_len` bytes that are ready now, or `None` when
    /// nothing is pending. Must never wait for data.
    fn poll_chunk(&mut self, max_len: usize) -> Option<Vec<u8>>;
}

impl ChunkSource for VecDeque<Vec<u8>> {
    fn poll_chunk(&mut self, max_len: usize) -> Option<Vec<u8>> {
        let mut chunk = self.pop_front()?;
        if chunk.len() > max_len {
            let rest = chunk.split_off(max_len);
            self.push_front(rest);
        }
        Some(chunk)
    }
}

/// Drains all currently available bytes from a [`ChunkSource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputDrainer {
    chunk_size: usize,
}

impl Default for OutputDrainer {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputDrainer {
    /// Creates a drainer reading [`DRAIN_CHUNK_SIZE`] bytes at a time
    #[must_use]
    pub const fn new() -> Self {
        Self {
            chunk_size: DRAIN_CHUNK_SIZE,
        }
    }

    /// Creates a drainer with a custom chunk size (minimum 1)
    #[must_use]
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Chunk size used per read
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Collects raw bytes until the source reports nothing pending
    pub fn drain_bytes<C: ChunkSource + ?Sized>(&self, source: &mut C) -> Vec<u8> {
        let mut collected = Vec::new();
        while let Some(chunk) = source.poll_chunk(self.chunk_size) {
            if chunk.is_empty() {
                break;
            }
            collected.extend_from_slice(&chunk);
        }
        collected
    }

    /// Collects available bytes and decodes them as UTF-8 (lossy).
    ///
    /// Decoding happens once over the whole snapshot so multi-byte
    /// characters split across chunks survive.
    pub fn drain<C: ChunkSource + ?Sized>(&self, source: &mut C) -> String {
        String::from_utf8_lossy(&self.drain_bytes(source)).into_owned()
    }
}
