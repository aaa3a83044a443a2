//! Property tests for the output drainer

use std::collections::VecDeque;

use proptest::prelude::*;
use sshdeck_core::{ChunkSource, OutputDrainer};

fn chunks_strategy() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(any::<u8>(), 1..300), 0..12)
}

/// Records the size of every poll it serves
struct CountingSource {
    inner: VecDeque<Vec<u8>>,
    served: Vec<usize>,
}

impl ChunkSource for CountingSource {
    fn poll_chunk(&mut self, max_len: usize) -> Option<Vec<u8>> {
        let chunk = self.inner.poll_chunk(max_len)?;
        self.served.push(chunk.len());
        Some(chunk)
    }
}

proptest! {
    /// Property: a drain returns every pending byte, in order
    #[test]
    fn drain_returns_everything_pending(chunks in chunks_strategy(), size in 1usize..512) {
        let expected: Vec<u8> = chunks.concat();
        let mut source: VecDeque<Vec<u8>> = chunks.into_iter().collect();
        let drained = OutputDrainer::with_chunk_size(size).drain_bytes(&mut source);
        prop_assert_eq!(drained, expected);
        prop_assert!(source.is_empty());
    }

    /// Property: no single read exceeds the chunk size
    #[test]
    fn reads_respect_chunk_size(chunks in chunks_strategy(), size in 1usize..64) {
        let mut source = CountingSource { inner: chunks.into_iter().collect(), served: Vec::new() };
        OutputDrainer::with_chunk_size(size).drain_bytes(&mut source);
        prop_assert!(source.served.iter().all(|&n| n <= size && n > 0));
    }

    /// Property: text drains decode the same as a one-shot decode
    #[test]
    fn drain_decodes_whole_snapshot(text in "\\PC{0,200}", size in 1usize..8) {
        let mut source: VecDeque<Vec<u8>> = VecDeque::from(vec![text.as_bytes().to_vec()]);
        prop_assert_eq!(OutputDrainer::with_chunk_size(size).drain(&mut source), text);
    }
}
