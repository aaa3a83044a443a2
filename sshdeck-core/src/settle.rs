//! Settle strategies: how long to wait for the remote before draining.
//!
//! Nothing in a raw shell stream says "the command is finished", so every
//! exchange waits, then drains. [`SettleStrategy::Fixed`] is the plain sleep
//! (1s/2s/3s in the default settings). [`SettleStrategy::Quiescent`] keeps
//! draining until the stream has been idle for a while, bounded by a maximum.

use std::time::Duration;

use tokio::time::Instant;

use crate::drain::{ChunkSource, OutputDrainer};

/// Lower bound for the quiescence polling interval
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How to wait for remote output before presenting it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleStrategy {
    /// Sleep for the given duration, then drain once
    Fixed(Duration),
    /// Drain repeatedly until no bytes arrive for `idle`, or `max` elapses
    Quiescent {
        /// Silence that counts as "done"
        idle: Duration,
        /// Upper bound on the total wait
        max: Duration,
    },
}

impl SettleStrategy {
    /// Fixed delay in whole seconds
    #[must_use]
    pub const fn fixed_secs(secs: u64) -> Self {
        Self::Fixed(Duration::from_secs(secs))
    }

    /// Waits according to the strategy and returns the drained bytes
    pub async fn settle_and_drain<C: ChunkSource + ?Sized>(
        &self,
        source: &mut C,
        drainer: &OutputDrainer,
    ) -> Vec<u8> {
        match *self {
            Self::Fixed(delay) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                drainer.drain_bytes(source)
            }
            Self::Quiescent { idle, max } => Self::drain_until_idle(source, drainer, idle, max).await,
        }
    }

    async fn drain_until_idle<C: ChunkSource + ?Sized>(
        source: &mut C,
        drainer: &OutputDrainer,
        idle: Duration,
        max: Duration,
    ) -> Vec<u8> {
        let started = Instant::now();
        let mut last_activity = started;
        let mut collected = Vec::new();
        let poll_interval = (idle / 4).max(MIN_POLL_INTERVAL);

        loop {
            let chunk = drainer.drain_bytes(source);
            let now = Instant::now();
            if chunk.is_empty() {
                if now.duration_since(last_activity) >= idle {
                    break;
                }
            } else {
                collected.extend_from_slice(&chunk);
                last_activity = now;
            }
            if now.duration_since(started) >= max {
                tracing::debug!(
                    max_ms = max.as_millis() as u64,
                    "Settle bound reached before the stream went idle"
                );
                break;
            }
            tokio::time::sleep(poll_interval).await;
        }

        collected
    }
}
