//! Shared flush buffer.
//!
//! Records accumulate until either threshold is crossed:
//! - the buffer holds `max_values` records (size-based flush)
//! - `interval_secs` have passed since the last flush (time-based flush)
//!
//! The interval is only checked when a record arrives. An idle forwarder
//! never flushes on its own; stale data goes out with the next sample.

use crate::core::clock::{Clock, SystemClock};
use crate::core::config::FlushConfig;
use crate::core::NormalizedRecord;
use parking_lot::Mutex;
use std::sync::Arc;

/// Outcome of an append.
#[derive(Debug, PartialEq)]
pub enum FlushDecision {
    /// Thresholds not reached, the record stays buffered
    Hold,
    /// Thresholds reached: the caller now owns this batch and must send it
    Flush(Vec<NormalizedRecord>),
}

impl FlushDecision {
    /// True if the append triggered a flush
    pub fn should_flush(&self) -> bool {
        matches!(self, FlushDecision::Flush(_))
    }

    /// Take the batch, empty when nothing was flushed
    pub fn into_batch(self) -> Vec<NormalizedRecord> {
        match self {
            FlushDecision::Hold => Vec::new(),
            FlushDecision::Flush(batch) => batch,
        }
    }
}

#[derive(Debug)]
struct BufferState {
    records: Vec<NormalizedRecord>,
    last_flush: u64,
}

/// Mutex-guarded record buffer.
///
/// Every operation takes the lock once and releases it before returning,
/// so callers never hold it across I/O.
pub struct FlushBuffer {
    state: Mutex<BufferState>,
    config: FlushConfig,
    clock: Arc<dyn Clock>,
}

impl FlushBuffer {
    /// Create a buffer on the system clock. The flush window starts now.
    pub fn new(config: FlushConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a buffer on a custom clock
    pub fn with_clock(config: FlushConfig, clock: Arc<dyn Clock>) -> Self {
        let last_flush = clock.now_secs();
        Self {
            state: Mutex::new(BufferState {
                records: Vec::new(),
                last_flush,
            }),
            config,
            clock,
        }
    }

    /// Append a record and decide whether the buffer must be flushed.
    ///
    /// On a flush the whole buffer is handed back and `last_flush` moves to
    /// the current time, all under the same lock acquisition.
    pub fn append(&self, record: NormalizedRecord) -> FlushDecision {
        let mut state = self.state.lock();
        state.records.push(record);

        let now = self.clock.now_secs();
        let elapsed = now.saturating_sub(state.last_flush);
        let count = state.records.len();

        if count == 0 || (count < self.config.max_values && elapsed < self.config.interval_secs) {
            return FlushDecision::Hold;
        }

        // max_values is only a threshold, never a capacity hint
        let batch = std::mem::take(&mut state.records);
        state.last_flush = now;
        drop(state);

        tracing::debug!(count, elapsed, "Flush threshold reached");
        FlushDecision::Flush(batch)
    }

    /// Take every buffered record regardless of thresholds.
    pub fn drain(&self) -> Vec<NormalizedRecord> {
        let mut state = self.state.lock();
        state.last_flush = self.clock.now_secs();
        std::mem::take(&mut state.records)
    }

    /// Number of buffered records
    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    /// True if nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.state.lock().records.is_empty()
    }

    /// Epoch seconds of the last flush (or of buffer creation)
    pub fn last_flush(&self) -> u64 {
        self.state.lock().last_flush
    }

    /// Active thresholds
    pub fn config(&self) -> FlushConfig {
        self.config
    }
}
