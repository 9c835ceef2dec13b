//! Packs queued events into batches the sink will accept.
//!
//! # Batching Strategy
//!
//! Each call to [`BatchAccumulator::next_batch`] assembles one batch and
//! flushes it as soon as any of these fires:
//! 1. **Count limit**: the batch holds `max_events` events
//! 2. **Size limit**: the next event would push the batch past `max_bytes`
//! 3. **Time limit**: `max_delay` has elapsed since the batch's first event
//! 4. **Stop**: shutdown was requested and the queue has been drained
//!
//! An event that does not fit under the size limit is held back as the
//! carry-over and opens the following batch, so nothing is reordered or lost
//! at a batch boundary.

use std::time::Duration;

use tokio::time::Instant;
use tracing::warn;

use crate::logs::event::{Batch, LogEvent};
use crate::logs::queue::{Dequeued, EventReceiver};

/// The three flush thresholds applied to every batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    pub max_events: usize,
    pub max_bytes: usize,
    pub max_delay: Duration,
}

enum Placement {
    Added,
    Flush,
}

/// Stateful batch builder owned by the worker.
#[derive(Debug)]
pub struct BatchAccumulator {
    receiver: EventReceiver,
    limits: BatchLimits,
    /// Event pulled from the queue that belongs at the head of the next batch.
    carry_over: Option<LogEvent>,
    finished: bool,
}

impl BatchAccumulator {
    #[must_use]
    pub fn new(receiver: EventReceiver, limits: BatchLimits) -> Self {
        Self {
            receiver,
            limits,
            carry_over: None,
            finished: false,
        }
    }

    /// True once a stop (or a closed queue) has been observed. The batch
    /// returned by the call that observed it is the last one.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Assembles the next batch.
    ///
    /// Waits without limit while the batch is empty. The returned batch is
    /// empty only when the stop was observed before any event arrived.
    pub async fn next_batch(&mut self) -> Batch {
        let mut batch = Batch::new();
        let mut deadline = None;

        if let Some(event) = self.carry_over.take() {
            deadline = Some(Instant::now() + self.limits.max_delay);
            if let Placement::Flush = self.place(&mut batch, event) {
                return batch;
            }
        }

        while batch.len() < self.limits.max_events {
            let timeout = match deadline {
                None => None,
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        break;
                    }
                    Some(remaining)
                }
            };

            let event = match self.receiver.dequeue_with_timeout(timeout).await {
                Dequeued::Event(event) => event,
                Dequeued::TimedOut => break,
                Dequeued::Stopped | Dequeued::Closed => {
                    self.finished = true;
                    break;
                }
            };

            if batch.is_empty() {
                deadline = Some(Instant::now() + self.limits.max_delay);
            }

            if let Placement::Flush = self.place(&mut batch, event) {
                break;
            }
        }

        batch
    }

    fn place(&mut self, batch: &mut Batch, event: LogEvent) -> Placement {
        let size = event.batch_size();
        if batch.size_bytes() + size <= self.limits.max_bytes {
            batch.push(event);
            return Placement::Added;
        }

        if batch.is_empty() {
            // Cannot be split; ship it on its own and let the sink decide.
            warn!(
                "LOGS | Log event of {} bytes exceeds the {} byte batch limit, sending it alone",
                size, self.limits.max_bytes
            );
            batch.push(event);
        } else {
            self.carry_over = Some(event);
        }
        Placement::Flush
    }
}
