//! Bounded handoff queue between logging callers and the background worker.
//!
//! The producer side ([`EventQueue`]) is cloneable and never blocks: when the
//! queue is full the event is dropped and a diagnostic is emitted. The
//! consumer side ([`EventReceiver`]) is owned by the single worker and waits
//! with an optional timeout that is cut short by a [`CancellationToken`].
//!
//! ```text
//!   callers ──try_send──▶ [ bounded mpsc ] ──recv──▶ worker
//!                                 ▲
//!                   cancel ───────┘ (unblocks the wait)
//! ```

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::logs::event::LogEvent;

/// Creates a queue of fixed `capacity` and returns both halves.
///
/// The capacity never changes afterwards. A capacity of zero is raised to one
/// since a zero-sized tokio channel is not constructible.
#[must_use]
pub fn bounded(capacity: usize, cancel_token: CancellationToken) -> (EventQueue, EventReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let queue = EventQueue {
        tx,
        dropped: Arc::new(AtomicU64::new(0)),
    };
    let receiver = EventReceiver { rx, cancel_token };
    (queue, receiver)
}

/// Producer half of the queue. Cheap to clone and safe to share across
/// threads.
#[derive(Clone, Debug)]
pub struct EventQueue {
    tx: mpsc::Sender<LogEvent>,
    dropped: Arc<AtomicU64>,
}

impl EventQueue {
    /// Offers `event` without blocking.
    ///
    /// Returns `false` when the event was dropped because the queue is full
    /// or the consumer is gone. Drops are counted and logged, never raised.
    pub fn enqueue(&self, event: LogEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(
                    "LOGS | Event queue is full ({} events), dropping log event",
                    self.tx.max_capacity()
                );
                false
            }
            Err(TrySendError::Closed(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!("LOGS | Event queue is closed, dropping log event");
                false
            }
        }
    }

    /// Number of events currently waiting in the queue.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fixed capacity chosen at construction.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    /// Total events dropped by [`enqueue`](Self::enqueue) so far.
    #[must_use]
    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Outcome of a single wait on the queue.
#[derive(Debug, PartialEq, Eq)]
pub enum Dequeued {
    /// An event was taken off the queue.
    Event(LogEvent),
    /// The timeout expired with nothing to take.
    TimedOut,
    /// The wait was cancelled because shutdown was requested.
    Stopped,
    /// Every producer is gone; nothing more can arrive.
    Closed,
}

/// Consumer half of the queue, owned by the worker.
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::Receiver<LogEvent>,
    cancel_token: CancellationToken,
}

impl EventReceiver {
    /// Waits for the next event.
    ///
    /// `None` waits without a time limit. Already-queued events are always
    /// returned ahead of a pending cancellation, so a stop request never
    /// strands events that were accepted before it.
    ///
    /// Observing the stop closes the queue: later `enqueue` calls fail, and
    /// an event that slipped in just before the close is still returned.
    pub async fn dequeue_with_timeout(&mut self, timeout: Option<Duration>) -> Dequeued {
        let Self { rx, cancel_token } = self;

        let recv = async {
            match timeout {
                Some(timeout) => tokio::time::timeout(timeout, rx.recv()).await.ok(),
                None => Some(rx.recv().await),
            }
        };

        let received = tokio::select! {
            biased;
            received = recv => Some(received),
            () = cancel_token.cancelled() => None,
        };

        match received {
            Some(Some(Some(event))) => Dequeued::Event(event),
            Some(Some(None)) => Dequeued::Closed,
            Some(None) => Dequeued::TimedOut,
            None => {
                rx.close();
                match rx.try_recv() {
                    Ok(event) => Dequeued::Event(event),
                    Err(_) => Dequeued::Stopped,
                }
            }
        }
    }
}
