//! Lifecycle of the batching pipeline.
//!
//! [`LogPipeline`] owns the producer half of the queue and the single
//! background worker that runs the accumulate-then-send loop:
//!
//! ```text
//!   Idle ──start()──▶ Running ──stop()──▶ StopRequested ──(worker joined
//!    │                                                     or abandoned)──▶ Stopped
//!    └──────────────────────stop()──────────────────────────────────────────▶ Stopped
//! ```
//!
//! `append` is accepted only while `Running`. `stop()` cancels the worker's
//! queue wait, lets it flush what was already accepted, and waits at most
//! `shutdown_timeout` for it to exit. An in-flight sink call is never
//! cancelled; if it outlives the bound the worker is abandoned.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard,
};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::logs::accumulator::BatchAccumulator;
use crate::logs::event::LogEvent;
use crate::logs::queue::{self, EventQueue, EventReceiver};
use crate::logs::sender::Sender;
use crate::sink::{self, SinkClientFactory};

/// Observable lifecycle state of a [`LogPipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Running,
    StopRequested,
    Stopped,
}

enum Lifecycle {
    Idle { receiver: EventReceiver },
    Running { worker: JoinHandle<()> },
    /// `worker` is `None` while a `stop()` call holds it.
    StopRequested { worker: Option<JoinHandle<()>> },
    Stopped,
}

impl Lifecycle {
    fn state(&self) -> LifecycleState {
        match self {
            Self::Idle { .. } => LifecycleState::Idle,
            Self::Running { .. } => LifecycleState::Running,
            Self::StopRequested { .. } => LifecycleState::StopRequested,
            Self::Stopped => LifecycleState::Stopped,
        }
    }
}

/// Non-blocking log appender backed by a single background sender.
pub struct LogPipeline {
    config: Arc<PipelineConfig>,
    queue: EventQueue,
    cancel_token: CancellationToken,
    sink_factory: SinkClientFactory,
    accepting: AtomicBool,
    lifecycle: Mutex<Lifecycle>,
}

impl LogPipeline {
    /// Creates an idle pipeline that ships to CloudWatch Logs over HTTP.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        Self::with_sink_factory(config, sink::cloudwatch_factory())
    }

    /// Creates an idle pipeline whose sink client is built by `sink_factory`
    /// on [`start`](Self::start).
    pub fn with_sink_factory(
        config: PipelineConfig,
        sink_factory: SinkClientFactory,
    ) -> Result<Self, PipelineError> {
        config.validate()?;

        let cancel_token = CancellationToken::new();
        let (queue, receiver) = queue::bounded(config.queue_capacity, cancel_token.clone());

        Ok(Self {
            config: Arc::new(config),
            queue,
            cancel_token,
            sink_factory,
            accepting: AtomicBool::new(false),
            lifecycle: Mutex::new(Lifecycle::Idle { receiver }),
        })
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.lifecycle().state()
    }

    /// Producer handle to the underlying queue.
    #[must_use]
    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    /// Hands `event` to the worker without blocking.
    ///
    /// Returns `false` when the event was dropped: the pipeline is not
    /// running, the queue is full, or the worker has already closed the queue
    /// for shutdown. An event accepted while `stop()` races this call is
    /// still part of the final batch.
    pub fn append(&self, event: LogEvent) -> bool {
        if !self.accepting.load(Ordering::Acquire) {
            debug!("LOGS | Pipeline is not running, dropping log event");
            return false;
        }
        self.queue.enqueue(event)
    }

    /// Builds the sink client and launches the worker.
    ///
    /// Calling it again while running is a no-op. Must be called from within
    /// a tokio runtime.
    pub fn start(&self) -> Result<(), PipelineError> {
        let mut lifecycle = self.lifecycle();
        match &*lifecycle {
            Lifecycle::Idle { .. } => {}
            Lifecycle::Running { .. } => return Ok(()),
            Lifecycle::StopRequested { .. } | Lifecycle::Stopped => {
                return Err(PipelineError::AlreadyStopped)
            }
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| PipelineError::NoRuntime(e.to_string()))?;
        let client = (self.sink_factory)(&self.config)?;

        let receiver = match std::mem::replace(&mut *lifecycle, Lifecycle::Stopped) {
            Lifecycle::Idle { receiver } => receiver,
            other => {
                *lifecycle = other;
                return Ok(());
            }
        };

        let accumulator = BatchAccumulator::new(receiver, self.config.batch_limits());
        let sender = Sender::new(
            client,
            self.config.log_group_name.clone(),
            self.config.log_stream_name.clone(),
        );
        let worker = runtime.spawn(run_worker(accumulator, sender));

        *lifecycle = Lifecycle::Running { worker };
        self.accepting.store(true, Ordering::Release);
        debug!(
            "LOGS | Pipeline started for {}/{}",
            self.config.log_group_name, self.config.log_stream_name
        );
        Ok(())
    }

    /// Signals the worker to flush and exit, then waits up to
    /// `shutdown_timeout` for it. Idempotent.
    ///
    /// If this future is dropped before the wait finishes, the pipeline
    /// stays in `StopRequested` and the next call resumes the wait.
    pub async fn stop(&self) {
        self.accepting.store(false, Ordering::Release);

        let worker = {
            let mut lifecycle = self.lifecycle();
            match std::mem::replace(&mut *lifecycle, Lifecycle::StopRequested { worker: None }) {
                Lifecycle::Running { worker }
                | Lifecycle::StopRequested {
                    worker: Some(worker),
                } => worker,
                Lifecycle::Idle { .. } | Lifecycle::Stopped => {
                    *lifecycle = Lifecycle::Stopped;
                    return;
                }
                // Another caller is already waiting on the worker.
                Lifecycle::StopRequested { worker: None } => return,
            }
        };

        self.cancel_token.cancel();

        let mut pending = PendingWorker {
            lifecycle: &self.lifecycle,
            worker: Some(worker),
        };
        if let Some(worker) = pending.worker.as_mut() {
            match tokio::time::timeout(self.config.shutdown_timeout, worker).await {
                Ok(Ok(())) => debug!("LOGS | Worker exited"),
                Ok(Err(e)) => error!("LOGS | Worker failed: {}", e),
                Err(_) => warn!(
                    "LOGS | Worker did not exit within {} ms, abandoning it",
                    self.config.shutdown_timeout.as_millis()
                ),
            }
        }

        // Dropping the handle detaches a worker that is still running.
        pending.worker = None;
        *self.lifecycle() = Lifecycle::Stopped;
    }
}

/// Worker handle held by an in-progress `stop()`. Hands it back to the
/// lifecycle if that call is cancelled mid-wait.
struct PendingWorker<'a> {
    lifecycle: &'a Mutex<Lifecycle>,
    worker: Option<JoinHandle<()>>,
}

impl Drop for PendingWorker<'_> {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let mut lifecycle = self
                .lifecycle
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            *lifecycle = Lifecycle::StopRequested {
                worker: Some(worker),
            };
        }
    }
}

impl std::fmt::Debug for LogPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogPipeline")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("queued", &self.queue.len())
            .finish_non_exhaustive()
    }
}

/// Accumulate-then-send loop. Runs until a stop is observed, sending the
/// final batch before returning.
async fn run_worker(mut accumulator: BatchAccumulator, sender: Sender) {
    debug!("LOGS | Sender worker started");
    while !accumulator.is_finished() {
        let batch = accumulator.next_batch().await;
        sender.send(batch).await;
    }
    debug!("LOGS | Sender worker finished");
}
