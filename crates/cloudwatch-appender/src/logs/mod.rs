//! Asynchronous batching pipeline from logging callers to the sink.
//!
//! # Architecture
//!
//! ```text
//!                     ┌──────────────┐
//!                     │   Callers    │  (any thread, never blocked)
//!                     └──────┬───────┘
//!                            │ append() / try_send
//!                            v
//!                     ┌──────────────┐
//!                     │ Event Queue  │  (bounded, drop-on-full)
//!                     └──────┬───────┘
//!                            │
//!                            v
//!                  ┌─────────────────┐
//!                  │   Accumulator   │  (count / bytes / delay)
//!                  └─────────┬───────┘
//!                            │ one batch per iteration
//!                            v
//!                     ┌──────────────┐
//!                     │    Sender    │  (PutLogEvents, no retry)
//!                     └──────┬───────┘
//!                            │
//!                            v
//!                  ┌─────────────────┐
//!                  │   Sink Client   │
//!                  └─────────────────┘
//! ```
//!
//! # Components
//!
//! - **[`queue`]**: bounded handoff between producers and the worker
//! - **[`accumulator`]**: packs events into batches under the sink's limits
//! - **[`sender`]**: turns a batch into a sink request and reports rejections
//! - **[`pipeline`]**: starts the worker and bounds its shutdown
//! - **[`event`]**: log records and batches
//! - **[`constants`]**: API limits and defaults

pub mod accumulator;
pub mod constants;
pub mod event;
pub mod pipeline;
pub mod queue;
pub mod sender;
