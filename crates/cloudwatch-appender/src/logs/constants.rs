//! Limits imposed by the CloudWatch Logs `PutLogEvents` API and the
//! appender's own defaults.
//!
//! # API Constraints
//!
//! A single `PutLogEvents` call is rejected when it breaks any of:
//! - **Batch count**: at most 10,000 events
//! - **Batch size**: at most 1,048,576 bytes, counted as the UTF-8 length of
//!   every message plus a fixed 26 bytes per event
//!
//! The accumulator packs batches so that neither limit is crossed.

/// Maximum number of events in one `PutLogEvents` request.
pub const MAX_BATCH_EVENTS: usize = 10_000;

/// Maximum size of one `PutLogEvents` request in bytes.
///
/// Counted as the sum of `message.len() + EVENT_OVERHEAD_BYTES` over every
/// event in the batch, where `message.len()` is the UTF-8 byte length.
pub const MAX_BATCH_BYTES: usize = 1_048_576;

/// Fixed per-event overhead that the sink adds to the message length when
/// computing a batch's size.
pub const EVENT_OVERHEAD_BYTES: usize = 26;

/// Default capacity of the handoff queue between callers and the worker.
pub const DEFAULT_QUEUE_CAPACITY: usize = 999;

/// Default time a batch may accumulate after its first event arrives.
pub const DEFAULT_MAX_BATCH_DELAY_MS: u64 = 2_000;

/// Default bound on how long `stop()` waits for the worker to exit.
pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 1_000;

/// Default timeout for a single `PutLogEvents` round-trip.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;

/// `X-Amz-Target` header value selecting the `PutLogEvents` operation.
pub(crate) const PUT_LOG_EVENTS_TARGET: &str = "Logs_20140328.PutLogEvents";

/// Content type of the CloudWatch Logs JSON protocol.
pub(crate) const AMZ_JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.1";
