//! Log records and the batches they are shipped in.

use crate::logs::constants::EVENT_OVERHEAD_BYTES;

/// A single timestamped log record.
///
/// Immutable once built; consumed exactly once by the accumulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// Milliseconds since the Unix epoch.
    pub timestamp_millis: i64,
    /// Rendered log message.
    pub message: String,
}

impl LogEvent {
    #[must_use]
    pub fn new(timestamp_millis: i64, message: impl Into<String>) -> Self {
        Self {
            timestamp_millis,
            message: message.into(),
        }
    }

    /// Creates an event stamped with the current wall-clock time.
    #[must_use]
    pub fn now(message: impl Into<String>) -> Self {
        let timestamp_millis = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or_default();
        Self::new(timestamp_millis, message)
    }

    /// Size this event contributes to a batch: UTF-8 message length plus the
    /// fixed per-event overhead.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.message.len() + EVENT_OVERHEAD_BYTES
    }
}

/// Ordered group of events destined for one sink call.
///
/// Keeps a running byte total so the accumulator can check the size budget
/// without rescanning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    events: Vec<LogEvent>,
    size_bytes: usize,
}

impl Batch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, event: LogEvent) {
        self.size_bytes += event.batch_size();
        self.events.push(event);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Sum of `batch_size()` over all events.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    #[must_use]
    pub fn events(&self) -> &[LogEvent] {
        &self.events
    }

    #[must_use]
    pub fn into_events(self) -> Vec<LogEvent> {
        self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_size_counts_utf8_bytes() {
        // 3 characters, 9 bytes
        let event = LogEvent::new(1, "日本語");
        assert_eq!(event.batch_size(), 9 + EVENT_OVERHEAD_BYTES);
    }

    #[test]
    fn test_batch_tracks_running_size() {
        let mut batch = Batch::new();
        assert!(batch.is_empty());
        assert_eq!(batch.size_bytes(), 0);

        batch.push(LogEvent::new(11, "111"));
        batch.push(LogEvent::new(22, "2222"));

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.size_bytes(), 3 + 4 + 2 * EVENT_OVERHEAD_BYTES);
    }

    #[test]
    fn test_batch_preserves_push_order() {
        let mut batch = Batch::new();
        for i in 0..5 {
            batch.push(LogEvent::new(i, i.to_string()));
        }

        let messages: Vec<_> = batch.into_events().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["0", "1", "2", "3", "4"]);
    }

    #[test]
    fn test_log_event_now_is_after_epoch() {
        let event = LogEvent::now("hello");
        assert!(event.timestamp_millis > 0);
        assert_eq!(event.message, "hello");
    }
}
