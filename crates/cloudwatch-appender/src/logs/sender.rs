//! Ships finished batches to the sink.
//!
//! Delivery is best-effort: a rejected, failed, or partially accepted batch is
//! logged and dropped. Nothing is retried or re-queued.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error};

use crate::logs::event::Batch;
use crate::sink::{InputLogEvent, PutLogEventsRequest, SinkClient};

#[derive(Clone)]
pub struct Sender {
    client: Arc<dyn SinkClient>,
    log_group_name: String,
    log_stream_name: String,
}

impl Sender {
    #[must_use]
    pub fn new(client: Arc<dyn SinkClient>, log_group_name: String, log_stream_name: String) -> Self {
        Self {
            client,
            log_group_name,
            log_stream_name,
        }
    }

    fn create_request(&self, batch: Batch) -> PutLogEventsRequest {
        PutLogEventsRequest {
            log_group_name: self.log_group_name.clone(),
            log_stream_name: self.log_stream_name.clone(),
            log_events: batch.into_events().into_iter().map(InputLogEvent::from).collect(),
        }
    }

    /// Sends `batch` and waits for the sink's answer.
    ///
    /// Empty batches are skipped. Errors never propagate out of here.
    pub async fn send(&self, batch: Batch) {
        if batch.is_empty() {
            return;
        }

        let n_events = batch.len();
        let size_bytes = batch.size_bytes();
        let request = self.create_request(batch);

        let time = Instant::now();
        match self.client.put_log_events(request).await {
            Ok(response) => {
                if let Some(rejection) = response.rejection() {
                    error!(
                        "LOGS | PutLogEvents rejected events from a batch of {}: {}",
                        n_events, rejection
                    );
                } else {
                    debug!(
                        "LOGS | Sent {} events ({} bytes) in {} ms",
                        n_events,
                        size_bytes,
                        time.elapsed().as_millis()
                    );
                }
            }
            Err(e) => {
                error!(
                    "LOGS | Failed to send {} events after {} ms, dropping batch: {}",
                    n_events,
                    time.elapsed().as_millis(),
                    e
                );
            }
        }
    }
}

impl std::fmt::Debug for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sender")
            .field("log_group_name", &self.log_group_name)
            .field("log_stream_name", &self.log_stream_name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::SinkError;
    use crate::logs::event::LogEvent;
    use crate::sink::{PutLogEventsResponse, RejectedLogEventsInfo};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tracing_test::traced_test;

    enum Reply {
        Accept,
        Reject(RejectedLogEventsInfo),
        Fail,
    }

    struct ScriptedSink {
        reply: Reply,
        requests: Mutex<Vec<PutLogEventsRequest>>,
    }

    impl ScriptedSink {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                reply,
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl SinkClient for ScriptedSink {
        async fn put_log_events(
            &self,
            request: PutLogEventsRequest,
        ) -> Result<PutLogEventsResponse, SinkError> {
            self.requests.lock().unwrap().push(request);
            match &self.reply {
                Reply::Accept => Ok(PutLogEventsResponse::default()),
                Reply::Reject(info) => Ok(PutLogEventsResponse {
                    next_sequence_token: None,
                    rejected_log_events_info: Some(info.clone()),
                }),
                Reply::Fail => Err(SinkError::Status {
                    status: 503,
                    body: "ServiceUnavailableException".to_string(),
                }),
            }
        }
    }

    fn batch(messages: &[&str]) -> Batch {
        let mut batch = Batch::new();
        for (i, message) in messages.iter().enumerate() {
            batch.push(LogEvent::new(i as i64 * 11, *message));
        }
        batch
    }

    fn sender(sink: &Arc<ScriptedSink>) -> Sender {
        Sender::new(
            Arc::clone(sink) as Arc<dyn SinkClient>,
            "myapp-lg".to_string(),
            "myapp-ls".to_string(),
        )
    }

    #[tokio::test]
    async fn test_send_builds_request_in_event_order() {
        let sink = ScriptedSink::new(Reply::Accept);

        sender(&sink).send(batch(&["111", "222", "333"])).await;

        let requests = sink.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].log_group_name, "myapp-lg");
        assert_eq!(requests[0].log_stream_name, "myapp-ls");
        let messages: Vec<_> = requests[0]
            .log_events
            .iter()
            .map(|e| (e.timestamp, e.message.as_str()))
            .collect();
        assert_eq!(messages, vec![(0, "111"), (11, "222"), (22, "333")]);
    }

    #[tokio::test]
    async fn test_send_skips_empty_batch() {
        let sink = ScriptedSink::new(Reply::Accept);

        sender(&sink).send(Batch::new()).await;

        assert!(sink.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    #[traced_test]
    async fn test_send_logs_rejection_detail() {
        let sink = ScriptedSink::new(Reply::Reject(RejectedLogEventsInfo {
            too_new_log_event_start_index: Some(1),
            ..Default::default()
        }));

        sender(&sink).send(batch(&["111", "222"])).await;

        assert!(logs_contain("rejected events"));
        assert!(logs_contain("tooNewLogEventStartIndex=1"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_send_logs_and_drops_on_failure() {
        let sink = ScriptedSink::new(Reply::Fail);
        let sender = sender(&sink);

        sender.send(batch(&["111"])).await;
        sender.send(batch(&["222"])).await;

        // One attempt per batch, no retry.
        assert_eq!(sink.requests.lock().unwrap().len(), 2);
        assert!(logs_contain("dropping batch"));
        assert!(logs_contain("ServiceUnavailableException"));
    }

    #[test]
    fn test_sender_debug_impl() {
        let sink = ScriptedSink::new(Reply::Accept);
        let debug_str = format!("{:?}", sender(&sink));
        assert!(debug_str.contains("myapp-lg"));
    }
}
