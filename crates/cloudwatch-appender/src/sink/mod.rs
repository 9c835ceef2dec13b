//! The remote ingestion boundary.
//!
//! [`SinkClient`] is the only seam between the pipeline and the network. The
//! wire types mirror the CloudWatch Logs `PutLogEvents` JSON shapes; the
//! production implementation lives in [`cloudwatch`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::error::SinkError;
use crate::logs::event::LogEvent;

pub mod cloudwatch;

/// One event as the sink expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputLogEvent {
    pub timestamp: i64,
    pub message: String,
}

impl From<LogEvent> for InputLogEvent {
    fn from(event: LogEvent) -> Self {
        Self {
            timestamp: event.timestamp_millis,
            message: event.message,
        }
    }
}

/// Batch-send request: destination plus events in chronological order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PutLogEventsRequest {
    pub log_group_name: String,
    pub log_stream_name: String,
    pub log_events: Vec<InputLogEvent>,
}

/// Indexes of events the sink refused to ingest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RejectedLogEventsInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub too_new_log_event_start_index: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub too_old_log_event_end_index: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expired_log_event_end_index: Option<i64>,
}

impl RejectedLogEventsInfo {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.too_new_log_event_start_index.is_none()
            && self.too_old_log_event_end_index.is_none()
            && self.expired_log_event_end_index.is_none()
    }
}

impl fmt::Display for RejectedLogEventsInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = [
            ("tooNewLogEventStartIndex", self.too_new_log_event_start_index),
            ("tooOldLogEventEndIndex", self.too_old_log_event_end_index),
            ("expiredLogEventEndIndex", self.expired_log_event_end_index),
        ];
        let mut first = true;
        for (name, value) in fields {
            if let Some(value) = value {
                if !first {
                    f.write_str(", ")?;
                }
                write!(f, "{name}={value}")?;
                first = false;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PutLogEventsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_sequence_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_log_events_info: Option<RejectedLogEventsInfo>,
}

impl PutLogEventsResponse {
    /// Rejection details, if the sink reported any.
    #[must_use]
    pub fn rejection(&self) -> Option<&RejectedLogEventsInfo> {
        self.rejected_log_events_info
            .as_ref()
            .filter(|info| !info.is_empty())
    }
}

/// Handle to the remote ingestion endpoint.
#[async_trait]
pub trait SinkClient: Send + Sync {
    /// Sends one batch. Blocks the caller until the round-trip completes.
    async fn put_log_events(
        &self,
        request: PutLogEventsRequest,
    ) -> Result<PutLogEventsResponse, SinkError>;
}

/// Builds the sink client when the pipeline starts.
pub type SinkClientFactory =
    Arc<dyn Fn(&PipelineConfig) -> Result<Arc<dyn SinkClient>, SinkError> + Send + Sync>;

/// Factory for the HTTP [`cloudwatch::CloudWatchSinkClient`].
#[must_use]
pub fn cloudwatch_factory() -> SinkClientFactory {
    Arc::new(|config| {
        let client = cloudwatch::CloudWatchSinkClient::new(config)?;
        Ok(Arc::new(client) as Arc<dyn SinkClient>)
    })
}
