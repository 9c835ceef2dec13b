//! HTTP sink client speaking the CloudWatch Logs JSON protocol.
//!
//! Requests go to the configured endpoint (or `https://logs.{region}.amazonaws.com`)
//! as `POST /` with the `PutLogEvents` target header. Credentials and request
//! signing are not handled here; point `endpoint_url` at a signing proxy or a
//! local emulator.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use tracing::debug;

use crate::config::PipelineConfig;
use crate::error::SinkError;
use crate::http::get_client;
use crate::logs::constants::{AMZ_JSON_CONTENT_TYPE, PUT_LOG_EVENTS_TARGET};
use crate::sink::{PutLogEventsRequest, PutLogEventsResponse, SinkClient};

#[derive(Debug, Clone)]
pub struct CloudWatchSinkClient {
    client: reqwest::Client,
    endpoint: reqwest::Url,
    headers: HeaderMap,
}

impl CloudWatchSinkClient {
    pub fn new(config: &PipelineConfig) -> Result<Self, SinkError> {
        let endpoint_str = config.sink_endpoint();
        let endpoint = reqwest::Url::parse(&endpoint_str)
            .map_err(|e| SinkError::Client(format!("invalid endpoint {endpoint_str}: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Amz-Target",
            HeaderValue::from_static(PUT_LOG_EVENTS_TARGET),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(AMZ_JSON_CONTENT_TYPE));

        Ok(Self {
            client: get_client(config),
            endpoint,
            headers,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &reqwest::Url {
        &self.endpoint
    }
}

#[async_trait]
impl SinkClient for CloudWatchSinkClient {
    async fn put_log_events(
        &self,
        request: PutLogEventsRequest,
    ) -> Result<PutLogEventsResponse, SinkError> {
        let body = serde_json::to_vec(&request).map_err(|e| SinkError::Client(e.to_string()))?;

        let resp = self
            .client
            .post(self.endpoint.clone())
            .headers(self.headers.clone())
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SinkError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await?;
        debug!("LOGS | PutLogEvents returned {} bytes", bytes.len());
        if bytes.is_empty() {
            return Ok(PutLogEventsResponse::default());
        }
        serde_json::from_slice(&bytes).map_err(|e| SinkError::Decode(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::logs::event::LogEvent;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn config_for(url: String) -> PipelineConfig {
        PipelineConfig {
            endpoint_url: Some(url),
            ..Default::default()
        }
    }

    fn request() -> PutLogEventsRequest {
        PutLogEventsRequest {
            log_group_name: "myapp-lg".to_string(),
            log_stream_name: "myapp-ls".to_string(),
            log_events: vec![
                LogEvent::new(11, "111").into(),
                LogEvent::new(22, "222").into(),
            ],
        }
    }

    #[test]
    fn test_new_rejects_invalid_endpoint() {
        let result = CloudWatchSinkClient::new(&config_for("::not-a-url".to_string()));
        assert!(matches!(result, Err(SinkError::Client(_))));
    }

    #[test]
    fn test_new_uses_region_endpoint() {
        let client = CloudWatchSinkClient::new(&PipelineConfig::default()).unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "https://logs.ap-northeast-1.amazonaws.com/"
        );
    }

    #[tokio::test]
    async fn test_put_log_events_posts_json() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("X-Amz-Target", "Logs_20140328.PutLogEvents")
            .match_header("Content-Type", "application/x-amz-json-1.1")
            .match_body(Matcher::Json(json!({
                "logGroupName": "myapp-lg",
                "logStreamName": "myapp-ls",
                "logEvents": [
                    {"timestamp": 11, "message": "111"},
                    {"timestamp": 22, "message": "222"},
                ],
            })))
            .with_status(200)
            .with_body(r#"{"nextSequenceToken":"49"}"#)
            .create_async()
            .await;

        let client = CloudWatchSinkClient::new(&config_for(server.url())).unwrap();
        let response = client.put_log_events(request()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.next_sequence_token.as_deref(), Some("49"));
        assert!(response.rejection().is_none());
    }

    #[tokio::test]
    async fn test_put_log_events_reports_rejection() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"rejectedLogEventsInfo":{"tooOldLogEventEndIndex":0}}"#)
            .create_async()
            .await;

        let client = CloudWatchSinkClient::new(&config_for(server.url())).unwrap();
        let response = client.put_log_events(request()).await.unwrap();

        let rejection = response.rejection().unwrap();
        assert_eq!(rejection.too_old_log_event_end_index, Some(0));
    }

    #[tokio::test]
    async fn test_put_log_events_empty_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .create_async()
            .await;

        let client = CloudWatchSinkClient::new(&config_for(server.url())).unwrap();
        let response = client.put_log_events(request()).await.unwrap();

        assert_eq!(response, PutLogEventsResponse::default());
    }

    #[tokio::test]
    async fn test_put_log_events_error_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(400)
            .with_body(r#"{"__type":"ResourceNotFoundException"}"#)
            .create_async()
            .await;

        let client = CloudWatchSinkClient::new(&config_for(server.url())).unwrap();
        let err = client.put_log_events(request()).await.unwrap_err();

        match err {
            SinkError::Status { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("ResourceNotFoundException"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_put_log_events_undecodable_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = CloudWatchSinkClient::new(&config_for(server.url())).unwrap();
        let err = client.put_log_events(request()).await.unwrap_err();

        assert!(matches!(err, SinkError::Decode(_)));
    }

    #[tokio::test]
    async fn test_put_log_events_transport_error() {
        let client =
            CloudWatchSinkClient::new(&config_for("http://127.0.0.1:1".to_string())).unwrap();
        let err = client.put_log_events(request()).await.unwrap_err();

        assert!(matches!(err, SinkError::Transport(_)));
    }
}
