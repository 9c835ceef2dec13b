// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::time::Duration;

use crate::error::PipelineError;
use crate::logs::accumulator::BatchLimits;
use crate::logs::constants;

/// Immutable settings for one pipeline.
///
/// Built once (by hand, from [`Default`], or via [`from_env`](Self::from_env))
/// and handed to [`LogPipeline`](crate::logs::pipeline::LogPipeline), which
/// keeps it behind an `Arc` for its whole life.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Capacity of the handoff queue
    pub queue_capacity: usize,
    /// Longest a batch may wait after its first event
    pub max_batch_delay: Duration,
    /// Events per `PutLogEvents` call
    pub max_events_per_batch: usize,
    /// Bytes per `PutLogEvents` call, message length plus per-event overhead
    pub max_batch_bytes: usize,
    /// How long `stop()` waits for the worker before abandoning it
    pub shutdown_timeout: Duration,
    /// Timeout for a single sink round-trip
    pub request_timeout: Duration,
    /// AWS region used to derive the default endpoint
    pub region: String,
    /// Explicit endpoint, overriding the region-derived one
    pub endpoint_url: Option<String>,
    pub log_group_name: String,
    pub log_stream_name: String,
    /// HTTPS proxy URL
    pub https_proxy: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: constants::DEFAULT_QUEUE_CAPACITY,
            max_batch_delay: Duration::from_millis(constants::DEFAULT_MAX_BATCH_DELAY_MS),
            max_events_per_batch: constants::MAX_BATCH_EVENTS,
            max_batch_bytes: constants::MAX_BATCH_BYTES,
            shutdown_timeout: Duration::from_millis(constants::DEFAULT_SHUTDOWN_TIMEOUT_MS),
            request_timeout: Duration::from_millis(constants::DEFAULT_REQUEST_TIMEOUT_MS),
            region: "ap-northeast-1".to_string(),
            endpoint_url: None,
            log_group_name: "myapp-lg".to_string(),
            log_stream_name: "myapp-ls".to_string(),
            https_proxy: None,
        }
    }
}

fn env_millis(name: &str) -> Option<Duration> {
    env::var(name)
        .ok()
        .and_then(|val| val.parse::<u64>().ok())
        .map(Duration::from_millis)
}

fn env_usize(name: &str) -> Option<usize> {
    env::var(name).ok().and_then(|val| val.parse::<usize>().ok())
}

fn env_non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|val| !val.trim().is_empty())
}

impl PipelineConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, PipelineError> {
        let defaults = Self::default();

        let config = Self {
            queue_capacity: env_usize("CWL_QUEUE_CAPACITY").unwrap_or(defaults.queue_capacity),
            max_batch_delay: env_millis("CWL_MAX_BATCH_DELAY_MS")
                .unwrap_or(defaults.max_batch_delay),
            max_events_per_batch: env_usize("CWL_MAX_BATCH_EVENTS")
                .unwrap_or(defaults.max_events_per_batch),
            max_batch_bytes: env_usize("CWL_MAX_BATCH_BYTES").unwrap_or(defaults.max_batch_bytes),
            shutdown_timeout: env_millis("CWL_SHUTDOWN_TIMEOUT_MS")
                .unwrap_or(defaults.shutdown_timeout),
            request_timeout: env_millis("CWL_REQUEST_TIMEOUT_MS")
                .unwrap_or(defaults.request_timeout),
            region: env_non_empty("CWL_REGION")
                .or_else(|| env_non_empty("AWS_REGION"))
                .unwrap_or(defaults.region),
            endpoint_url: env_non_empty("CWL_ENDPOINT_URL"),
            log_group_name: env_non_empty("CWL_LOG_GROUP_NAME").unwrap_or(defaults.log_group_name),
            log_stream_name: env_non_empty("CWL_LOG_STREAM_NAME")
                .unwrap_or(defaults.log_stream_name),
            https_proxy: env_non_empty("CWL_HTTPS_PROXY").or_else(|| env_non_empty("HTTPS_PROXY")),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.queue_capacity == 0 {
            return Err(PipelineError::InvalidConfig(
                "queue capacity must be greater than 0".to_string(),
            ));
        }

        if !(1..=constants::MAX_BATCH_EVENTS).contains(&self.max_events_per_batch) {
            return Err(PipelineError::InvalidConfig(format!(
                "max events per batch must be between 1 and {}, got {}",
                constants::MAX_BATCH_EVENTS,
                self.max_events_per_batch
            )));
        }

        // At least one empty message has to fit.
        let min_bytes = constants::EVENT_OVERHEAD_BYTES + 1;
        if !(min_bytes..=constants::MAX_BATCH_BYTES).contains(&self.max_batch_bytes) {
            return Err(PipelineError::InvalidConfig(format!(
                "max batch bytes must be between {} and {}, got {}",
                min_bytes,
                constants::MAX_BATCH_BYTES,
                self.max_batch_bytes
            )));
        }

        if self.max_batch_delay.is_zero() {
            return Err(PipelineError::InvalidConfig(
                "max batch delay must be greater than 0".to_string(),
            ));
        }

        if self.shutdown_timeout.is_zero() {
            return Err(PipelineError::InvalidConfig(
                "shutdown timeout must be greater than 0".to_string(),
            ));
        }

        for (field, value) in [
            ("region", &self.region),
            ("log group name", &self.log_group_name),
            ("log stream name", &self.log_stream_name),
        ] {
            if value.trim().is_empty() {
                return Err(PipelineError::InvalidConfig(format!(
                    "{field} cannot be empty"
                )));
            }
        }

        Ok(())
    }

    /// Endpoint the sink client posts to.
    #[must_use]
    pub fn sink_endpoint(&self) -> String {
        match &self.endpoint_url {
            Some(url) => url.clone(),
            None => format!("https://logs.{}.amazonaws.com", self.region),
        }
    }

    #[must_use]
    pub fn batch_limits(&self) -> BatchLimits {
        BatchLimits {
            max_events: self.max_events_per_batch,
            max_bytes: self.max_batch_bytes,
            max_delay: self.max_batch_delay,
        }
    }
}
