// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Errors returned by a [`SinkClient`](crate::sink::SinkClient).
///
/// None of these stop the pipeline; the sender logs them and moves on.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Failed to build sink client: {0}")]
    Client(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Sink responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode sink response: {0}")]
    Decode(String),
}

/// Errors returned by the pipeline's construction and lifecycle calls.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No tokio runtime available to run the worker: {0}")]
    NoRuntime(String),

    #[error("Pipeline already stopped")]
    AlreadyStopped,

    #[error("Sink client error: {0}")]
    Sink(#[from] SinkError),
}
