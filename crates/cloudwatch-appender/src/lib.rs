// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! # CloudWatch Appender
//!
//! A non-blocking log appender that batches records in the background and
//! ships them to CloudWatch Logs with `PutLogEvents`.
//!
//! Callers hand events to [`LogPipeline::append`], which never blocks: when
//! the bounded queue is full the event is dropped and a diagnostic is logged.
//! A single worker packs queued events into batches that respect the sink's
//! count, byte and recency limits and sends them one at a time.
//!
//! ```rust,no_run
//! use cloudwatch_appender::{LogEvent, LogPipeline, PipelineConfig};
//!
//! # async fn run() -> Result<(), cloudwatch_appender::PipelineError> {
//! let pipeline = LogPipeline::new(PipelineConfig::from_env()?)?;
//! pipeline.start()?;
//! pipeline.append(LogEvent::now("service started"));
//! pipeline.stop().await;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod config;
pub mod error;
pub mod http;
pub mod logs;
pub mod sink;

pub use config::PipelineConfig;
pub use error::{PipelineError, SinkError};
pub use logs::event::{Batch, LogEvent};
pub use logs::pipeline::{LifecycleState, LogPipeline};
