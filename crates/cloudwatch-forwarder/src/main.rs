// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::env;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use cloudwatch_appender::{LogEvent, LogPipeline, PipelineConfig};

#[tokio::main]
pub async fn main() {
    let log_level = env::var("CWL_LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("info".to_string());

    let env_filter = format!("h2=off,hyper=off,rustls=off,reqwest=off,{}", log_level);

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .with_writer(std::io::stderr)
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");

    let config = match PipelineConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}. Shutting down forwarder.", e);
            return;
        }
    };

    let pipeline = match LogPipeline::new(config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!("Unable to create log pipeline: {}. Shutting down forwarder.", e);
            return;
        }
    };

    if let Err(e) = pipeline.start() {
        error!("Unable to start log pipeline: {}. Shutting down forwarder.", e);
        return;
    }

    info!(
        "Forwarding stdin to {}/{} via {}",
        pipeline.config().log_group_name,
        pipeline.config().log_stream_name,
        pipeline.config().sink_endpoint()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if line.is_empty() {
                        continue;
                    }
                    pipeline.append(LogEvent::now(line));
                }
                Ok(None) => {
                    debug!("stdin closed");
                    break;
                }
                Err(e) => {
                    warn!("Failed to read from stdin: {}", e);
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                debug!("Received interrupt");
                break;
            }
        }
    }

    pipeline.stop().await;
    info!(
        "Forwarder stopped, {} events dropped",
        pipeline.queue().dropped_events()
    );
}
