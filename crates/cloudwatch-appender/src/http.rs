//! HTTP client construction for the sink.
//!
//! The client carries the per-request timeout, connection pooling and an
//! optional HTTPS proxy from [`PipelineConfig`]. An unusable proxy setting
//! falls back to a direct connection rather than failing startup.

use core::time::Duration;
use std::error::Error;

use tracing::error;

use crate::config::PipelineConfig;

/// Creates a configured HTTP client with proxy support.
#[must_use]
pub fn get_client(config: &PipelineConfig) -> reqwest::Client {
    match build_client(config, true) {
        Ok(client) => client,
        Err(e) => {
            error!(
                "Unable to parse proxy configuration: {}, falling back to direct connection",
                e
            );
            match build_client(config, false) {
                Ok(client) => client,
                Err(inner) => {
                    error!(
                        "Failed to build HTTP client without proxy: {}, using reqwest defaults",
                        inner
                    );
                    reqwest::Client::new()
                }
            }
        }
    }
}

fn build_client(
    config: &PipelineConfig,
    allow_proxy: bool,
) -> Result<reqwest::Client, Box<dyn Error>> {
    let mut client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .pool_idle_timeout(Some(Duration::from_secs(270)))
        .tcp_keepalive(Some(Duration::from_secs(120)));

    if allow_proxy {
        if let Some(https_uri) = &config.https_proxy {
            let proxy = reqwest::Proxy::https(https_uri.clone())?;
            client = client.proxy(proxy);
        }
    }

    Ok(client.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client_without_proxy() {
        let config = PipelineConfig::default();
        assert!(build_client(&config, true).is_ok());
    }

    #[test]
    fn test_build_client_with_proxy() {
        let config = PipelineConfig {
            https_proxy: Some("https://proxy.local:3128".to_string()),
            ..Default::default()
        };
        assert!(build_client(&config, true).is_ok());
    }

    #[test]
    fn test_get_client_falls_back_on_bad_proxy() {
        let config = PipelineConfig {
            https_proxy: Some("not a url at all".to_string()),
            ..Default::default()
        };
        // Hands back a usable client either way.
        let _client = get_client(&config);
    }
}
