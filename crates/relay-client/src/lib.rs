//! HTTP client for the aiXplain pipeline API.
//!
//! Two flavours of the same protocol are exposed through one [`AixplainClient`]:
//! the SDK-style run (`x-api-key`, blocks until the job settles) and the direct
//! run (`Authorization: Bearer`, returns the first response as-is).

mod direct;
mod sdk;

use async_trait::async_trait;
use relay_config::UpstreamConfig;
use relay_core::{PipelineHandle, PipelineInput, RelayError, Upstream};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;

pub use sdk::SDK_POLL_INTERVAL;

/// Client for the hosted pipeline, shared across requests.
pub struct AixplainClient {
    client: Client,
    config: UpstreamConfig,
    sdk_poll_interval: Duration,
}

impl AixplainClient {
    pub fn new(config: UpstreamConfig) -> Self {
        Self {
            client: Client::new(),
            config,
            sdk_poll_interval: SDK_POLL_INTERVAL,
        }
    }

    /// Overrides the interval between SDK-style status checks.
    pub fn with_sdk_poll_interval(mut self, interval: Duration) -> Self {
        self.sdk_poll_interval = interval;
        self
    }

    pub fn config(&self) -> &UpstreamConfig {
        &self.config
    }

    fn access_key(&self) -> Result<&str, RelayError> {
        self.config.access_key.as_deref().ok_or(RelayError::NotInitialized)
    }

    /// Loads the pipeline metadata. Called once at startup.
    pub async fn load_pipeline(&self) -> Result<PipelineHandle, RelayError> {
        sdk::load(self).await
    }
}

#[async_trait]
impl Upstream for AixplainClient {
    async fn run_pipeline(&self, input: &PipelineInput) -> Result<Value, RelayError> {
        sdk::run(self, input).await
    }

    async fn submit(&self, input: &PipelineInput) -> Result<Value, RelayError> {
        direct::submit(self, input).await
    }

    async fn poll_status(&self, url: &str) -> Result<Value, RelayError> {
        direct::poll_status(self, url).await
    }

    async fn fetch_text(&self, url: &str) -> Result<String, RelayError> {
        direct::fetch_text(self, url).await
    }
}

/// Sends a request and returns the body text, mapping non-2xx to `RelayError::Status`.
async fn send_text(request: RequestBuilder) -> Result<String, RelayError> {
    let response = request
        .send()
        .await
        .map_err(|e| RelayError::Http(e.to_string()))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| RelayError::Http(e.to_string()))?;

    if !status.is_success() {
        return Err(RelayError::Status {
            code: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

async fn send_json(request: RequestBuilder) -> Result<Value, RelayError> {
    let body = send_text(request).await?;
    Ok(serde_json::from_str(&body)?)
}
