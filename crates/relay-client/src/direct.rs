//! Direct HTTP calls authenticated with a bearer token.

use relay_core::{preview, PipelineInput, RelayError};
use serde_json::Value;
use tracing::{debug, info};

use crate::{send_json, send_text, AixplainClient};

pub(crate) async fn submit(client: &AixplainClient, input: &PipelineInput) -> Result<Value, RelayError> {
    let url = client.config.run_url();
    info!("Making direct API call to: {}", url);

    let body = send_json(
        client
            .client
            .post(&url)
            .bearer_auth(client.access_key()?)
            .json(input),
    )
    .await?;

    info!("Initial API response: {}", preview(&body.to_string(), 500));
    Ok(body)
}

pub(crate) async fn poll_status(client: &AixplainClient, url: &str) -> Result<Value, RelayError> {
    let body = send_json(client.client.get(url).bearer_auth(client.access_key()?)).await?;
    debug!("Poll result: {}", preview(&body.to_string(), 500));
    Ok(body)
}

pub(crate) async fn fetch_text(client: &AixplainClient, url: &str) -> Result<String, RelayError> {
    info!("Fetching text from URL: {}", url);
    send_text(client.client.get(url)).await
}
