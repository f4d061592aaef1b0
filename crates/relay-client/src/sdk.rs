//! SDK-style pipeline access: metadata lookup and a run that waits for completion.

use std::time::{Duration, Instant};

use relay_core::{preview, JobStatus, PipelineHandle, PipelineInput, RelayError, Submission};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::{send_json, AixplainClient};

pub const SDK_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Deserialize)]
struct PipelineMetadata {
    #[serde(default)]
    id: Option<String>,
    name: String,
}

pub(crate) async fn load(client: &AixplainClient) -> Result<PipelineHandle, RelayError> {
    let url = client.config.metadata_url();
    let body = send_json(client.client.get(&url).header("x-api-key", client.access_key()?)).await?;
    let meta: PipelineMetadata = serde_json::from_value(body)?;

    let id = meta.id.unwrap_or_else(|| client.config.pipeline_id.clone());
    Ok(PipelineHandle::new(id, meta.name))
}

pub(crate) async fn run(client: &AixplainClient, input: &PipelineInput) -> Result<Value, RelayError> {
    let key = client.access_key()?;
    let url = client.config.run_url();
    debug!("SDK run: POST {}", url);

    let body = send_json(client.client.post(&url).header("x-api-key", key).json(input)).await?;

    let poll_url = match Submission::from_body(body) {
        Submission::Immediate(result) => return Ok(result),
        Submission::Pending { url } => url,
    };

    let timeout = client.config.sdk_timeout;
    let started = Instant::now();

    loop {
        if started.elapsed() >= timeout {
            return Err(RelayError::Timeout(timeout.as_secs()));
        }
        tokio::time::sleep(client.sdk_poll_interval).await;

        let body = send_json(client.client.get(&poll_url).header("x-api-key", key)).await?;
        debug!("SDK poll: {}", preview(&body.to_string(), 200));

        let completed = body.get("completed").and_then(Value::as_bool).unwrap_or(false);
        match JobStatus::of(&body) {
            Some(JobStatus::Success) => {
                info!("SDK run completed after {} ms", started.elapsed().as_millis());
                return Ok(body);
            }
            Some(JobStatus::Other(status)) => return Err(RelayError::JobFailed(status)),
            _ if completed => return Ok(body),
            _ => {}
        }
    }
}
