//! Pipeline loading at startup.

use relay_client::AixplainClient;
use relay_core::PipelineHandle;
use tracing::{error, info};

/// Loads the pipeline handle once. A failure leaves the relay uninitialized
/// for the lifetime of the process.
pub async fn load(client: &AixplainClient) -> Option<PipelineHandle> {
    info!("Loading pipeline {}", client.config().pipeline_id);

    match client.load_pipeline().await {
        Ok(handle) => {
            info!("Successfully loaded pipeline: {}", handle.name);
            info!("Available pipeline methods: {:?}", handle.methods);
            Some(handle)
        }
        Err(e) => {
            error!("Failed to initialize pipeline: {}", e);
            None
        }
    }
}
