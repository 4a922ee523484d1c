use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tonic::Request;
use tracing::{info, warn};

use crate::core::{MasterClient, RegisterRequest};

/// Register `address` with the master, retrying until the master accepts.
///
/// Returns `None` if `shutdown` fires first.
pub async fn register(
    master: &str,
    address: &str,
    retry_interval: Duration,
    shutdown: &CancellationToken,
) -> Option<u32> {
    loop {
        match try_register(master, address).await {
            Ok(worker_id) => {
                info!("Registered with {master} as worker {worker_id}");
                return Some(worker_id);
            }
            Err(e) => warn!("Failed to register with {master}, retrying: {e:#}"),
        }

        tokio::select! {
            _ = shutdown.cancelled() => return None,
            _ = tokio::time::sleep(retry_interval) => {}
        }
    }
}

async fn try_register(master: &str, address: &str) -> anyhow::Result<u32> {
    let mut client = MasterClient::connect(master.to_string()).await?;
    let response = client
        .register(Request::new(RegisterRequest {
            address: address.to_string(),
        }))
        .await?;
    Ok(response.into_inner().worker_id)
}
