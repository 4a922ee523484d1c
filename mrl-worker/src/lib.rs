//! A MapReduce worker: runs map and reduce tasks handed out by the master.

use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;
use tracing::info;

use common::{IntermediateStore, Workload};

pub mod core;
pub mod registration;

use crate::core::{MRWorker, WorkerServer};

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// URI of the master, e.g. `http://127.0.0.1:8030`.
    pub master: String,
    pub workload: Workload,
    pub store: IntermediateStore,

    /// Stop serving after this many completed tasks.
    pub max_tasks: Option<u32>,

    /// Pause between registration attempts.
    pub retry_interval: Duration,
}

/// Serve tasks on `listener` until the master says to stop, `shutdown` is
/// cancelled, or the task limit is reached.
///
/// Returns the number of tasks this worker completed.
pub async fn run_worker(
    listener: TcpListener,
    config: WorkerConfig,
    shutdown: CancellationToken,
) -> anyhow::Result<u32> {
    let local = listener
        .local_addr()
        .context("worker listener has no local address")?;
    let address = format!("http://{local}");
    info!("Worker server listening on {local}");

    let worker = MRWorker::new(config.workload, config.store, shutdown.clone())
        .with_max_tasks(config.max_tasks);
    let completed = worker.completed();

    let stop = shutdown.clone();
    let server = tokio::spawn(
        Server::builder()
            .add_service(WorkerServer::new(worker))
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
                stop.cancelled().await
            }),
    );

    if registration::register(&config.master, &address, config.retry_interval, &shutdown)
        .await
        .is_none()
    {
        info!("Stopped before registering");
    }

    server
        .await
        .context("worker server panicked")?
        .context("worker server failed")?;

    let completed = completed.load(Ordering::SeqCst);
    info!("Worker exited after {completed} tasks");
    Ok(completed)
}
