mod args;

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use args::Args;
use common::IntermediateStore;
use mrl_worker::{run_worker, WorkerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = WorkerConfig {
        master: args.master,
        workload: workload::named(&args.workload)?,
        store: IntermediateStore::new(args.work_dir),
        max_tasks: args.max_tasks,
        retry_interval: Duration::from_millis(args.retry_interval_ms),
    };

    let listener = TcpListener::bind((args.host.as_str(), args.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", args.host, args.port))?;

    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupted, shutting down");
                on_signal.cancel();
            }
            Err(e) => error!("Unable to listen for shutdown signal: {e}"),
        }
    });

    let completed = run_worker(listener, config, shutdown).await?;
    println!("{completed}");
    Ok(())
}
