mod args;

use args::Args;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use common::{IntermediateStore, Job};
use mrl_master::run_distributed;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    // Reject jobs that can never run before accepting any worker.
    let workload = workload::named(&args.workload)?;
    let job = Job::from_globs(args.job_name, &args.inputs, args.reduce_tasks, workload)?;
    let store = IntermediateStore::new(args.work_dir);

    let listener = TcpListener::bind((args.host.as_str(), args.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", args.host, args.port))?;

    let report = run_distributed(job, store, listener, args.keep_intermediate).await?;

    for phase in &report.phases {
        info!(
            "{} phase: {} tasks, {} attempts, {} failures",
            phase.phase, phase.tasks, phase.attempts, phase.failures
        );
    }
    for worker in &report.workers {
        info!(
            "Worker {} ({}) completed {} tasks",
            worker.id, worker.address, worker.tasks_completed
        );
    }
    println!("{}", report.result.display());

    Ok(())
}
