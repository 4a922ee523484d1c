mod args;

use args::Args;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use common::sequential::run_sequential;
use common::{IntermediateStore, Job};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let workload = workload::named(&args.workload)?;
    let job = Job::from_globs(args.job_name, &args.inputs, args.reduce_tasks, workload)?;
    let store = IntermediateStore::new(args.work_dir);

    let result = run_sequential(&job, &store)?;
    if !args.keep_intermediate {
        store
            .remove_intermediate(job.name(), job.n_map(), job.n_reduce())
            .context("failed to clean up partition files")?;
    }

    info!("Job `{}` completed", job.name());
    println!("{}", result.display());
    Ok(())
}
