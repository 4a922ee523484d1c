//! Runs a whole job in the calling thread, without workers or networking.
//!
//! It drives the same executors the workers run, so the two modes produce
//! identical files.

use std::path::PathBuf;

use anyhow::Result;
use tracing::info;

use crate::merge::merge_outputs;
use crate::store::IntermediateStore;
use crate::task::Phase;
use crate::Job;

/// Run every map task, then every reduce task, then merge the outputs.
///
/// Returns the path of the merged result file.
pub fn run_sequential(job: &Job, store: &IntermediateStore) -> Result<PathBuf> {
    info!(
        "Running job `{}` sequentially: {} map tasks, {} reduce tasks",
        job.name(),
        job.n_map(),
        job.n_reduce()
    );

    for phase in [Phase::Map, Phase::Reduce] {
        for index in 0..job.n_tasks(phase) {
            job.task(phase, index).execute(job.workload(), store)?;
        }
        info!("Sequential {phase} phase done");
    }

    merge_outputs(store, job.name(), job.n_reduce())
}
