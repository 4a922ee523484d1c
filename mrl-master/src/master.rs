use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use common::merge::merge_outputs;
use common::{IntermediateStore, Job, JobState, Phase};

use crate::core;
use crate::scheduler::{Dispatcher, GrpcDispatcher, PhaseReport, Scheduler};
use crate::worker_info::WorkerStats;
use crate::worker_registry::WorkerRegistry;

/// Everything a finished job reports.
#[derive(Debug, Clone)]
pub struct JobReport {
    pub job_name: String,
    pub phases: Vec<PhaseReport>,

    /// The merged output of the job.
    pub result: PathBuf,

    /// Workers that acknowledged the final shutdown, with the number of
    /// tasks each one completed.
    pub workers: Vec<WorkerStats>,
}

/// Drives one job over the worker pool: every map task, then every reduce
/// task, then the merge.
pub struct Master<D> {
    job: Job,
    store: IntermediateStore,
    registry: Arc<WorkerRegistry>,
    dispatcher: Arc<D>,
    scheduler: Scheduler<D>,
    state: watch::Sender<JobState>,
    keep_intermediate: bool,
}

impl<D: Dispatcher> Master<D> {
    pub fn new(
        job: Job,
        store: IntermediateStore,
        registry: Arc<WorkerRegistry>,
        dispatcher: D,
    ) -> Self {
        let dispatcher = Arc::new(dispatcher);
        let (state, _) = watch::channel(JobState::Pending);
        Self {
            scheduler: Scheduler::new(registry.clone(), dispatcher.clone()),
            job,
            store,
            registry,
            dispatcher,
            state,
            keep_intermediate: false,
        }
    }

    /// Keep the map tasks' partition files after the job completes.
    pub fn keep_intermediate(mut self, keep: bool) -> Self {
        self.keep_intermediate = keep;
        self
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    pub fn registry(&self) -> &Arc<WorkerRegistry> {
        &self.registry
    }

    /// Watch the job move through its states.
    pub fn subscribe(&self) -> watch::Receiver<JobState> {
        self.state.subscribe()
    }

    /// Run the job to completion.
    ///
    /// Waits as long as it takes for workers to show up; a phase only ends
    /// once every one of its tasks has succeeded.
    pub async fn run(&self) -> Result<JobReport> {
        let job = &self.job;
        info!(
            "Starting job `{}` ({}): {} documents, {} reduce tasks",
            job.name(),
            job.workload().name,
            job.n_map(),
            job.n_reduce()
        );

        self.state.send_replace(JobState::Mapping);
        let map = self.scheduler.run_phase(job, Phase::Map).await?;

        self.state.send_replace(JobState::Reducing);
        let reduce = self.scheduler.run_phase(job, Phase::Reduce).await?;

        let result = merge_outputs(&self.store, job.name(), job.n_reduce())?;
        if !self.keep_intermediate {
            self.store
                .remove_intermediate(job.name(), job.n_map(), job.n_reduce())
                .context("failed to clean up partition files")?;
        }

        let workers = self.shutdown_workers().await;

        self.state.send_replace(JobState::Completed);
        info!("Job `{}` completed, result in {}", job.name(), result.display());

        Ok(JobReport {
            job_name: job.name().to_string(),
            phases: vec![map, reduce],
            result,
            workers,
        })
    }

    /// Tell every idle worker to stop and collect their task counts.
    async fn shutdown_workers(&self) -> Vec<WorkerStats> {
        let mut stats = Vec::new();
        for worker in self.registry.drain_idle().await {
            match self.dispatcher.shutdown(&worker).await {
                Ok(tasks_completed) => {
                    debug!("Worker {} completed {tasks_completed} tasks", worker.id());
                    stats.push(WorkerStats {
                        id: worker.id(),
                        address: worker.address().to_string(),
                        tasks_completed,
                    });
                }
                Err(e) => warn!("Failed to shut down worker {}: {e}", worker.id()),
            }
        }
        stats.sort_by_key(|s| s.id);
        stats
    }
}

/// Wait until a job watched through [`Master::subscribe`] has completed.
pub async fn wait_completed(mut state: watch::Receiver<JobState>) -> Result<()> {
    state
        .wait_for(|s| *s == JobState::Completed)
        .await
        .context("master dropped before the job completed")?;
    Ok(())
}

/// Run `job` with workers that register on `listener`.
///
/// The registration server runs for the lifetime of the job and is shut down
/// once the job completes.
pub async fn run_distributed(
    job: Job,
    store: IntermediateStore,
    listener: TcpListener,
    keep_intermediate: bool,
) -> Result<JobReport> {
    let registry = Arc::new(WorkerRegistry::new());
    let shutdown = CancellationToken::new();
    let server = tokio::spawn(core::serve(listener, registry.clone(), shutdown.clone()));

    let master =
        Master::new(job, store, registry, GrpcDispatcher).keep_intermediate(keep_intermediate);
    let report = master.run().await;

    shutdown.cancel();
    server
        .await
        .context("registration server panicked")?
        .context("registration server failed")?;

    report
}
