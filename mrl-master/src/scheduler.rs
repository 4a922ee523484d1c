//! Runs all tasks of one phase on the worker pool.
//!
//! Every pending task gets its own dispatch unit, which waits for an idle
//! worker, calls it, and hands the worker back (success) or drops it
//! (failure). The phase driver alone updates the [`TaskBook`], so a task is
//! counted done exactly once, and a failed task goes back to pending to be
//! picked up by another worker. There is no retry limit and no call timeout.

use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::{bail, Context};
use thiserror::Error;
use tokio::task::JoinSet;
use tonic::transport::Channel;
use tonic::Request;
use tracing::{debug, info, warn};

use common::{Job, Phase, Task};

use crate::core::worker::worker_client::WorkerClient;
use crate::core::worker::{DoTaskRequest, ShutdownRequest};
use crate::worker_info::{WorkerHandle, WorkerID};
use crate::worker_registry::WorkerRegistry;

/// Why a call to a worker did not succeed.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("could not reach worker at {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: tonic::transport::Error,
    },

    #[error("worker at {address} failed the call: {status}")]
    Rejected {
        address: String,
        status: tonic::Status,
    },
}

/// Remote operations the master performs on a worker.
#[tonic::async_trait]
pub trait Dispatcher: Send + Sync + 'static {
    /// Run `task` on `worker` and wait for it to finish.
    async fn do_task(&self, worker: &WorkerHandle, task: &Task) -> Result<(), DispatchError>;

    /// Tell `worker` to stop. Returns the number of tasks it completed.
    async fn shutdown(&self, worker: &WorkerHandle) -> Result<u32, DispatchError>;
}

/// Calls workers over gRPC, opening a fresh connection for every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrpcDispatcher;

impl GrpcDispatcher {
    async fn client(worker: &WorkerHandle) -> Result<WorkerClient<Channel>, DispatchError> {
        WorkerClient::connect(worker.address().to_string())
            .await
            .map_err(|source| DispatchError::Connect {
                address: worker.address().to_string(),
                source,
            })
    }
}

#[tonic::async_trait]
impl Dispatcher for GrpcDispatcher {
    async fn do_task(&self, worker: &WorkerHandle, task: &Task) -> Result<(), DispatchError> {
        let mut client = Self::client(worker).await?;
        client
            .do_task(Request::new(DoTaskRequest::from(task)))
            .await
            .map_err(|status| DispatchError::Rejected {
                address: worker.address().to_string(),
                status,
            })?;
        Ok(())
    }

    async fn shutdown(&self, worker: &WorkerHandle) -> Result<u32, DispatchError> {
        let mut client = Self::client(worker).await?;
        let response = client
            .shutdown(Request::new(ShutdownRequest {}))
            .await
            .map_err(|status| DispatchError::Rejected {
                address: worker.address().to_string(),
                status,
            })?;
        Ok(response.into_inner().tasks_completed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskState {
    Pending,
    InFlight,
    Done,
}

/// Progress of every task index in a phase.
#[derive(Debug)]
pub struct TaskBook {
    states: Vec<TaskState>,
    pending: VecDeque<u32>,
    completed: u32,
}

impl TaskBook {
    pub fn new(n_tasks: u32) -> Self {
        Self {
            states: vec![TaskState::Pending; n_tasks as usize],
            pending: (0..n_tasks).collect(),
            completed: 0,
        }
    }

    /// Take the next pending task and mark it in flight.
    pub fn next_pending(&mut self) -> Option<u32> {
        let index = self.pending.pop_front()?;
        self.states[index as usize] = TaskState::InFlight;
        Some(index)
    }

    /// Mark an in-flight task done. Returns `false`, changing nothing, if the
    /// task was not in flight.
    pub fn complete(&mut self, index: u32) -> bool {
        match self.states.get_mut(index as usize) {
            Some(state) if *state == TaskState::InFlight => {
                *state = TaskState::Done;
                self.completed += 1;
                true
            }
            _ => false,
        }
    }

    /// Put an in-flight task back into pending. Returns `false`, changing
    /// nothing, if the task was not in flight.
    pub fn requeue(&mut self, index: u32) -> bool {
        match self.states.get_mut(index as usize) {
            Some(state) if *state == TaskState::InFlight => {
                *state = TaskState::Pending;
                self.pending.push_back(index);
                true
            }
            _ => false,
        }
    }

    pub fn completed(&self) -> u32 {
        self.completed
    }

    pub fn total(&self) -> u32 {
        self.states.len() as u32
    }

    pub fn in_flight(&self) -> usize {
        self.states
            .iter()
            .filter(|s| **s == TaskState::InFlight)
            .count()
    }

    pub fn is_complete(&self) -> bool {
        self.completed == self.total()
    }
}

/// Summary of one finished phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseReport {
    pub phase: Phase,

    /// Number of tasks in the phase, all of which succeeded.
    pub tasks: u32,

    /// Calls made, successful or not.
    pub attempts: u32,

    /// Calls that failed and were retried.
    pub failures: u32,
}

/// What a dispatch unit reports back to the phase driver.
struct Outcome {
    index: u32,
    worker: WorkerID,
    result: Result<(), DispatchError>,
}

async fn dispatch<D: Dispatcher>(
    registry: Arc<WorkerRegistry>,
    dispatcher: Arc<D>,
    task: Task,
) -> Outcome {
    let worker = registry.acquire().await;
    debug!("Dispatching {task} to worker {}", worker.id());

    let result = dispatcher.do_task(&worker, &task).await;
    let id = worker.id();
    match result {
        Ok(()) => registry.release(worker).await,
        Err(_) => registry.discard(worker).await,
    }

    Outcome {
        index: task.index,
        worker: id,
        result,
    }
}

pub struct Scheduler<D> {
    registry: Arc<WorkerRegistry>,
    dispatcher: Arc<D>,
}

impl<D: Dispatcher> Scheduler<D> {
    pub fn new(registry: Arc<WorkerRegistry>, dispatcher: Arc<D>) -> Self {
        Self {
            registry,
            dispatcher,
        }
    }

    /// Run every task of `phase` until each has succeeded once.
    ///
    /// Only returns an error if a dispatch unit panicked.
    pub async fn run_phase(&self, job: &Job, phase: Phase) -> anyhow::Result<PhaseReport> {
        let n_tasks = job.n_tasks(phase);
        let n_io = match phase {
            Phase::Map => job.n_reduce(),
            Phase::Reduce => job.n_map(),
        };
        info!("Schedule: {n_tasks} {phase} tasks ({n_io} I/Os)");

        let mut book = TaskBook::new(n_tasks);
        let mut units = JoinSet::new();
        let mut report = PhaseReport {
            phase,
            tasks: n_tasks,
            attempts: 0,
            failures: 0,
        };

        while !book.is_complete() {
            while let Some(index) = book.next_pending() {
                report.attempts += 1;
                units.spawn(dispatch(
                    self.registry.clone(),
                    self.dispatcher.clone(),
                    job.task(phase, index),
                ));
            }

            let Some(joined) = units.join_next().await else {
                bail!("{phase} phase stalled with no task in flight");
            };
            let outcome = joined.context("dispatch unit panicked")?;

            match outcome.result {
                Ok(()) => {
                    book.complete(outcome.index);
                    debug!(
                        "{phase} task #{} done on worker {} ({}/{})",
                        outcome.index,
                        outcome.worker,
                        book.completed(),
                        book.total()
                    );
                }
                Err(e) => {
                    report.failures += 1;
                    warn!("{phase} task #{} failed, requeueing: {e}", outcome.index);
                    book.requeue(outcome.index);
                }
            }
        }

        info!(
            "Schedule: {phase} phase done ({} attempts, {} failures)",
            report.attempts, report.failures
        );
        Ok(report)
    }
}
