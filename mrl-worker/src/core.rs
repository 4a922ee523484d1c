//
// Import gRPC stubs/definitions.
//
pub use master::{master_client::MasterClient, RegisterRequest};
pub mod master {
    tonic::include_proto!("master");
}

pub use worker::worker_server::{Worker, WorkerServer};
pub use worker::{DoTaskRequest, DoTaskResponse, ShutdownRequest, ShutdownResponse};
pub mod worker {
    tonic::include_proto!("worker");
}

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status};
use tracing::{debug, error, info};

use common::{IntermediateStore, Phase, Task, Workload};

/// Serves task calls from the master, one at a time.
#[derive(Debug)]
pub struct MRWorker {
    workload: Workload,
    store: IntermediateStore,

    /// Held while a task runs.
    running: Mutex<()>,

    completed: Arc<AtomicU32>,

    /// Stop serving after this many completed tasks.
    max_tasks: Option<u32>,

    shutdown: CancellationToken,
}

impl MRWorker {
    pub fn new(workload: Workload, store: IntermediateStore, shutdown: CancellationToken) -> Self {
        Self {
            workload,
            store,
            running: Mutex::new(()),
            completed: Arc::new(AtomicU32::new(0)),
            max_tasks: None,
            shutdown,
        }
    }

    pub fn with_max_tasks(mut self, max_tasks: Option<u32>) -> Self {
        self.max_tasks = max_tasks;
        self
    }

    /// Counter of completed tasks, readable after the worker is gone.
    pub fn completed(&self) -> Arc<AtomicU32> {
        self.completed.clone()
    }
}

/// Build a task from the wire request.
pub fn task_from_request(request: DoTaskRequest) -> Result<Task, Status> {
    let phase = match worker::Phase::try_from(request.phase) {
        Ok(worker::Phase::Map) => Phase::Map,
        Ok(worker::Phase::Reduce) => Phase::Reduce,
        Err(_) => {
            return Err(Status::invalid_argument(format!(
                "unknown phase {}",
                request.phase
            )))
        }
    };

    match phase {
        Phase::Map if request.file.is_empty() => Err(Status::invalid_argument(
            "map task without an input file",
        )),
        Phase::Map => Ok(Task::map(
            request.job_name,
            request.task_number,
            request.file,
            request.num_other_phase,
        )),
        Phase::Reduce => Ok(Task::reduce(
            request.job_name,
            request.task_number,
            request.num_other_phase,
        )),
    }
}

#[tonic::async_trait]
impl Worker for MRWorker {
    async fn do_task(
        &self,
        request: Request<DoTaskRequest>,
    ) -> Result<Response<DoTaskResponse>, Status> {
        let task = task_from_request(request.into_inner())?;

        // We accept the work only if we are free.
        let _running = self
            .running
            .try_lock()
            .map_err(|_| Status::resource_exhausted("worker is already running a task"))?;
        if self.shutdown.is_cancelled() {
            return Err(Status::unavailable("worker is shutting down"));
        }

        let label = task.to_string();
        info!("Running {label}");

        let workload = self.workload;
        let store = self.store.clone();
        let outcome = tokio::task::spawn_blocking(move || task.execute(&workload, &store)).await;

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!("{label} failed: {e:#}");
                return Err(Status::internal(format!("{label} failed: {e:#}")));
            }
            Err(e) => {
                error!("{label} panicked: {e}");
                return Err(Status::internal(format!("{label} panicked")));
            }
        }

        let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("{label} done, {done} tasks completed");

        if self.max_tasks.is_some_and(|max| done >= max) {
            info!("Reached the limit of {done} tasks, no longer serving");
            self.shutdown.cancel();
        }

        Ok(Response::new(DoTaskResponse {}))
    }

    async fn shutdown(
        &self,
        _: Request<ShutdownRequest>,
    ) -> Result<Response<ShutdownResponse>, Status> {
        let tasks_completed = self.completed.load(Ordering::SeqCst);
        info!("Shutdown requested after {tasks_completed} tasks");
        self.shutdown.cancel();
        Ok(Response::new(ShutdownResponse { tasks_completed }))
    }
}
