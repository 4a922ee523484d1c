//! The master side of the MapReduce framework: the worker registry, the
//! per-phase scheduler and the job driver, plus the gRPC service workers
//! register through.

pub mod core;
pub mod master;
pub mod scheduler;
pub mod worker_info;
pub mod worker_registry;

pub use master::{run_distributed, wait_completed, JobReport, Master};
pub use scheduler::{DispatchError, Dispatcher, GrpcDispatcher, PhaseReport, Scheduler, TaskBook};
pub use worker_info::{WorkerHandle, WorkerID, WorkerStats};
pub use worker_registry::WorkerRegistry;
