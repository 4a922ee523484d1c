use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::transport::{Endpoint, Server};
use tonic::{Request, Response, Status};
use tracing::info;

use common::{Phase, Task};

pub use master::master_server::{Master as MasterRpc, MasterServer};
use master::{RegisterRequest, RegisterResponse};
pub mod master {
    tonic::include_proto!("master");
}

pub mod worker {
    tonic::include_proto!("worker");
}

use crate::worker_registry::WorkerRegistry;

/// The master's gRPC face: workers call it to join the pool.
#[derive(Debug, Clone)]
pub struct MRMaster {
    registry: Arc<WorkerRegistry>,
}

impl MRMaster {
    pub fn new(registry: Arc<WorkerRegistry>) -> Self {
        Self { registry }
    }
}

#[tonic::async_trait]
impl MasterRpc for MRMaster {
    /// Worker requests to join the workforce.
    async fn register(
        &self,
        request: Request<RegisterRequest>,
    ) -> Result<Response<RegisterResponse>, Status> {
        let address = request.into_inner().address;
        Endpoint::from_shared(address.clone())
            .map_err(|_| Status::invalid_argument(format!("`{address}` is not a valid URI")))?;

        let worker_id = self.registry.register(address).await;
        Ok(Response::new(RegisterResponse { worker_id }))
    }
}

impl From<&Task> for worker::DoTaskRequest {
    fn from(task: &Task) -> Self {
        let phase = match task.phase {
            Phase::Map => worker::Phase::Map,
            Phase::Reduce => worker::Phase::Reduce,
        };
        Self {
            job_name: task.job_name.clone(),
            phase: phase as i32,
            task_number: task.index,
            file: task.file.clone().unwrap_or_default(),
            num_other_phase: task.num_other,
        }
    }
}

/// Serve worker registrations on `listener` until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    registry: Arc<WorkerRegistry>,
    shutdown: CancellationToken,
) -> Result<(), tonic::transport::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!("Master listening on {}", addr);
    }

    Server::builder()
        .add_service(MasterServer::new(MRMaster::new(registry)))
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
            shutdown.cancelled().await
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_task_request() {
        let request = worker::DoTaskRequest::from(&Task::map("wc", 4, "in/doc.txt", 3));
        assert_eq!(request.job_name, "wc");
        assert_eq!(request.phase(), worker::Phase::Map);
        assert_eq!(request.task_number, 4);
        assert_eq!(request.file, "in/doc.txt");
        assert_eq!(request.num_other_phase, 3);
    }

    #[test]
    fn reduce_task_request_has_no_file() {
        let request = worker::DoTaskRequest::from(&Task::reduce("wc", 1, 7));
        assert_eq!(request.phase(), worker::Phase::Reduce);
        assert!(request.file.is_empty());
        assert_eq!(request.num_other_phase, 7);
    }

    #[tokio::test]
    async fn register_adds_worker() {
        let registry = Arc::new(WorkerRegistry::new());
        let service = MRMaster::new(registry.clone());
        let response = service
            .register(Request::new(RegisterRequest {
                address: "http://127.0.0.1:7001".into(),
            }))
            .await
            .unwrap();
        assert_eq!(response.into_inner().worker_id, 0);
        assert_eq!(registry.worker_count().await, 1);
        assert_eq!(registry.acquire().await.address(), "http://127.0.0.1:7001");
    }

    #[tokio::test]
    async fn register_rejects_bad_address() {
        let registry = Arc::new(WorkerRegistry::new());
        let service = MRMaster::new(registry.clone());
        let status = service
            .register(Request::new(RegisterRequest {
                address: "not a uri".into(),
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
        assert_eq!(registry.worker_count().await, 0);
    }
}
