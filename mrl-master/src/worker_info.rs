pub type WorkerID = u32;

/// A registered worker, as held by the idle pool or by the one dispatch unit
/// currently using it.
///
/// Handles are not `Clone`. Owning the handle is what entitles a dispatch
/// unit to call the worker.
#[derive(Debug, PartialEq, Eq)]
pub struct WorkerHandle {
    /// Unique ID for each worker address.
    id: WorkerID,

    /// URI of the worker's gRPC server, e.g. `http://127.0.0.1:7001`.
    address: String,
}

impl WorkerHandle {
    pub(crate) fn new(id: WorkerID, address: String) -> Self {
        Self { id, address }
    }

    pub fn id(&self) -> WorkerID {
        self.id
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

/// What a worker reported when it was told to shut down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerStats {
    pub id: WorkerID,
    pub address: String,
    pub tasks_completed: u32,
}
