use std::collections::{HashMap, HashSet};

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::worker_info::*;

/// Bookkeeping for every address that ever registered.
#[derive(Debug, Default)]
struct Roster {
    /// ID assigned to each address on first registration.
    ids: HashMap<String, WorkerID>,

    /// Addresses with a handle either idle in the pool or held by a dispatch unit.
    live: HashSet<String>,

    /// Live addresses that registered again while their handle was out.
    /// If that handle is then discarded, the address goes back into the pool.
    rejoined: HashSet<String>,

    /// Number of accepted registrations.
    registrations: usize,
}

/// Registry for workers.
///
/// Idle workers wait in a queue. A dispatch unit takes a handle out with
/// [`acquire`](Self::acquire) and gives it back with
/// [`release`](Self::release) or drops it with [`discard`](Self::discard).
/// An address has at most one handle at any time, so no two dispatch units
/// ever call the same worker at once.
#[derive(Debug)]
pub struct WorkerRegistry {
    idle_tx: mpsc::UnboundedSender<WorkerHandle>,
    idle_rx: Mutex<mpsc::UnboundedReceiver<WorkerHandle>>,
    roster: Mutex<Roster>,
}

impl Default for WorkerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerRegistry {
    pub fn new() -> Self {
        let (idle_tx, idle_rx) = mpsc::unbounded_channel();
        Self {
            idle_tx,
            idle_rx: Mutex::new(idle_rx),
            roster: Mutex::new(Roster::default()),
        }
    }

    /// Add a worker to the idle pool and return its ID.
    ///
    /// Registering an address that already has a handle does not create a
    /// second one.
    pub async fn register(&self, address: impl Into<String>) -> WorkerID {
        let address = address.into();
        let mut roster = self.roster.lock().await;

        let next_id = roster.ids.len() as WorkerID;
        let id = *roster.ids.entry(address.clone()).or_insert(next_id);

        if !roster.live.insert(address.clone()) {
            debug!("Worker {id} at {address} registered again while live");
            roster.rejoined.insert(address);
            return id;
        }

        roster.registrations += 1;
        info!("Worker {id} joined from {address}");
        self.push_idle(WorkerHandle::new(id, address));
        id
    }

    /// Wait until a worker is idle and take it.
    ///
    /// Waits forever if no worker ever becomes idle.
    pub async fn acquire(&self) -> WorkerHandle {
        let mut idle = self.idle_rx.lock().await;
        match idle.recv().await {
            Some(worker) => worker,
            // The registry owns a sender, so the queue never closes.
            None => std::future::pending().await,
        }
    }

    /// Return a worker that finished its call to the idle pool.
    pub async fn release(&self, worker: WorkerHandle) {
        self.roster.lock().await.rejoined.remove(worker.address());
        self.push_idle(worker);
    }

    /// Drop a worker whose call failed. It is assumed dead.
    pub async fn discard(&self, worker: WorkerHandle) {
        let mut roster = self.roster.lock().await;
        if roster.rejoined.remove(worker.address()) {
            info!(
                "Worker {} at {} failed but has since re-registered",
                worker.id(),
                worker.address()
            );
            self.push_idle(worker);
            return;
        }
        roster.live.remove(worker.address());
        warn!("Discarding worker {} at {}", worker.id(), worker.address());
    }

    /// Take every worker that is idle right now, without waiting.
    pub async fn drain_idle(&self) -> Vec<WorkerHandle> {
        let mut idle = self.idle_rx.lock().await;
        let mut roster = self.roster.lock().await;
        let mut workers = Vec::new();
        while let Ok(worker) = idle.try_recv() {
            roster.live.remove(worker.address());
            roster.rejoined.remove(worker.address());
            workers.push(worker);
        }
        workers
    }

    /// Number of accepted registrations.
    pub async fn worker_count(&self) -> usize {
        self.roster.lock().await.registrations
    }

    /// Number of workers that are idle or busy.
    pub async fn live_count(&self) -> usize {
        self.roster.lock().await.live.len()
    }

    fn push_idle(&self, worker: WorkerHandle) {
        // The receiver lives in `self`, so this cannot fail.
        let _ = self.idle_tx.send(worker);
    }
}
