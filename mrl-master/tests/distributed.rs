//! Full jobs over real gRPC, with the master and workers on loopback ports.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use common::{IntermediateStore, Job};
use mrl_master::{run_distributed, JobReport};
use mrl_worker::{run_worker, WorkerConfig};

fn write_docs(dir: &Path, docs: &[(&str, &str)]) -> Vec<String> {
    docs.iter()
        .map(|(name, text)| {
            let path = dir.join(name);
            fs::write(&path, text).unwrap();
            path.to_string_lossy().into_owned()
        })
        .collect()
}

async fn start_master(
    job: Job,
    store: IntermediateStore,
) -> (SocketAddr, JoinHandle<anyhow::Result<JobReport>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let master = tokio::spawn(run_distributed(job, store, listener, false));
    (addr, master)
}

async fn start_worker(
    master: SocketAddr,
    workload: &str,
    store: IntermediateStore,
    max_tasks: Option<u32>,
    shutdown: CancellationToken,
) -> JoinHandle<anyhow::Result<u32>> {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let config = WorkerConfig {
        master: format!("http://{master}"),
        workload: workload::named(workload).unwrap(),
        store,
        max_tasks,
        retry_interval: Duration::from_millis(50),
    };
    tokio::spawn(run_worker(listener, config, shutdown))
}

async fn within<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::time::timeout(Duration::from_secs(30), future)
        .await
        .expect("timed out")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn inverted_index_over_grpc() {
    let dir = tempfile::tempdir().unwrap();
    let files = write_docs(dir.path(), &[("doc1", "a b a"), ("doc2", "b c")]);
    let (doc1, doc2) = (files[0].clone(), files[1].clone());
    let store = IntermediateStore::new(dir.path().join("work"));

    let job = Job::new("ii", files, 2, workload::named("ii").unwrap()).unwrap();
    let (addr, master) = start_master(job, store.clone()).await;
    let shutdown = CancellationToken::new();
    let workers = vec![
        start_worker(addr, "ii", store.clone(), None, shutdown.clone()).await,
        start_worker(addr, "ii", store.clone(), None, shutdown.clone()).await,
    ];

    let report = within(master).await.unwrap().unwrap();
    assert_eq!(
        fs::read_to_string(&report.result).unwrap(),
        format!("a: 1 {doc1}\nb: 2 {doc1},{doc2}\nc: 1 {doc2}\n")
    );

    // Workers the master told to stop have already exited. One that joined
    // too late to be told is stopped here.
    shutdown.cancel();
    let mut completed = 0;
    for worker in workers {
        completed += within(worker).await.unwrap().unwrap();
    }
    assert_eq!(completed, 4);
    let reported: u32 = report.workers.iter().map(|w| w.tasks_completed).sum();
    assert_eq!(reported, 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn job_finishes_after_a_worker_exits() {
    let dir = tempfile::tempdir().unwrap();
    let files = write_docs(
        dir.path(),
        &[("one", "to be or not"), ("two", "to be"), ("three", "or not to")],
    );
    let store = IntermediateStore::new(dir.path());

    let job = Job::new("crash", files, 2, workload::named("wc").unwrap()).unwrap();
    let (addr, master) = start_master(job, store.clone()).await;

    let short_lived = start_worker(addr, "wc", store.clone(), Some(1), CancellationToken::new()).await;
    assert_eq!(within(short_lived).await.unwrap().unwrap(), 1);

    let replacement = start_worker(addr, "wc", store.clone(), None, CancellationToken::new()).await;
    let report = within(master).await.unwrap().unwrap();
    assert_eq!(
        fs::read_to_string(&report.result).unwrap(),
        "be: 2\nnot: 2\nor: 2\nto: 3\n"
    );
    assert!(within(replacement).await.unwrap().unwrap() >= 4);
}
