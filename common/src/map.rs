use std::fs;

use anyhow::{bail, Context, Error};
use tracing::{debug, info};

use crate::partition::partition;
use crate::store::IntermediateStore;
use crate::{KeyValue, MapFn};

/// Run one map task: read `document`, apply `map_fn` and route every
/// emitted record to one of `n_reduce` partition files.
///
/// All `n_reduce` files are written, empty ones included, so that the reduce
/// side can read every (map, reduce) pair unconditionally. Each file is
/// replaced as a whole, which makes re-running the same task index safe.
pub fn perform_map(
    store: &IntermediateStore,
    job_name: &str,
    map_task: u32,
    document: &str,
    n_reduce: u32,
    map_fn: MapFn,
) -> Result<(), Error> {
    if n_reduce == 0 {
        bail!("map task {map_task} of job `{job_name}` needs at least one reduce task");
    }

    info!("Starting map task {map_task} of job `{job_name}` on `{document}`");

    // Documents are opaque bytes; invalid UTF-8 becomes U+FFFD, which no
    // workload treats as part of a word.
    let bytes = fs::read(document)
        .with_context(|| format!("failed to read input document `{document}`"))?;
    let contents = String::from_utf8_lossy(&bytes).into_owned();

    let mut buckets: Vec<Vec<KeyValue>> = vec![Vec::new(); n_reduce as usize];
    let emitted = map_fn(KeyValue::new(document, contents))
        .with_context(|| format!("map function failed on `{document}`"))?;
    for kv in emitted {
        let kv = kv.with_context(|| format!("map function failed on `{document}`"))?;
        let bucket = partition(kv.key(), n_reduce);
        buckets[bucket as usize].push(kv);
    }

    for (reduce_task, records) in buckets.iter().enumerate() {
        let path = store.partition_path(job_name, map_task, reduce_task as u32);
        store.write_records(&path, records)?;
    }

    debug!(
        "Map task {map_task} emitted {} records",
        buckets.iter().map(Vec::len).sum::<usize>()
    );
    Ok(())
}
