use std::collections::HashMap;

use anyhow::{Context, Error};
use tracing::{debug, info};

use crate::store::IntermediateStore;
use crate::{KeyValue, ReduceFn};

/// Run one reduce task.
///
/// Reads the partition file for `reduce_task` from each of the `n_map` map
/// tasks, groups values by key (ascending map task, then file order), and
/// writes one `{key, reduce_fn(key, values)}` record per key to the output
/// file, keys in ascending order. Every partition file is read before the
/// reduce function runs for any key.
pub fn perform_reduce(
    store: &IntermediateStore,
    job_name: &str,
    reduce_task: u32,
    n_map: u32,
    reduce_fn: ReduceFn,
) -> Result<(), Error> {
    info!("Starting reduce task {reduce_task} of job `{job_name}` over {n_map} map outputs");

    let mut groups: HashMap<String, Vec<String>> = HashMap::new();
    for map_task in 0..n_map {
        let path = store.partition_path(job_name, map_task, reduce_task);
        let records = store.read_records(&path).with_context(|| {
            format!("reduce task {reduce_task} could not read output of map task {map_task}")
        })?;
        for kv in records {
            groups.entry(kv.key).or_default().push(kv.value);
        }
    }

    let mut keys: Vec<&String> = groups.keys().collect();
    keys.sort_unstable();

    let mut output = Vec::with_capacity(keys.len());
    for key in keys {
        let values = &groups[key];
        let result = reduce_fn(key, Box::new(values.iter().map(String::as_str)))
            .with_context(|| format!("reduce function failed on key `{key}`"))?;
        output.push(KeyValue::new(key.as_str(), result));
    }

    let path = store.output_path(job_name, reduce_task);
    store.write_records(&path, &output)?;

    debug!("Reduce task {reduce_task} wrote {} keys", output.len());
    Ok(())
}
