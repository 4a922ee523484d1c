use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Result};
use tracing::info;

use crate::store::IntermediateStore;

/// Combine the output files of every reduce task into the job's result file,
/// one `key: value` line per key in ascending key order.
///
/// Returns the path of the result file.
pub fn merge_outputs(store: &IntermediateStore, job_name: &str, n_reduce: u32) -> Result<PathBuf> {
    info!("Merging {n_reduce} reduce outputs of job `{job_name}`");

    let mut merged = BTreeMap::new();
    for reduce_task in 0..n_reduce {
        let path = store.output_path(job_name, reduce_task);
        for kv in store.read_records(&path)? {
            if merged.contains_key(&kv.key) {
                bail!(
                    "key `{}` appears in more than one reduce output (seen again in {})",
                    kv.key,
                    path.display()
                );
            }
            merged.insert(kv.key, kv.value);
        }
    }

    let result_path = store.result_path(job_name);
    store.write_atomic(&result_path, |writer| {
        for (key, value) in &merged {
            writeln!(writer, "{key}: {value}")?;
        }
        Ok(())
    })?;

    Ok(result_path)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::KeyValue;

    #[test]
    fn merges_in_key_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = IntermediateStore::new(dir.path());
        store
            .write_records(
                &store.output_path("job", 0),
                &[KeyValue::new("b", "2"), KeyValue::new("d", "4")],
            )
            .unwrap();
        store
            .write_records(
                &store.output_path("job", 1),
                &[KeyValue::new("a", "1"), KeyValue::new("c", "3")],
            )
            .unwrap();

        let path = merge_outputs(&store, "job", 2).unwrap();
        assert_eq!(path, store.result_path("job"));
        assert_eq!(fs::read_to_string(path).unwrap(), "a: 1\nb: 2\nc: 3\nd: 4\n");
    }

    #[test]
    fn duplicate_key_across_outputs_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = IntermediateStore::new(dir.path());
        for r in 0..2 {
            store
                .write_records(&store.output_path("job", r), &[KeyValue::new("same", "1")])
                .unwrap();
        }
        assert!(merge_outputs(&store, "job", 2).is_err());
    }

    #[test]
    fn failed_merge_keeps_previous_result() {
        let dir = tempfile::tempdir().unwrap();
        let store = IntermediateStore::new(dir.path());
        fs::write(store.result_path("job"), "a: 1\n").unwrap();
        for r in 0..2 {
            store
                .write_records(&store.output_path("job", r), &[KeyValue::new("same", "1")])
                .unwrap();
        }

        assert!(merge_outputs(&store, "job", 2).is_err());
        assert_eq!(fs::read_to_string(store.result_path("job")).unwrap(), "a: 1\n");
    }

    #[test]
    fn missing_output_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = IntermediateStore::new(dir.path());
        assert!(merge_outputs(&store, "job", 1).is_err());
    }
}
