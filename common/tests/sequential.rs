use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use common::map::perform_map;
use common::merge::merge_outputs;
use common::sequential::run_sequential;
use common::{IntermediateStore, Job, KeyValue};

fn write_docs(dir: &Path, docs: &[(&str, &str)]) -> Vec<String> {
    docs.iter()
        .map(|(name, text)| {
            let path = dir.join(name);
            fs::write(&path, text).unwrap();
            path.to_string_lossy().into_owned()
        })
        .collect()
}

/// Every (key, value) of every reduce output, with the bucket it came from.
fn outputs(store: &IntermediateStore, job: &Job) -> Vec<(u32, KeyValue)> {
    (0..job.n_reduce())
        .flat_map(|r| {
            store
                .read_records(&store.output_path(job.name(), r))
                .unwrap()
                .into_iter()
                .map(move |kv| (r, kv))
        })
        .collect()
}

#[test]
fn inverted_index_example() {
    let dir = tempfile::tempdir().unwrap();
    let files = write_docs(dir.path(), &[("doc1", "a b a"), ("doc2", "b c")]);
    let (doc1, doc2) = (files[0].clone(), files[1].clone());

    let job = Job::new("ii", files, 2, workload::named("ii").unwrap()).unwrap();
    let store = IntermediateStore::new(dir.path().join("work"));
    run_sequential(&job, &store).unwrap();

    let results: BTreeMap<String, String> = outputs(&store, &job)
        .into_iter()
        .map(|(_, kv)| (kv.key, kv.value))
        .collect();
    let expected: BTreeMap<String, String> = [
        ("a".to_string(), format!("1 {doc1}")),
        ("b".to_string(), format!("2 {doc1},{doc2}")),
        ("c".to_string(), format!("1 {doc2}")),
    ]
    .into_iter()
    .collect();
    assert_eq!(results, expected);

    let merged = fs::read_to_string(store.result_path("ii")).unwrap();
    assert_eq!(
        merged,
        format!("a: 1 {doc1}\nb: 2 {doc1},{doc2}\nc: 1 {doc2}\n")
    );
}

#[test]
fn output_keys_match_mapper_keys_for_any_r() {
    let dir = tempfile::tempdir().unwrap();
    let files = write_docs(
        dir.path(),
        &[
            ("one", "the quick brown fox jumps over the lazy dog"),
            ("two", "The dog barks; the fox runs."),
            ("three", ""),
            ("four", "zebra apple Zebra apple"),
        ],
    );

    let mut emitted = BTreeSet::new();
    for file in &files {
        let text = fs::read_to_string(file).unwrap();
        let kvs = workload::wc::map(KeyValue::new(file.as_str(), text)).unwrap();
        for kv in kvs {
            emitted.insert(kv.unwrap().key);
        }
    }

    for n_reduce in 1..=5 {
        let store = IntermediateStore::new(dir.path().join(format!("r{n_reduce}")));
        let job = Job::new("wc", files.clone(), n_reduce, workload::named("wc").unwrap()).unwrap();
        run_sequential(&job, &store).unwrap();

        let all = outputs(&store, &job);
        let keys: BTreeSet<String> = all.iter().map(|(_, kv)| kv.key.clone()).collect();
        assert_eq!(keys, emitted, "R = {n_reduce}");
        // No key is produced twice, and each one lands in its own bucket.
        assert_eq!(keys.len(), all.len());
        for (bucket, kv) in &all {
            assert_eq!(common::partition(&kv.key, n_reduce), *bucket);
        }
    }
}

#[test]
fn word_counts_are_exact() {
    let dir = tempfile::tempdir().unwrap();
    let files = write_docs(dir.path(), &[("x", "a a b"), ("y", "b a c")]);
    let store = IntermediateStore::new(dir.path());
    let job = Job::new("counts", files, 3, workload::named("wc").unwrap()).unwrap();

    let result = run_sequential(&job, &store).unwrap();
    assert_eq!(fs::read_to_string(result).unwrap(), "a: 3\nb: 2\nc: 1\n");
}

#[test]
fn map_rerun_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let files = write_docs(dir.path(), &[("doc", "one two three two one one")]);
    let wc = workload::named("wc").unwrap();
    let store = IntermediateStore::new(dir.path().join("work"));

    // A crashed attempt left a stale, partial file behind.
    fs::create_dir_all(store.root()).unwrap();
    fs::write(store.partition_path("idem", 0, 1), "{\"key\":\"stale\",\"value\":\"1\"}\n{\"ke").unwrap();

    perform_map(&store, "idem", 0, &files[0], 3, wc.map_fn).unwrap();
    let first: Vec<Vec<u8>> = (0..3)
        .map(|r| fs::read(store.partition_path("idem", 0, r)).unwrap())
        .collect();

    perform_map(&store, "idem", 0, &files[0], 3, wc.map_fn).unwrap();
    let second: Vec<Vec<u8>> = (0..3)
        .map(|r| fs::read(store.partition_path("idem", 0, r)).unwrap())
        .collect();

    assert_eq!(first, second);
    let all: Vec<KeyValue> = (0..3)
        .flat_map(|r| store.read_records(&store.partition_path("idem", 0, r)).unwrap())
        .collect();
    assert_eq!(all.len(), 6);
    assert!(all.iter().all(|kv| kv.key != "stale"));
}

#[test]
fn merge_after_sequential_matches_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let files = write_docs(dir.path(), &[("g", "1 2\n2 3\n3 1\n1 4\n")]);
    let store = IntermediateStore::new(dir.path().join("work"));
    let job = Job::new("deg", files, 2, workload::named("vertex-degree").unwrap()).unwrap();
    run_sequential(&job, &store).unwrap();

    let merged = fs::read_to_string(merge_outputs(&store, "deg", 2).unwrap()).unwrap();
    assert_eq!(
        merged,
        "1: 1, deg=3\n2: 2, deg=2\n3: 3, deg=2\n4: 4, deg=1\n"
    );
}

#[test]
fn non_utf8_input_still_counts() {
    let dir = tempfile::tempdir().unwrap();
    let doc = dir.path().join("latin1");
    fs::write(&doc, b"caf\xe9 au lait").unwrap();
    let store = IntermediateStore::new(dir.path().join("work"));
    let job = Job::new(
        "latin1",
        vec![doc.to_string_lossy().into_owned()],
        2,
        workload::named("wc").unwrap(),
    )
    .unwrap();

    let result = run_sequential(&job, &store).unwrap();
    assert_eq!(fs::read_to_string(result).unwrap(), "au: 1\ncaf: 1\nlait: 1\n");
}
