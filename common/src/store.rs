//! Naming convention and staging directory for the files that carry
//! records between phases.
//!
//! Every file name is a pure function of the job name and task indices, so
//! a map task and the reduce tasks reading its output agree on names without
//! any coordination:
//!
//! - `mrtmp.<job>-<map>-<reduce>`: records map task `map` routed to bucket `reduce`.
//! - `mrtmp.<job>-res-<reduce>`: output of reduce task `reduce`.
//! - `mrtmp.<job>`: merged result of the whole job.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::{codec, KeyValue};

#[derive(Debug, Clone)]
pub struct IntermediateStore {
    root: PathBuf,
}

impl IntermediateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding what map task `map_task` produced for reduce task `reduce_task`.
    pub fn partition_path(&self, job_name: &str, map_task: u32, reduce_task: u32) -> PathBuf {
        self.root
            .join(format!("mrtmp.{job_name}-{map_task}-{reduce_task}"))
    }

    /// Output file of reduce task `reduce_task`.
    pub fn output_path(&self, job_name: &str, reduce_task: u32) -> PathBuf {
        self.root.join(format!("mrtmp.{job_name}-res-{reduce_task}"))
    }

    /// Merged result of the whole job.
    pub fn result_path(&self, job_name: &str) -> PathBuf {
        self.root.join(format!("mrtmp.{job_name}"))
    }

    /// Replace the file at `path` with `records`.
    ///
    /// Records go to a temporary file in the store directory which is then
    /// renamed over `path`, so readers either see a previous complete file
    /// or the new complete one.
    pub fn write_records(&self, path: &Path, records: &[KeyValue]) -> Result<()> {
        self.write_atomic(path, |mut writer| codec::write_records(&mut writer, records))?;
        debug!("Wrote {} records to {}", records.len(), path.display());
        Ok(())
    }

    /// Replace the file at `path` with whatever `fill` writes.
    ///
    /// Same guarantee as [`write_records`](Self::write_records): if `fill`
    /// fails, the file at `path` is left untouched.
    pub fn write_atomic<F>(&self, path: &Path, fill: F) -> Result<()>
    where
        F: FnOnce(&mut dyn Write) -> Result<()>,
    {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("failed to create store directory {}", self.root.display()))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)
            .with_context(|| format!("failed to create temporary file in {}", self.root.display()))?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            fill(&mut writer)?;
            writer.flush()?;
        }
        tmp.persist(path)
            .map_err(|e| e.error)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    /// Read every record of the file at `path`.
    pub fn read_records(&self, path: &Path) -> Result<Vec<KeyValue>> {
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        codec::read_records(BufReader::new(file))
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("failed to decode {}", path.display()))
    }

    /// Remove every partition file of a job.
    pub fn remove_intermediate(&self, job_name: &str, n_map: u32, n_reduce: u32) -> Result<()> {
        for map_task in 0..n_map {
            for reduce_task in 0..n_reduce {
                remove_if_exists(&self.partition_path(job_name, map_task, reduce_task))?;
            }
        }
        Ok(())
    }

    /// Remove every file of a job: partitions, reduce outputs and the merged result.
    pub fn remove_all(&self, job_name: &str, n_map: u32, n_reduce: u32) -> Result<()> {
        self.remove_intermediate(job_name, n_map, n_reduce)?;
        for reduce_task in 0..n_reduce {
            remove_if_exists(&self.output_path(job_name, reduce_task))?;
        }
        remove_if_exists(&self.result_path(job_name))
    }
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("failed to remove {}", path.display())),
    }
}
