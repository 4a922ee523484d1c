use std::fmt;

use anyhow::{anyhow, Result};

use crate::store::IntermediateStore;
use crate::{map, reduce, Workload};

/// The two phases of a job. Map always fully precedes reduce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Map,
    Reduce,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Map => f.write_str("map"),
            Phase::Reduce => f.write_str("reduce"),
        }
    }
}

/// One schedulable unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub job_name: String,
    pub phase: Phase,
    pub index: u32,

    /// Input document. Only set for map tasks.
    pub file: Option<String>,

    /// For a map task the number of reduce tasks, for a reduce task the
    /// number of map tasks.
    pub num_other: u32,
}

impl Task {
    pub fn map(job_name: impl Into<String>, index: u32, file: impl Into<String>, n_reduce: u32) -> Self {
        Self {
            job_name: job_name.into(),
            phase: Phase::Map,
            index,
            file: Some(file.into()),
            num_other: n_reduce,
        }
    }

    pub fn reduce(job_name: impl Into<String>, index: u32, n_map: u32) -> Self {
        Self {
            job_name: job_name.into(),
            phase: Phase::Reduce,
            index,
            file: None,
            num_other: n_map,
        }
    }

    /// Run the task to completion in the calling thread.
    pub fn execute(&self, workload: &Workload, store: &IntermediateStore) -> Result<()> {
        match self.phase {
            Phase::Map => {
                let file = self
                    .file
                    .as_deref()
                    .ok_or_else(|| anyhow!("map task {} has no input file", self.index))?;
                map::perform_map(
                    store,
                    &self.job_name,
                    self.index,
                    file,
                    self.num_other,
                    workload.map_fn,
                )
            }
            Phase::Reduce => reduce::perform_reduce(
                store,
                &self.job_name,
                self.index,
                self.num_other,
                workload.reduce_fn,
            ),
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} task #{}", self.job_name, self.phase, self.index)
    }
}
