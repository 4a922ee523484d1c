use std::fmt;

use anyhow::{bail, Context, Result};

use crate::task::{Phase, Task};
use crate::Workload;

/// State of the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Job not started.
    Pending,

    /// Mapping phase.
    Mapping,

    /// Reducing phase.
    Reducing,

    /// Job completed.
    Completed,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Pending => "pending",
            JobState::Mapping => "mapping",
            JobState::Reducing => "reducing",
            JobState::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// A MapReduce job: named input documents, a reduce-task count and the
/// application that processes them.
#[derive(Debug, Clone)]
pub struct Job {
    name: String,
    files: Vec<String>,
    n_reduce: u32,
    workload: Workload,
}

impl Job {
    /// Create a job, rejecting inputs that could never complete.
    pub fn new(
        name: impl Into<String>,
        files: Vec<String>,
        n_reduce: u32,
        workload: Workload,
    ) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            bail!("job name must not be empty");
        }
        if name.contains(['/', '\\']) {
            bail!("job name `{name}` must not contain a path separator");
        }
        if files.is_empty() {
            bail!("job `{name}` has no input documents");
        }
        if n_reduce == 0 {
            bail!("job `{name}` needs at least one reduce task");
        }
        if u32::try_from(files.len()).is_err() {
            bail!("job `{name}` has too many input documents");
        }

        Ok(Self {
            name,
            files,
            n_reduce,
            workload,
        })
    }

    /// Create a job whose documents are every file matched by `patterns`,
    /// in pattern order then path order.
    pub fn from_globs(
        name: impl Into<String>,
        patterns: &[String],
        n_reduce: u32,
        workload: Workload,
    ) -> Result<Self> {
        let mut files = Vec::new();
        for pattern in patterns {
            let mut matched = 0;
            for entry in glob::glob(pattern).with_context(|| format!("bad input pattern `{pattern}`"))? {
                let path = entry?;
                if path.is_file() {
                    files.push(path.to_string_lossy().into_owned());
                    matched += 1;
                }
            }
            if matched == 0 {
                bail!("input pattern `{pattern}` matched no files");
            }
        }
        Self::new(name, files, n_reduce, workload)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn workload(&self) -> &Workload {
        &self.workload
    }

    /// Number of map tasks, one per document.
    pub fn n_map(&self) -> u32 {
        self.files.len() as u32
    }

    /// Number of reduce tasks.
    pub fn n_reduce(&self) -> u32 {
        self.n_reduce
    }

    /// Number of tasks in `phase`.
    pub fn n_tasks(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Map => self.n_map(),
            Phase::Reduce => self.n_reduce,
        }
    }

    /// Describe task `index` of `phase`.
    ///
    /// # Panics
    /// Panics if `index` is out of range for the phase.
    pub fn task(&self, phase: Phase, index: u32) -> Task {
        match phase {
            Phase::Map => Task::map(
                self.name.as_str(),
                index,
                self.files[index as usize].as_str(),
                self.n_reduce,
            ),
            Phase::Reduce => Task::reduce(self.name.as_str(), index, self.n_map()),
        }
    }
}
