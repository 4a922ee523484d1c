use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about = "Run a MapReduce job in a single process", long_about = None)]
pub struct Args {
    /// Name of the job. Intermediate and output files are named after it.
    #[arg(short, long, default_value = "mr")]
    pub job_name: String,

    /// Number of reduce tasks.
    #[arg(short, long, default_value = "3")]
    pub reduce_tasks: u32,

    /// Name of the workload to run.
    #[arg(short, long, default_value = "wc")]
    pub workload: String,

    /// Directory for intermediate and output files.
    #[arg(short = 'd', long, default_value = ".")]
    pub work_dir: PathBuf,

    /// Keep intermediate files once the job is done.
    #[arg(long)]
    pub keep_intermediate: bool,

    /// Glob patterns for the input files.
    #[arg(required = true)]
    pub inputs: Vec<String>,
}
