use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// The host for the server to bind.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// The port for the server to run on.
    #[arg(short, long, default_value = "8030")]
    pub port: u16,

    /// Name of the job. Intermediate and output files are named after it.
    #[arg(short, long, default_value = "mr")]
    pub job_name: String,

    /// Number of reduce tasks.
    #[arg(short, long, default_value = "3")]
    pub reduce_tasks: u32,

    /// Name of the workload to run.
    #[arg(short, long, default_value = "wc")]
    pub workload: String,

    /// Directory for intermediate and output files, shared with the workers.
    #[arg(short = 'd', long, default_value = ".")]
    pub work_dir: PathBuf,

    /// Keep the map tasks' partition files once the job is done.
    #[arg(long)]
    pub keep_intermediate: bool,

    /// Glob patterns for the input files.
    #[arg(required = true)]
    pub inputs: Vec<String>,
}
