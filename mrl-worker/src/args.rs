use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// The address of the master server
    #[arg(short = 'j', long = "join", default_value = "http://127.0.0.1:8030")]
    pub master: String,

    /// The host to run the worker on.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// The port to run the worker on. 0 picks a free one.
    #[arg(short, long, default_value = "0")]
    pub port: u16,

    /// Name of the workload to run. Must match the master's.
    #[arg(short, long, default_value = "wc")]
    pub workload: String,

    /// Directory shared with the master for intermediate and output files.
    #[arg(short = 'd', long, default_value = ".")]
    pub work_dir: PathBuf,

    /// Exit after completing this many tasks.
    #[arg(long)]
    pub max_tasks: Option<u32>,

    /// Milliseconds between registration attempts.
    #[arg(long, default_value = "500")]
    pub retry_interval_ms: u64,
}
