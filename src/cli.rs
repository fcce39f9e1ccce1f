use clap::Parser;
use std::path::PathBuf;
use transcode_watch::config::Config;

#[derive(Parser)]
#[command(name = "transcode-watch")]
#[command(author, version, about = "Watch a folder and transcode videos")]
pub struct Cli {
    /// Input path
    pub in_dir: PathBuf,

    /// Intermediate work path
    pub work_dir: PathBuf,

    /// Output path
    pub out_dir: PathBuf,

    /// Delay between iterations in seconds [default: 1.0]
    #[arg(long)]
    pub delay: Option<f64>,

    /// Number of transcoding processes that can be active [default: 32]
    #[arg(long)]
    pub maxprocs: Option<usize>,

    /// Worker program to run for each file
    #[arg(long)]
    pub worker: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded config.
    pub fn apply(&self, config: &mut Config) {
        if let Some(delay) = self.delay {
            config.dispatch.delay_secs = delay;
        }
        if let Some(maxprocs) = self.maxprocs {
            config.dispatch.max_procs = maxprocs;
        }
        if let Some(ref worker) = self.worker {
            config.worker.program = Some(worker.clone());
            config.worker.args.clear();
        }
    }
}
