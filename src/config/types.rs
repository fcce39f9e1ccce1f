use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    pub worker: WorkerConfig,

    #[serde(default)]
    pub encoder: EncoderConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DispatchConfig {
    /// Delay between poll iterations in seconds (default: 1.0)
    #[serde(default = "default_delay_secs")]
    pub delay_secs: f64,

    /// Maximum number of transcode workers running at once (default: 32)
    #[serde(default = "default_max_procs")]
    pub max_procs: usize,

    /// Kill a worker that runs longer than this. Unset means no limit.
    #[serde(default)]
    pub worker_timeout_secs: Option<u64>,

    /// Wake the poll loop early when something lands in the input directory
    #[serde(default)]
    pub wake_on_change: bool,

    /// Only claim files with one of these extensions (empty = any file)
    #[serde(default)]
    pub extensions: Vec<String>,
}

fn default_delay_secs() -> f64 {
    1.0
}

fn default_max_procs() -> usize {
    32
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            delay_secs: default_delay_secs(),
            max_procs: default_max_procs(),
            worker_timeout_secs: None,
            wake_on_change: false,
            extensions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WorkerConfig {
    /// Worker executable. Defaults to the `transcode-worker` binary installed
    /// alongside the dispatcher, then to `transcode-worker` on PATH.
    #[serde(default)]
    pub program: Option<PathBuf>,

    /// Arguments placed before the source and destination paths, e.g. the
    /// script name when `program` is an interpreter.
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EncoderConfig {
    #[serde(default = "default_encoder")]
    pub program: PathBuf,

    #[serde(default = "default_exiftool")]
    pub exiftool: PathBuf,
}

fn default_encoder() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_exiftool() -> PathBuf {
    PathBuf::from("exiftool")
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            program: default_encoder(),
            exiftool: default_exiftool(),
        }
    }
}
