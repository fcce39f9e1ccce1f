//! Shared fixtures for dispatcher integration tests.
//!
//! [`TestDirs`] lays out input, work and output directories in a temp dir.
//! Workers are shell scripts run through `sh`, so the tests need a unix
//! shell but no encoder.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;
use transcode_watch::watch::{DispatchOptions, Dispatcher, ReconcileSummary};
use transcode_watch::worker::WorkerCommand;

/// Copies the source to the destination.
pub const SUCCEED: &str = r#"cp "$1" "$2""#;

/// Writes partial output, then fails.
pub const FAIL: &str = r#"echo partial > "$2"; exit 3"#;

/// Exits successfully without writing any output.
pub const SUCCEED_WITHOUT_OUTPUT: &str = "exit 0";

/// Runs far longer than any test.
pub const HANG: &str = "sleep 30";

pub struct TestDirs {
    pub root: TempDir,
    pub input: PathBuf,
    pub work: PathBuf,
    pub output: PathBuf,
}

impl TestDirs {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("failed to create temp dir");
        let input = root.path().join("in");
        let work = root.path().join("work");
        let output = root.path().join("out");
        for dir in [&input, &work, &output] {
            std::fs::create_dir(dir).expect("failed to create test dir");
        }
        Self {
            root,
            input,
            work,
            output,
        }
    }

    /// Drop a file into the input directory.
    pub fn arrive(&self, name: &str) -> PathBuf {
        let path = self.input.join(name);
        std::fs::write(&path, format!("contents of {name}")).expect("failed to write input");
        path
    }

    /// Write `body` as a worker script and return a command that runs it.
    pub fn worker(&self, body: &str) -> WorkerCommand {
        let script = self.root.path().join("worker.sh");
        std::fs::write(&script, body).expect("failed to write worker script");
        WorkerCommand::new("sh").with_args([script])
    }

    pub fn dispatcher(&self, body: &str, max_procs: usize) -> Dispatcher {
        let options = DispatchOptions {
            delay: Duration::from_millis(20),
            max_procs,
            ..DispatchOptions::default()
        };
        self.dispatcher_with(self.worker(body), options)
    }

    pub fn dispatcher_with(&self, worker: WorkerCommand, options: DispatchOptions) -> Dispatcher {
        let dispatcher = Dispatcher::new(&self.input, &self.work, &self.output, worker, options);
        assert!(dispatcher.prepare_staging());
        dispatcher
    }

    pub fn src(&self) -> PathBuf {
        self.work.join("src")
    }

    pub fn dst(&self) -> PathBuf {
        self.work.join("dst")
    }
}

/// Names of the entries in `dir`, sorted.
pub fn list(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("failed to list dir")
        .map(|e| e.expect("bad entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Reconcile until no workers remain, returning the combined counts.
pub async fn drain(dispatcher: &mut Dispatcher) -> ReconcileSummary {
    let mut total = ReconcileSummary::default();
    for _ in 0..500 {
        let summary = dispatcher.reconcile();
        total.succeeded += summary.succeeded;
        total.failed += summary.failed;
        if dispatcher.active_len() == 0 {
            return total;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("workers did not finish in time");
}
