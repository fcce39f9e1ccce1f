//! The watch-folder dispatcher.
//!
//! A single loop alternates between intake (claim new files from the input
//! directory by renaming them into staging and start a worker for each) and
//! reconciliation (poll workers without blocking and move or delete their
//! staged files once they exit), sleeping for a fixed delay in between.

pub mod jobs;
pub mod staging;
pub mod wake;

pub use jobs::{ActiveJobs, JobState, StagedJob};
pub use staging::StagingArea;
pub use wake::ChangeWaker;

use crate::config::DispatchConfig;
use crate::worker::WorkerCommand;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Tuning for the dispatch loop.
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    pub delay: Duration,
    pub max_procs: usize,
    pub worker_timeout: Option<Duration>,
    pub wake_on_change: bool,
    /// Lowercase extensions to accept; empty accepts every file.
    pub extensions: Vec<String>,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self::from(&DispatchConfig::default())
    }
}

impl From<&DispatchConfig> for DispatchOptions {
    fn from(config: &DispatchConfig) -> Self {
        Self {
            delay: Duration::try_from_secs_f64(config.delay_secs)
                .unwrap_or(Duration::from_secs(1)),
            max_procs: config.max_procs.max(1),
            worker_timeout: config.worker_timeout_secs.map(Duration::from_secs),
            wake_on_change: config.wake_on_change,
            extensions: config
                .extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }
}

/// Counts from one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub running: usize,
}

enum Outcome {
    Succeeded,
    Failed,
}

pub struct Dispatcher {
    input_dir: PathBuf,
    output_dir: PathBuf,
    staging: StagingArea,
    worker: WorkerCommand,
    options: DispatchOptions,
    active: ActiveJobs,
    input_reachable: bool,
}

impl Dispatcher {
    pub fn new(
        input_dir: impl Into<PathBuf>,
        work_dir: impl AsRef<Path>,
        output_dir: impl Into<PathBuf>,
        worker: WorkerCommand,
        options: DispatchOptions,
    ) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            staging: StagingArea::new(work_dir.as_ref()),
            worker,
            active: ActiveJobs::new(options.max_procs),
            options,
            input_reachable: true,
        }
    }

    /// Create the staging directories. See [`StagingArea::prepare`].
    pub fn prepare_staging(&self) -> bool {
        self.staging.prepare()
    }

    /// Number of workers not yet observed as finished.
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Claim pending files and start a worker for each, up to the
    /// concurrency limit. Returns how many files were claimed.
    pub fn intake(&mut self) -> usize {
        let entries = match std::fs::read_dir(&self.input_dir) {
            Ok(entries) => {
                if !self.input_reachable {
                    tracing::info!("Input directory {:?} is readable again", self.input_dir);
                    self.input_reachable = true;
                }
                entries
            }
            Err(e) => {
                // Logged once per outage; the loop keeps polling
                if self.input_reachable {
                    tracing::warn!("Cannot list input directory {:?}: {}", self.input_dir, e);
                    self.input_reachable = false;
                }
                return 0;
            }
        };

        let mut claimed = 0;

        for entry in entries {
            let Ok(entry) = entry else { continue };
            let name = entry.file_name();

            if is_hidden(&name) {
                continue;
            }

            if !self.active.has_capacity() {
                break;
            }

            if entry.file_type().is_ok_and(|t| t.is_dir()) {
                continue;
            }

            if !has_accepted_extension(&name, &self.options.extensions) {
                continue;
            }

            // A same-named file still being transcoded keeps its staging slot
            if self.active.contains(&name) {
                tracing::debug!(file = ?name, "Waiting for earlier job with the same name");
                continue;
            }

            if self.claim(entry.path(), name) {
                claimed += 1;
            }
        }

        claimed
    }

    fn claim(&mut self, pending: PathBuf, name: OsString) -> bool {
        let src = self.staging.src_path(&name);
        let dst = self.staging.dst_path(&name);
        let out = self.output_dir.join(&name);

        if let Err(e) = staging::safe_rename(&pending, &src) {
            tracing::debug!(file = ?name, "Skipping unclaimable file: {}", e);
            return false;
        }

        match self.worker.spawn(&src, &dst) {
            Ok(child) => {
                let job = StagedJob::new(name, src, dst, out, child);
                tracing::info!(file = ?job.name, pid = ?job.pid(), "Started transcode");
                self.active.insert(job);
                true
            }
            Err(e) => {
                tracing::error!(
                    file = ?name,
                    "Failed to start worker {:?}: {}",
                    self.worker.program(),
                    e
                );
                // Hand the file back so it is picked up once the worker is
                // fixed. A newer arrival under the same name wins; the staged
                // copy is then left behind as residue.
                if let Err(e) = staging::safe_rename_new(&src, &pending) {
                    tracing::warn!(file = ?name, "Could not return {:?} to input: {}", src, e);
                }
                false
            }
        }
    }

    /// Poll every active worker once and settle the ones that have exited.
    pub fn reconcile(&mut self) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();
        let mut finished: Vec<(OsString, Outcome)> = Vec::new();
        let timeout = self.options.worker_timeout;

        for job in self.active.iter_mut() {
            match job.poll() {
                JobState::Running => {
                    summary.running += 1;
                    if let Some(limit) = timeout {
                        if job.elapsed() >= limit && !job.kill_sent() {
                            tracing::warn!(
                                file = ?job.name,
                                pid = ?job.pid(),
                                "Worker exceeded {:?}, killing it",
                                limit
                            );
                            if let Err(e) = job.kill() {
                                tracing::warn!(file = ?job.name, "Failed to kill worker: {}", e);
                            }
                        }
                    }
                }
                JobState::Exited(status) if status.success() => {
                    finished.push((job.name.clone(), Outcome::Succeeded));
                }
                JobState::Exited(status) => {
                    tracing::warn!(file = ?job.name, %status, "Transcode failed");
                    finished.push((job.name.clone(), Outcome::Failed));
                }
                JobState::Lost(e) => {
                    tracing::warn!(file = ?job.name, "Lost track of worker: {}", e);
                    finished.push((job.name.clone(), Outcome::Failed));
                }
            }
        }

        for (name, outcome) in finished {
            let Some(job) = self.active.remove(&name) else {
                continue;
            };
            match outcome {
                Outcome::Succeeded => {
                    summary.succeeded += 1;
                    complete(&job);
                }
                Outcome::Failed => {
                    summary.failed += 1;
                    discard(&job);
                }
            }
        }

        summary
    }

    /// Run intake and reconciliation until `cancel` fires.
    ///
    /// Workers still running at that point are left running.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut waker = if self.options.wake_on_change {
            match ChangeWaker::watch(&self.input_dir) {
                Ok(waker) => Some(waker),
                Err(e) => {
                    tracing::warn!("Falling back to plain polling: {:#}", e);
                    None
                }
            }
        } else {
            None
        };

        tracing::info!(
            "Dispatching {:?} -> {:?} (staging {:?}, max {} workers, delay {:?})",
            self.input_dir,
            self.output_dir,
            self.staging.root(),
            self.active.limit(),
            self.options.delay
        );

        loop {
            let claimed = self.intake();
            let summary = self.reconcile();

            if claimed > 0 || summary.succeeded > 0 || summary.failed > 0 {
                tracing::debug!(
                    claimed,
                    succeeded = summary.succeeded,
                    failed = summary.failed,
                    active = self.active.len(),
                    "Iteration complete"
                );
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.options.delay) => {}
                _ = wait_for_change(&mut waker) => {}
            }
        }

        if !self.active.is_empty() {
            tracing::info!(
                "Dispatcher stopped with {} transcodes still running",
                self.active.len()
            );
        }
    }
}

async fn wait_for_change(waker: &mut Option<ChangeWaker>) {
    match waker {
        Some(waker) => waker.changed().await,
        None => std::future::pending().await,
    }
}

/// Move the worker's output into place and drop the claimed source.
fn complete(job: &StagedJob) {
    match staging::safe_rename(&job.dst, &job.out) {
        Ok(()) => tracing::info!(file = ?job.name, "Transcode finished: {:?}", job.out),
        Err(e) => tracing::warn!(
            file = ?job.name,
            "Worker succeeded but {:?} could not be moved to {:?}: {}",
            job.dst,
            job.out,
            e
        ),
    }

    if let Err(e) = staging::safe_remove(&job.src) {
        tracing::warn!(file = ?job.name, "Failed to remove staged source {:?}: {}", job.src, e);
    }
}

/// Remove both staged files of a failed job. Each removal is attempted
/// regardless of the other.
fn discard(job: &StagedJob) {
    if let Err(e) = staging::safe_remove(&job.dst) {
        tracing::warn!(file = ?job.name, "Failed to remove staged output {:?}: {}", job.dst, e);
    }
    if let Err(e) = staging::safe_remove(&job.src) {
        tracing::warn!(file = ?job.name, "Failed to remove staged source {:?}: {}", job.src, e);
    }
}

/// Dot-files are never candidates.
pub fn is_hidden(name: &OsStr) -> bool {
    name.as_encoded_bytes().first() == Some(&b'.')
}

fn has_accepted_extension(name: &OsStr, extensions: &[String]) -> bool {
    if extensions.is_empty() {
        return true;
    }

    Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| extensions.iter().any(|e| *e == ext))
}
