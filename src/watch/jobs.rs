use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::{Duration, Instant};
use tokio::process::Child;

/// A claimed file and the worker transcoding it.
#[derive(Debug)]
pub struct StagedJob {
    pub name: OsString,
    /// Claimed source, under the staging `src` directory
    pub src: PathBuf,
    /// Worker output, under the staging `dst` directory
    pub dst: PathBuf,
    /// Final location in the output directory
    pub out: PathBuf,
    child: Child,
    started: Instant,
    kill_sent: bool,
}

/// What a non-blocking check of a worker found.
#[derive(Debug)]
pub enum JobState {
    Running,
    Exited(ExitStatus),
    /// The OS could not report on the child at all.
    Lost(std::io::Error),
}

impl StagedJob {
    pub fn new(name: OsString, src: PathBuf, dst: PathBuf, out: PathBuf, child: Child) -> Self {
        Self {
            name,
            src,
            dst,
            out,
            child,
            started: Instant::now(),
            kill_sent: false,
        }
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Check the worker without waiting for it.
    pub fn poll(&mut self) -> JobState {
        match self.child.try_wait() {
            Ok(None) => JobState::Running,
            Ok(Some(status)) => JobState::Exited(status),
            Err(e) => JobState::Lost(e),
        }
    }

    /// Ask the OS to kill the worker once. Its exit is picked up by a later
    /// poll like any other.
    ///
    /// On unix the whole process group goes, so an encoder started by the
    /// worker cannot write into staging after the job is discarded.
    pub fn kill(&mut self) -> std::io::Result<()> {
        if self.kill_sent {
            return Ok(());
        }
        self.kill_sent = true;

        #[cfg(unix)]
        if let Some(pid) = self.child.id() {
            use nix::sys::signal::{killpg, Signal};
            use nix::unistd::Pid;

            match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
                Ok(()) => return Ok(()),
                // Group already gone; fall through to the direct kill
                Err(nix::errno::Errno::ESRCH) => {}
                Err(e) => return Err(e.into()),
            }
        }

        self.child.start_kill()
    }

    pub fn kill_sent(&self) -> bool {
        self.kill_sent
    }
}

/// In-flight jobs keyed by filename.
///
/// Owned by the dispatcher loop alone. Admission is gated by
/// [`ActiveJobs::has_capacity`], so the set never grows past its limit.
#[derive(Debug)]
pub struct ActiveJobs {
    jobs: HashMap<OsString, StagedJob>,
    limit: usize,
}

impl ActiveJobs {
    pub fn new(limit: usize) -> Self {
        Self {
            jobs: HashMap::with_capacity(limit),
            limit,
        }
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn has_capacity(&self) -> bool {
        self.jobs.len() < self.limit
    }

    pub fn contains(&self, name: &OsStr) -> bool {
        self.jobs.contains_key(name)
    }

    pub fn insert(&mut self, job: StagedJob) {
        debug_assert!(self.has_capacity());
        debug_assert!(!self.contains(&job.name));
        self.jobs.insert(job.name.clone(), job);
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut StagedJob> {
        self.jobs.values_mut()
    }

    pub fn remove(&mut self, name: &OsStr) -> Option<StagedJob> {
        self.jobs.remove(name)
    }
}
