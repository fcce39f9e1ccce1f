//! Launching the external transcode worker.
//!
//! The dispatcher knows nothing about how a worker transcodes. It runs the
//! program with the staged source and destination paths as its final two
//! arguments and later reads back only the exit status.

use crate::config::WorkerConfig;
use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::{Child, Command};

/// Name of the worker binary shipped with the dispatcher.
pub const DEFAULT_WORKER: &str = "transcode-worker";

#[derive(Debug, Clone)]
pub struct WorkerCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl WorkerCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Arguments placed before the source and destination paths.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Find the worker to run.
    ///
    /// A configured program is looked up on PATH (or checked in place when it
    /// is a path). Otherwise the `transcode-worker` binary installed next to
    /// the running executable is preferred over one on PATH, and is handed
    /// `config_file` so it reads the same `[encoder]` settings.
    pub fn resolve(config: &WorkerConfig, config_file: Option<&Path>) -> Result<Self> {
        let mut args = Vec::new();

        let program = match &config.program {
            Some(program) => which::which(program)
                .with_context(|| format!("Worker program not found: {:?}", program))?,
            None => {
                if let Some(path) = config_file {
                    args.push(OsString::from("--config"));
                    args.push(path.as_os_str().to_owned());
                }
                default_worker()?
            }
        };

        args.extend(config.args.iter().map(OsString::from));

        Ok(Self { program, args })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Start a worker for one staged file without waiting for it.
    ///
    /// The child is not killed when its handle is dropped, so workers outlive
    /// a dispatcher that exits. On unix each worker leads its own process
    /// group, so the encoder it launches can be killed along with it.
    pub fn spawn(&self, src: &Path, dst: &Path) -> std::io::Result<Child> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(src)
            .arg(dst)
            .stdin(Stdio::null())
            .kill_on_drop(false);

        #[cfg(unix)]
        command.process_group(0);

        command.spawn()
    }
}

fn default_worker() -> Result<PathBuf> {
    let file_name = format!("{}{}", DEFAULT_WORKER, std::env::consts::EXE_SUFFIX);

    if let Ok(exe) = std::env::current_exe() {
        let sibling = exe.with_file_name(&file_name);
        if sibling.is_file() {
            return Ok(sibling);
        }
    }

    which::which(DEFAULT_WORKER).with_context(|| {
        format!(
            "Could not find {} next to this executable or on PATH; set [worker] program or pass --worker",
            DEFAULT_WORKER
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_missing_program() {
        let config = WorkerConfig {
            program: Some(PathBuf::from("/nonexistent/worker-12345")),
            args: Vec::new(),
        };
        let err = WorkerCommand::resolve(&config, None).unwrap_err();
        assert!(err.to_string().contains("Worker program not found"));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_program_on_path() {
        let config = WorkerConfig {
            program: Some(PathBuf::from("sh")),
            args: vec!["worker.sh".to_string()],
        };
        let worker = WorkerCommand::resolve(&config, Some(Path::new("my.toml"))).unwrap();
        assert!(worker.program().is_absolute());
        // Only the bundled worker understands --config
        assert_eq!(worker.args, vec![OsString::from("worker.sh")]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_spawn_passes_paths_last() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("args.txt");
        let script = format!("printf '%s\\n' \"$@\" > {:?}", out);

        let worker = WorkerCommand::new("sh").with_args(["-c", script.as_str(), "worker"]);
        let status = worker
            .spawn(Path::new("/work/src/a.mov"), Path::new("/work/dst/a.mov"))
            .unwrap()
            .wait()
            .await
            .unwrap();

        assert!(status.success());
        let args = std::fs::read_to_string(&out).unwrap();
        assert_eq!(args, "/work/src/a.mov\n/work/dst/a.mov\n");
    }
}
