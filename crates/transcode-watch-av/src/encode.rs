//! Encoder command construction and execution.

use crate::rotation::Rotation;
use crate::{Error, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

/// A single baseline-H.264 transcode of one file.
#[derive(Debug, Clone)]
pub struct EncodeCommand {
    encoder: PathBuf,
    input: PathBuf,
    output: PathBuf,
    rotation: Rotation,
}

impl EncodeCommand {
    /// Create a command that encodes `input` into `output` with `encoder`.
    pub fn new(encoder: impl Into<PathBuf>, input: &Path, output: &Path, rotation: Rotation) -> Self {
        Self {
            encoder: encoder.into(),
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            rotation,
        }
    }

    /// ffmpeg rotates by the display matrix on its own unless told not to;
    /// avconv builds do not.
    fn autorotates(&self) -> bool {
        self.encoder
            .file_stem()
            .is_some_and(|stem| stem.to_string_lossy().eq_ignore_ascii_case("ffmpeg"))
    }

    /// Arguments passed to the encoder.
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();

        if self.autorotates() {
            args.push("-noautorotate".into());
        }

        args.push("-i".into());
        args.push(self.input.clone().into_os_string());

        // Overwrite any partial output left from an earlier attempt
        args.push("-y".into());

        args.extend(["-c:a", "copy"].map(OsString::from));
        args.extend(["-c:v", "h264", "-profile:v", "baseline"].map(OsString::from));
        args.extend(["-qscale", "1"].map(OsString::from));

        args.extend(self.rotation.filter_args().iter().map(OsString::from));

        args.push(self.output.clone().into_os_string());
        args
    }

    /// Human-readable command line for logs.
    pub fn command_line(&self) -> String {
        std::iter::once(self.encoder.as_os_str().to_os_string())
            .chain(self.args())
            .map(|a| a.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run the encoder to completion.
    pub fn run(&self) -> Result<()> {
        let tool = self.encoder.display().to_string();

        #[cfg(feature = "tracing")]
        tracing::debug!("Running encoder: {}", self.command_line());

        let status = Command::new(&self.encoder)
            .args(self.args())
            .status()
            .map_err(|e| Error::tool_failed(&tool, e.to_string()))?;

        if !status.success() {
            return Err(Error::tool_failed(tool, format!("exited with {}", status)));
        }

        Ok(())
    }
}
