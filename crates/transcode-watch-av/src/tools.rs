//! External tool detection.

use crate::{Error, Result};
use std::path::PathBuf;
use std::process::Command;

/// Information about an external tool.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    /// Name of the tool.
    pub name: String,
    /// Whether the tool is available.
    pub available: bool,
    /// Version string if available.
    pub version: Option<String>,
    /// Path to the tool executable.
    pub path: Option<PathBuf>,
}

/// Check if a tool is available using the given version argument.
///
/// # Example
///
/// ```no_run
/// use transcode_watch_av::check_tool;
///
/// let info = check_tool("ffmpeg", "-version");
/// if info.available {
///     println!("ffmpeg version: {:?}", info.version);
/// }
/// ```
pub fn check_tool(name: &str, version_arg: &str) -> ToolInfo {
    let result = Command::new(name).arg(version_arg).output();

    match result {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .map(|s| s.trim().to_string());

            let path = which::which(name).ok();

            ToolInfo {
                name: name.to_string(),
                available: true,
                version,
                path,
            }
        }
        _ => ToolInfo {
            name: name.to_string(),
            available: false,
            version: None,
            path: None,
        },
    }
}

/// Check the tools the transcode step shells out to.
///
/// `exiftool` takes `-ver` rather than `--version`; every ffmpeg-style encoder
/// takes `-version`.
pub fn check_tools(encoder: &str, exiftool: &str) -> Vec<ToolInfo> {
    vec![check_tool(encoder, "-version"), check_tool(exiftool, "-ver")]
}

/// Require that a tool is available, returning its path.
///
/// # Errors
///
/// Returns an error if the tool is not found.
pub fn require_tool(name: &str) -> Result<PathBuf> {
    which::which(name).map_err(|_| Error::tool_not_found(name))
}
