//! Rotation metadata probing.
//!
//! Phone recordings store their orientation as a `Rotation` tag rather than
//! rotated pixels. The tag is read with exiftool and turned into a video
//! filter that bakes the orientation into the encoded frames.

use crate::{Error, Result};
use regex::Regex;
use std::path::Path;
use std::process::Command;
use std::sync::LazyLock;

static ROTATION_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Rotation\s*:\s*(\d+)").expect("valid rotation regex"));

/// Clockwise rotation recorded in a file's metadata, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rotation(pub u32);

impl Rotation {
    /// Video filter arguments that compensate for this rotation.
    ///
    /// Angles other than the four right angles get no filter.
    pub fn filter_args(&self) -> &'static [&'static str] {
        match self.0 {
            90 => &["-vf", "transpose=1"],
            180 => &["-vf", "vflip,hflip"],
            270 => &["-vf", "transpose=3"],
            _ => &[],
        }
    }
}

impl std::fmt::Display for Rotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parse the output of `exiftool -Rotation <file>`.
pub fn parse_rotation(output: &str) -> Result<Rotation> {
    let captures = ROTATION_TAG
        .captures(output)
        .ok_or_else(|| Error::parse_error("exiftool", "Rotation metadata not found"))?;

    captures[1]
        .parse::<u32>()
        .map(Rotation)
        .map_err(|e| Error::parse_error("exiftool", format!("invalid rotation: {}", e)))
}

/// Read the rotation of `input` using the given exiftool executable.
pub fn probe_rotation(exiftool: &Path, input: &Path) -> Result<Rotation> {
    if !input.exists() {
        return Err(Error::file_not_found(input));
    }

    let output = Command::new(exiftool)
        .arg("-Rotation")
        .arg(input)
        .output()
        .map_err(|e| Error::tool_failed("exiftool", e.to_string()))?;

    if !output.status.success() {
        return Err(Error::tool_failed(
            "exiftool",
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    parse_rotation(&String::from_utf8_lossy(&output.stdout))
}
