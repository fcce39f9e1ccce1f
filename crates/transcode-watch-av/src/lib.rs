//! # transcode-watch-av
//!
//! The transcode step run by each `transcode-worker` process.
//!
//! This crate provides functionality for:
//! - Reading rotation metadata with exiftool
//! - Building and running a baseline-H.264 encoder command that bakes the
//!   rotation into the frames
//! - Detecting the external tools involved
//!
//! ## Features
//!
//! - `tracing` - Enable tracing support
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use transcode_watch_av::{probe_rotation, EncodeCommand};
//!
//! let input = Path::new("/work/src/clip.mov");
//! let rotation = probe_rotation(Path::new("exiftool"), input)?;
//! EncodeCommand::new("ffmpeg", input, Path::new("/work/dst/clip.mov"), rotation).run()?;
//! # Ok::<(), transcode_watch_av::Error>(())
//! ```

pub mod encode;
mod error;
pub mod rotation;
pub mod tools;

// Re-exports
pub use encode::EncodeCommand;
pub use error::{Error, Result};
pub use rotation::{parse_rotation, probe_rotation, Rotation};
pub use tools::{check_tool, check_tools, require_tool, ToolInfo};

