//! transcode-watch - watch-folder video transcoding
//!
//! This library crate exposes the dispatcher for the binaries and for
//! integration testing.

pub mod config;
pub mod watch;
pub mod worker;
