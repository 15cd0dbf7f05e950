//! Video probing and transcoding through external tools.
//!
//! Unlike images, videos are never decoded in-process: `ffprobe` reports the
//! source resolution and `ffmpeg` writes each tier/container pair.

pub mod ffmpeg;
pub mod tool;

pub use ffmpeg::{Ffmpeg, ToolStatus};
pub use tool::{MediaTool, ToolError, TranscodeOptions};
