//! Media tool trait and shared types.
//!
//! The video pipeline needs two things from the outside world: the resolution
//! of a source clip and a way to transcode it. [`MediaTool`] covers both; the
//! production implementation is [`Ffmpeg`](super::ffmpeg::Ffmpeg). Tests use
//! the scripted `MockTool` below.

use crate::types::Dimensions;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("tool not found: {tool}")]
    NotFound { tool: String },
    #[error("{tool} failed: {message}")]
    Failed { tool: String, message: String },
    #[error("failed to parse {tool} output: {message}")]
    Parse { tool: String, message: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ToolError {
    pub fn not_found(tool: impl Into<String>) -> Self {
        Self::NotFound { tool: tool.into() }
    }

    pub fn failed(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn parse(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

/// Parameters for a single transcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranscodeOptions {
    /// Target frame size, already evened.
    pub resolution: Dimensions,
    /// Video bitrate in kbit/s; `<= 0` leaves it to the encoder.
    pub bitrate_kbps: i32,
}

/// Probing and transcoding of video files.
pub trait MediaTool {
    /// Resolution of the first video stream.
    fn probe(&self, path: &Path) -> Result<Dimensions, ToolError>;

    /// Transcode `source` into `dest`, creating or overwriting it.
    fn transcode(
        &self,
        source: &Path,
        dest: &Path,
        options: &TranscodeOptions,
    ) -> Result<(), ToolError>;
}
