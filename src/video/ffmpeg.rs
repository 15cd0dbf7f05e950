//! [`MediaTool`] implementation driving the `ffprobe` and `ffmpeg` executables.

use super::tool::{MediaTool, ToolError, TranscodeOptions};
use crate::types::Dimensions;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    width: Option<u32>,
    height: Option<u32>,
}

/// External `ffprobe`/`ffmpeg` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ffmpeg {
    pub ffprobe: PathBuf,
    pub ffmpeg: PathBuf,
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self::new("ffprobe", "ffmpeg")
    }
}

/// Availability of one external executable.
#[derive(Debug, Clone)]
pub struct ToolStatus {
    pub name: String,
    /// Resolved location on `PATH` (or the configured path itself).
    pub path: Option<PathBuf>,
    /// First line of `-version` output.
    pub version: Option<String>,
}

impl ToolStatus {
    pub fn available(&self) -> bool {
        self.version.is_some()
    }
}

impl Ffmpeg {
    pub fn new(ffprobe: impl Into<PathBuf>, ffmpeg: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe: ffprobe.into(),
            ffmpeg: ffmpeg.into(),
        }
    }

    /// Report whether both executables can be run.
    pub fn check(&self) -> Vec<ToolStatus> {
        vec![check_tool(&self.ffprobe), check_tool(&self.ffmpeg)]
    }
}

fn check_tool(program: &Path) -> ToolStatus {
    let version = Command::new(program)
        .arg("-version")
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| {
            String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .map(str::to_string)
        });

    ToolStatus {
        name: program.display().to_string(),
        path: which::which(program).ok(),
        version,
    }
}

/// Run `program`, mapping a missing executable and a non-zero exit to
/// [`ToolError`].
fn run(program: &Path, args: &[OsString]) -> Result<Output, ToolError> {
    let tool = program.display().to_string();
    debug!(tool = %tool, args = ?args, "running");

    let output = Command::new(program).args(args).output().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ToolError::not_found(&tool)
        } else {
            ToolError::Io(e)
        }
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = match stderr.trim() {
            "" => output.status.to_string(),
            trimmed => trimmed.to_string(),
        };
        return Err(ToolError::failed(tool, message));
    }
    Ok(output)
}

/// Arguments asking `ffprobe` for the first video stream's size as JSON.
pub fn probe_args(path: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-v",
        "error",
        "-select_streams",
        "v:0",
        "-show_entries",
        "stream=width,height",
        "-of",
        "json",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();
    args.push(path.into());
    args
}

/// Arguments for one `ffmpeg` transcode.
pub fn transcode_args(source: &Path, dest: &Path, options: &TranscodeOptions) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-y".into(), "-v".into(), "error".into(), "-i".into()];
    args.push(source.into());
    if options.bitrate_kbps > 0 {
        args.push("-b:v".into());
        args.push(format!("{}k", options.bitrate_kbps).into());
    }
    args.push("-vf".into());
    args.push(
        format!(
            "scale={}:{}",
            options.resolution.width, options.resolution.height
        )
        .into(),
    );
    args.push("-c:a".into());
    args.push("copy".into());
    args.push(dest.into());
    args
}

/// Extract the first stream carrying a non-zero size from `ffprobe` JSON.
pub fn parse_probe_output(json: &str) -> Result<Dimensions, ToolError> {
    let output: FfprobeOutput =
        serde_json::from_str(json).map_err(|e| ToolError::parse("ffprobe", e.to_string()))?;

    output
        .streams
        .into_iter()
        .find_map(|stream| match (stream.width, stream.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some(Dimensions::new(w, h)),
            _ => None,
        })
        .ok_or_else(|| ToolError::parse("ffprobe", "no video stream with a frame size"))
}

impl MediaTool for Ffmpeg {
    fn probe(&self, path: &Path) -> Result<Dimensions, ToolError> {
        let output = run(&self.ffprobe, &probe_args(path))?;
        let json = String::from_utf8(output.stdout)
            .map_err(|e| ToolError::parse("ffprobe", format!("invalid UTF-8: {}", e)))?;
        parse_probe_output(&json)
    }

    fn transcode(
        &self,
        source: &Path,
        dest: &Path,
        options: &TranscodeOptions,
    ) -> Result<(), ToolError> {
        run(&self.ffmpeg, &transcode_args(source, dest, options))?;
        Ok(())
    }
}
