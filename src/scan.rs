//! Input discovery.
//!
//! Expands the command line inputs into the ordered batch the pipelines
//! consume. Files are taken as given; directories are walked recursively for
//! files with a known extension, sorted by name so repeated runs see the same
//! order.
//!
//! Each discovered file keeps its path relative to the input it came from,
//! so `photos/2024/beach.jpg` found under `photos/` lands at
//! `<out>/2024/beach.jpg` (before the tier and format are applied):
//!
//! ```text
//! photos/                     out/
//! ├── cover.png               ├── cover.S.png ...
//! └── 2024/                   └── 2024/
//!     └── beach.jpg               ├── beach.S.jpg
//!                                 └── ...
//! ```

use crate::imaging::ImageFormat;
use crate::process::BatchItem;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Input not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Cannot walk directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error(
        "{} and {} would write the same output files",
        first.display(),
        second.display()
    )]
    Collision { first: PathBuf, second: PathBuf },
}

/// Container extensions picked up when walking directories for videos.
const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mov", "m4v", "mkv", "webm", "avi", "wmv", "flv", "mpg", "mpeg", "ts",
];

/// Which pipeline the inputs are for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Check if a path has an extension this kind of pipeline handles.
    pub fn matches(self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        match self {
            MediaKind::Image => ImageFormat::is_supported_extension(ext),
            MediaKind::Video => VIDEO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()),
        }
    }
}

/// A discovered source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedInput {
    pub path: PathBuf,
    /// Destination path relative to the output directory.
    pub relative: PathBuf,
}

/// Expand `inputs` into the list of source files, in order.
///
/// Explicit files are always included, whatever their extension; walked
/// directories only contribute files matching `kind`.
pub fn collect_inputs(inputs: &[PathBuf], kind: MediaKind) -> Result<Vec<ScannedInput>, ScanError> {
    let mut found = Vec::new();

    for input in inputs {
        if input.is_file() {
            let relative = input
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| input.clone());
            found.push(ScannedInput {
                path: input.clone(),
                relative,
            });
        } else if input.is_dir() {
            let before = found.len();
            for entry in WalkDir::new(input).follow_links(true).sort_by_file_name() {
                let entry = entry?;
                let path = entry.path();
                if !entry.file_type().is_file() || !kind.matches(path) {
                    continue;
                }
                let relative = path.strip_prefix(input).unwrap_or(path).to_path_buf();
                found.push(ScannedInput {
                    path: path.to_path_buf(),
                    relative,
                });
            }
            debug!(
                dir = %input.display(),
                files = found.len() - before,
                "scanned directory"
            );
        } else {
            return Err(ScanError::NotFound(input.clone()));
        }
    }

    Ok(found)
}

/// Pair each discovered input with its destination template under `out_dir`.
///
/// Output names drop the source extension, so `a.jpg` and `a.png` in the
/// same directory would both produce `a.S.webp`. Such pairs are rejected
/// before anything is written.
pub fn batch_items(inputs: &[ScannedInput], out_dir: &Path) -> Result<Vec<BatchItem>, ScanError> {
    let mut seen: HashMap<PathBuf, &Path> = HashMap::new();
    let mut items = Vec::with_capacity(inputs.len());

    for input in inputs {
        let template = out_dir.join(&input.relative);
        if let Some(first) = seen.insert(template.with_extension(""), &input.path) {
            return Err(ScanError::Collision {
                first: first.to_path_buf(),
                second: input.path.clone(),
            });
        }
        items.push(BatchItem::new(&input.path, template));
    }

    Ok(items)
}
