//! Per-item pipelines and the batch driver.
//!
//! Each input is a [`BatchItem`]: a source file plus a destination template
//! whose extension is replaced by `<tier>.<format>` for every output.
//!
//! ## Images
//!
//! ```text
//! identify ─► plan_tiers (StopWhenFits) ─► for each tier:
//!                                             for each format (+ source format):
//!                                                 render
//! ```
//!
//! A 2000x1000 jpg with caps 200/500/1000 and formats `jpg, webp` produces:
//!
//! ```text
//! out/beach.S.jpg   out/beach.S.webp     200x100
//! out/beach.M.jpg   out/beach.M.webp     500x250
//! out/beach.L.jpg   out/beach.L.webp     1000x500
//! ```
//!
//! ## Videos
//!
//! Every tier is emitted (no early exit), target sizes are evened for the
//! encoder, the source container is not added, and existing non-empty
//! destinations are left alone. A zero-length destination is treated as the
//! leftover of an interrupted run: it is removed and transcoded again.
//!
//! ## Failure
//!
//! The first error aborts the item and the batch. [`ItemFailure`] and
//! [`BatchFailure`] carry everything produced up to that point.

use crate::imaging::{
    self, BackendError, ImageBackend, ImageFormat, Quality, RustBackend, render_tier,
    tier_formats,
};
use crate::naming::{TierLabel, output_path};
use crate::tiers::{PlanMode, PlannedTier, even_resolution, plan_tiers};
use crate::types::{Dimensions, TierCap};
use crate::video::{MediaTool, ToolError, TranscodeOptions};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
    #[error("Video tool failed: {0}")]
    Tool(#[from] ToolError),
    #[error("Filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Source not found: {}", .0.display())]
    SourceNotFound(PathBuf),
    #[error("Output template has no file name: {}", .0.display())]
    InvalidTemplate(PathBuf),
}

/// One input of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    pub source: PathBuf,
    /// Destination path whose extension is replaced per output.
    pub template: PathBuf,
}

impl BatchItem {
    pub fn new(source: impl Into<PathBuf>, template: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            template: template.into(),
        }
    }
}

/// Settings for the image pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSettings {
    pub tiers: Vec<TierCap>,
    pub formats: Vec<ImageFormat>,
    pub quality: Quality,
}

/// Settings for the video pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoSettings {
    pub tiers: Vec<TierCap>,
    /// Container extensions, e.g. `mp4`.
    pub formats: Vec<String>,
    /// kbit/s; `<= 0` leaves the bitrate to the encoder.
    pub bitrate_kbps: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Written,
    /// A non-empty video destination already existed.
    Skipped,
}

/// One produced (or kept) output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputFile {
    pub path: PathBuf,
    pub tier: TierLabel,
    pub format: String,
    pub status: FileStatus,
}

/// Result set for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemOutput {
    pub source: PathBuf,
    /// Probed source size, once known.
    pub source_size: Option<Dimensions>,
    /// Canonical source format (images only).
    pub source_format: Option<String>,
    /// Output files in creation order.
    pub files: Vec<OutputFile>,
    /// Labels of the tiers processed, in order. A tier is recorded when its
    /// processing begins.
    pub tiers: Vec<TierLabel>,
    /// Formats produced, first occurrence order, no duplicates.
    pub formats: Vec<String>,
}

impl ItemOutput {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            source_size: None,
            source_format: None,
            files: Vec::new(),
            tiers: Vec::new(),
            formats: Vec::new(),
        }
    }

    /// Paths of every output file, in creation order.
    pub fn paths(&self) -> Vec<&Path> {
        self.files.iter().map(|f| f.path.as_path()).collect()
    }

    fn record(&mut self, tier: TierLabel, path: PathBuf, format: &str, status: FileStatus) {
        if !self.formats.iter().any(|f| f == format) {
            self.formats.push(format.to_string());
        }
        self.files.push(OutputFile {
            path,
            tier,
            format: format.to_string(),
            status,
        });
    }
}

/// A failed item with whatever it produced before the error.
#[derive(Error, Debug)]
#[error("{}: {error}", partial.source.display())]
pub struct ItemFailure {
    pub partial: ItemOutput,
    #[source]
    pub error: ProcessError,
}

/// An aborted batch.
#[derive(Error, Debug)]
#[error("item {} of the batch failed: {failure}", index + 1)]
pub struct BatchFailure {
    /// Results of the items before the failing one.
    pub completed: Vec<ItemOutput>,
    /// Zero-based position of the failing item.
    pub index: usize,
    #[source]
    pub failure: ItemFailure,
}

/// Progress events emitted while a batch runs.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    ItemProcessed {
        /// 1-based position in the batch.
        index: usize,
        output: ItemOutput,
    },
    ItemFailed {
        index: usize,
        partial: ItemOutput,
        error: String,
    },
}

fn ensure_parent(template: &Path) -> Result<(), ProcessError> {
    match template.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|source| ProcessError::Filesystem {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

/// Outputs are named after the template's file name, so it must have one.
fn require_file_name(template: &Path) -> Result<(), ProcessError> {
    match template.file_name() {
        Some(_) => Ok(()),
        None => Err(ProcessError::InvalidTemplate(template.to_path_buf())),
    }
}

fn require_source(source: &Path) -> Result<(), ProcessError> {
    if source.exists() {
        Ok(())
    } else {
        Err(ProcessError::SourceNotFound(source.to_path_buf()))
    }
}

/// Tier plan for an image: stops after the first tier the source fits.
pub fn image_plan(source: Dimensions, caps: &[TierCap]) -> Vec<PlannedTier> {
    plan_tiers(source, caps, PlanMode::StopWhenFits)
}

/// Tier plan for a video: every tier, with sizes evened for the encoder.
pub fn video_plan(source: Dimensions, caps: &[TierCap]) -> Vec<PlannedTier> {
    plan_tiers(source, caps, PlanMode::EmitAll)
        .into_iter()
        .map(|tier| PlannedTier {
            output: even_resolution(tier.output),
            ..tier
        })
        .collect()
}

fn log_plan(source: &Path, plan: &[PlannedTier]) {
    for tier in plan {
        debug!(
            source = %source.display(),
            tier = %tier.label,
            cap = %tier.cap,
            size = %tier.output,
            resize = tier.resize,
            "planned tier"
        );
    }
}

/// Run `per_item` over `items` in order, stopping at the first failure.
fn run_batch(
    items: &[BatchItem],
    progress: Option<Sender<ProcessEvent>>,
    mut per_item: impl FnMut(&BatchItem) -> Result<ItemOutput, ItemFailure>,
) -> Result<Vec<ItemOutput>, BatchFailure> {
    let mut completed = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        match per_item(item) {
            Ok(output) => {
                if let Some(ref tx) = progress {
                    tx.send(ProcessEvent::ItemProcessed {
                        index: index + 1,
                        output: output.clone(),
                    })
                    .ok();
                }
                completed.push(output);
            }
            Err(failure) => {
                warn!(
                    source = %item.source.display(),
                    error = %failure.error,
                    "aborting batch"
                );
                if let Some(ref tx) = progress {
                    tx.send(ProcessEvent::ItemFailed {
                        index: index + 1,
                        partial: failure.partial.clone(),
                        error: failure.error.to_string(),
                    })
                    .ok();
                }
                return Err(BatchFailure {
                    completed,
                    index,
                    failure,
                });
            }
        }
    }

    info!(items = completed.len(), "batch complete");
    Ok(completed)
}

// ============================================================================
// Images
// ============================================================================

/// Process one image with the built-in backend.
pub fn process_image(
    source: &Path,
    template: &Path,
    settings: &ImageSettings,
) -> Result<ItemOutput, ItemFailure> {
    process_image_with_backend(&RustBackend::new(), source, template, settings)
}

/// Process one image using a specific backend (allows testing with mock).
pub fn process_image_with_backend(
    backend: &impl ImageBackend,
    source: &Path,
    template: &Path,
    settings: &ImageSettings,
) -> Result<ItemOutput, ItemFailure> {
    let mut output = ItemOutput::new(source);
    match image_item(backend, source, template, settings, &mut output) {
        Ok(()) => Ok(output),
        Err(error) => Err(ItemFailure {
            partial: output,
            error,
        }),
    }
}

fn image_item(
    backend: &impl ImageBackend,
    source: &Path,
    template: &Path,
    settings: &ImageSettings,
    output: &mut ItemOutput,
) -> Result<(), ProcessError> {
    require_file_name(template)?;
    require_source(source)?;
    let info = imaging::identify(backend, source)?;
    output.source_size = Some(info.dimensions);
    output.source_format = Some(info.format.to_string());

    ensure_parent(template)?;

    let plan = image_plan(info.dimensions, &settings.tiers);
    log_plan(source, &plan);
    let formats = tier_formats(&settings.formats, info.format);

    for tier in &plan {
        output.tiers.push(tier.label);
        render_tier(
            backend,
            source,
            template,
            tier,
            &formats,
            settings.quality,
            |path, format| output.record(tier.label, path, format.extension(), FileStatus::Written),
        )?;
    }

    info!(
        source = %source.display(),
        tiers = output.tiers.len(),
        files = output.files.len(),
        "processed image"
    );
    Ok(())
}

/// Process a batch of images with the built-in backend.
pub fn process_images(
    items: &[BatchItem],
    settings: &ImageSettings,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<Vec<ItemOutput>, BatchFailure> {
    process_images_with_backend(&RustBackend::new(), items, settings, progress)
}

/// Process a batch of images using a specific backend.
pub fn process_images_with_backend(
    backend: &impl ImageBackend,
    items: &[BatchItem],
    settings: &ImageSettings,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<Vec<ItemOutput>, BatchFailure> {
    run_batch(items, progress, |item| {
        process_image_with_backend(backend, &item.source, &item.template, settings)
    })
}

// ============================================================================
// Videos
// ============================================================================

/// Process one video through `tool`.
pub fn process_video(
    tool: &impl MediaTool,
    source: &Path,
    template: &Path,
    settings: &VideoSettings,
) -> Result<ItemOutput, ItemFailure> {
    let mut output = ItemOutput::new(source);
    match video_item(tool, source, template, settings, &mut output) {
        Ok(()) => Ok(output),
        Err(error) => Err(ItemFailure {
            partial: output,
            error,
        }),
    }
}

/// Whether `dest` already holds a finished transcode. Zero-length leftovers
/// are removed.
fn existing_output(dest: &Path) -> Result<bool, ProcessError> {
    let fs_error = |source| ProcessError::Filesystem {
        path: dest.to_path_buf(),
        source,
    };
    match std::fs::metadata(dest) {
        Ok(meta) if meta.len() > 0 => Ok(true),
        Ok(_) => {
            warn!(path = %dest.display(), "removing zero-length output");
            std::fs::remove_file(dest).map_err(fs_error)?;
            Ok(false)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(fs_error(e)),
    }
}

fn video_item(
    tool: &impl MediaTool,
    source: &Path,
    template: &Path,
    settings: &VideoSettings,
    output: &mut ItemOutput,
) -> Result<(), ProcessError> {
    require_file_name(template)?;
    require_source(source)?;
    let dimensions = tool.probe(source)?;
    debug!(path = %source.display(), size = %dimensions, "probed video");
    output.source_size = Some(dimensions);

    ensure_parent(template)?;

    let plan = video_plan(dimensions, &settings.tiers);
    log_plan(source, &plan);

    let mut formats: Vec<&str> = Vec::with_capacity(settings.formats.len());
    for format in &settings.formats {
        if !formats.contains(&format.as_str()) {
            formats.push(format);
        }
    }

    for tier in &plan {
        output.tiers.push(tier.label);
        let options = TranscodeOptions {
            resolution: tier.output,
            bitrate_kbps: settings.bitrate_kbps,
        };

        for &format in &formats {
            let dest = output_path(template, tier.label, format);
            if existing_output(&dest)? {
                info!(path = %dest.display(), "output exists, skipping");
                output.record(tier.label, dest, format, FileStatus::Skipped);
                continue;
            }

            debug!(
                output = %dest.display(),
                tier = %tier.label,
                size = %options.resolution,
                "transcoding"
            );
            tool.transcode(source, &dest, &options)?;
            output.record(tier.label, dest, format, FileStatus::Written);
        }
    }

    info!(
        source = %source.display(),
        tiers = output.tiers.len(),
        files = output.files.len(),
        "processed video"
    );
    Ok(())
}

/// Process a batch of videos through `tool`.
pub fn process_videos(
    tool: &impl MediaTool,
    items: &[BatchItem],
    settings: &VideoSettings,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<Vec<ItemOutput>, BatchFailure> {
    run_batch(items, progress, |item| {
        process_video(tool, &item.source, &item.template, settings)
    })
}
