//! High-level image operations.
//!
//! These functions combine tier plans and naming with backend execution: they
//! decide which files a tier produces and hand each one to the backend.

use super::backend::{BackendError, ImageBackend, SourceInfo};
use super::params::{ImageFormat, Quality, RenderParams};
use crate::naming::output_path;
use crate::tiers::PlannedTier;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Probe a source image through the backend.
pub fn identify(backend: &impl ImageBackend, path: &Path) -> Result<SourceInfo> {
    let info = backend.identify(path)?;
    debug!(
        path = %path.display(),
        size = %info.dimensions,
        format = %info.format,
        "identified source"
    );
    Ok(info)
}

/// Formats to write for every tier: the requested ones in order (duplicates
/// dropped), then the source format if it was not requested.
pub fn tier_formats(requested: &[ImageFormat], source: ImageFormat) -> Vec<ImageFormat> {
    let mut formats: Vec<ImageFormat> = Vec::with_capacity(requested.len() + 1);
    for &format in requested.iter().chain(std::iter::once(&source)) {
        if !formats.contains(&format) {
            formats.push(format);
        }
    }
    formats
}

/// Plan one output file without executing it.
pub fn plan_render(
    source: &Path,
    template: &Path,
    tier: &PlannedTier,
    format: ImageFormat,
    quality: Quality,
) -> RenderParams {
    RenderParams {
        source: source.to_path_buf(),
        output: output_path(template, tier.label, format.extension()),
        resize_to: tier.resize.then_some(tier.output),
        format,
        quality,
    }
}

/// Write every format of one tier.
///
/// `on_written` is called after each file lands on disk, so a caller keeps an
/// accurate record of what exists even when a later format fails.
pub fn render_tier(
    backend: &impl ImageBackend,
    source: &Path,
    template: &Path,
    tier: &PlannedTier,
    formats: &[ImageFormat],
    quality: Quality,
    mut on_written: impl FnMut(PathBuf, ImageFormat),
) -> Result<()> {
    for &format in formats {
        let params = plan_render(source, template, tier, format, quality);
        debug!(
            output = %params.output.display(),
            tier = %tier.label,
            size = %tier.output,
            "writing"
        );
        backend.render(&params)?;
        on_written(params.output, format);
    }
    Ok(())
}
