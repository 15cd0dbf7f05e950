//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every processed item leads with its positional index and source file name,
//! followed by the probed size. Produced files are indented underneath,
//! labelled by tier:
//!
//! ```text
//! 001 beach.jpg (2000x1000 jpg)
//!     S: out/beach.S.jpg
//!     S: out/beach.S.webp
//!     M: out/beach.M.jpg
//! 002 clip.mov (1920x1080)
//!     R: out/clip.R.mp4 (skipped, exists)
//! Processed 2 items, 4 files
//! ```
//!
//! ## Plan
//!
//! ```text
//! Source 2000x1000 (landscape)
//!     S: 200x100 (cap 200x200)
//!     M: 500x250 (cap 500x500)
//!     L: 1000x500 (cap 1000x1000)
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::process::{FileStatus, ItemOutput, ProcessEvent};
use crate::tiers::PlannedTier;
use crate::types::{Dimensions, TierCap};
use crate::video::ToolStatus;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, singular: &str, plural: &str) -> String {
    if n == 1 {
        format!("{} {}", n, singular)
    } else {
        format!("{} {}", n, plural)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Item header: index, file name and whatever is known about the source.
///
/// ```text
/// 001 beach.jpg (2000x1000 jpg)
/// 002 clip.mov (1920x1080)
/// 003 broken.png
/// ```
fn item_header(index: usize, output: &ItemOutput) -> String {
    let name = file_name(&output.source);
    match (output.source_size, output.source_format.as_deref()) {
        (Some(size), Some(format)) => {
            format!("{} {} ({} {})", format_index(index), name, size, format)
        }
        (Some(size), None) => format!("{} {} ({})", format_index(index), name, size),
        _ => format!("{} {}", format_index(index), name),
    }
}

// ============================================================================
// Processing
// ============================================================================

/// Format one item's result set.
pub fn format_item_output(index: usize, output: &ItemOutput) -> Vec<String> {
    let mut lines = vec![item_header(index, output)];
    for file in &output.files {
        let status = match file.status {
            FileStatus::Written => "",
            FileStatus::Skipped => " (skipped, exists)",
        };
        lines.push(format!(
            "{}{}: {}{}",
            indent(1),
            file.tier,
            file.path.display(),
            status
        ));
    }
    lines
}

/// Format a single process progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::ItemProcessed { index, output } => format_item_output(*index, output),
        ProcessEvent::ItemFailed {
            index,
            partial,
            error,
        } => {
            let mut lines = format_item_output(*index, partial);
            lines.push(format!("{}failed: {}", indent(1), error));
            lines
        }
    }
}

/// One-line batch summary.
pub fn format_summary(outputs: &[ItemOutput]) -> String {
    let files: usize = outputs.iter().map(|o| o.files.len()).sum();
    format!(
        "Processed {}, {}",
        plural(outputs.len(), "item", "items"),
        plural(files, "file", "files")
    )
}

/// Print the batch summary to stdout.
pub fn print_summary(outputs: &[ItemOutput]) {
    println!("{}", format_summary(outputs));
}

// ============================================================================
// Plan
// ============================================================================

/// Format a tier plan for a source of the given size.
pub fn format_plan(source: Dimensions, plan: &[PlannedTier]) -> Vec<String> {
    let orientation = if source.is_landscape() {
        "landscape"
    } else {
        "portrait"
    };
    let mut lines = vec![format!("Source {} ({})", source, orientation)];

    for tier in plan {
        let detail = match tier.cap {
            TierCap::NoResize => "original".to_string(),
            TierCap::Cap { .. } if tier.resize => format!("cap {}", tier.cap),
            TierCap::Cap { .. } => format!("cap {}, fits", tier.cap),
        };
        lines.push(format!(
            "{}{}: {} ({})",
            indent(1),
            tier.label,
            tier.output,
            detail
        ));
    }
    lines
}

/// Print a tier plan to stdout.
pub fn print_plan(source: Dimensions, plan: &[PlannedTier]) {
    for line in format_plan(source, plan) {
        println!("{}", line);
    }
}

// ============================================================================
// Tool check
// ============================================================================

/// Format the availability of external tools.
///
/// ```text
/// ffprobe: ffprobe version 6.1 (/usr/bin/ffprobe)
/// ffmpeg: not found
/// ```
pub fn format_tool_check(statuses: &[ToolStatus]) -> Vec<String> {
    statuses
        .iter()
        .map(|status| match (&status.version, &status.path) {
            (Some(version), Some(path)) => {
                format!("{}: {} ({})", status.name, version, path.display())
            }
            (Some(version), None) => format!("{}: {}", status.name, version),
            (None, _) => format!("{}: not found", status.name),
        })
        .collect()
}

/// Print tool availability to stdout.
pub fn print_tool_check(statuses: &[ToolStatus]) {
    for line in format_tool_check(statuses) {
        println!("{}", line);
    }
}
