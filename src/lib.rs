//! # tierscale
//!
//! Batch-resizes images and re-encodes videos into size tiers and output
//! formats. Given a source, an ordered list of width/height caps, the wanted
//! formats and a quality setting, it writes one file per tier and format:
//!
//! ```text
//! beach.jpg (2000x1000), caps 200/500/1000, formats jpg + webp
//!
//!   beach.S.jpg  beach.S.webp     200x100
//!   beach.M.jpg  beach.M.webp     500x250
//!   beach.L.jpg  beach.L.webp     1000x500
//! ```
//!
//! # Pipeline
//!
//! ```text
//! probe ─► plan tiers ─► scale ─► fan out formats
//! ```
//!
//! - **Probe**: images through the `image` crate, videos through `ffprobe`.
//! - **Plan**: [`tiers::plan_tiers`] walks the caps, labels each tier
//!   (`S`, `M`, `L`, `XL`, ... or `R` for the original resolution) and decides
//!   whether it needs scaling. Images stop after the first cap the source
//!   already fits; videos emit every tier.
//! - **Scale**: Lanczos3 in-process for images, `ffmpeg` for videos.
//! - **Fan out**: one file per format, named by [`naming::output_path`]. Images
//!   always get their own source format as well.
//!
//! Batches run sequentially and stop at the first failing item, returning
//! everything produced so far.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | `Dimensions` and `TierCap` |
//! | [`tiers`] | Pure tier planning: labels, target sizes, early exit |
//! | [`naming`] | Tier labels and output path derivation |
//! | [`imaging`] | `ImageBackend` trait, the `image`-crate backend, format fan-out |
//! | [`video`] | `MediaTool` trait and the `ffprobe`/`ffmpeg` implementation |
//! | [`process`] | Per-item pipelines and the batch driver |
//! | [`scan`] | Expands file/directory inputs into a batch |
//! | [`config`] | `tierscale.toml` loading, merging and validation |
//! | [`output`] | CLI output formatting |

pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod process;
pub mod scan;
pub mod tiers;
pub mod types;
pub mod video;

#[cfg(test)]
pub(crate) mod test_helpers;
