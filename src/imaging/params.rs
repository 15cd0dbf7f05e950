//! Parameter types for image operations.
//!
//! These describe *what* to write, not *how*. They are the interface between
//! the fan-out in [`operations`](super::operations) (which decides which files
//! to create) and the [`backend`](super::backend) (which does the pixel and
//! codec work), so a mock backend can stand in during tests.
//!
//! - [`ImageFormat`]: the six supported encode/decode formats, with
//!   canonical extensions (`jpeg` → `jpg`, `tiff` → `tif`).
//! - [`Quality`]: encoder quality derived from the signed quality setting.
//! - [`RenderParams`]: one output file: source, destination, size, format, quality.

use crate::types::Dimensions;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// A supported image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Jpg,
    Png,
    Webp,
    Tif,
    Gif,
    Bmp,
}

impl ImageFormat {
    pub const ALL: [ImageFormat; 6] = [
        ImageFormat::Jpg,
        ImageFormat::Png,
        ImageFormat::Webp,
        ImageFormat::Tif,
        ImageFormat::Gif,
        ImageFormat::Bmp,
    ];

    /// Canonical file extension.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Webp => "webp",
            ImageFormat::Tif => "tif",
            ImageFormat::Gif => "gif",
            ImageFormat::Bmp => "bmp",
        }
    }

    /// Parse a format name or extension, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ImageFormat::Jpg),
            "png" => Some(ImageFormat::Png),
            "webp" => Some(ImageFormat::Webp),
            "tif" | "tiff" => Some(ImageFormat::Tif),
            "gif" => Some(ImageFormat::Gif),
            "bmp" => Some(ImageFormat::Bmp),
            _ => None,
        }
    }

    /// True if `ext` names a supported input file extension.
    pub fn is_supported_extension(ext: &str) -> bool {
        Self::from_name(ext).is_some()
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ImageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("unsupported image format: {s}"))
    }
}

/// Encoder quality.
///
/// Built from the signed quality setting: values above 100 clamp to 100,
/// negative values leave the choice to the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quality {
    #[default]
    CodecDefault,
    Level(u8),
}

impl Quality {
    pub fn from_setting(value: i32) -> Self {
        if value < 0 {
            Quality::CodecDefault
        } else {
            Quality::Level(value.min(100) as u8)
        }
    }

    pub fn level(self) -> Option<u8> {
        match self {
            Quality::CodecDefault => None,
            Quality::Level(q) => Some(q),
        }
    }
}

/// One output file to produce.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderParams {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Target size; `None` re-encodes the source at its own resolution.
    pub resize_to: Option<Dimensions>,
    pub format: ImageFormat,
    pub quality: Quality,
}
