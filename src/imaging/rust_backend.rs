//! Pure Rust image backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `ImageReader::with_guessed_format` + `into_dimensions` (header only) |
//! | Decode (JPEG, PNG, TIFF, WebP, GIF, BMP) | `image` crate decoders |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → JPEG | `JpegEncoder` (quality 1-100, or the codec default) |
//! | Encode → WebP | `WebPEncoder::new_lossless` |
//! | Encode → PNG, TIFF, GIF, BMP | `DynamicImage::write_to` |
//!
//! The fan-out writes several files from the same source and size, so the
//! backend keeps the last decoded source and the last resized frame. Each item
//! is decoded once, and each tier resized once, however many formats are
//! requested.

use super::backend::{BackendError, ImageBackend, SourceInfo};
use super::params::{ImageFormat, Quality, RenderParams};
use crate::types::Dimensions;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat as CodecFormat, ImageReader};
use std::cell::RefCell;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Default)]
pub struct RustBackend {
    cache: RefCell<FrameCache>,
}

impl RustBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Default)]
struct FrameCache {
    source: Option<(PathBuf, DynamicImage)>,
    resized: Option<(Dimensions, DynamicImage)>,
}

impl FrameCache {
    /// The source image at the requested size, decoding and resizing only on a miss.
    fn frame(
        &mut self,
        source: &Path,
        resize_to: Option<Dimensions>,
    ) -> Result<&DynamicImage, BackendError> {
        let (path, image) = match self.source.take() {
            Some((path, image)) if path == source => (path, image),
            _ => {
                self.resized = None;
                (source.to_path_buf(), load_image(source)?)
            }
        };
        let original: &DynamicImage = &self.source.insert((path, image)).1;

        let Some(target) = resize_to else {
            return Ok(original);
        };

        if !matches!(&self.resized, Some((dims, _)) if *dims == target) {
            self.resized = None;
        }
        let (_, frame) = self.resized.get_or_insert_with(|| {
            debug!(source = %source.display(), size = %target, "resizing");
            let resized = original.resize_exact(target.width, target.height, FilterType::Lanczos3);
            (target, resized)
        });
        Ok(&*frame)
    }
}

fn from_codec_format(format: CodecFormat) -> Option<ImageFormat> {
    match format {
        CodecFormat::Jpeg => Some(ImageFormat::Jpg),
        CodecFormat::Png => Some(ImageFormat::Png),
        CodecFormat::WebP => Some(ImageFormat::Webp),
        CodecFormat::Tiff => Some(ImageFormat::Tif),
        CodecFormat::Gif => Some(ImageFormat::Gif),
        CodecFormat::Bmp => Some(ImageFormat::Bmp),
        _ => None,
    }
}

/// Open a reader with its format resolved: header sniffing first, then the
/// file extension.
fn open_reader(path: &Path) -> Result<(ImageReader<BufReader<File>>, ImageFormat), BackendError> {
    let open_err = |source| BackendError::Open {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = ImageReader::open(path)
        .map_err(open_err)?
        .with_guessed_format()
        .map_err(open_err)?;

    let detected = match reader.format() {
        Some(format) => format,
        None => {
            let format = CodecFormat::from_path(path).map_err(|_| {
                BackendError::UnsupportedFormat(format!("{} (unrecognized)", path.display()))
            })?;
            reader.set_format(format);
            format
        }
    };

    let format = from_codec_format(detected).ok_or_else(|| {
        BackendError::UnsupportedFormat(format!("{:?} ({})", detected, path.display()))
    })?;
    Ok((reader, format))
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    let (reader, _) = open_reader(path)?;
    debug!(path = %path.display(), "decoding");
    reader.decode().map_err(|e| BackendError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Encode `img` to `path` in the given format, creating or truncating the file.
fn save_image(
    img: &DynamicImage,
    path: &Path,
    format: ImageFormat,
    quality: Quality,
) -> Result<(), BackendError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let result = match format {
        ImageFormat::Jpg => {
            let encoder = match quality.level() {
                Some(q) => JpegEncoder::new_with_quality(&mut writer, q.clamp(1, 100)),
                None => JpegEncoder::new(&mut writer),
            };
            DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)
        }
        ImageFormat::Webp => DynamicImage::ImageRgba8(img.to_rgba8())
            .write_with_encoder(WebPEncoder::new_lossless(&mut writer)),
        ImageFormat::Png => img.write_to(&mut writer, CodecFormat::Png),
        ImageFormat::Tif => {
            let eight_bit = if img.color().has_alpha() {
                DynamicImage::ImageRgba8(img.to_rgba8())
            } else {
                DynamicImage::ImageRgb8(img.to_rgb8())
            };
            eight_bit.write_to(&mut writer, CodecFormat::Tiff)
        }
        ImageFormat::Gif => {
            DynamicImage::ImageRgba8(img.to_rgba8()).write_to(&mut writer, CodecFormat::Gif)
        }
        ImageFormat::Bmp => {
            DynamicImage::ImageRgb8(img.to_rgb8()).write_to(&mut writer, CodecFormat::Bmp)
        }
    };

    result.map_err(|e| BackendError::Encode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    writer.flush()?;
    Ok(())
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<SourceInfo, BackendError> {
        let (reader, format) = open_reader(path)?;
        let (width, height) = reader.into_dimensions().map_err(|e| BackendError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(SourceInfo {
            dimensions: Dimensions::new(width, height),
            format,
        })
    }

    fn render(&self, params: &RenderParams) -> Result<(), BackendError> {
        let mut cache = self.cache.borrow_mut();
        let frame = cache.frame(&params.source, params.resize_to)?;
        save_image(frame, &params.output, params.format, params.quality)
    }
}
