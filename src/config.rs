//! Configuration module.
//!
//! Handles loading, validating and merging `tierscale.toml`. Stock defaults
//! are the base layer; a config file overrides any subset of keys; command
//! line flags override both.
//!
//! ## Config File Location
//!
//! 1. `--config FILE` when given (the file must exist)
//! 2. `tierscale.toml` in the working directory, if present
//! 3. otherwise stock defaults only
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! tiers = [[200, 200], [500, 500], [1000, 1000]]
//!
//! [images]
//! formats = ["jpg", "webp"]
//! quality = 90
//!
//! [videos]
//! formats = ["mp4"]
//! bitrate = 1500
//!
//! [tools]
//! ffprobe = "ffprobe"
//! ffmpeg = "ffmpeg"
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Tables merge key by key, arrays are replaced as a
//! whole:
//!
//! ```toml
//! # Keep the original resolution as well, and write only webp
//! tiers = ["original", [320, 320], [1280, 1280]]
//!
//! [images]
//! formats = ["webp"]
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::ImageFormat;
use crate::process::{ImageSettings, VideoSettings};
use crate::types::TierCap;
use crate::video::Ffmpeg;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "tierscale.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Top-level configuration.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TierscaleConfig {
    /// Size caps in ascending order. `"original"` or a negative pair keeps
    /// the source resolution (tier `R`).
    pub tiers: Vec<TierCap>,
    pub images: ImagesConfig,
    pub videos: VideosConfig,
    pub tools: ToolsConfig,
}

impl Default for TierscaleConfig {
    fn default() -> Self {
        Self {
            tiers: vec![
                TierCap::cap(200, 200),
                TierCap::cap(500, 500),
                TierCap::cap(1000, 1000),
            ],
            images: ImagesConfig::default(),
            videos: VideosConfig::default(),
            tools: ToolsConfig::default(),
        }
    }
}

/// Image pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Output formats; the source format is always added.
    pub formats: Vec<String>,
    /// Encoder quality. Above 100 clamps to 100, negative selects the codec
    /// default.
    pub quality: i32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            formats: vec!["jpg".to_string(), "webp".to_string()],
            quality: 90,
        }
    }
}

/// Video pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VideosConfig {
    /// Container extensions.
    pub formats: Vec<String>,
    /// Video bitrate in kbit/s; zero or negative leaves it to the encoder.
    pub bitrate: i32,
}

impl Default for VideosConfig {
    fn default() -> Self {
        Self {
            formats: vec!["mp4".to_string()],
            bitrate: 1500,
        }
    }
}

/// External executables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    pub ffprobe: PathBuf,
    pub ffmpeg: PathBuf,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffprobe: PathBuf::from("ffprobe"),
            ffmpeg: PathBuf::from("ffmpeg"),
        }
    }
}

impl TierscaleConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tiers.is_empty() {
            return Err(ConfigError::Validation(
                "tiers must not be empty".into(),
            ));
        }

        let mut previous: Option<(u32, u32)> = None;
        for (i, tier) in self.tiers.iter().enumerate() {
            let TierCap::Cap { width, height } = *tier else {
                continue;
            };
            if width == 0 || height == 0 {
                return Err(ConfigError::Validation(format!(
                    "tiers[{}]: cap dimensions must be non-zero",
                    i
                )));
            }
            if let Some((pw, ph)) = previous {
                if width < pw || height < ph {
                    return Err(ConfigError::Validation(format!(
                        "tiers[{}]: {}x{} is smaller than the previous cap {}x{}; caps must be ascending",
                        i, width, height, pw, ph
                    )));
                }
            }
            previous = Some((width, height));
        }

        if self.images.formats.is_empty() {
            return Err(ConfigError::Validation(
                "images.formats must not be empty".into(),
            ));
        }
        self.image_formats()?;

        if self.videos.formats.is_empty() {
            return Err(ConfigError::Validation(
                "videos.formats must not be empty".into(),
            ));
        }
        for format in &self.videos.formats {
            if format.is_empty() || format.contains(['.', '/', '\\']) {
                return Err(ConfigError::Validation(format!(
                    "videos.formats: '{}' is not a bare container extension",
                    format
                )));
            }
        }
        Ok(())
    }

    /// Parse `images.formats`.
    pub fn image_formats(&self) -> Result<Vec<ImageFormat>, ConfigError> {
        self.images
            .formats
            .iter()
            .map(|name| {
                ImageFormat::from_name(name).ok_or_else(|| {
                    ConfigError::Validation(format!(
                        "images.formats: unknown format '{}' (expected one of {})",
                        name,
                        ImageFormat::ALL
                            .iter()
                            .map(|f| f.extension())
                            .collect::<Vec<_>>()
                            .join(", ")
                    ))
                })
            })
            .collect()
    }

    /// Settings for the image pipeline.
    pub fn image_settings(&self) -> Result<ImageSettings, ConfigError> {
        Ok(ImageSettings {
            tiers: self.tiers.clone(),
            formats: self.image_formats()?,
            quality: crate::imaging::Quality::from_setting(self.images.quality),
        })
    }

    /// Settings for the video pipeline.
    pub fn video_settings(&self) -> VideoSettings {
        VideoSettings {
            tiers: self.tiers.clone(),
            formats: self
                .videos
                .formats
                .iter()
                .map(|f| f.to_ascii_lowercase())
                .collect(),
            bitrate_kbps: self.videos.bitrate,
        }
    }

    /// `ffprobe`/`ffmpeg` as configured.
    pub fn media_tool(&self) -> Ffmpeg {
        Ffmpeg::new(self.tools.ffprobe.clone(), self.tools.ffmpeg.clone())
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// Parsed from [`stock_config_toml`], so the documented file and the base
/// layer cannot drift apart.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::from_str(stock_config_toml())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<TierscaleConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: TierscaleConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Locate the config file: `explicit` if given, else [`CONFIG_FILE_NAME`] in
/// `dir` if it exists.
pub fn find_config(explicit: Option<&Path>, dir: &Path) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let candidate = dir.join(CONFIG_FILE_NAME);
            candidate.is_file().then_some(candidate)
        }
    }
}

/// Load the effective configuration.
///
/// An explicit path that does not exist is an error; a missing
/// `tierscale.toml` in `dir` just means stock defaults.
pub fn load_config(explicit: Option<&Path>, dir: &Path) -> Result<TierscaleConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = find_config(explicit, dir)
        .map(|path| load_raw_config(&path))
        .transpose()?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `tierscale.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# tierscale configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# tierscale reads ./tierscale.toml, or the file given with --config.
# Unknown keys will cause an error.

# Size caps, smallest first. Each produced tier is labelled by position:
# S, M, L, XL, XXL, ...
# A source is compared against the cap along its longer side (width for
# landscape and square, height for portrait) and scaled down to it.
# Images stop after the first cap they already fit; videos emit every tier.
# "original" (or [-1, -1]) adds an R tier at the source resolution without
# taking a letter.
tiers = [[200, 200], [500, 500], [1000, 1000]]

# ---------------------------------------------------------------------------
# Images
# ---------------------------------------------------------------------------
[images]
# Output formats: jpg, png, webp, tif, gif, bmp.
# The source format is always written as well.
formats = ["jpg", "webp"]

# Encoder quality. Values above 100 are clamped; a negative value selects
# the codec default. Only JPEG uses it (WebP output is lossless).
quality = 90

# ---------------------------------------------------------------------------
# Videos
# ---------------------------------------------------------------------------
[videos]
# Container extensions passed to ffmpeg.
formats = ["mp4"]

# Video bitrate in kbit/s. Zero or negative leaves it to the encoder.
bitrate = 1500

# ---------------------------------------------------------------------------
# External tools
# ---------------------------------------------------------------------------
[tools]
ffprobe = "ffprobe"
ffmpeg = "ffmpeg"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn overlay(text: &str) -> toml::Value {
        toml::from_str(text).unwrap()
    }

    fn resolve(text: &str) -> Result<TierscaleConfig, ConfigError> {
        resolve_config(stock_defaults_value().unwrap(), Some(overlay(text)))
    }

    #[test]
    fn default_config_values() {
        let config = TierscaleConfig::default();
        assert_eq!(config.tiers.len(), 3);
        assert_eq!(config.tiers[2], TierCap::cap(1000, 1000));
        assert_eq!(config.images.formats, vec!["jpg", "webp"]);
        assert_eq!(config.images.quality, 90);
        assert_eq!(config.videos.bitrate, 1500);
        assert_eq!(config.tools.ffmpeg, PathBuf::from("ffmpeg"));
        config.validate().unwrap();
    }

    #[test]
    fn parse_partial_config() {
        let config: TierscaleConfig = toml::from_str(
            r#"
[images]
quality = 75
"#,
        )
        .unwrap();
        assert_eq!(config.images.quality, 75);
        // Default values preserved
        assert_eq!(config.images.formats, vec!["jpg", "webp"]);
        assert_eq!(config.videos.formats, vec!["mp4"]);
    }

    #[test]
    fn parse_sentinel_tiers() {
        let config: TierscaleConfig =
            toml::from_str(r#"tiers = ["original", [320, 320], [-1, -1]]"#).unwrap();
        assert_eq!(
            config.tiers,
            vec![TierCap::NoResize, TierCap::cap(320, 320), TierCap::NoResize]
        );
    }

    #[test]
    fn unknown_keys_rejected() {
        let result: Result<TierscaleConfig, _> = toml::from_str(
            r#"
[images]
qualty = 80
"#,
        );
        assert!(result.is_err());
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn empty_tiers_rejected() {
        let result = resolve("tiers = []");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn zero_cap_rejected() {
        let result = resolve("tiers = [[0, 100]]");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn descending_caps_rejected() {
        let result = resolve("tiers = [[500, 500], [200, 200]]");
        match result {
            Err(ConfigError::Validation(msg)) => assert!(msg.contains("ascending")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn sentinel_does_not_break_ordering() {
        let config = resolve(r#"tiers = [[200, 200], "original", [500, 500]]"#).unwrap();
        assert_eq!(config.tiers.len(), 3);
    }

    #[test]
    fn unknown_image_format_rejected() {
        let result = resolve(
            r#"
[images]
formats = ["jpg", "heic"]
"#,
        );
        match result {
            Err(ConfigError::Validation(msg)) => assert!(msg.contains("heic")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn empty_image_formats_rejected() {
        let result = resolve(
            r#"
[images]
formats = []
"#,
        );
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn video_format_with_dot_rejected() {
        let result = resolve(
            r#"
[videos]
formats = [".mp4"]
"#,
        );
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn video_format_with_separator_rejected() {
        let result = resolve(
            r#"
[videos]
formats = ["../mp4"]
"#,
        );
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // Settings
    // =========================================================================

    #[test]
    fn image_settings_parse_aliases_and_quality() {
        let config = resolve(
            r#"
[images]
formats = ["JPEG", "tiff"]
quality = 250
"#,
        )
        .unwrap();
        let settings = config.image_settings().unwrap();
        assert_eq!(settings.formats, vec![ImageFormat::Jpg, ImageFormat::Tif]);
        assert_eq!(settings.quality, crate::imaging::Quality::Level(100));
    }

    #[test]
    fn negative_quality_selects_codec_default() {
        let config = resolve("[images]\nquality = -1\n").unwrap();
        assert_eq!(
            config.image_settings().unwrap().quality,
            crate::imaging::Quality::CodecDefault
        );
    }

    #[test]
    fn video_settings_carry_bitrate_and_tiers() {
        let config = resolve(
            r#"
tiers = [[640, 640]]

[videos]
formats = ["MP4", "webm"]
bitrate = 0
"#,
        )
        .unwrap();
        let settings = config.video_settings();
        assert_eq!(settings.formats, vec!["mp4", "webm"]);
        assert_eq!(settings.bitrate_kbps, 0);
        assert_eq!(settings.tiers, vec![TierCap::cap(640, 640)]);
    }

    #[test]
    fn media_tool_uses_configured_paths() {
        let config = resolve(
            r#"
[tools]
ffmpeg = "/opt/ffmpeg/bin/ffmpeg"
"#,
        )
        .unwrap();
        let tool = config.media_tool();
        assert_eq!(tool.ffmpeg, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
        assert_eq!(tool.ffprobe, PathBuf::from("ffprobe"));
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_overrides_scalar_and_keeps_siblings() {
        let base = stock_defaults_value().unwrap();
        let merged = merge_toml(base, overlay("[images]\nquality = 50\n"));
        let images = merged.get("images").unwrap();
        assert_eq!(images.get("quality").unwrap().as_integer(), Some(50));
        assert_eq!(images.get("formats").unwrap().as_array().unwrap().len(), 2);
    }

    #[test]
    fn merge_replaces_arrays_wholesale() {
        let base = stock_defaults_value().unwrap();
        let merged = merge_toml(base, overlay("tiers = [[100, 100]]"));
        assert_eq!(merged.get("tiers").unwrap().as_array().unwrap().len(), 1);
    }

    #[test]
    fn merge_adds_new_keys() {
        let base = overlay("[a]\nx = 1\n");
        let merged = merge_toml(base, overlay("[a]\ny = 2\n"));
        let a = merged.get("a").unwrap();
        assert_eq!(a.get("x").unwrap().as_integer(), Some(1));
        assert_eq!(a.get("y").unwrap().as_integer(), Some(2));
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(None, tmp.path()).unwrap();
        assert_eq!(config, TierscaleConfig::default());
    }

    #[test]
    fn load_config_reads_file_in_directory() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE_NAME),
            r#"
[videos]
bitrate = 800
"#,
        )
        .unwrap();

        let config = load_config(None, tmp.path()).unwrap();
        assert_eq!(config.videos.bitrate, 800);
        assert_eq!(config.images.quality, 90);
    }

    #[test]
    fn explicit_path_wins_over_directory() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE_NAME), "[images]\nquality = 10\n").unwrap();
        let explicit = tmp.path().join("other.toml");
        fs::write(&explicit, "[images]\nquality = 20\n").unwrap();

        let config = load_config(Some(&explicit), tmp.path()).unwrap();
        assert_eq!(config.images.quality, 20);
    }

    #[test]
    fn missing_explicit_path_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_config(Some(&tmp.path().join("nope.toml")), tmp.path());
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE_NAME), "this is not valid toml [[[").unwrap();

        let result = load_config(None, tmp.path());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    // =========================================================================
    // stock_config_toml tests
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: TierscaleConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, TierscaleConfig::default());
    }

    #[test]
    fn stock_config_toml_contains_all_sections() {
        let content = stock_config_toml();
        assert!(content.contains("tiers ="));
        assert!(content.contains("[images]"));
        assert!(content.contains("[videos]"));
        assert!(content.contains("[tools]"));
    }

    #[test]
    fn default_config_serializes_to_mergeable_table() {
        let val = toml::Value::try_from(TierscaleConfig::default()).unwrap();
        assert!(val.is_table());
        assert_eq!(val, stock_defaults_value().unwrap());
    }
}
