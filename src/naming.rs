//! Centralized naming for tier labels and derivative file paths.
//!
//! ## Tier labels
//!
//! Named tiers are labeled by position: `S`, `M`, `L`, then one extra `X` per
//! position beyond `L` (`XL`, `XXL`, ...). The original-resolution tier is
//! always `R` and sits outside that sequence.
//!
//! ## Output paths
//!
//! A derivative path is the destination template with its extension replaced
//! by `<label>.<format>`:
//!
//! - `out/beach.jpg` + `M` + `webp` → `out/beach.M.webp`
//! - `out/beach` + `S` + `png` → `out/beach.S.png`
//! - `out/v1.2/clip.mov` + `XL` + `mp4` → `out/v1.2/clip.XL.mp4`

use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};

/// Label of an emitted tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TierLabel {
    /// Original resolution.
    Original,
    /// Zero-based position among named tiers: 0 → `S`, 1 → `M`, 2 → `L`, ...
    Named(usize),
}

impl TierLabel {
    pub fn as_string(self) -> String {
        match self {
            TierLabel::Original => "R".to_string(),
            TierLabel::Named(0) => "S".to_string(),
            TierLabel::Named(1) => "M".to_string(),
            TierLabel::Named(n) => format!("{}L", "X".repeat(n - 2)),
        }
    }
}

impl fmt::Display for TierLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

impl Serialize for TierLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Derive the output path for one tier/format pair from a destination template.
///
/// Only the final extension of the template is replaced; dots in parent
/// directories or earlier in the file name are left untouched.
pub fn output_path(template: &Path, label: TierLabel, format: &str) -> PathBuf {
    template.with_extension(format!("{}.{}", label, format))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_three_labels() {
        assert_eq!(TierLabel::Named(0).to_string(), "S");
        assert_eq!(TierLabel::Named(1).to_string(), "M");
        assert_eq!(TierLabel::Named(2).to_string(), "L");
    }

    #[test]
    fn extra_large_labels_grow_by_one_x() {
        assert_eq!(TierLabel::Named(3).to_string(), "XL");
        assert_eq!(TierLabel::Named(4).to_string(), "XXL");
        assert_eq!(TierLabel::Named(6).to_string(), "XXXXL");
    }

    #[test]
    fn original_label() {
        assert_eq!(TierLabel::Original.to_string(), "R");
    }

    #[test]
    fn output_path_replaces_extension() {
        let p = output_path(Path::new("foo.jpg"), TierLabel::Named(1), "webp");
        assert_eq!(p, PathBuf::from("foo.M.webp"));
    }

    #[test]
    fn output_path_without_extension() {
        let p = output_path(Path::new("out/foo"), TierLabel::Named(0), "png");
        assert_eq!(p, PathBuf::from("out/foo.S.png"));
    }

    #[test]
    fn output_path_keeps_dots_in_directories() {
        let p = output_path(
            Path::new("./new/v1.2/001.png"),
            TierLabel::Original,
            "jpg",
        );
        assert_eq!(p, PathBuf::from("./new/v1.2/001.R.jpg"));
    }

    #[test]
    fn output_path_only_last_extension_replaced() {
        let p = output_path(Path::new("a.b.jpg"), TierLabel::Named(3), "gif");
        assert_eq!(p, PathBuf::from("a.b.XL.gif"));
    }
}
