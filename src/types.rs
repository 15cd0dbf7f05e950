//! Shared types used by both the image and the video pipeline.
//!
//! [`TierCap`] is also the on-disk representation of a tier in `tierscale.toml`:
//! either a `[width, height]` pair or the keyword `"original"`. For
//! compatibility with older tier lists, a pair with a negative component
//! (e.g. `[-1, -1]`) also means "original".

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pixel resolution of a media item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Landscape or square.
    pub fn is_landscape(self) -> bool {
        self.width >= self.height
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// One entry of a tier specification.
///
/// `NoResize` emits the source at its own resolution under the `R` label and
/// does not take a slot in the `S, M, L, XL, ...` sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTierCap", into = "RawTierCap")]
pub enum TierCap {
    NoResize,
    Cap { width: u32, height: u32 },
}

impl TierCap {
    pub fn cap(width: u32, height: u32) -> Self {
        TierCap::Cap { width, height }
    }

    /// Convert a signed `(width, height)` pair, treating any negative
    /// component as the "original resolution" sentinel.
    pub fn from_signed(width: i64, height: i64) -> Result<Self, String> {
        if width < 0 || height < 0 {
            return Ok(TierCap::NoResize);
        }
        let width = u32::try_from(width).map_err(|_| format!("tier width {width} is too large"))?;
        let height =
            u32::try_from(height).map_err(|_| format!("tier height {height} is too large"))?;
        Ok(TierCap::Cap { width, height })
    }
}

impl fmt::Display for TierCap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TierCap::NoResize => f.write_str("original"),
            TierCap::Cap { width, height } => write!(f, "{}x{}", width, height),
        }
    }
}

const ORIGINAL_KEYWORD: &str = "original";

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawTierCap {
    Keyword(String),
    Pair([i64; 2]),
}

impl TryFrom<RawTierCap> for TierCap {
    type Error = String;

    fn try_from(raw: RawTierCap) -> Result<Self, Self::Error> {
        match raw {
            RawTierCap::Keyword(k) if k.eq_ignore_ascii_case(ORIGINAL_KEYWORD) => {
                Ok(TierCap::NoResize)
            }
            RawTierCap::Keyword(k) => Err(format!(
                "unknown tier `{k}`: expected [width, height] or \"{ORIGINAL_KEYWORD}\""
            )),
            RawTierCap::Pair([w, h]) => TierCap::from_signed(w, h),
        }
    }
}

impl From<TierCap> for RawTierCap {
    fn from(cap: TierCap) -> Self {
        match cap {
            TierCap::NoResize => RawTierCap::Keyword(ORIGINAL_KEYWORD.to_string()),
            TierCap::Cap { width, height } => RawTierCap::Pair([width as i64, height as i64]),
        }
    }
}
