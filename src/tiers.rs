//! Tier planning: which size tiers to emit for a source, and at what size.
//!
//! All functions here are pure and testable without any I/O or media files.
//!
//! For each cap, in order:
//!
//! - [`TierCap::NoResize`] emits the source resolution as `R` and does not
//!   advance the named-tier counter, so the next real cap is still `S` when
//!   the sentinel comes first.
//! - [`TierCap::Cap`] compares the **source** against the cap along its
//!   governing axis (width for landscape/square, height for portrait) and
//!   scales down to the cap when it is exceeded.
//!
//! With [`PlanMode::StopWhenFits`] planning ends after the first real cap the
//! source already fits: caps are ascending, so every later tier would be a
//! byte-identical copy. [`PlanMode::EmitAll`] keeps going regardless.

use crate::naming::TierLabel;
use crate::types::{Dimensions, TierCap};

/// Whether a fitting tier ends the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanMode {
    /// Image pipeline: stop after the first real tier that needed no scaling.
    StopWhenFits,
    /// Video pipeline: emit every tier.
    EmitAll,
}

/// A single tier to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedTier {
    pub label: TierLabel,
    pub cap: TierCap,
    /// Output resolution (the source resolution when `resize` is false).
    pub output: Dimensions,
    /// Whether the source has to be scaled down for this tier.
    pub resize: bool,
}

/// Scale `source` down to fit `cap_width`/`cap_height` along its governing axis.
///
/// Returns `None` when the source already fits. The other axis keeps the
/// aspect ratio, rounded to the nearest pixel and never below 1.
///
/// ```
/// # use tierscale::tiers::fit_to_cap;
/// # use tierscale::types::Dimensions;
/// let fitted = fit_to_cap(Dimensions::new(2000, 1000), 200, 200);
/// assert_eq!(fitted, Some(Dimensions::new(200, 100)));
/// assert_eq!(fit_to_cap(Dimensions::new(150, 100), 200, 200), None);
/// ```
pub fn fit_to_cap(source: Dimensions, cap_width: u32, cap_height: u32) -> Option<Dimensions> {
    let Dimensions { width, height } = source;
    if source.is_landscape() {
        if width <= cap_width {
            return None;
        }
        let w = cap_width.max(1);
        Some(Dimensions::new(w, scale_axis(height, w, width)))
    } else {
        if height <= cap_height {
            return None;
        }
        let h = cap_height.max(1);
        Some(Dimensions::new(scale_axis(width, h, height), h))
    }
}

/// `value * numerator / denominator`, rounded, at least 1.
fn scale_axis(value: u32, numerator: u32, denominator: u32) -> u32 {
    let scaled = (value as f64 * numerator as f64 / denominator as f64).round() as u32;
    scaled.max(1)
}

/// Round both dimensions down to even numbers (minimum 2), as most video
/// encoders reject odd frame sizes in 4:2:0 chroma.
pub fn even_resolution(dims: Dimensions) -> Dimensions {
    fn even(v: u32) -> u32 {
        (v & !1).max(2)
    }
    Dimensions::new(even(dims.width), even(dims.height))
}

/// Plan the tiers to emit for a source of the given size.
pub fn plan_tiers(source: Dimensions, caps: &[TierCap], mode: PlanMode) -> Vec<PlannedTier> {
    let mut planned = Vec::with_capacity(caps.len());
    let mut named = 0usize;

    for &cap in caps {
        match cap {
            TierCap::NoResize => planned.push(PlannedTier {
                label: TierLabel::Original,
                cap,
                output: source,
                resize: false,
            }),
            TierCap::Cap { width, height } => {
                let fitted = fit_to_cap(source, width, height);
                planned.push(PlannedTier {
                    label: TierLabel::Named(named),
                    cap,
                    output: fitted.unwrap_or(source),
                    resize: fitted.is_some(),
                });
                named += 1;

                if fitted.is_none() && mode == PlanMode::StopWhenFits {
                    break;
                }
            }
        }
    }

    planned
}
