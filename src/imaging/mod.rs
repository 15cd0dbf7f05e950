//! Image processing on top of the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `ImageReader` header sniffing + `into_dimensions` |
//! | **Resize** | `resize_exact` with Lanczos3 |
//! | **Encode** | JPEG / PNG / WebP (lossless) / TIFF / GIF / BMP encoders |
//!
//! The module is split into:
//! - **Parameters**: formats, quality and per-file render descriptions
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: tier fan-out combining plans, naming and the backend

pub mod backend;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend, SourceInfo};
pub use operations::{identify, plan_render, render_tier, tier_formats};
pub use params::{ImageFormat, Quality, RenderParams};
pub use rust_backend::RustBackend;
