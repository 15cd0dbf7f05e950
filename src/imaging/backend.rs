//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the image pipeline
//! needs: `identify` (dimensions + format from the file header) and `render`
//! (write one output file, resized or not).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use the recording `MockBackend` below.

use super::params::{ImageFormat, RenderParams};
use crate::types::Dimensions;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot decode {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),
    #[error("cannot encode {}: {message}", path.display())]
    Encode { path: PathBuf, message: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceInfo {
    pub dimensions: Dimensions,
    /// Canonical source format.
    pub format: ImageFormat,
}

/// Trait for image processing backends.
pub trait ImageBackend {
    /// Read dimensions and format from the file header.
    fn identify(&self, path: &Path) -> Result<SourceInfo, BackendError>;

    /// Write one output file, creating or overwriting it.
    fn render(&self, params: &RenderParams) -> Result<(), BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::Quality;
    use std::sync::Mutex;

    /// Mock backend that records operations without executing them.
    #[derive(Default)]
    pub struct MockBackend {
        pub identify_results: Mutex<Vec<SourceInfo>>,
        /// Output file names whose render call fails.
        pub failing_outputs: Mutex<Vec<String>>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(String),
        Render {
            source: String,
            output: String,
            resize_to: Option<(u32, u32)>,
            format: ImageFormat,
            quality: Quality,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Results are handed out in order, one per identify call.
        pub fn with_sources(mut sources: Vec<SourceInfo>) -> Self {
            sources.reverse();
            Self {
                identify_results: Mutex::new(sources),
                ..Self::default()
            }
        }

        pub fn fail_on(self, output_file_name: &str) -> Self {
            self.failing_outputs
                .lock()
                .unwrap()
                .push(output_file_name.to_string());
            self
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn rendered_outputs(&self) -> Vec<String> {
            self.get_operations()
                .into_iter()
                .filter_map(|op| match op {
                    RecordedOp::Render { output, .. } => Some(output),
                    RecordedOp::Identify(_) => None,
                })
                .collect()
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, path: &Path) -> Result<SourceInfo, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(path.to_string_lossy().to_string()));

            self.identify_results
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| BackendError::Decode {
                    path: path.to_path_buf(),
                    message: "no mock source info".to_string(),
                })
        }

        fn render(&self, params: &RenderParams) -> Result<(), BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Render {
                source: params.source.to_string_lossy().to_string(),
                output: params.output.to_string_lossy().to_string(),
                resize_to: params.resize_to.map(|d| (d.width, d.height)),
                format: params.format,
                quality: params.quality,
            });

            let file_name = params
                .output
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            if self.failing_outputs.lock().unwrap().contains(&file_name) {
                return Err(BackendError::Encode {
                    path: params.output.clone(),
                    message: "mock encode failure".to_string(),
                });
            }
            Ok(())
        }
    }

    #[test]
    fn mock_hands_out_sources_in_order() {
        let backend = MockBackend::with_sources(vec![
            SourceInfo {
                dimensions: Dimensions::new(800, 600),
                format: ImageFormat::Jpg,
            },
            SourceInfo {
                dimensions: Dimensions::new(10, 20),
                format: ImageFormat::Png,
            },
        ]);

        let first = backend.identify(Path::new("/a.jpg")).unwrap();
        let second = backend.identify(Path::new("/b.png")).unwrap();
        assert_eq!(first.dimensions, Dimensions::new(800, 600));
        assert_eq!(second.format, ImageFormat::Png);
        assert!(backend.identify(Path::new("/c.png")).is_err());
    }

    #[test]
    fn mock_records_render() {
        let backend = MockBackend::new();

        backend
            .render(&RenderParams {
                source: "/source.jpg".into(),
                output: "/out/source.S.webp".into(),
                resize_to: Some(Dimensions::new(200, 100)),
                format: ImageFormat::Webp,
                quality: Quality::Level(80),
            })
            .unwrap();

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(
            &ops[0],
            RecordedOp::Render {
                resize_to: Some((200, 100)),
                format: ImageFormat::Webp,
                quality: Quality::Level(80),
                ..
            }
        ));
    }

    #[test]
    fn mock_fails_on_requested_output() {
        let backend = MockBackend::new().fail_on("x.S.png");
        let result = backend.render(&RenderParams {
            source: "/x.png".into(),
            output: "/out/x.S.png".into(),
            resize_to: None,
            format: ImageFormat::Png,
            quality: Quality::CodecDefault,
        });
        assert!(matches!(result, Err(BackendError::Encode { .. })));
    }
}
