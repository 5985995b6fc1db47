//! Model artifact loader

use crate::config::ModelFormat;
use crate::error::{Result, ScoringError};
use crate::models::classifier::Classifier;
use crate::models::forest::ForestModel;
use std::path::Path;
use tracing::info;

/// Loader for classifier artifacts
#[derive(Debug, Clone)]
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    #[cfg_attr(not(feature = "onnx"), allow(dead_code))]
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with default settings (1 thread)
    pub fn new() -> Self {
        Self::with_threads(1)
    }

    /// Create a new model loader with specified number of ONNX threads
    pub fn with_threads(onnx_threads: usize) -> Self {
        Self {
            onnx_threads: onnx_threads.max(1),
        }
    }

    /// Resolve `Auto` from the file extension
    pub fn resolve_format(path: &Path, format: ModelFormat) -> ModelFormat {
        match format {
            ModelFormat::Auto => match path.extension().and_then(|e| e.to_str()) {
                Some(ext) if ext.eq_ignore_ascii_case("onnx") => ModelFormat::Onnx,
                _ => ModelFormat::Forest,
            },
            other => other,
        }
    }

    /// Load a classifier artifact.
    ///
    /// Any failure is `ModelUnavailable`; the caller cannot serve
    /// predictions without a model.
    pub fn load<P: AsRef<Path>>(
        &self,
        path: P,
        format: ModelFormat,
    ) -> Result<Box<dyn Classifier>> {
        let path = path.as_ref();

        if !path.is_file() {
            return Err(ScoringError::model_unavailable(
                path.display(),
                "model file not found",
            ));
        }

        let format = Self::resolve_format(path, format);
        info!(path = %path.display(), format = ?format, "Loading model artifact");

        match format {
            ModelFormat::Onnx => self.load_onnx(path),
            _ => Ok(Box::new(ForestModel::load(path)?)),
        }
    }

    #[cfg(feature = "onnx")]
    fn load_onnx(&self, path: &Path) -> Result<Box<dyn Classifier>> {
        let model = crate::models::onnx::OnnxClassifier::load(path, self.onnx_threads)?;
        Ok(Box::new(model))
    }

    #[cfg(not(feature = "onnx"))]
    fn load_onnx(&self, path: &Path) -> Result<Box<dyn Classifier>> {
        Err(ScoringError::model_unavailable(
            path.display(),
            "ONNX support not compiled in; rebuild with --features onnx",
        ))
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}
