//! ONNX Runtime backed classifier

use crate::error::{Result, ScoringError};
use crate::feature_extractor::FeatureVector;
use crate::models::classifier::Classifier;
use ort::memory::Allocator;
use ort::session::{builder::GraphOptimizationLevel, Session, SessionOutputs};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, DynValue, Tensor};
use serde::Deserialize;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, info, warn};

/// Training metadata exported next to the ONNX graph
#[derive(Debug, Clone, Deserialize)]
struct FeatureMetadata {
    feature_names: Vec<String>,
    feature_importances: Vec<f64>,
}

/// Sidecar path: `model.onnx` -> `model.features.json`
pub fn metadata_path(model_path: &Path) -> PathBuf {
    model_path.with_extension("features.json")
}

/// ONNX classifier with its feature metadata
pub struct OnnxClassifier {
    name: String,
    /// Session runs need exclusive access
    session: RwLock<Session>,
    input_name: String,
    output_name: String,
    metadata: FeatureMetadata,
}

impl OnnxClassifier {
    /// Load an ONNX model and its sidecar metadata
    pub fn load<P: AsRef<Path>>(path: P, onnx_threads: usize) -> Result<Self> {
        let path = path.as_ref();
        let name = path.display().to_string();
        let unavailable = |e: &dyn Display| ScoringError::model_unavailable(&name, e);

        let meta_path = metadata_path(path);
        let raw = std::fs::read_to_string(&meta_path).map_err(|e| {
            unavailable(&format!("cannot read {}: {e}", meta_path.display()))
        })?;
        let metadata: FeatureMetadata = serde_json::from_str(&raw).map_err(|e| unavailable(&e))?;

        if metadata.feature_names.len() != metadata.feature_importances.len() {
            return Err(unavailable(&format!(
                "{} feature importances for {} features",
                metadata.feature_importances.len(),
                metadata.feature_names.len()
            )));
        }

        info!(model = %name, threads = onnx_threads, "Loading ONNX model");

        let session = Session::builder()
            .map_err(|e| unavailable(&e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| unavailable(&e))?
            .with_intra_threads(onnx_threads)
            .map_err(|e| unavailable(&e))?
            .commit_from_file(path)
            .map_err(|e| unavailable(&e))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| session.outputs.last())
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "probabilities".to_string());

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            "ONNX model loaded"
        );

        Ok(Self {
            name,
            session: RwLock::new(session),
            input_name,
            output_name,
            metadata,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn feature_names(&self) -> &[String] {
        &self.metadata.feature_names
    }

    fn feature_importances(&self) -> &[f64] {
        &self.metadata.feature_importances
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<[f64; 2]> {
        let inference = |e: &dyn Display| ScoringError::InferenceError(e.to_string());

        // Input shape [1, num_features]
        let shape = vec![1_i64, features.len() as i64];
        let input = Tensor::from_array((shape, features.to_f32())).map_err(|e| inference(&e))?;

        let mut session = self
            .session
            .write()
            .map_err(|e| inference(&format!("session lock poisoned: {e}")))?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(|e| inference(&e))?;

        let p1 = extract_probability(&outputs, &self.output_name).map_err(|e| inference(&e))?;

        debug!(model = %self.name, probability = p1, "ONNX inference complete");

        Ok([1.0 - p1, p1])
    }
}

/// Fraud probability from the session outputs.
///
/// Tries the configured output first, then every non-label output. Tensor
/// outputs hold `[batch, classes]` probabilities; scikit-learn's ZipMap
/// export holds `seq(map(int64, float))` instead.
fn extract_probability(
    outputs: &SessionOutputs,
    output_name: &str,
) -> std::result::Result<f64, String> {
    if let Some(output) = outputs.get(output_name) {
        match probability_from_value(output) {
            Ok(p1) => return Ok(p1),
            Err(e) => warn!(output = %output_name, error = %e, "Configured output unusable"),
        }
    }

    for (name, output) in outputs.iter() {
        if name == output_name || name.contains("label") {
            continue;
        }
        if let Ok(p1) = probability_from_value(&output) {
            debug!(output = %name, probability = p1, "Probability taken from fallback output");
            return Ok(p1);
        }
    }

    Err(format!("no probability output found (expected `{output_name}`)"))
}

fn probability_from_value(output: &DynValue) -> std::result::Result<f64, String> {
    if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
        let dims: Vec<i64> = shape.iter().copied().collect();
        return probability_from_tensor(&dims, data);
    }

    if DynSequenceValueType::can_downcast(&output.dtype()) {
        return probability_from_sequence_map(output);
    }

    Err(format!("unsupported output type {:?}", output.dtype()))
}

/// `[1, 2]` or `[2]` class probabilities, or a single fraud probability
fn probability_from_tensor(dims: &[i64], data: &[f32]) -> std::result::Result<f64, String> {
    let classes = dims.last().copied().unwrap_or(data.len() as i64);
    match (classes, data) {
        (c, [_, p1, ..]) if c >= 2 => Ok(f64::from(*p1)),
        (1, [p1, ..]) => Ok(f64::from(*p1)),
        _ => Err(format!("unexpected probability tensor shape {dims:?}")),
    }
}

fn probability_from_sequence_map(output: &DynValue) -> std::result::Result<f64, String> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(|e| format!("not a sequence: {e}"))?;
    let maps = sequence
        .try_extract_sequence::<DynMapValueType>(&allocator)
        .map_err(|e| e.to_string())?;

    // batch size is always 1
    let first = maps.first().ok_or("empty probability sequence")?;
    let pairs = first
        .try_extract_key_values::<i64, f32>()
        .map_err(|e| e.to_string())?;

    class_one_probability(&pairs)
}

fn class_one_probability(pairs: &[(i64, f32)]) -> std::result::Result<f64, String> {
    if let Some((_, p1)) = pairs.iter().find(|(class, _)| *class == 1) {
        return Ok(f64::from(*p1));
    }
    if let Some((_, p0)) = pairs.iter().find(|(class, _)| *class == 0) {
        return Ok(1.0 - f64::from(*p0));
    }
    Err("probability map has neither class 0 nor class 1".to_string())
}
