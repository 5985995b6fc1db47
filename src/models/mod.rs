//! Classifier capability and model loading

pub mod classifier;
pub mod forest;
pub mod loader;
#[cfg(feature = "onnx")]
pub mod onnx;

pub use classifier::{predict, Classifier, FeatureImportance, Prediction};
pub use forest::ForestModel;
pub use loader::ModelLoader;
