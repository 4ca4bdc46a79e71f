//! Model Module - Regression artifact and inference
//!
//! Kept apart from feature assembly so the artifact format can change
//! without touching request validation.

pub mod inference;
pub mod linear;
#[cfg(feature = "onnx")]
pub mod onnx;

// Re-export common types
pub use inference::{load_model, InferenceStats, LoadedModel, ModelError, ModelMetadata};
