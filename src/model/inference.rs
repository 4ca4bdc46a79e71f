//! Inference Engine - artifact loading and prediction
//!
//! The artifact is read once at startup and shared read-only afterwards.
//! Format is chosen by file extension:
//! - `.json` → [`LinearModel`]
//! - `.onnx` → `OnnxModel` (cargo feature `onnx`)

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::linear::LinearModel;
use crate::features::{FeatureSchema, FeatureVector};

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model not found: {0}")]
    NotFound(String),

    #[error("Failed to read model: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to load model: {0}")]
    Load(String),

    #[error("Unsupported model format '{0}' (expected .json or .onnx)")]
    UnsupportedFormat(String),

    #[error("Model expects {expected} features, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Model was loaded for layout {expected:08x}, vector has {actual:08x}")]
    LayoutMismatch { expected: u32, actual: u32 },

    #[cfg(feature = "onnx")]
    #[error("Inference failed: {0}")]
    Runtime(String),

    #[error("Model returned a non-finite prediction")]
    NonFinite,
}

// ============================================================================
// REGRESSOR TRAIT
// ============================================================================

/// Anything that maps one feature row to one number
pub trait Regressor: Send + Sync {
    fn predict(&self, features: &[f64]) -> Result<f64, ModelError>;

    /// Input width, when the artifact knows it
    fn feature_count(&self) -> Option<usize> {
        None
    }

    /// Training column names, when the artifact kept them
    fn feature_names(&self) -> Option<Vec<String>> {
        None
    }

    fn kind(&self) -> &'static str;
}

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Model metadata for the info route
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_path: String,
    pub model_type: String,
    pub sha256: String,
    pub size_bytes: u64,
    pub features: usize,
    pub layout_hash: u32,
    pub loaded_at: DateTime<Utc>,
}

/// Inference counters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceStats {
    pub inference_count: u64,
    pub error_count: u64,
    pub avg_latency_ms: f32,
}

/// Loaded model bound to the schema it was validated against
pub struct LoadedModel {
    regressor: Box<dyn Regressor>,
    metadata: ModelMetadata,
    latency_sum_us: AtomicU64,
    inference_count: AtomicU64,
    error_count: AtomicU64,
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("kind", &self.regressor.kind())
            .field("metadata", &self.metadata)
            .finish()
    }
}

impl LoadedModel {
    /// Wrap an in-memory regressor, checking it against `schema`
    pub fn new(
        regressor: Box<dyn Regressor>,
        schema: &FeatureSchema,
        model_path: &str,
        bytes: &[u8],
    ) -> Result<Self, ModelError> {
        check_compatible(regressor.as_ref(), schema)?;

        let metadata = ModelMetadata {
            model_path: model_path.to_string(),
            model_type: regressor.kind().to_string(),
            sha256: checksum(bytes),
            size_bytes: bytes.len() as u64,
            features: schema.len(),
            layout_hash: schema.layout_hash(),
            loaded_at: Utc::now(),
        };

        Ok(Self {
            regressor,
            metadata,
            latency_sum_us: AtomicU64::new(0),
            inference_count: AtomicU64::new(0),
            error_count: AtomicU64::new(0),
        })
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    /// Predict for an assembled vector. Errors are passed through unchanged.
    pub fn predict(&self, vector: &FeatureVector) -> Result<f64, ModelError> {
        if vector.layout_hash != self.metadata.layout_hash {
            self.error_count.fetch_add(1, Ordering::Relaxed);
            return Err(ModelError::LayoutMismatch {
                expected: self.metadata.layout_hash,
                actual: vector.layout_hash,
            });
        }

        let start_time = Instant::now();
        let result = self
            .regressor
            .predict(vector.as_slice())
            .and_then(|value| if value.is_finite() { Ok(value) } else { Err(ModelError::NonFinite) });

        let elapsed = start_time.elapsed().as_micros() as u64;
        self.latency_sum_us.fetch_add(elapsed, Ordering::Relaxed);
        self.inference_count.fetch_add(1, Ordering::Relaxed);
        if result.is_err() {
            self.error_count.fetch_add(1, Ordering::Relaxed);
        }

        result
    }

    pub fn stats(&self) -> InferenceStats {
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        let count = self.inference_count.load(Ordering::Relaxed);
        let avg = if count > 0 { (sum as f32 / count as f32) / 1000.0 } else { 0.0 };

        InferenceStats {
            inference_count: count,
            error_count: self.error_count.load(Ordering::Relaxed),
            avg_latency_ms: avg,
        }
    }
}

// ============================================================================
// LOADING
// ============================================================================

/// Load the artifact at `model_path` for `schema`
pub fn load_model(model_path: &str, schema: &FeatureSchema) -> Result<LoadedModel, ModelError> {
    tracing::info!("Loading model from: {}", model_path);

    let path = Path::new(model_path);
    if !path.exists() {
        return Err(ModelError::NotFound(model_path.to_string()));
    }

    let bytes = std::fs::read(path)?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let regressor: Box<dyn Regressor> = match extension.as_str() {
        "json" => Box::new(LinearModel::from_json_bytes(&bytes)?),
        #[cfg(feature = "onnx")]
        "onnx" => Box::new(super::onnx::OnnxModel::from_bytes(&bytes)?),
        other => return Err(ModelError::UnsupportedFormat(other.to_string())),
    };

    let model = LoadedModel::new(regressor, schema, model_path, &bytes)?;

    tracing::info!(
        "Model loaded: {} ({} features, sha256 {})",
        model.metadata.model_type,
        model.metadata.features,
        &model.metadata.sha256[..12]
    );

    Ok(model)
}

fn check_compatible(regressor: &dyn Regressor, schema: &FeatureSchema) -> Result<(), ModelError> {
    if let Some(count) = regressor.feature_count() {
        if count != schema.len() {
            return Err(ModelError::ShapeMismatch {
                expected: schema.len(),
                actual: count,
            });
        }
    }

    if let Some(names) = regressor.feature_names() {
        if names.iter().map(String::as_str).ne(schema.feature_names()) {
            return Err(ModelError::Load(format!(
                "Model was trained on {:?}, schema '{}' declares {:?}",
                names,
                schema.name(),
                schema.feature_names()
            )));
        }
    }

    Ok(())
}

/// Hex SHA-256 of the artifact bytes
pub fn checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

// ============================================================================
// TESTS
// ============================================================================
