//! ONNX Runtime regressor
//!
//! Runs an exported regression graph with input shape `[1, n]` (f32).
//! The first element of the first output is the prediction.

use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;

use super::inference::{ModelError, Regressor};

pub struct OnnxModel {
    // Session::run needs &mut
    session: Mutex<Session>,
    /// Static width of the feature axis, `None` when the graph leaves it dynamic
    input_width: Option<usize>,
}

impl OnnxModel {
    pub fn from_bytes(model_bytes: &[u8]) -> Result<Self, ModelError> {
        tracing::info!("Loading ONNX model from memory ({} bytes)", model_bytes.len());

        let session = Session::builder()
            .map_err(|e| ModelError::Load(format!("Session builder error: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ModelError::Load(format!("Optimization error: {}", e)))?
            .commit_from_memory(model_bytes)
            .map_err(|e| ModelError::Load(format!("Load from memory error: {}", e)))?;

        let input = session
            .inputs
            .first()
            .ok_or_else(|| ModelError::Load("Graph declares no inputs".to_string()))?;
        let input_width = input
            .input_type
            .tensor_shape()
            .and_then(|shape| static_width(shape));

        tracing::debug!("ONNX input '{}' width: {:?}", input.name, input_width);

        Ok(Self {
            session: Mutex::new(session),
            input_width,
        })
    }
}

/// Last axis of a `[batch, features]` input; symbolic dims are negative
fn static_width(dims: &[i64]) -> Option<usize> {
    dims.last()
        .copied()
        .filter(|dim| *dim > 0)
        .map(|dim| dim as usize)
}

impl Regressor for OnnxModel {
    fn predict(&self, features: &[f64]) -> Result<f64, ModelError> {
        if let Some(width) = self.input_width {
            if features.len() != width {
                return Err(ModelError::ShapeMismatch {
                    expected: width,
                    actual: features.len(),
                });
            }
        }

        let input: Vec<f32> = features.iter().map(|v| *v as f32).collect();
        let input_array = Array2::<f32>::from_shape_vec((1, features.len()), input)
            .map_err(|e| ModelError::Runtime(format!("Array error: {}", e)))?;

        let input_tensor = Value::from_array(input_array)
            .map_err(|e| ModelError::Runtime(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();

        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| ModelError::Runtime("No output defined".to_string()))?;

        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| ModelError::Runtime(format!("Inference failed: {}", e)))?;

        let output = outputs
            .get(&output_name)
            .ok_or_else(|| ModelError::Runtime("No output".to_string()))?;

        let output_tensor = output
            .try_extract_tensor::<f32>()
            .map_err(|e| ModelError::Runtime(format!("Extract error: {}", e)))?;

        output_tensor
            .1
            .first()
            .map(|v| *v as f64)
            .ok_or_else(|| ModelError::Runtime("Empty output tensor".to_string()))
    }

    fn feature_count(&self) -> Option<usize> {
        self.input_width
    }

    fn kind(&self) -> &'static str {
        "onnx"
    }
}
