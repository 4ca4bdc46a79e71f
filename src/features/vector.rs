//! Feature Vector - Ordered model input
//!
//! Values are stored in the order the schema declares them. The layout hash
//! travels with the values so a vector built for one schema is never fed to
//! a model loaded for another.

use serde::{Deserialize, Serialize};

use super::schema::FeatureSchema;

/// Ordered numeric features tagged with the layout they were built for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// CRC32 of the schema layout
    pub layout_hash: u32,
    /// Values in schema-declared order
    pub values: Vec<f64>,
}

impl FeatureVector {
    pub fn new(schema: &FeatureSchema, values: Vec<f64>) -> Self {
        Self {
            layout_hash: schema.layout_hash(),
            values,
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Convert to JSON for debug logging
    pub fn to_log_entry(&self, schema: &FeatureSchema) -> serde_json::Value {
        let named: serde_json::Map<String, serde_json::Value> = schema
            .feature_names()
            .into_iter()
            .zip(self.values.iter())
            .map(|(name, value)| (name.to_string(), serde_json::json!(value)))
            .collect();

        serde_json::json!({
            "schema": schema.name(),
            "layout_hash": format!("{:08x}", self.layout_hash),
            "values": named,
        })
    }
}
