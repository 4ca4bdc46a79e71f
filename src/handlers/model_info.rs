//! Model info handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::features::FeatureKind;
use crate::model::{InferenceStats, ModelMetadata};
use crate::AppState;

#[derive(Serialize)]
pub struct SlotInfo {
    name: String,
    kind: FeatureKind,
    required: bool,
}

#[derive(Serialize)]
pub struct SchemaInfo {
    name: String,
    version: u8,
    layout_hash: String,
    feature_count: usize,
    features: Vec<SlotInfo>,
    constraints: Vec<String>,
}

#[derive(Serialize)]
pub struct ModelInfoResponse {
    schema: SchemaInfo,
    model: ModelMetadata,
    stats: InferenceStats,
}

pub async fn info(State(state): State<AppState>) -> Json<ModelInfoResponse> {
    let schema = &state.schema;

    let features = schema
        .slots()
        .iter()
        .map(|slot| SlotInfo {
            name: slot.name.clone(),
            kind: slot.kind,
            required: slot.required,
        })
        .collect();

    Json(ModelInfoResponse {
        schema: SchemaInfo {
            name: schema.name().to_string(),
            version: schema.version(),
            layout_hash: format!("{:08x}", schema.layout_hash()),
            feature_count: schema.len(),
            features,
            constraints: schema.relations().iter().map(|r| r.describe()).collect(),
        },
        model: state.model.metadata().clone(),
        stats: state.model.stats(),
    })
}
