//! Prediction handlers
//!
//! Both transports build a `RawInput` and share one path:
//! assemble → model → response.

use std::collections::HashMap;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::features::{assemble, RawInput};
use crate::{AppError, AppResult, AppState};

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: f64,
    pub status: String,
    pub schema: String,
    pub request_id: Uuid,
}

/// POST /predict with a JSON object body
pub async fn predict_json(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<PredictResponse>> {
    let Json(body) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let raw = RawInput::from_json(&body)
        .ok_or_else(|| AppError::BadRequest("Request body must be a JSON object".to_string()))?;

    run_prediction(&state, raw)
}

/// GET /predict with query parameters
pub async fn predict_query(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<PredictResponse>> {
    run_prediction(&state, RawInput::from_query(params))
}

fn run_prediction(state: &AppState, raw: RawInput) -> AppResult<Json<PredictResponse>> {
    let request_id = Uuid::new_v4();
    let start_time = Instant::now();

    let vector = assemble(&raw, &state.schema)?;
    tracing::trace!(%request_id, features = %vector.to_log_entry(&state.schema), "Assembled features");

    let prediction = state.model.predict(&vector)?;
    let prediction = match state.config.prediction_decimals {
        Some(decimals) => round_to(prediction, decimals),
        None => prediction,
    };

    tracing::debug!(
        %request_id,
        schema = state.schema.name(),
        prediction,
        latency_us = start_time.elapsed().as_micros() as u64,
        "Prediction served"
    );

    Ok(Json(PredictResponse {
        prediction,
        status: "success".to_string(),
        schema: state.schema.name().to_string(),
        request_id,
    }))
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals.min(15) as i32);
    (value * factor).round() / factor
}
