//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;

use crate::features::ValidationError;
use crate::model::ModelError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Client input errors
    Validation(ValidationError),
    BadRequest(String),

    // Model errors
    Model(ModelError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Validation(err) => {
                tracing::debug!("Rejected input ({}): {}", err.kind(), err);
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Model(err) => {
                tracing::error!("Model error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Prediction failed".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        AppError::Model(err)
    }
}
