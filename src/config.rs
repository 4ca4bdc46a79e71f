//! Configuration module

use std::env;
use std::path::PathBuf;

use crate::features::{FeatureSchema, SchemaError};

/// Outcome of reading `.env`.
/// Captured before tracing is initialised, logged right after.
#[derive(Debug)]
pub enum DotenvStatus {
    Loaded(PathBuf),
    Missing,
    Invalid(String),
}

impl DotenvStatus {
    pub fn from_result(result: Result<PathBuf, dotenvy::Error>) -> Self {
        match result {
            Ok(path) => DotenvStatus::Loaded(path),
            Err(e) if e.not_found() => DotenvStatus::Missing,
            Err(e) => DotenvStatus::Invalid(e.to_string()),
        }
    }

    pub fn log(&self) {
        match self {
            DotenvStatus::Loaded(path) => tracing::debug!("Loaded environment from {}", path.display()),
            DotenvStatus::Missing => tracing::debug!("No .env file found"),
            DotenvStatus::Invalid(e) => tracing::debug!("Ignoring .env file: {}", e),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Path to the model artifact (.json or .onnx)
    pub model_path: String,

    /// Built-in schema name (engagement, advertising, marketing)
    pub feature_schema: String,

    /// Custom schema file, overrides `feature_schema`
    pub feature_schema_path: Option<String>,

    /// Round predictions in responses to this many decimals
    pub prediction_decimals: Option<u32>,

    /// Environment (development, production)
    pub environment: String,

    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            model_path: "model.json".to_string(),
            feature_schema: "marketing".to_string(),
            feature_schema_path: None,
            prediction_decimals: None,
            environment: "development".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),

            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),

            model_path: lookup("MODEL_PATH").unwrap_or(defaults.model_path),

            feature_schema: lookup("FEATURE_SCHEMA").unwrap_or(defaults.feature_schema),

            feature_schema_path: lookup("FEATURE_SCHEMA_PATH").filter(|p| !p.trim().is_empty()),

            prediction_decimals: lookup("PREDICTION_DECIMALS").and_then(|d| d.parse().ok()),

            environment: lookup("ENVIRONMENT").unwrap_or(defaults.environment),

            log_format: match lookup("LOG_FORMAT").as_deref() {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        }
    }

    /// Resolve the feature schema this process serves
    pub fn load_schema(&self) -> Result<FeatureSchema, SchemaError> {
        match &self.feature_schema_path {
            Some(path) => FeatureSchema::from_json_file(path),
            None => FeatureSchema::builtin(&self.feature_schema),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
