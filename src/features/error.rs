//! Validation errors produced by the assembly pipeline

use thiserror::Error;

/// Classified client-input failure.
///
/// Every variant is deterministic for a given input and schema, so callers
/// should fix the request rather than retry it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// One or more required features are absent, listed in schema order
    #[error("Missing features: {}", format_names(.0))]
    MissingFeatures(Vec<String>),

    /// A present value could not be coerced to a finite number
    #[error("Invalid value for '{field}': expected a number, got {found}")]
    InvalidType { field: String, found: String },

    /// Values are individually well-typed but violate a domain rule
    #[error("Constraint violated: {rule} ({})", format_values(.values))]
    ConstraintViolation {
        rule: String,
        values: Vec<(String, f64)>,
    },
}

impl ValidationError {
    /// Short machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::MissingFeatures(_) => "missing_features",
            ValidationError::InvalidType { .. } => "invalid_type",
            ValidationError::ConstraintViolation { .. } => "constraint_violation",
        }
    }
}

fn format_names(names: &[String]) -> String {
    let quoted: Vec<String> = names.iter().map(|n| format!("'{}'", n)).collect();
    format!("[{}]", quoted.join(", "))
}

fn format_values(values: &[(String, f64)]) -> String {
    values
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join(", ")
}
