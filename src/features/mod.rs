//! Features Module - Request validation and feature assembly
//!
//! Turns loosely-typed request values into the ordered vector the model
//! was trained on. Pure and stateless; safe to call from any task.

pub mod assemble;
pub mod error;
pub mod raw;
pub mod schema;
pub mod vector;

// Re-export common types
pub use assemble::assemble;
pub use error::ValidationError;
pub use raw::RawInput;
pub use schema::{FeatureKind, FeatureSchema, SchemaError};
pub use vector::FeatureVector;
