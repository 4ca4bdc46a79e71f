//! Feature Schema - Ordered feature definition
//!
//! **The slot order of a schema is the column order the model was trained on.**
//!
//! ## Rules:
//! 1. Add / remove / reorder a slot → bump `version`
//! 2. The layout hash covers version + ordered names, so any of the above
//!    changes it
//! 3. Never sort slots; assembly emits values in declared order

use std::collections::HashSet;
use std::path::Path;

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

// ============================================================================
// SLOT DEFINITION
// ============================================================================

/// Semantic type of a feature slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    /// Any finite number
    Numeric,
    /// Finite number >= 0
    NonNegative,
    /// Categorical flag, 0 or 1
    Flag,
}

impl FeatureKind {
    /// Whether a finite value satisfies this kind's domain rule
    pub fn admits(&self, value: f64) -> bool {
        match self {
            FeatureKind::Numeric => true,
            FeatureKind::NonNegative => value >= 0.0,
            FeatureKind::Flag => value == 0.0 || value == 1.0,
        }
    }

    /// Human-readable rule for `field`, used in violation messages
    pub fn rule_for(&self, field: &str) -> String {
        match self {
            FeatureKind::Numeric => format!("{} is a number", field),
            FeatureKind::NonNegative => format!("{} >= 0", field),
            FeatureKind::Flag => format!("{} in {{0, 1}}", field),
        }
    }
}

/// One named position in the feature vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSlot {
    pub name: String,
    pub kind: FeatureKind,
    #[serde(default = "default_required")]
    pub required: bool,
    /// Value used when an optional slot is absent
    #[serde(default)]
    pub default: f64,
}

fn default_required() -> bool {
    true
}

impl FeatureSlot {
    pub fn required(name: &str, kind: FeatureKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: true,
            default: 0.0,
        }
    }
}

/// Relational rule between two slots, checked after per-slot checks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Relation {
    /// `lhs <= rhs`
    LessOrEqual { lhs: String, rhs: String },
}

impl Relation {
    pub fn describe(&self) -> String {
        match self {
            Relation::LessOrEqual { lhs, rhs } => format!("{} <= {}", lhs, rhs),
        }
    }

    fn fields(&self) -> [&str; 2] {
        match self {
            Relation::LessOrEqual { lhs, rhs } => [lhs.as_str(), rhs.as_str()],
        }
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Failed to read schema file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse schema file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid schema: {0}")]
    Invalid(String),

    #[error("Unknown built-in schema '{0}' (expected engagement, advertising or marketing)")]
    UnknownBuiltin(String),
}

/// Immutable, ordered feature schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct FeatureSchema {
    #[validate(length(min = 1, message = "schema name must not be empty"))]
    name: String,
    #[serde(default = "default_version")]
    version: u8,
    #[validate(length(min = 1, message = "schema needs at least one feature"))]
    features: Vec<FeatureSlot>,
    #[serde(default)]
    relations: Vec<Relation>,
}

fn default_version() -> u8 {
    1
}

impl FeatureSchema {
    /// `{impressions, clicks}` with `clicks <= impressions`
    pub fn engagement() -> Self {
        Self {
            name: "engagement".to_string(),
            version: 1,
            features: vec![
                FeatureSlot::required("impressions", FeatureKind::NonNegative),
                FeatureSlot::required("clicks", FeatureKind::NonNegative),
            ],
            relations: vec![Relation::LessOrEqual {
                lhs: "clicks".to_string(),
                rhs: "impressions".to_string(),
            }],
        }
    }

    /// `{TV, Radio, Newspaper}` advertising spend
    pub fn advertising() -> Self {
        Self {
            name: "advertising".to_string(),
            version: 1,
            features: vec![
                FeatureSlot::required("TV", FeatureKind::Numeric),
                FeatureSlot::required("Radio", FeatureKind::Numeric),
                FeatureSlot::required("Newspaper", FeatureKind::Numeric),
            ],
            relations: Vec::new(),
        }
    }

    /// 12-field temporal/marketing schema
    pub fn marketing() -> Self {
        use FeatureKind::{Flag, Numeric};

        let features = [
            ("impressions", Numeric),
            ("clicks", Numeric),
            ("spend", Numeric),
            ("hour", Numeric),
            ("day_of_week", Numeric),
            ("is_weekend", Flag),
            ("is_business_hours", Flag),
            ("impressions_lag_1", Numeric),
            ("clicks_lag_1", Numeric),
            ("conversions_lag_1", Numeric),
            ("impressions_rolling_mean_24", Numeric),
            ("clicks_rolling_mean_24", Numeric),
        ]
        .into_iter()
        .map(|(name, kind)| FeatureSlot::required(name, kind))
        .collect();

        Self {
            name: "marketing".to_string(),
            version: 1,
            features,
            relations: Vec::new(),
        }
    }

    /// Look up a built-in schema by name
    pub fn builtin(name: &str) -> Result<Self, SchemaError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "engagement" => Ok(Self::engagement()),
            "advertising" => Ok(Self::advertising()),
            "marketing" => Ok(Self::marketing()),
            other => Err(SchemaError::UnknownBuiltin(other.to_string())),
        }
    }

    /// Load a custom schema from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self, SchemaError> {
        let schema: FeatureSchema = serde_json::from_str(content)?;
        schema.check()?;
        Ok(schema)
    }

    /// Structural validation: field constraints, unique names, known relation fields
    fn check(&self) -> Result<(), SchemaError> {
        self.validate()
            .map_err(|e| SchemaError::Invalid(e.to_string()))?;

        let mut seen = HashSet::new();
        for slot in &self.features {
            if slot.name.trim().is_empty() {
                return Err(SchemaError::Invalid("feature name must not be empty".into()));
            }
            if !seen.insert(slot.name.as_str()) {
                return Err(SchemaError::Invalid(format!("duplicate feature '{}'", slot.name)));
            }
            if !slot.default.is_finite() {
                return Err(SchemaError::Invalid(format!(
                    "default for '{}' must be finite",
                    slot.name
                )));
            }
            // Absent optional slots take their default, which then goes through the same domain check
            if !slot.required && !slot.kind.admits(slot.default) {
                return Err(SchemaError::Invalid(format!(
                    "default {} for '{}' violates {}",
                    slot.default,
                    slot.name,
                    slot.kind.rule_for(&slot.name)
                )));
            }
        }

        for relation in &self.relations {
            for field in relation.fields() {
                if !seen.contains(field) {
                    return Err(SchemaError::Invalid(format!(
                        "relation '{}' references unknown feature '{}'",
                        relation.describe(),
                        field
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn slots(&self) -> &[FeatureSlot] {
        &self.features
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Feature names in declared order
    pub fn feature_names(&self) -> Vec<&str> {
        self.features.iter().map(|s| s.name.as_str()).collect()
    }

    /// Position of a feature in the vector
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.features.iter().position(|s| s.name == name)
    }

    /// CRC32 over version and ordered names.
    /// Used to detect layout mismatches between clients and the loaded model.
    pub fn layout_hash(&self) -> u32 {
        let mut hasher = Hasher::new();

        hasher.update(&[self.version]);

        for slot in &self.features {
            hasher.update(slot.name.as_bytes());
            hasher.update(&[0]); // Separator
        }

        hasher.finalize()
    }
}

// ============================================================================
// TESTS
// ============================================================================
