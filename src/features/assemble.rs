//! Feature Assembly - raw input → ordered vector
//!
//! Checks run cheapest first and fail fast:
//! 1. presence (all missing names reported at once)
//! 2. numeric coercion (first bad field)
//! 3. per-slot domain checks, then relational rules
//! 4. vector construction in schema order

use super::error::ValidationError;
use super::raw::{RawInput, RawValue};
use super::schema::{FeatureSchema, FeatureSlot, Relation};
use super::vector::FeatureVector;

/// Validate `raw` against `schema` and build the model input.
///
/// Pure: same input and schema always give the same vector or the same error.
pub fn assemble(raw: &RawInput, schema: &FeatureSchema) -> Result<FeatureVector, ValidationError> {
    check_presence(raw, schema)?;

    let mut values = Vec::with_capacity(schema.len());
    for slot in schema.slots() {
        let value = match raw.get(&slot.name) {
            v if v.is_present() => coerce(&slot.name, v)?,
            _ => slot.default,
        };
        values.push(value);
    }

    for (slot, value) in schema.slots().iter().zip(values.iter()) {
        check_domain(slot, *value)?;
    }

    for relation in schema.relations() {
        check_relation(relation, schema, &values)?;
    }

    Ok(FeatureVector::new(schema, values))
}

fn check_presence(raw: &RawInput, schema: &FeatureSchema) -> Result<(), ValidationError> {
    let missing: Vec<String> = schema
        .slots()
        .iter()
        .filter(|slot| slot.required && !raw.get(&slot.name).is_present())
        .map(|slot| slot.name.clone())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingFeatures(missing))
    }
}

/// Parse one present value as a finite f64
pub fn coerce(field: &str, value: &RawValue) -> Result<f64, ValidationError> {
    let parsed = match value {
        RawValue::Number(n) => Some(*n),
        RawValue::Text(s) => s.trim().parse::<f64>().ok(),
        RawValue::Bool(_) | RawValue::Nested | RawValue::Absent => None,
    };

    match parsed {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(ValidationError::InvalidType {
            field: field.to_string(),
            found: value.describe(),
        }),
    }
}

fn check_domain(slot: &FeatureSlot, value: f64) -> Result<(), ValidationError> {
    if slot.kind.admits(value) {
        return Ok(());
    }

    Err(ValidationError::ConstraintViolation {
        rule: slot.kind.rule_for(&slot.name),
        values: vec![(slot.name.clone(), value)],
    })
}

fn check_relation(
    relation: &Relation,
    schema: &FeatureSchema,
    values: &[f64],
) -> Result<(), ValidationError> {
    match relation {
        Relation::LessOrEqual { lhs, rhs } => {
            // Both indices exist: relations are checked against slots when the schema is built
            let (Some(l), Some(r)) = (schema.index_of(lhs), schema.index_of(rhs)) else {
                return Ok(());
            };

            if values[l] <= values[r] {
                Ok(())
            } else {
                Err(ValidationError::ConstraintViolation {
                    rule: relation.describe(),
                    values: vec![(lhs.clone(), values[l]), (rhs.clone(), values[r])],
                })
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn json_input(body: serde_json::Value) -> RawInput {
        RawInput::from_json(&body).unwrap()
    }

    #[test]
    fn test_engagement_valid() {
        let raw = json_input(json!({"impressions": 100, "clicks": 50}));
        let vector = assemble(&raw, &FeatureSchema::engagement()).unwrap();
        assert_eq!(vector.values, vec![100.0, 50.0]);
    }

    #[test]
    fn test_engagement_clicks_exceed_impressions() {
        let raw = json_input(json!({"impressions": 100, "clicks": 150}));
        let err = assemble(&raw, &FeatureSchema::engagement()).unwrap_err();

        match err {
            ValidationError::ConstraintViolation { rule, values } => {
                assert_eq!(rule, "clicks <= impressions");
                assert_eq!(
                    values,
                    vec![("clicks".to_string(), 150.0), ("impressions".to_string(), 100.0)]
                );
            }
            other => panic!("expected constraint violation, got {:?}", other),
        }
    }

    #[test]
    fn test_engagement_negative_rejected() {
        let raw = json_input(json!({"impressions": -5, "clicks": 0}));
        let err = assemble(&raw, &FeatureSchema::engagement()).unwrap_err();

        assert_eq!(
            err,
            ValidationError::ConstraintViolation {
                rule: "impressions >= 0".into(),
                values: vec![("impressions".into(), -5.0)],
            }
        );
    }

    #[test]
    fn test_advertising_declared_order() {
        // Input order and alphabetical order both differ from the schema
        let raw = json_input(json!({"Newspaper": 69.2, "Radio": 37.8, "TV": 230.1}));
        let vector = assemble(&raw, &FeatureSchema::advertising()).unwrap();
        assert_eq!(vector.values, vec![230.1, 37.8, 69.2]);
    }

    #[test]
    fn test_missing_lists_all_in_schema_order() {
        let raw = json_input(json!({"Radio": 37.8}));
        let err = assemble(&raw, &FeatureSchema::advertising()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingFeatures(vec!["TV".into(), "Newspaper".into()])
        );
    }

    #[test]
    fn test_null_and_blank_count_as_missing() {
        let raw = json_input(json!({"TV": null, "Radio": "", "Newspaper": "  "}));
        let err = assemble(&raw, &FeatureSchema::advertising()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingFeatures(vec!["TV".into(), "Radio".into(), "Newspaper".into()])
        );
    }

    #[test]
    fn test_presence_checked_before_type() {
        let raw = json_input(json!({"TV": "abc"}));
        let err = assemble(&raw, &FeatureSchema::advertising()).unwrap_err();
        assert!(matches!(err, ValidationError::MissingFeatures(_)));
    }

    #[test]
    fn test_type_checked_before_constraint() {
        let raw = json_input(json!({"impressions": -1, "clicks": "many"}));
        let err = assemble(&raw, &FeatureSchema::engagement()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidType {
                field: "clicks".into(),
                found: "\"many\"".into()
            }
        );
    }

    #[test]
    fn test_text_and_number_coerce_equally() {
        let from_text = json_input(json!({"TV": "230.1", "Radio": " 37.8 ", "Newspaper": "69.2"}));
        let from_number = json_input(json!({"TV": 230.1, "Radio": 37.8, "Newspaper": 69.2}));
        let schema = FeatureSchema::advertising();

        assert_eq!(
            assemble(&from_text, &schema).unwrap(),
            assemble(&from_number, &schema).unwrap()
        );
    }

    #[test]
    fn test_integer_text() {
        assert_eq!(coerce("impressions", &RawValue::Text("1500".into())), Ok(1500.0));
    }

    #[test]
    fn test_non_numeric_inputs_rejected() {
        for value in [
            RawValue::Text("abc".into()),
            RawValue::Text("NaN".into()),
            RawValue::Text("inf".into()),
            RawValue::Bool(true),
            RawValue::Nested,
            RawValue::Number(f64::NAN),
        ] {
            let err = coerce("TV", &value).unwrap_err();
            assert!(
                matches!(&err, ValidationError::InvalidType { field, .. } if field == "TV"),
                "{:?} should be rejected",
                value
            );
        }
    }

    #[test]
    fn test_superfluous_keys_ignored() {
        let raw = json_input(json!({"impressions": 10, "clicks": 1, "campaign": "spring"}));
        let vector = assemble(&raw, &FeatureSchema::engagement()).unwrap();
        assert_eq!(vector.values, vec![10.0, 1.0]);
    }

    #[test]
    fn test_marketing_flags() {
        let schema = FeatureSchema::marketing();
        let mut body = json!({
            "impressions": 1200, "clicks": 48, "spend": 35.5, "hour": 14,
            "day_of_week": 2, "is_weekend": 0, "is_business_hours": 1,
            "impressions_lag_1": 1100, "clicks_lag_1": 40, "conversions_lag_1": 3,
            "impressions_rolling_mean_24": 1050.5, "clicks_rolling_mean_24": 41.2
        });

        let vector = assemble(&json_input(body.clone()), &schema).unwrap();
        assert_eq!(vector.values.len(), 12);
        assert_eq!(vector.values[0], 1200.0);
        assert_eq!(vector.values[6], 1.0);
        assert_eq!(vector.values[11], 41.2);

        body["is_weekend"] = json!(2);
        let err = assemble(&json_input(body), &schema).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::ConstraintViolation { values, .. } if values[0].0 == "is_weekend"
        ));
    }

    #[test]
    fn test_optional_slot_uses_default() {
        let schema = FeatureSchema::from_json_str(
            r#"{
                "name": "promo",
                "features": [
                    {"name": "spend", "kind": "non_negative"},
                    {"name": "promo", "kind": "flag", "required": false}
                ]
            }"#,
        )
        .unwrap();

        let vector = assemble(&json_input(json!({"spend": 10})), &schema).unwrap();
        assert_eq!(vector.values, vec![10.0, 0.0]);

        let vector = assemble(&json_input(json!({"spend": 10, "promo": "1"})), &schema).unwrap();
        assert_eq!(vector.values, vec![10.0, 1.0]);
    }

    #[test]
    fn test_idempotent() {
        let raw = json_input(json!({"TV": "0.1", "Radio": 1e-9, "Newspaper": "123456.789"}));
        let schema = FeatureSchema::advertising();

        let first = assemble(&raw, &schema).unwrap();
        let second = assemble(&raw, &schema).unwrap();

        let bits = |v: &FeatureVector| v.values.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&first), bits(&second));
        assert_eq!(first.layout_hash, second.layout_hash);

        let bad = json_input(json!({"TV": "x"}));
        assert_eq!(assemble(&bad, &schema), assemble(&bad, &schema));
    }
}
