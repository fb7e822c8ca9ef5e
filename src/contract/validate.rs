use serde_json::Value;

use super::{Contract, FieldType};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{contract} violation at {path}: {kind}")]
pub struct ContractViolation {
    pub contract: &'static str,
    pub path: String,
    pub kind: ViolationKind,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ViolationKind {
    #[error("missing required field")]
    Missing,
    #[error("expected {expected}, found {found}")]
    WrongType {
        expected: &'static str,
        found: &'static str,
    },
    #[error("length {len} is outside {bounds}")]
    Length { len: usize, bounds: String },
    #[error("value {value} is outside {bounds}")]
    OutOfRange { value: String, bounds: String },
    #[error("{value:?} is not one of {allowed:?}")]
    NotAllowed {
        value: String,
        allowed: Vec<&'static str>,
    },
    #[error("{count} items, expected {bounds}")]
    Cardinality { count: usize, bounds: String },
}

fn bounds<T: std::fmt::Display>(min: Option<T>, max: Option<T>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("{min}..={max}"),
        (Some(min), None) => format!("{min}.."),
        (None, Some(max)) => format!("..={max}"),
        (None, None) => "..".to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub(super) fn validate_object(
    contract: &Contract,
    value: &Value,
    path: &str,
) -> Result<(), ContractViolation> {
    let fail = |path: String, kind| ContractViolation {
        contract: contract.name,
        path,
        kind,
    };

    let Some(object) = value.as_object() else {
        return Err(fail(
            path.to_string(),
            ViolationKind::WrongType {
                expected: "object",
                found: json_kind(value),
            },
        ));
    };

    for field in &contract.fields {
        let field_path = format!("{path}.{}", field.name);
        match object.get(field.name) {
            None | Some(Value::Null) => {
                if field.required {
                    return Err(fail(field_path, ViolationKind::Missing));
                }
            }
            Some(inner) => validate_value(contract, &field.ty, inner, &field_path)?,
        }
    }

    Ok(())
}

fn validate_value(
    contract: &Contract,
    ty: &FieldType,
    value: &Value,
    path: &str,
) -> Result<(), ContractViolation> {
    let fail = |kind| ContractViolation {
        contract: contract.name,
        path: path.to_string(),
        kind,
    };
    let wrong_type = || {
        fail(ViolationKind::WrongType {
            expected: ty.type_name(),
            found: json_kind(value),
        })
    };

    match ty {
        FieldType::String { min_len, max_len } => {
            let text = value.as_str().ok_or_else(wrong_type)?;
            let len = text.chars().count();
            let too_short = min_len.is_some_and(|min| len < min);
            let too_long = max_len.is_some_and(|max| len > max);
            if too_short || too_long {
                return Err(fail(ViolationKind::Length {
                    len,
                    bounds: bounds(*min_len, *max_len),
                }));
            }
        }
        FieldType::Integer { min, max } => {
            let number = as_integer(value).ok_or_else(wrong_type)?;
            let below = min.is_some_and(|min| number < min);
            let above = max.is_some_and(|max| number > max);
            if below || above {
                return Err(fail(ViolationKind::OutOfRange {
                    value: number.to_string(),
                    bounds: bounds(*min, *max),
                }));
            }
        }
        FieldType::Number { min, max } => {
            let number = value.as_f64().ok_or_else(wrong_type)?;
            let below = min.is_some_and(|min| number < min);
            let above = max.is_some_and(|max| number > max);
            if below || above {
                return Err(fail(ViolationKind::OutOfRange {
                    value: number.to_string(),
                    bounds: bounds(*min, *max),
                }));
            }
        }
        FieldType::Boolean => {
            value.as_bool().ok_or_else(wrong_type)?;
        }
        FieldType::Enum(allowed) => {
            let text = value.as_str().ok_or_else(wrong_type)?;
            if !allowed.contains(&text) {
                return Err(fail(ViolationKind::NotAllowed {
                    value: text.to_string(),
                    allowed: allowed.clone(),
                }));
            }
        }
        FieldType::Array {
            items,
            min_items,
            max_items,
        } => {
            let list = value.as_array().ok_or_else(wrong_type)?;
            let count = list.len();
            let too_few = min_items.is_some_and(|min| count < min);
            let too_many = max_items.is_some_and(|max| count > max);
            if too_few || too_many {
                return Err(fail(ViolationKind::Cardinality {
                    count,
                    bounds: bounds(*min_items, *max_items),
                }));
            }
            for (idx, item) in list.iter().enumerate() {
                validate_value(contract, items, item, &format!("{path}[{idx}]"))?;
            }
        }
        FieldType::Object(nested) => validate_object(nested, value, path)?,
    }

    Ok(())
}

/// Integers may arrive as `85` or `85.0`; anything with a fraction is rejected.
/// Rewrites integral floats (`85.0`) in integer positions as JSON integers,
/// so typed decoding accepts everything validation accepted.
pub(super) fn normalize_object(contract: &Contract, value: &mut Value) {
    let Some(map) = value.as_object_mut() else {
        return;
    };
    for field in contract.fields() {
        if let Some(inner) = map.get_mut(field.name) {
            normalize_value(&field.ty, inner);
        }
    }
}

fn normalize_value(ty: &FieldType, value: &mut Value) {
    match ty {
        FieldType::Integer { .. } if value.is_f64() => {
            if let Some(number) = as_integer(value) {
                *value = Value::from(number);
            }
        }
        FieldType::Array { items, .. } => {
            if let Some(list) = value.as_array_mut() {
                for item in list {
                    normalize_value(items, item);
                }
            }
        }
        FieldType::Object(nested) => normalize_object(nested, value),
        _ => {}
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    let float = value.as_f64()?;
    if float.fract() == 0.0 && float.abs() < i64::MAX as f64 {
        Some(float as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::contract::Schema;

    struct Card;
    impl Schema for Card {
        fn contract() -> Contract {
            Contract::new("Card")
                .required("front", FieldType::text())
                .required("back", FieldType::text())
        }
    }

    fn quiz() -> Contract {
        Contract::new("Quiz")
            .required("question", FieldType::text_up_to(20))
            .required("options", FieldType::exactly(FieldType::text(), 4))
            .required("score", FieldType::integer(0, 100))
            .required("level", FieldType::one_of(&["easy", "hard"]))
            .optional("cards", FieldType::list(FieldType::object::<Card>()))
            .optional("ratio", FieldType::number(0.0, 1.0))
            .optional("done", FieldType::Boolean)
    }

    fn valid() -> Value {
        json!({
            "question": "2 + 2?",
            "options": ["1", "2", "3", "4"],
            "score": 80,
            "level": "easy",
        })
    }

    #[test]
    fn accepts_conforming_value_and_ignores_extra_fields() {
        let mut value = valid();
        value["unrelated"] = json!("kept");
        assert_eq!(quiz().validate(&value), Ok(()));
    }

    #[test]
    fn rejects_missing_and_null_required_fields() {
        let mut value = valid();
        value.as_object_mut().unwrap().remove("question");
        let err = quiz().validate(&value).unwrap_err();
        assert_eq!(err.path, "$.question");
        assert_eq!(err.kind, ViolationKind::Missing);

        let mut value = valid();
        value["score"] = Value::Null;
        assert_eq!(
            quiz().validate(&value).unwrap_err().kind,
            ViolationKind::Missing
        );
    }

    #[test]
    fn rejects_three_options_when_four_are_required() {
        let mut value = valid();
        value["options"] = json!(["a", "b", "c"]);
        let err = quiz().validate(&value).unwrap_err();
        assert_eq!(err.path, "$.options");
        assert!(matches!(
            err.kind,
            ViolationKind::Cardinality { count: 3, .. }
        ));
    }

    #[test]
    fn enforces_integer_bounds_and_kind() {
        let mut value = valid();
        value["score"] = json!(101);
        assert!(matches!(
            quiz().validate(&value).unwrap_err().kind,
            ViolationKind::OutOfRange { .. }
        ));

        value["score"] = json!(-1);
        assert!(quiz().validate(&value).is_err());

        value["score"] = json!(72.5);
        assert!(matches!(
            quiz().validate(&value).unwrap_err().kind,
            ViolationKind::WrongType {
                expected: "integer",
                ..
            }
        ));

        value["score"] = json!(72.0);
        assert_eq!(quiz().validate(&value), Ok(()));
    }

    #[test]
    fn enforces_string_length_enum_and_number_range() {
        let mut value = valid();
        value["question"] = json!("");
        assert!(matches!(
            quiz().validate(&value).unwrap_err().kind,
            ViolationKind::Length { len: 0, .. }
        ));

        let mut value = valid();
        value["level"] = json!("medium");
        assert!(matches!(
            quiz().validate(&value).unwrap_err().kind,
            ViolationKind::NotAllowed { .. }
        ));

        let mut value = valid();
        value["ratio"] = json!(1.5);
        assert!(quiz().validate(&value).is_err());

        let mut value = valid();
        value["done"] = json!("yes");
        assert!(quiz().validate(&value).is_err());
    }

    #[test]
    fn reports_nested_paths() {
        let mut value = valid();
        value["cards"] = json!([
            { "front": "a", "back": "b" },
            { "front": "c" },
        ]);
        let err = quiz().validate(&value).unwrap_err();
        assert_eq!(err.contract, "Card");
        assert_eq!(err.path, "$.cards[1].back");
    }

    #[test]
    fn rejects_non_object_root() {
        let err = quiz().validate(&json!(["not", "an", "object"])).unwrap_err();
        assert_eq!(err.path, "$");
        assert!(err.to_string().contains("expected object, found array"));
    }

    #[test]
    fn integral_floats_normalize_to_integers() {
        let mut value = valid();
        value["score"] = json!(85.0);
        value["ratio"] = json!(1.0);
        quiz().validate(&value).unwrap();
        quiz().normalize(&mut value);
        assert!(value["score"].is_u64());
        assert_eq!(value["score"], json!(85));
        assert!(value["ratio"].is_f64());
    }
}
