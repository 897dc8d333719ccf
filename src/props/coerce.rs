//! Raw string attributes to typed props.

use serde_json::{Map, Number, Value};

use super::schema::{PropField, PropType, PropsSchema};
use super::{PropError, Props};
use crate::element::{is_truthy, Attributes};

/// Coerce raw attributes into typed props according to `schema`.
///
/// Attribute names are matched case-insensitively. Attributes the schema
/// does not declare are dropped.
pub fn coerce(raw: &Attributes, schema: &PropsSchema) -> Result<Props, PropError> {
    let mut props = Map::new();
    for field in schema.fields() {
        match raw.get(&field.name) {
            Some(value) => {
                let typed = coerce_value(value, &field.ty, &field.name)?;
                props.insert(field.name.clone(), typed);
            }
            None => fill_missing(&mut props, field, "")?,
        }
    }
    Ok(props)
}

fn fill_missing(props: &mut Props, field: &PropField, prefix: &str) -> Result<(), PropError> {
    if let Some(default) = &field.default {
        props.insert(field.name.clone(), default.clone());
    } else if field.required {
        return Err(PropError::Missing {
            field: format!("{prefix}{}", field.name),
        });
    }
    Ok(())
}

fn coerce_value(raw: &str, ty: &PropType, path: &str) -> Result<Value, PropError> {
    let invalid = |reason: &str| PropError::Invalid {
        field: path.to_owned(),
        value: raw.to_owned(),
        reason: reason.to_owned(),
    };

    let value = match ty {
        PropType::Str => Value::String(raw.to_owned()),
        PropType::Bool => Value::Bool(is_truthy(raw)),
        PropType::Int => raw
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| invalid("expected an integer"))?,
        PropType::Float => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| invalid("expected a number"))?,
        PropType::List => match serde_json::from_str::<Value>(raw) {
            Ok(list @ Value::Array(_)) => list,
            _ => Value::Array(
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| Value::String(s.to_owned()))
                    .collect(),
            ),
        },
        PropType::Nested(schema) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(object)) => Value::Object(validate_nested(&object, schema, path)?),
            Ok(_) => return Err(invalid("expected an object")),
            Err(e) => return Err(invalid(&e.to_string())),
        },
    };
    Ok(value)
}

/// Validate an already-structured object against a nested schema.
fn validate_nested(object: &Props, schema: &PropsSchema, path: &str) -> Result<Props, PropError> {
    let prefix = format!("{path}.");
    let mut out = Map::new();
    for field in schema.fields() {
        let field_path = format!("{prefix}{}", field.name);
        match object.get(&field.name) {
            Some(value) => {
                let typed = check_json(value, &field.ty, &field_path)?;
                out.insert(field.name.clone(), typed);
            }
            None => fill_missing(&mut out, field, &prefix)?,
        }
    }
    Ok(out)
}

/// Type-check a JSON value. Strings are coerced the same way attribute text is.
fn check_json(value: &Value, ty: &PropType, path: &str) -> Result<Value, PropError> {
    if let Value::String(s) = value {
        return coerce_value(s, ty, path);
    }
    let ok = match ty {
        PropType::Str => false,
        PropType::Bool => value.is_boolean(),
        PropType::Int => value.is_i64() || value.is_u64(),
        PropType::Float => value.is_number(),
        PropType::List => value.is_array(),
        PropType::Nested(schema) => {
            return match value {
                Value::Object(object) => Ok(Value::Object(validate_nested(object, schema, path)?)),
                other => Err(PropError::Invalid {
                    field: path.to_owned(),
                    value: other.to_string(),
                    reason: "expected an object".to_owned(),
                }),
            };
        }
    };
    if ok {
        Ok(value.clone())
    } else {
        Err(PropError::Invalid {
            field: path.to_owned(),
            value: value.to_string(),
            reason: format!("expected {ty:?}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn todo_schema() -> PropsSchema {
        PropsSchema::new("TodoItem")
            .required("text", PropType::Str)
            .with_default("completed", PropType::Bool, json!(false))
            .required("id", PropType::Int)
    }

    // ── Scalars ──────────────────────────────────────────────────────

    #[test]
    fn bool_tokens() {
        let schema = PropsSchema::new("B").required("flag", PropType::Bool);
        for (raw, expected) in [("Yes", true), ("0", false), ("TRUE", true), ("on", false)] {
            let props = coerce(&attrs(&[("flag", raw)]), &schema).unwrap();
            assert_eq!(props["flag"], json!(expected), "raw={raw:?}");
        }
    }

    #[test]
    fn todo_item_props() {
        let props = coerce(
            &attrs(&[("text", "Buy milk"), ("id", "3"), ("on_remove", "remove_todo")]),
            &todo_schema(),
        )
        .unwrap();
        assert_eq!(
            Value::Object(props),
            json!({"text": "Buy milk", "completed": false, "id": 3})
        );
    }

    #[test]
    fn non_numeric_int_is_invalid() {
        let err = coerce(&attrs(&[("text", "a"), ("id", "three")]), &todo_schema()).unwrap_err();
        assert_eq!(
            err,
            PropError::Invalid {
                field: "id".into(),
                value: "three".into(),
                reason: "expected an integer".into(),
            }
        );
    }

    #[test]
    fn float_parses() {
        let schema = PropsSchema::new("F").required("ratio", PropType::Float);
        let props = coerce(&attrs(&[("ratio", " 0.5 ")]), &schema).unwrap();
        assert_eq!(props["ratio"], json!(0.5));
        assert!(coerce(&attrs(&[("ratio", "NaN")]), &schema).is_err());
    }

    #[test]
    fn missing_required_field() {
        let err = coerce(&attrs(&[("text", "a")]), &todo_schema()).unwrap_err();
        assert_eq!(err, PropError::Missing { field: "id".into() });
    }

    #[test]
    fn optional_without_default_is_omitted() {
        let schema = PropsSchema::new("O").optional("hint", PropType::Str);
        let props = coerce(&Attributes::new(), &schema).unwrap();
        assert!(props.is_empty());
    }

    // ── Collections ──────────────────────────────────────────────────

    #[test]
    fn list_prefers_json() {
        let schema = PropsSchema::new("L").required("tags", PropType::List);
        let props = coerce(&attrs(&[("tags", r#"[1, "two"]"#)]), &schema).unwrap();
        assert_eq!(props["tags"], json!([1, "two"]));
    }

    #[test]
    fn list_falls_back_to_comma_split() {
        let schema = PropsSchema::new("L").required("tags", PropType::List);
        let props = coerce(&attrs(&[("tags", "a, b,,c ")]), &schema).unwrap();
        assert_eq!(props["tags"], json!(["a", "b", "c"]));
    }

    #[test]
    fn nested_schema_validates_recursively() {
        let inner = PropsSchema::new("Owner")
            .required("name", PropType::Str)
            .with_default("admin", PropType::Bool, json!(false));
        let schema = PropsSchema::new("N").required("owner", PropType::Nested(inner));

        let props = coerce(&attrs(&[("owner", r#"{"name": "kim", "extra": 1}"#)]), &schema).unwrap();
        assert_eq!(props["owner"], json!({"name": "kim", "admin": false}));

        let err = coerce(&attrs(&[("owner", r#"{"admin": true}"#)]), &schema).unwrap_err();
        assert_eq!(err, PropError::Missing { field: "owner.name".into() });

        let err = coerce(&attrs(&[("owner", "not json")]), &schema).unwrap_err();
        assert!(matches!(err, PropError::Invalid { ref field, .. } if field == "owner"));
    }

    #[test]
    fn nested_rejects_wrong_json_type() {
        let inner = PropsSchema::new("Point").required("x", PropType::Int);
        let schema = PropsSchema::new("N").required("p", PropType::Nested(inner));
        let err = coerce(&attrs(&[("p", r#"{"x": [1]}"#)]), &schema).unwrap_err();
        assert!(matches!(err, PropError::Invalid { ref field, .. } if field == "p.x"));

        let ok = coerce(&attrs(&[("p", r#"{"x": "7"}"#)]), &schema).unwrap();
        assert_eq!(ok["p"], json!({"x": 7}));
    }
}
