//! A partial JSON-Schema draft checker over [`Element`] trees.
//!
//! A schema is either a boolean (`true` accepts everything, `false`
//! rejects everything) or an object carrying constraint keywords. The
//! supported keywords are `type`, `enum`, `const`, `minLength`,
//! `maxLength`, `pattern` (reserved), `multipleOf`, `minimum`,
//! `exclusiveMinimum`, `maximum`, `exclusiveMaximum`, `properties`,
//! `minProperties`, and `maxProperties`. `$id` and `$defs` are validated
//! for shape at the root; `$ref` resolution is not performed.

use std::cmp::Ordering;

use thiserror::Error;

use crate::dom::{Element, Object};

/// An error produced while checking an instance against a schema.
///
/// The taxonomy is disjoint from the parser's [`Error`](crate::Error):
/// [`Validation`](SchemaError::Validation) means the instance failed the
/// schema; every other member means the schema itself is malformed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaError {
    #[error("schema validation failed")]
    Validation,

    #[error("schema $defs value must be an object")]
    DefsMustBeObject,

    #[error("schema enum value must be an array")]
    EnumMustBeArray,

    #[error("schema must be boolean or object")]
    NotBooleanOrObject,

    #[error("schema expected a number")]
    ExpectedNumber,

    #[error("schema expected a non-negative integer")]
    ExpectedNonNegativeInteger,

    #[error("schema expected a string")]
    ExpectedString,

    #[error("schema pattern constraint was not a string")]
    PatternString,

    #[error("schema properties keyword value must be an object")]
    PropertiesMustBeObject,

    #[error("schema type constraint was not a string or an array")]
    TypeStringOrStringArray,

    #[error("schema type name invalid")]
    TypeNameInvalid,
}

fn bool_to_result(b: bool) -> Result<(), SchemaError> {
    if b {
        Ok(())
    } else {
        Err(SchemaError::Validation)
    }
}

/// A numeric instance or constraint value.
#[derive(Clone, Copy, Debug)]
enum Num {
    Int(i64),
    Uint(u64),
    Float(f64),
}

fn as_num(el: &Element) -> Option<Num> {
    match el {
        Element::I64(v) => Some(Num::Int(*v)),
        Element::U64(v) => Some(Num::Uint(*v)),
        Element::Double(v) => Some(Num::Float(*v)),
        _ => None,
    }
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(v) => v as f64,
            Num::Uint(v) => v as f64,
            Num::Float(v) => v,
        }
    }

    fn as_i128(self) -> Option<i128> {
        match self {
            Num::Int(v) => Some(i128::from(v)),
            Num::Uint(v) => Some(i128::from(v)),
            Num::Float(_) => None,
        }
    }
}

/// Compare two numbers, promoting to `f64` when either side is a float
/// and comparing exactly otherwise.
fn compare(a: Num, b: Num) -> Option<Ordering> {
    match (a.as_i128(), b.as_i128()) {
        (Some(x), Some(y)) => Some(x.cmp(&y)),
        _ => a.as_f64().partial_cmp(&b.as_f64()),
    }
}

fn is_multiple_of(a: Num, divisor: Num) -> bool {
    match (a.as_i128(), divisor.as_i128()) {
        (Some(x), Some(y)) => y != 0 && x % y == 0,
        _ => {
            let d = divisor.as_f64();
            if d == 0.0 {
                return false;
            }
            let t = a.as_f64() / d;
            t == t.floor()
        }
    }
}

fn is_integer(el: &Element) -> bool {
    match el {
        Element::I64(_) | Element::U64(_) => true,
        Element::Double(d) => *d == d.trunc(),
        _ => false,
    }
}

fn check_type_name(name: &str, instance: &Element) -> Result<(), SchemaError> {
    let matched = match name {
        "array" => matches!(instance, Element::Array(_)),
        "boolean" => matches!(instance, Element::Bool(_)),
        "integer" => is_integer(instance),
        "null" => matches!(instance, Element::Null),
        "number" => as_num(instance).is_some(),
        "object" => matches!(instance, Element::Object(_)),
        "string" => matches!(instance, Element::String(_)),
        _ => return Err(SchemaError::TypeNameInvalid),
    };
    bool_to_result(matched)
}

fn check_type(type_name: &Element, instance: &Element) -> Result<(), SchemaError> {
    match type_name {
        Element::String(name) => check_type_name(name, instance),
        _ => Err(SchemaError::TypeNameInvalid),
    }
}

/// Evaluate a numeric-comparison keyword. The keyword validates only if
/// `pred` holds for the ordering of (instance, constraint).
fn comparison_constraint(
    schema: &Object,
    keyword: &str,
    num: Num,
    pred: impl Fn(Ordering) -> bool,
) -> Result<(), SchemaError> {
    let Some(value) = schema.get(keyword) else {
        return Ok(());
    };
    let bound = as_num(value).ok_or(SchemaError::ExpectedNumber)?;
    match compare(num, bound) {
        Some(ord) => bool_to_result(pred(ord)),
        None => Err(SchemaError::Validation),
    }
}

fn number_constraints(schema: &Object, num: Num) -> Result<(), SchemaError> {
    // "multipleOf" must be a number strictly greater than zero; the
    // instance is valid only if division by it yields an integer.
    if let Some(value) = schema.get("multipleOf") {
        let divisor = as_num(value).ok_or(SchemaError::ExpectedNumber)?;
        bool_to_result(is_multiple_of(num, divisor))?;
    }

    // "maximum" is an inclusive upper limit.
    comparison_constraint(schema, "maximum", num, |o| o != Ordering::Greater)?;

    // "exclusiveMaximum" is an exclusive upper limit.
    comparison_constraint(schema, "exclusiveMaximum", num, |o| o == Ordering::Less)?;

    // "minimum" is an inclusive lower limit.
    comparison_constraint(schema, "minimum", num, |o| o != Ordering::Less)?;

    // "exclusiveMinimum" is an exclusive lower limit.
    comparison_constraint(schema, "exclusiveMinimum", num, |o| o == Ordering::Greater)
}

/// Evaluate a keyword whose value must be a non-negative integer.
fn non_negative_constraint(
    schema: &Object,
    keyword: &str,
    pred: impl Fn(u64) -> bool,
) -> Result<(), SchemaError> {
    let Some(value) = schema.get(keyword) else {
        return Ok(());
    };
    let limit = match value {
        Element::I64(v) if *v >= 0 => *v as u64,
        Element::U64(v) => *v,
        _ => return Err(SchemaError::ExpectedNonNegativeInteger),
    };
    bool_to_result(pred(limit))
}

fn string_constraints(schema: &Object, s: &str) -> Result<(), SchemaError> {
    // string length is measured in code points
    let length = || s.chars().count() as u64;

    non_negative_constraint(schema, "maxLength", |limit| length() <= limit)?;
    non_negative_constraint(schema, "minLength", |limit| length() >= limit)?;

    // "pattern" is reserved: its shape is checked but it is not evaluated.
    if let Some(pattern) = schema.get("pattern") {
        if !matches!(pattern, Element::String(_)) {
            return Err(SchemaError::PatternString);
        }
    }
    Ok(())
}

fn object_constraints(schema: &Object, instance: &Object) -> Result<(), SchemaError> {
    // Each value of "properties" is a sub-schema; a name appearing in both
    // the instance and the keyword validates against its sub-schema.
    if let Some(properties) = schema.get("properties") {
        let Element::Object(properties) = properties else {
            return Err(SchemaError::PropertiesMustBeObject);
        };
        for (name, subschema) in properties {
            if let Some(member) = instance.get(name) {
                check_element(subschema, member)?;
            }
        }
    }

    non_negative_constraint(schema, "maxProperties", |limit| {
        instance.len() as u64 <= limit
    })?;
    non_negative_constraint(schema, "minProperties", |limit| {
        instance.len() as u64 >= limit
    })
}

fn check_element(schema: &Element, instance: &Element) -> Result<(), SchemaError> {
    // A schema or sub-schema may be either an object or a boolean.
    let map = match schema {
        Element::Bool(b) => return bool_to_result(*b),
        Element::Object(map) => map,
        _ => return Err(SchemaError::NotBooleanOrObject),
    };

    if let Some(expected) = map.get("const") {
        if instance != expected {
            return Err(SchemaError::Validation);
        }
    }

    if let Some(values) = map.get("enum") {
        let Element::Array(values) = values else {
            return Err(SchemaError::EnumMustBeArray);
        };
        if !values.iter().any(|el| el == instance) {
            return Err(SchemaError::Validation);
        }
    }

    if let Some(type_constraint) = map.get("type") {
        match type_constraint {
            Element::String(name) => check_type_name(name, instance)?,
            Element::Array(names) => {
                let mut result = Err(SchemaError::Validation);
                for name in names {
                    result = check_type(name, instance);
                    if result.is_ok() {
                        break;
                    }
                }
                result?
            }
            _ => return Err(SchemaError::TypeStringOrStringArray),
        }
    }

    if let Some(num) = as_num(instance) {
        number_constraints(map, num)?;
    }
    if let Element::String(s) = instance {
        string_constraints(map, s)?;
    }
    if let Element::Object(obj) = instance {
        object_constraints(map, obj)?;
    }
    Ok(())
}

/// Check `instance` against `schema`.
///
/// ```
/// use pushjson::dom::parse_into_dom;
/// use pushjson::schema;
/// use pushjson::Extensions;
///
/// let schema_doc = parse_into_dom(br#"{"type": "integer", "minimum": 0}"#, Extensions::empty()).unwrap();
/// let ok = parse_into_dom(b"17", Extensions::empty()).unwrap();
/// let bad = parse_into_dom(b"-1", Extensions::empty()).unwrap();
///
/// assert!(schema::check(&schema_doc, &ok).is_ok());
/// assert!(schema::check(&schema_doc, &bad).is_err());
/// ```
pub fn check(schema: &Element, instance: &Element) -> Result<(), SchemaError> {
    let map = match schema {
        Element::Bool(b) => return bool_to_result(*b),
        Element::Object(map) => map,
        _ => return Err(SchemaError::NotBooleanOrObject),
    };

    if let Some(id) = map.get("$id") {
        if !matches!(id, Element::String(_)) {
            return Err(SchemaError::ExpectedString);
        }
    }
    if let Some(defs) = map.get("$defs") {
        if !matches!(defs, Element::Object(_)) {
            return Err(SchemaError::DefsMustBeObject);
        }
    }

    check_element(schema, instance)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dom::parse_into_dom;
    use crate::Extensions;

    fn dom(json: &str) -> Element {
        parse_into_dom(json.as_bytes(), Extensions::empty()).unwrap()
    }

    fn run(schema: &str, instance: &str) -> Result<(), SchemaError> {
        check(&dom(schema), &dom(instance))
    }

    #[test]
    fn boolean_schemas() {
        assert_eq!(run("true", "42"), Ok(()));
        assert_eq!(run("false", "42"), Err(SchemaError::Validation));
    }

    #[test]
    fn schema_must_be_boolean_or_object() {
        assert_eq!(run("17", "42"), Err(SchemaError::NotBooleanOrObject));
        assert_eq!(run("\"s\"", "42"), Err(SchemaError::NotBooleanOrObject));
    }

    #[test]
    fn type_names() {
        assert_eq!(run(r#"{"type": "array"}"#, "[]"), Ok(()));
        assert_eq!(run(r#"{"type": "boolean"}"#, "true"), Ok(()));
        assert_eq!(run(r#"{"type": "null"}"#, "null"), Ok(()));
        assert_eq!(run(r#"{"type": "number"}"#, "1.5"), Ok(()));
        assert_eq!(run(r#"{"type": "object"}"#, "{}"), Ok(()));
        assert_eq!(run(r#"{"type": "string"}"#, "\"s\""), Ok(()));
        assert_eq!(
            run(r#"{"type": "string"}"#, "17"),
            Err(SchemaError::Validation)
        );
        assert_eq!(
            run(r#"{"type": "wibble"}"#, "17"),
            Err(SchemaError::TypeNameInvalid)
        );
    }

    #[test]
    fn integer_accepts_doubles_with_zero_fraction() {
        assert_eq!(run(r#"{"type": "integer"}"#, "2"), Ok(()));
        assert_eq!(run(r#"{"type": "integer"}"#, "2.0"), Ok(()));
        assert_eq!(
            run(r#"{"type": "integer"}"#, "2.5"),
            Err(SchemaError::Validation)
        );
    }

    #[test]
    fn type_arrays_accept_any_match() {
        let s = r#"{"type": ["integer", "string"]}"#;
        assert_eq!(run(s, "42"), Ok(()));
        assert_eq!(run(s, "\"x\""), Ok(()));
        assert_eq!(run(s, "null"), Err(SchemaError::Validation));
        assert_eq!(
            run(r#"{"type": 17}"#, "null"),
            Err(SchemaError::TypeStringOrStringArray)
        );
    }

    #[test]
    fn const_compares_structurally() {
        assert_eq!(run(r#"{"const": [1, "a"]}"#, r#"[1, "a"]"#), Ok(()));
        assert_eq!(
            run(r#"{"const": 0}"#, "0.0"),
            Err(SchemaError::Validation)
        );
        assert_eq!(run(r#"{"const": 0.0}"#, "0.0"), Ok(()));
    }

    #[test]
    fn enum_membership() {
        let s = r#"{"enum": [1, "two", null]}"#;
        assert_eq!(run(s, "1"), Ok(()));
        assert_eq!(run(s, "\"two\""), Ok(()));
        assert_eq!(run(s, "null"), Ok(()));
        assert_eq!(run(s, "2"), Err(SchemaError::Validation));
        assert_eq!(
            run(r#"{"enum": "two"}"#, "1"),
            Err(SchemaError::EnumMustBeArray)
        );
    }

    #[test]
    fn string_lengths_count_code_points() {
        let s = r#"{"minLength": 2, "maxLength": 3}"#;
        assert_eq!(run(s, "\"ab\""), Ok(()));
        assert_eq!(run(s, "\"abc\""), Ok(()));
        assert_eq!(run(s, "\"a\""), Err(SchemaError::Validation));
        assert_eq!(run(s, "\"abcd\""), Err(SchemaError::Validation));
        // two code points, six bytes
        assert_eq!(run(s, "\"\u{1D11E}\u{1D11E}\""), Ok(()));
        assert_eq!(
            run(r#"{"minLength": -1}"#, "\"a\""),
            Err(SchemaError::ExpectedNonNegativeInteger)
        );
    }

    #[test]
    fn pattern_is_reserved_but_shape_checked() {
        assert_eq!(run(r#"{"pattern": "^a+$"}"#, "\"bbb\""), Ok(()));
        assert_eq!(
            run(r#"{"pattern": 17}"#, "\"bbb\""),
            Err(SchemaError::PatternString)
        );
    }

    #[test]
    fn multiple_of() {
        assert_eq!(run(r#"{"multipleOf": 3}"#, "9"), Ok(()));
        assert_eq!(run(r#"{"multipleOf": 3}"#, "10"), Err(SchemaError::Validation));
        assert_eq!(run(r#"{"multipleOf": 0.5}"#, "1.5"), Ok(()));
        assert_eq!(run(r#"{"multipleOf": 2}"#, "3.0"), Err(SchemaError::Validation));
        assert_eq!(run(r#"{"multipleOf": 0}"#, "3"), Err(SchemaError::Validation));
        assert_eq!(
            run(r#"{"multipleOf": "x"}"#, "3"),
            Err(SchemaError::ExpectedNumber)
        );
    }

    #[test]
    fn numeric_bounds() {
        let s = r#"{"minimum": 0, "maximum": 10}"#;
        assert_eq!(run(s, "0"), Ok(()));
        assert_eq!(run(s, "10"), Ok(()));
        assert_eq!(run(s, "-1"), Err(SchemaError::Validation));
        assert_eq!(run(s, "10.5"), Err(SchemaError::Validation));

        let s = r#"{"exclusiveMinimum": 0, "exclusiveMaximum": 10}"#;
        assert_eq!(run(s, "0"), Err(SchemaError::Validation));
        assert_eq!(run(s, "10"), Err(SchemaError::Validation));
        assert_eq!(run(s, "5"), Ok(()));

        // mixed integer/float comparisons promote
        assert_eq!(run(r#"{"minimum": 0.5}"#, "1"), Ok(()));
        assert_eq!(run(r#"{"maximum": 0.5}"#, "1"), Err(SchemaError::Validation));
    }

    #[test]
    fn bounds_ignore_non_numbers() {
        assert_eq!(run(r#"{"minimum": 100}"#, "\"x\""), Ok(()));
        assert_eq!(run(r#"{"minimum": 100}"#, "[]"), Ok(()));
    }

    #[test]
    fn properties() {
        let s = r#"{"properties": {"a": {"type": "integer"}, "b": {"type": "string"}}}"#;
        assert_eq!(run(s, r#"{"a": 1, "b": "x"}"#), Ok(()));
        assert_eq!(run(s, r#"{"a": 1}"#), Ok(()));
        // absent properties are not required
        assert_eq!(run(s, r#"{}"#), Ok(()));
        assert_eq!(run(s, r#"{"other": null}"#), Ok(()));
        assert_eq!(
            run(s, r#"{"a": "not an int"}"#),
            Err(SchemaError::Validation)
        );
        assert_eq!(
            run(r#"{"properties": []}"#, "{}"),
            Err(SchemaError::PropertiesMustBeObject)
        );
    }

    #[test]
    fn property_counts() {
        let s = r#"{"minProperties": 1, "maxProperties": 2}"#;
        assert_eq!(run(s, r#"{"a": 1}"#), Ok(()));
        assert_eq!(run(s, r#"{"a": 1, "b": 2}"#), Ok(()));
        assert_eq!(run(s, r#"{}"#), Err(SchemaError::Validation));
        assert_eq!(
            run(s, r#"{"a": 1, "b": 2, "c": 3}"#),
            Err(SchemaError::Validation)
        );
    }

    #[test]
    fn nested_sub_schema_booleans() {
        assert_eq!(
            run(r#"{"properties": {"a": false}}"#, r#"{"a": 1}"#),
            Err(SchemaError::Validation)
        );
        assert_eq!(
            run(r#"{"properties": {"a": false}}"#, r#"{}"#),
            Ok(())
        );
    }

    #[test]
    fn root_keywords() {
        assert_eq!(
            run(r#"{"$id": "tag:example", "$defs": {}}"#, "null"),
            Ok(())
        );
        assert_eq!(
            run(r#"{"$id": 17}"#, "null"),
            Err(SchemaError::ExpectedString)
        );
        assert_eq!(
            run(r#"{"$defs": []}"#, "null"),
            Err(SchemaError::DefsMustBeObject)
        );
    }
}
