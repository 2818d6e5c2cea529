//! Typed values produced by the tree parser and the scalar inferencer.

use std::collections::BTreeMap;

use serde::Serialize;

use super::errors::TreeDiagnostic;

/// One leaf or branch of a parsed telemetry object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Empty value.
    Null,
    /// `true` or `false`, matched case-insensitively.
    Bool(bool),
    /// Whole number without fraction or exponent.
    Integer(i64),
    /// Any other numeric literal.
    Float(f64),
    /// Text that matched no other rule.
    String(String),
    /// Bracketed list literal.
    List(Vec<Value>),
    /// Nested object, either indented or a braced literal.
    Object(ParsedObject),
}

impl Value {
    /// Returns the nested object when the value is one.
    #[must_use]
    pub const fn as_object(&self) -> Option<&ParsedObject> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Numeric view of integer and float values.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Text view of string values.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(text) => Some(text),
            _ => None,
        }
    }

    fn depth(&self) -> usize {
        match self {
            Self::Object(object) => object.depth(),
            Self::List(items) => items.iter().map(Self::depth).max().unwrap_or(0),
            _ => 0,
        }
    }
}

/// A telemetry record: optional root identifier plus named fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<u64>,
    #[serde(flatten)]
    fields: BTreeMap<String, Value>,
}

impl ParsedObject {
    /// Creates an object from its parts.
    #[must_use]
    pub const fn new(id: Option<u64>, fields: BTreeMap<String, Value>) -> Self {
        Self { id, fields }
    }

    /// Root identifier, absent when the block had no root-id line.
    #[must_use]
    pub const fn id(&self) -> Option<u64> {
        self.id
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Follows a path of nested object keys, e.g. `["Position", "x"]`.
    #[must_use]
    pub fn path(&self, keys: &[&str]) -> Option<&Value> {
        let (last, parents) = keys.split_last()?;
        let mut object = self;
        for key in parents {
            object = object.get(key)?.as_object()?;
        }
        object.get(last)
    }

    /// Iterates over fields in key order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the object has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Nesting depth; an object holding only scalars has depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        1 + self.fields.values().map(Value::depth).max().unwrap_or(0)
    }
}

/// Classifies a trimmed scalar token.
///
/// Rules apply in order and the first match wins: empty text is null,
/// `true`/`false` in any case are booleans, numeric literals become integers
/// or floats, `[...]` and `{...}` are parsed as JSON literals, and anything
/// else stays a string. A bracketed literal that fails to parse is kept as
/// its raw text and reported through the returned diagnostic.
#[must_use]
pub fn infer_value(text: &str, line: usize) -> (Value, Option<TreeDiagnostic>) {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return (Value::Null, None);
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return (Value::Bool(true), None);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return (Value::Bool(false), None);
    }
    if let Some(number) = numeric_literal(trimmed) {
        return (number, None);
    }
    let bracketed = (trimmed.starts_with('[') && trimmed.ends_with(']'))
        || (trimmed.starts_with('{') && trimmed.ends_with('}'));
    if bracketed {
        return match serde_json::from_str::<serde_json::Value>(trimmed) {
            Ok(parsed) => (from_json(parsed), None),
            Err(error) => (
                Value::String(trimmed.to_owned()),
                Some(TreeDiagnostic::value_parse(line, trimmed, &error)),
            ),
        };
    }
    (Value::String(trimmed.to_owned()), None)
}

/// Parses `[+-]digits[.digits][(e|E)[+-]digits]`.
///
/// Literals without fraction or exponent that fit in `i64` become integers;
/// everything else that matches the grammar becomes a float.
pub(crate) fn numeric_literal(text: &str) -> Option<Value> {
    let integral = scan_numeric(text)?;
    if integral && let Ok(value) = text.parse::<i64>() {
        return Some(Value::Integer(value));
    }
    text.parse::<f64>().ok().map(Value::Float)
}

/// Returns `Some(true)` for integral literals, `Some(false)` for literals
/// with a fraction or exponent, `None` when the grammar does not match.
fn scan_numeric(text: &str) -> Option<bool> {
    let mut chars = text.chars().peekable();
    if matches!(chars.peek(), Some('+' | '-')) {
        chars.next();
    }
    let mut integral = true;
    if consume_digits(&mut chars) == 0 {
        return None;
    }
    if chars.next_if_eq(&'.').is_some() {
        integral = false;
        if consume_digits(&mut chars) == 0 {
            return None;
        }
    }
    if chars.next_if(|c| matches!(c, 'e' | 'E')).is_some() {
        integral = false;
        chars.next_if(|c| matches!(c, '+' | '-'));
        if consume_digits(&mut chars) == 0 {
            return None;
        }
    }
    chars.next().is_none().then_some(integral)
}

fn consume_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> usize {
    let mut count = 0;
    while chars.next_if(char::is_ascii_digit).is_some() {
        count += 1;
    }
    count
}

pub(crate) fn from_json(value: serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(flag) => Value::Bool(flag),
        serde_json::Value::Number(number) => number
            .as_i64()
            .map(Value::Integer)
            .or_else(|| number.as_f64().map(Value::Float))
            .unwrap_or(Value::Null),
        serde_json::Value::String(text) => Value::String(text),
        serde_json::Value::Array(items) => Value::List(items.into_iter().map(from_json).collect()),
        serde_json::Value::Object(map) => Value::Object(ParsedObject::new(
            None,
            map.into_iter()
                .map(|(key, item)| (key, from_json(item)))
                .collect(),
        )),
    }
}

pub(crate) fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(flag) => serde_json::Value::Bool(*flag),
        Value::Integer(number) => serde_json::Value::from(*number),
        Value::Float(number) => serde_json::Number::from_f64(*number)
            .map_or(serde_json::Value::Null, serde_json::Value::Number),
        Value::String(text) => serde_json::Value::String(text.clone()),
        Value::List(items) => serde_json::Value::Array(items.iter().map(to_json).collect()),
        Value::Object(object) => serde_json::Value::Object(
            object
                .fields()
                .map(|(key, item)| (key.to_owned(), to_json(item)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn inferred(text: &str) -> Value {
        let (value, diagnostic) = infer_value(text, 1);
        assert!(diagnostic.is_none(), "unexpected diagnostic: {diagnostic:?}");
        value
    }

    #[rstest]
    #[case("", Value::Null)]
    #[case("true", Value::Bool(true))]
    #[case("FALSE", Value::Bool(false))]
    #[case("True", Value::Bool(true))]
    #[case("42", Value::Integer(42))]
    #[case("-7", Value::Integer(-7))]
    #[case("+3", Value::Integer(3))]
    #[case("0.10096984356642", Value::Float(0.100_969_843_566_42))]
    #[case("3.2e+5", Value::Float(320_000.0))]
    #[case("-4.2356550693512e-05", Value::Float(-4.235_655_069_351_2e-5))]
    #[case("1E3", Value::Float(1000.0))]
    #[case("F-15C", Value::String("F-15C".to_owned()))]
    #[case("1.", Value::String("1.".to_owned()))]
    #[case(".5", Value::String(".5".to_owned()))]
    #[case("12:30", Value::String("12:30".to_owned()))]
    #[case("null", Value::String("null".to_owned()))]
    fn classifies_scalars(#[case] text: &str, #[case] expected: Value) {
        assert_eq!(inferred(text), expected);
    }

    #[test]
    fn integers_too_large_for_i64_become_floats() {
        assert_eq!(
            inferred("99999999999999999999"),
            Value::Float(99_999_999_999_999_999_999.0)
        );
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(inferred("  17 \t"), Value::Integer(17));
        assert_eq!(inferred("  Su-27  "), Value::String("Su-27".to_owned()));
    }

    #[test]
    fn float_lists_parse_as_lists() {
        assert_eq!(
            inferred("[150.5, 0.0, -2.3]"),
            Value::List(vec![
                Value::Float(150.5),
                Value::Float(0.0),
                Value::Float(-2.3)
            ])
        );
    }

    #[test]
    fn braced_literals_parse_as_objects() {
        let value = inferred(r#"{"x": 1, "name": "tanker"}"#);
        let object = value.as_object().expect("object literal");
        assert_eq!(object.get("x"), Some(&Value::Integer(1)));
        assert_eq!(object.get("name"), Some(&Value::String("tanker".to_owned())));
        assert_eq!(object.id(), None);
    }

    #[rstest]
    #[case("[1, 2,]")]
    #[case("[150.5, 0.0,]")]
    #[case("{not json}")]
    fn broken_literals_fall_back_to_text(#[case] text: &str) {
        let (value, diagnostic) = infer_value(text, 9);
        assert_eq!(value, Value::String(text.to_owned()));
        match diagnostic {
            Some(TreeDiagnostic::ValueParse { line, .. }) => assert_eq!(line, 9),
            other => panic!("expected value parse diagnostic, got {other:?}"),
        }
    }

    #[test]
    fn depth_counts_nested_objects() {
        let (value, _) = infer_value(r#"{"a": {"b": {"c": 1}}}"#, 1);
        assert_eq!(value.as_object().map(ParsedObject::depth), Some(3));
    }

    #[test]
    fn path_walks_nested_objects() {
        let (value, _) = infer_value(r#"{"Position": {"x": 12.5}}"#, 1);
        let object = value.as_object().expect("object literal");
        assert_eq!(object.path(&["Position", "x"]), Some(&Value::Float(12.5)));
        assert_eq!(object.path(&["Position", "y"]), None);
        assert_eq!(object.path(&[]), None);
    }
}
