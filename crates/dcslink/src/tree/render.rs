//! Writes parsed objects back out in the indentation-tree format.
//!
//! Output re-parses to an equal tree for anything [`parse_tree`] produces.
//! Nested objects are written as indented lines when their keys and leaves
//! read back unchanged, and as a one-line JSON literal otherwise. Only the
//! first object of a document may lack an id, and top-level null fields
//! (which the parser never emits) come back as the string `null`.
//!
//! [`parse_tree`]: super::parse_tree

use std::fmt::Write as _;

use super::value::{ParsedObject, Value, infer_value, to_json};

/// Renders objects, one root block each, using one tab per nesting level.
#[must_use]
pub fn render_tree(objects: &[ParsedObject]) -> String {
    let mut out = String::new();
    for object in objects {
        match object.id() {
            Some(id) => {
                let _ = writeln!(out, "{id}:");
                write_fields(object, 1, &mut out);
            }
            None => write_fields(object, 0, &mut out),
        }
    }
    out
}

fn write_fields(object: &ParsedObject, depth: usize, out: &mut String) {
    for (key, value) in object.fields() {
        push_indent(depth, out);
        out.push_str(key);
        out.push(':');
        match value {
            Value::Object(nested) if writes_as_block(nested) => {
                out.push('\n');
                write_fields(nested, depth + 1, out);
            }
            scalar => {
                out.push(' ');
                write_scalar(scalar, out);
                out.push('\n');
            }
        }
    }
}

fn write_scalar(value: &Value, out: &mut String) {
    let _ = match value {
        Value::Null => write!(out, "null"),
        Value::Bool(flag) => write!(out, "{flag}"),
        Value::Integer(number) => write!(out, "{number}"),
        // Debug keeps a `.0` or exponent so the literal re-infers as a float.
        Value::Float(number) => write!(out, "{number:?}"),
        Value::String(text) => write!(out, "{text}"),
        Value::List(_) | Value::Object(_) => write!(out, "{}", to_json(value)),
    };
}

/// Whether every key of `object` reads back unchanged as a field line and
/// every scalar leaf re-infers to the same value.
fn writes_as_block(object: &ParsedObject) -> bool {
    object.fields().all(|(key, value)| {
        let plain_key = !key.is_empty() && key.trim() == key && !key.contains([':', '\n', '\r']);
        plain_key
            && match value {
                // A digit-only key with an empty value reads as a root-id line.
                Value::Object(_) => !key.bytes().all(|byte| byte.is_ascii_digit()),
                scalar => reinfers(scalar),
            }
    })
}

fn reinfers(value: &Value) -> bool {
    let mut text = String::new();
    write_scalar(value, &mut text);
    if text.contains(['\n', '\r']) {
        return false;
    }
    matches!(infer_value(&text, 0), (reparsed, None) if reparsed == *value)
}

fn push_indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push('\t');
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse_tree;
    use super::*;

    fn round_trip(text: &str) {
        let first = parse_tree(text);
        let rendered = render_tree(&first.objects);
        let second = parse_tree(&rendered);
        assert_eq!(first.objects, second.objects, "rendered:\n{rendered}");
    }

    #[test]
    fn aircraft_block_round_trips() {
        round_trip("16785664:\n\tPitch: 0.10096984356642\n\tType:\n\t\tlevel3: 5\n\tCountry: 2\n");
    }

    #[test]
    fn mixed_document_round_trips() {
        round_trip(concat!(
            "Time: 1200\n",
            "101:\n",
            "    Name: F-15C\n",
            "    Heading: 1.0\n",
            "    Distance: 3.2e+5\n",
            "    Tiny: -4.2356550693512e-05\n",
            "    Human: TRUE\n",
            "    Velocity: [150.5, 0.0, -2.3]\n",
            "    Mixed: [1, \"two\", {\"three\": 3}]\n",
            "    Payload:\n",
            "    Meta: {\"flag\": \"true\", \"note\": \"\", \"a:b\": 1, \"7\": {\"x\": 1}, \"gap\": null}\n",
            "    Escort: {\"Callsign\": \"Uzi 1-1\", \"Lead\": {\"Speed\": 250.0}}\n",
            "    LatLongAlt:\n",
            "        Lat: 41.5\n",
            "        Nested:\n",
            "            Deep: yes\n",
            "102:\n",
            "\tName: Su-27\n",
        ));
    }

    #[test]
    fn renders_one_tab_per_level() {
        let document = parse_tree("7:\n    Type:\n        level1: 2\n");
        assert_eq!(render_tree(&document.objects), "7:\n\tType:\n\t\tlevel1: 2\n");
    }

    #[test]
    fn literals_that_would_reinfer_stay_json() {
        let document = parse_tree("1:\n\tMeta: {\"flag\": \"true\", \"note\": \"\", \"a:b\": 1}\n");
        assert_eq!(
            render_tree(&document.objects),
            "1:\n\tMeta: {\"a:b\":1,\"flag\":\"true\",\"note\":\"\"}\n"
        );
    }

    #[test]
    fn plain_literals_render_as_blocks() {
        let document = parse_tree("1:\n\tLead: {\"Speed\": 250.0, \"Name\": \"Uzi\"}\n");
        assert_eq!(
            render_tree(&document.objects),
            "1:\n\tLead:\n\t\tName: Uzi\n\t\tSpeed: 250.0\n"
        );
    }

    #[test]
    fn floats_keep_their_float_shape() {
        let document = parse_tree("Speed: 250.0\n");
        assert_eq!(render_tree(&document.objects), "Speed: 250.0\n");
    }
}
