//! Indentation-tree parser.
//!
//! Each block starts at a root-id line (`16785664:`) and holds indented
//! `key: value` lines. A key with an empty value opens a nested object that
//! collects every following line indented deeper than the key itself.

use std::collections::BTreeMap;

use tracing::debug;

use super::TREE_TARGET;
use super::errors::TreeDiagnostic;
use super::value::{ParsedObject, Value, infer_value};

/// Width a tab contributes to a line's indentation.
pub const TAB_WIDTH: usize = 4;

/// Parsed objects plus the diagnostics recovered from along the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeDocument {
    /// One object per root block, in source order.
    pub objects: Vec<ParsedObject>,
    /// Problems that degraded a single line or value.
    pub diagnostics: Vec<TreeDiagnostic>,
}

#[derive(Debug, Clone, Copy)]
struct SourceLine<'a> {
    number: usize,
    text: &'a str,
}

/// Parses indentation-tree text into objects.
///
/// Blank lines are ignored and malformed lines are skipped, so the call never
/// fails; inspect [`TreeDocument::diagnostics`] for what was dropped.
#[must_use]
pub fn parse_tree(text: &str) -> TreeDocument {
    let mut document = TreeDocument::default();
    let mut block: Vec<SourceLine<'_>> = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        if raw.trim().is_empty() {
            continue;
        }
        if root_id_digits(raw).is_some() && !block.is_empty() {
            document.push_block(&block);
            block.clear();
        }
        block.push(SourceLine {
            number: index + 1,
            text: raw,
        });
    }
    if !block.is_empty() {
        document.push_block(&block);
    }

    for diagnostic in &document.diagnostics {
        debug!(
            target: TREE_TARGET,
            line = diagnostic.line(),
            diagnostic = %diagnostic,
            "recovered from malformed telemetry"
        );
    }
    document
}

impl TreeDocument {
    fn push_block(&mut self, lines: &[SourceLine<'_>]) {
        let mut id = None;
        let mut fields = lines;
        if let Some((first, rest)) = lines.split_first()
            && let Some(digits) = root_id_digits(first.text)
        {
            match digits.parse::<u64>() {
                Ok(value) => id = Some(value),
                Err(_) => self.diagnostics.push(TreeDiagnostic::RootIdOverflow {
                    line: first.number,
                    digits: digits.to_owned(),
                }),
            }
            fields = rest;
        }

        let mut builder = ObjectBuilder::default();
        for line in fields {
            builder.apply(*line, &mut self.diagnostics);
        }
        self.objects.push(builder.finish(id));
    }
}

/// Returns the digits of a root-id line (`ws* digits ':' ws*`).
fn root_id_digits(line: &str) -> Option<&str> {
    let digits = line.trim().strip_suffix(':')?;
    (!digits.is_empty() && digits.bytes().all(|byte| byte.is_ascii_digit())).then_some(digits)
}

fn indentation_width(line: &str) -> usize {
    line.chars()
        .map_while(|c| match c {
            ' ' => Some(1),
            '\t' => Some(TAB_WIDTH),
            _ => None,
        })
        .sum()
}

/// An open nested object waiting to be attached to its parent.
#[derive(Debug)]
struct Frame {
    indent: usize,
    key: String,
    fields: BTreeMap<String, Value>,
}

/// Stack of open frames above an implicit root that is never closed.
#[derive(Debug, Default)]
struct ObjectBuilder {
    root: BTreeMap<String, Value>,
    open: Vec<Frame>,
}

impl ObjectBuilder {
    fn apply(&mut self, line: SourceLine<'_>, diagnostics: &mut Vec<TreeDiagnostic>) {
        let indent = indentation_width(line.text);
        let content = line.text.trim_start_matches([' ', '\t']);
        let Some((raw_key, remainder)) = content.split_once(':') else {
            diagnostics.push(TreeDiagnostic::malformed(line.number, content));
            return;
        };
        let key = raw_key.trim();
        if key.is_empty() {
            diagnostics.push(TreeDiagnostic::malformed(line.number, content));
            return;
        }

        self.close_frames(indent);
        if remainder.trim().is_empty() {
            self.open.push(Frame {
                indent,
                key: key.to_owned(),
                fields: BTreeMap::new(),
            });
            return;
        }

        let (value, diagnostic) = infer_value(remainder, line.number);
        diagnostics.extend(diagnostic);
        self.current_fields().insert(key.to_owned(), value);
    }

    /// Closes every open frame indented at or beyond `indent`.
    fn close_frames(&mut self, indent: usize) {
        while self.open.last().is_some_and(|frame| frame.indent >= indent) {
            if let Some(frame) = self.open.pop() {
                self.attach(frame);
            }
        }
    }

    fn attach(&mut self, frame: Frame) {
        let nested = Value::Object(ParsedObject::new(None, frame.fields));
        self.current_fields().insert(frame.key, nested);
    }

    fn current_fields(&mut self) -> &mut BTreeMap<String, Value> {
        match self.open.last_mut() {
            Some(frame) => &mut frame.fields,
            None => &mut self.root,
        }
    }

    fn finish(mut self, id: Option<u64>) -> ParsedObject {
        self.close_frames(0);
        ParsedObject::new(id, self.root)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn single(text: &str) -> ParsedObject {
        let document = parse_tree(text);
        assert!(
            document.diagnostics.is_empty(),
            "unexpected diagnostics: {:?}",
            document.diagnostics
        );
        assert_eq!(document.objects.len(), 1, "expected one object");
        document.objects.into_iter().next().expect("one object")
    }

    fn nested<'a>(object: &'a ParsedObject, key: &str) -> &'a ParsedObject {
        object
            .get(key)
            .and_then(Value::as_object)
            .unwrap_or_else(|| panic!("{key} should be a nested object"))
    }

    #[test]
    fn parses_aircraft_block() {
        let object =
            single("16785664:\n\tPitch: 0.10096984356642\n\tType:\n\t\tlevel3: 5\n\tCountry: 2\n");

        assert_eq!(object.id(), Some(16_785_664));
        assert_eq!(object.get("Pitch"), Some(&Value::Float(0.100_969_843_566_42)));
        assert_eq!(object.get("Country"), Some(&Value::Integer(2)));
        assert_eq!(nested(&object, "Type").get("level3"), Some(&Value::Integer(5)));
        assert_eq!(object.len(), 3);
        assert_eq!(object.depth(), 2);
    }

    #[test]
    fn scientific_notation_is_a_float() {
        let object = single("Distance: 3.2e+5");
        assert_eq!(object.get("Distance"), Some(&Value::Float(320_000.0)));
        assert_eq!(object.id(), None);
    }

    #[test]
    fn depth_mirrors_indentation() {
        let object = single(
            "1:\n    LatLongAlt:\n        Lat: 41.5\n        Long: 43.1\n    Position:\n        inner:\n            deeper:\n                x: 1\n",
        );
        assert_eq!(object.depth(), 4);
        assert_eq!(
            object.path(&["Position", "inner", "deeper", "x"]),
            Some(&Value::Integer(1))
        );
        assert_eq!(object.path(&["LatLongAlt", "Long"]), Some(&Value::Float(43.1)));
    }

    #[test]
    fn splits_multiple_root_blocks() {
        let document = parse_tree(
            "101:\n\tName: F-15C\n\tCoalition: Enemies\n\n102:\n\tName: Su-27\n\tFlags:\n\t\tHuman: false\n",
        );
        assert!(document.diagnostics.is_empty());
        let ids: Vec<_> = document.objects.iter().map(ParsedObject::id).collect();
        assert_eq!(ids, vec![Some(101), Some(102)]);
        let second = document.objects.get(1).expect("second object");
        assert_eq!(second.get("Name"), Some(&Value::String("Su-27".to_owned())));
        assert_eq!(nested(second, "Flags").get("Human"), Some(&Value::Bool(false)));
    }

    #[test]
    fn lines_before_first_root_form_an_anonymous_object() {
        let document = parse_tree("Time: 1234.5\n7:\n\tName: Tanker\n");
        assert_eq!(document.objects.len(), 2);
        let preamble = document.objects.first().expect("preamble object");
        assert_eq!(preamble.id(), None);
        assert_eq!(preamble.get("Time"), Some(&Value::Float(1234.5)));
    }

    #[rstest]
    #[case("1:\n\tType:\n        level3: 5\n")]
    #[case("1:\n    Type:\n\t\tlevel3: 5\n")]
    fn tabs_and_spaces_compare_as_equal_width(#[case] text: &str) {
        let object = single(text);
        assert_eq!(nested(&object, "Type").get("level3"), Some(&Value::Integer(5)));
    }

    #[test]
    fn malformed_lines_are_skipped_and_reported() {
        let document = parse_tree("5:\n\tName: Hawk\n\tgarbage without separator\n\tCountry: 3\n");
        let object = document.objects.first().expect("object");
        assert_eq!(object.get("Name"), Some(&Value::String("Hawk".to_owned())));
        assert_eq!(object.get("Country"), Some(&Value::Integer(3)));
        assert_eq!(
            document.diagnostics,
            vec![TreeDiagnostic::MalformedLine {
                line: 3,
                content: "garbage without separator".to_owned()
            }]
        );
    }

    #[test]
    fn empty_keys_are_malformed() {
        let document = parse_tree("5:\n\t: orphan\n");
        assert_eq!(document.diagnostics.len(), 1);
        assert!(document.objects.first().is_some_and(ParsedObject::is_empty));
    }

    #[test]
    fn dedent_past_every_frame_lands_in_the_root() {
        let object = single("1:\n        Deep:\n            x: 1\n    Shallow: 2\nTop: 3\n");
        assert_eq!(nested(&object, "Deep").get("x"), Some(&Value::Integer(1)));
        assert_eq!(object.get("Shallow"), Some(&Value::Integer(2)));
        assert_eq!(object.get("Top"), Some(&Value::Integer(3)));
    }

    #[test]
    fn sibling_keys_close_the_previous_nested_object() {
        let object = single("1:\n\tA:\n\t\tx: 1\n\tB:\n\t\ty: 2\n");
        assert_eq!(nested(&object, "A").len(), 1);
        assert_eq!(nested(&object, "B").get("y"), Some(&Value::Integer(2)));
    }

    #[test]
    fn later_duplicates_replace_earlier_values() {
        let object = single("1:\n\tName: first\n\tName: second\n");
        assert_eq!(object.get("Name"), Some(&Value::String("second".to_owned())));
    }

    #[test]
    fn value_is_split_at_the_first_colon_only() {
        let object = single("Clock: 12:30:05");
        assert_eq!(object.get("Clock"), Some(&Value::String("12:30:05".to_owned())));
    }

    #[test]
    fn empty_nested_objects_are_kept() {
        let object = single("1:\n\tPayload:\n\tName: Viper\n");
        assert!(nested(&object, "Payload").is_empty());
    }

    #[test]
    fn list_values_keep_order() {
        let object = single("1:\n\tVelocity: [150.5, 0.0, -2.3]\n");
        assert_eq!(
            object.get("Velocity"),
            Some(&Value::List(vec![
                Value::Float(150.5),
                Value::Float(0.0),
                Value::Float(-2.3)
            ]))
        );
    }

    #[test]
    fn broken_literal_is_kept_as_text_with_a_diagnostic() {
        let document = parse_tree("1:\n\tVelocity: [150.5, 0.0,]\n");
        let object = document.objects.first().expect("object");
        assert_eq!(
            object.get("Velocity"),
            Some(&Value::String("[150.5, 0.0,]".to_owned()))
        );
        assert!(matches!(
            document.diagnostics.as_slice(),
            [TreeDiagnostic::ValueParse { line: 2, .. }]
        ));
    }

    #[test]
    fn oversized_root_id_keeps_the_object_without_an_id() {
        let document = parse_tree("99999999999999999999999:\n\tName: ghost\n");
        let object = document.objects.first().expect("object");
        assert_eq!(object.id(), None);
        assert_eq!(object.get("Name"), Some(&Value::String("ghost".to_owned())));
        assert!(matches!(
            document.diagnostics.as_slice(),
            [TreeDiagnostic::RootIdOverflow { line: 1, .. }]
        ));
    }

    #[rstest]
    #[case("")]
    #[case("\n\n   \n\t\n")]
    fn blank_input_yields_no_objects(#[case] text: &str) {
        assert_eq!(parse_tree(text), TreeDocument::default());
    }

    #[test]
    fn crlf_line_endings_are_accepted() {
        let object = single("3:\r\n\tName: Tomcat\r\n\tSpeed: 250\r\n");
        assert_eq!(object.get("Name"), Some(&Value::String("Tomcat".to_owned())));
        assert_eq!(object.get("Speed"), Some(&Value::Integer(250)));
    }

    #[rstest]
    #[case("  42:  ", Some("42"))]
    #[case("42:", Some("42"))]
    #[case("42", None)]
    #[case("4a:", None)]
    #[case(":", None)]
    #[case("42: 1", None)]
    fn recognises_root_id_lines(#[case] line: &str, #[case] expected: Option<&str>) {
        assert_eq!(root_id_digits(line), expected);
    }
}
