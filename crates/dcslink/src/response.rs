//! Interpreted responses: the envelope plus a typed payload.

use serde::Serialize;

use crate::catalog::{self, ResultFormat};
use crate::frame::ResponseEnvelope;
use crate::tree::{ParsedObject, TreeDiagnostic, Value, infer_value, parse_tree};

/// Typed view of a response's `result` text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// No result, or a command that never returns one.
    Empty,
    /// Objects parsed from indentation-tree text.
    Objects(Vec<ParsedObject>),
    /// One inferred scalar.
    Scalar(Value),
}

impl Payload {
    /// Parsed objects, empty for other payloads.
    #[must_use]
    pub fn objects(&self) -> &[ParsedObject] {
        match self {
            Self::Objects(objects) => objects,
            _ => &[],
        }
    }

    /// Consumes the payload and returns its first object.
    #[must_use]
    pub fn into_first_object(self) -> Option<ParsedObject> {
        match self {
            Self::Objects(objects) => objects.into_iter().next(),
            _ => None,
        }
    }

    /// Whether there is nothing to read.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// A response as delivered to observers.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Envelope fields as received.
    pub envelope: ResponseEnvelope,
    /// Typed payload.
    pub payload: Payload,
    /// Lines of the result text that could not be read cleanly.
    pub diagnostics: Vec<TreeDiagnostic>,
}

impl Response {
    /// Interprets an envelope using the catalogue's result format for its id.
    ///
    /// Unknown ids are read as a tree when the text contains a `:` and as a
    /// scalar otherwise.
    #[must_use]
    pub fn from_envelope(envelope: ResponseEnvelope) -> Self {
        let format = catalog::find(envelope.id).map_or_else(
            || guess_format(&envelope.result),
            |definition| definition.result_format,
        );
        let (payload, diagnostics) = interpret(&envelope.result, format);
        Self {
            envelope,
            payload,
            diagnostics,
        }
    }

    /// Command id echoed by the simulator.
    #[must_use]
    pub const fn command_id(&self) -> u32 {
        self.envelope.id
    }

    /// Remote error text when the call failed.
    #[must_use]
    pub fn remote_error(&self) -> Option<&str> {
        self.envelope.remote_error()
    }
}

fn guess_format(result: &str) -> ResultFormat {
    if result.contains(':') {
        ResultFormat::Tree
    } else {
        ResultFormat::Scalar
    }
}

fn interpret(result: &str, format: ResultFormat) -> (Payload, Vec<TreeDiagnostic>) {
    if result.trim().is_empty() {
        return (Payload::Empty, Vec::new());
    }
    match format {
        ResultFormat::Empty => (Payload::Empty, Vec::new()),
        ResultFormat::Tree => {
            let document = parse_tree(result);
            (Payload::Objects(document.objects), document.diagnostics)
        }
        ResultFormat::Scalar => {
            let (value, diagnostic) = infer_value(result, 1);
            (Payload::Scalar(value), diagnostic.into_iter().collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn envelope(id: u32, result: &str) -> ResponseEnvelope {
        ResponseEnvelope {
            id,
            result: result.to_owned(),
            ..ResponseEnvelope::default()
        }
    }

    #[test]
    fn tree_commands_yield_objects() {
        let response = Response::from_envelope(envelope(
            catalog::WORLD_OBJECTS,
            "1:\n\tName: A\n2:\n\tName: B\n",
        ));
        let ids: Vec<_> = response.payload.objects().iter().map(ParsedObject::id).collect();
        assert_eq!(ids, vec![Some(1), Some(2)]);
        assert!(response.diagnostics.is_empty());
    }

    #[rstest]
    #[case(catalog::MODEL_TIME, "1234.5", Value::Float(1234.5))]
    #[case(20, "Maverick", Value::String("Maverick".to_owned()))]
    #[case(59, "true", Value::Bool(true))]
    fn scalar_commands_yield_values(#[case] id: u32, #[case] text: &str, #[case] value: Value) {
        let response = Response::from_envelope(envelope(id, text));
        assert_eq!(response.payload, Payload::Scalar(value));
    }

    #[rstest]
    #[case(catalog::SELF_DATA, "")]
    #[case(catalog::MODEL_TIME, "  \n")]
    #[case(12, "ignored")]
    fn empty_results_and_actions_have_no_payload(#[case] id: u32, #[case] text: &str) {
        assert!(Response::from_envelope(envelope(id, text)).payload.is_empty());
    }

    #[test]
    fn unknown_ids_fall_back_on_content() {
        let tree = Response::from_envelope(envelope(900, "Name: A\n"));
        assert_eq!(tree.payload.objects().len(), 1);
        let scalar = Response::from_envelope(envelope(900, "42"));
        assert_eq!(scalar.payload, Payload::Scalar(Value::Integer(42)));
    }

    #[test]
    fn diagnostics_are_carried_alongside_the_payload() {
        let response =
            Response::from_envelope(envelope(catalog::SELF_DATA, "Name: A\nno separator\n"));
        assert_eq!(response.payload.objects().len(), 1);
        assert_eq!(response.diagnostics.len(), 1);
    }

    #[test]
    fn first_object_is_extracted() {
        let response = Response::from_envelope(envelope(catalog::OBJECT_BY_ID, "7:\n\tName: A\n"));
        let object = response.payload.into_first_object().expect("object");
        assert_eq!(object.id(), Some(7));
    }
}
