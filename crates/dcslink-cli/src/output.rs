//! Rendering of catalogue entries, payloads and responses.

use std::collections::BTreeMap;
use std::io::Write;

use dcslink::catalog::CommandDefinition;
use dcslink::tree::render_tree;
use dcslink::{ParsedObject, Payload, Response, Value};
use serde::Serialize;

use crate::AppError;
use crate::cli::OutputFormat;

#[derive(Debug, Serialize)]
struct CatalogEntry<'a> {
    id: u32,
    syntax: &'a str,
    returns_data: bool,
    result_format: String,
    parameters: Vec<ParameterEntry<'a>>,
}

#[derive(Debug, Serialize)]
struct ParameterEntry<'a> {
    name: &'a str,
    kind: String,
}

impl<'a> From<&'a CommandDefinition> for CatalogEntry<'a> {
    fn from(definition: &'a CommandDefinition) -> Self {
        Self {
            id: definition.id,
            syntax: definition.syntax,
            returns_data: definition.returns_data,
            result_format: definition.result_format.to_string(),
            parameters: definition
                .parameters
                .iter()
                .map(|parameter| ParameterEntry {
                    name: parameter.name,
                    kind: parameter.kind.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ResponseLine<'a> {
    id: u32,
    api_syntax: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    payload: &'a Payload,
}

/// Writes catalogue entries. The tree form keys each entry by its id.
pub(crate) fn write_catalog<'a>(
    out: &mut impl Write,
    definitions: impl IntoIterator<Item = &'a CommandDefinition>,
    format: OutputFormat,
) -> Result<(), AppError> {
    match format {
        OutputFormat::Json => {
            let entries: Vec<CatalogEntry<'_>> =
                definitions.into_iter().map(CatalogEntry::from).collect();
            serde_json::to_writer_pretty(&mut *out, &entries)?;
            writeln!(out)?;
        }
        OutputFormat::Tree => {
            let objects: Vec<ParsedObject> =
                definitions.into_iter().map(catalog_object).collect();
            out.write_all(render_tree(&objects).as_bytes())?;
        }
    }
    Ok(())
}

fn catalog_object(definition: &CommandDefinition) -> ParsedObject {
    let parameters = definition
        .parameters
        .iter()
        .map(|parameter| {
            (
                parameter.name.to_owned(),
                Value::String(parameter.kind.to_string()),
            )
        })
        .collect();
    let mut fields = BTreeMap::new();
    fields.insert("syntax".to_owned(), Value::String(definition.syntax.to_owned()));
    fields.insert("returns_data".to_owned(), Value::Bool(definition.returns_data));
    fields.insert(
        "result_format".to_owned(),
        Value::String(definition.result_format.to_string()),
    );
    if !definition.parameters.is_empty() {
        fields.insert(
            "parameters".to_owned(),
            Value::Object(ParsedObject::new(None, parameters)),
        );
    }
    ParsedObject::new(Some(u64::from(definition.id)), fields)
}

/// Writes one payload.
pub(crate) fn write_payload(
    out: &mut impl Write,
    payload: &Payload,
    format: OutputFormat,
) -> Result<(), AppError> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, payload)?;
            writeln!(out)?;
        }
        OutputFormat::Tree => write_payload_tree(out, payload)?,
    }
    Ok(())
}

fn write_payload_tree(out: &mut impl Write, payload: &Payload) -> Result<(), AppError> {
    match payload {
        Payload::Empty => {}
        Payload::Objects(objects) => out.write_all(render_tree(objects).as_bytes())?,
        Payload::Scalar(Value::String(text)) => writeln!(out, "{text}")?,
        Payload::Scalar(value) => writeln!(out, "{}", serde_json::to_string(value)?)?,
    }
    Ok(())
}

/// Writes one response as observed while watching.
pub(crate) fn write_response(
    out: &mut impl Write,
    response: &Response,
    format: OutputFormat,
) -> Result<(), AppError> {
    match format {
        OutputFormat::Json => {
            let line = ResponseLine {
                id: response.command_id(),
                api_syntax: &response.envelope.api_syntax,
                error: response.remote_error(),
                payload: &response.payload,
            };
            serde_json::to_writer(&mut *out, &line)?;
            writeln!(out)?;
        }
        OutputFormat::Tree => {
            writeln!(out, "-- {} {}", response.command_id(), response.envelope.api_syntax)?;
            if let Some(error) = response.remote_error() {
                writeln!(out, "error: {error}")?;
            }
            write_payload_tree(out, &response.payload)?;
        }
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use dcslink::catalog;
    use dcslink::tree::parse_tree;

    use super::*;

    fn render(write: impl FnOnce(&mut Vec<u8>) -> Result<(), AppError>) -> String {
        let mut buffer = Vec::new();
        if let Err(error) = write(&mut buffer) {
            panic!("render failed: {error}");
        }
        String::from_utf8(buffer).unwrap_or_else(|error| panic!("output utf8: {error}"))
    }

    #[test]
    fn catalog_json_lists_parameters() {
        let Some(definition) = catalog::find(catalog::OBJECT_BY_ID) else {
            panic!("object lookup is catalogued");
        };
        let text = render(|out| write_catalog(out, [definition], OutputFormat::Json));
        let parsed: serde_json::Value =
            serde_json::from_str(&text).unwrap_or_else(|error| panic!("json: {error}"));
        assert_eq!(parsed[0]["id"], 10);
        assert_eq!(parsed[0]["parameters"][0]["name"], "object_id");
        assert_eq!(parsed[0]["parameters"][0]["kind"], "number");
        assert_eq!(parsed[0]["result_format"], "tree");
    }

    #[test]
    fn catalog_tree_reparses() {
        let text = render(|out| write_catalog(out, catalog::matching("getdevice"), OutputFormat::Tree));
        let document = parse_tree(&text);
        assert!(document.diagnostics.is_empty(), "{:?}", document.diagnostics);
        let ids: Vec<_> = document.objects.iter().map(ParsedObject::id).collect();
        assert_eq!(ids, vec![Some(2), Some(6), Some(7), Some(8)]);
    }

    #[test]
    fn scalar_payloads_print_bare_in_tree_form() {
        let text = render(|out| {
            write_payload(out, &Payload::Scalar(Value::Float(1234.5)), OutputFormat::Tree)
        });
        assert_eq!(text, "1234.5\n");
        let text = render(|out| write_payload(out, &Payload::Empty, OutputFormat::Json));
        assert_eq!(text, "null\n");
    }

    #[test]
    fn objects_render_as_tree_text() {
        let document = parse_tree("42:\n\tName: F-15C\n");
        let payload = Payload::Objects(document.objects);
        let text = render(|out| write_payload(out, &payload, OutputFormat::Tree));
        assert_eq!(text, "42:\n\tName: F-15C\n");
    }
}
