//! Outbound commands and their wire encoding.
//!
//! A [`Command`] is built from a catalogue definition, adjusted with
//! parameter overrides, then handed to the queue by value. Once queued it can
//! no longer be changed.

mod errors;

use std::fmt;

use serde::Serialize;
use strum::{Display, EnumString};

use crate::catalog::{self, CommandDefinition, ResultFormat};
use crate::tree::numeric_literal;

pub use errors::CommandError;

/// Result type tag sent with every command.
const RESULT_TYPE_NIL: &str = "nil";

/// Slot type of a command parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ParamKind {
    /// Numeric slot, wire tag `0`.
    Number,
    /// String slot, wire tag `1`.
    Text,
}

impl ParamKind {
    /// Tag used in the `type` field of `parameter_defs`.
    #[must_use]
    pub const fn wire_tag(self) -> u8 {
        match self {
            Self::Number => 0,
            Self::Text => 1,
        }
    }
}

/// A parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Numeric value.
    Number(f64),
    /// Text value.
    Text(String),
}

impl ParamValue {
    /// Converts the value to fit a slot of type `kind`.
    ///
    /// Text assigned to a numeric slot must be a numeric literal; numbers
    /// assigned to a text slot are formatted without a trailing `.0`.
    pub fn coerce(self, kind: ParamKind, name: &str) -> Result<Self, CommandError> {
        let mismatch = |value: &Self| CommandError::ParameterType {
            name: name.to_owned(),
            expected: kind,
            value: value.to_string(),
        };
        match (kind, self) {
            (ParamKind::Number, Self::Number(number)) if number.is_finite() => {
                Ok(Self::Number(number))
            }
            (ParamKind::Number, Self::Text(text)) => numeric_literal(text.trim())
                .and_then(|value| value.as_f64())
                .filter(|number| number.is_finite())
                .map(Self::Number)
                .ok_or_else(|| mismatch(&Self::Text(text))),
            (ParamKind::Number, other) => Err(mismatch(&other)),
            (ParamKind::Text, value) => Ok(Self::Text(value.to_string())),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // `f64` display already drops the fractional part of whole numbers.
            Self::Number(number) => write!(formatter, "{number}"),
            Self::Text(text) => formatter.write_str(text),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        // Ids above 2^53 lose precision; the simulator never issues them.
        Self::Number(value as f64)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A command ready to be queued.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    definition: &'static CommandDefinition,
    values: Vec<ParamValue>,
}

impl Command {
    /// Builds a command with default parameter values (`0` or empty text).
    #[must_use]
    pub fn new(definition: &'static CommandDefinition) -> Self {
        let values = definition
            .parameters
            .iter()
            .map(|parameter| match parameter.kind {
                ParamKind::Number => ParamValue::Number(0.0),
                ParamKind::Text => ParamValue::Text(String::new()),
            })
            .collect();
        Self { definition, values }
    }

    /// Builds a command from the catalogue entry with this id.
    pub fn from_catalog(id: u32) -> Result<Self, CommandError> {
        catalog::find(id)
            .map(Self::new)
            .ok_or(CommandError::UnknownCommand(id))
    }

    /// Sets one parameter, converting the value to the slot type.
    pub fn set(&mut self, name: &str, value: impl Into<ParamValue>) -> Result<(), CommandError> {
        let (index, kind) = self.slot(name)?;
        let coerced = value.into().coerce(kind, name)?;
        if let Some(slot) = self.values.get_mut(index) {
            *slot = coerced;
        }
        Ok(())
    }

    /// Builder form of [`Command::set`].
    pub fn with(mut self, name: &str, value: impl Into<ParamValue>) -> Result<Self, CommandError> {
        self.set(name, value)?;
        Ok(self)
    }

    /// Applies several overrides; on any failure none of them are applied.
    pub fn apply_overrides<I, K, V>(&mut self, overrides: I) -> Result<(), CommandError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<ParamValue>,
    {
        let mut staged = self.clone();
        for (name, value) in overrides {
            staged.set(name.as_ref(), value)?;
        }
        *self = staged;
        Ok(())
    }

    /// Command id.
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.definition.id
    }

    /// Call syntax.
    #[must_use]
    pub const fn syntax(&self) -> &'static str {
        self.definition.syntax
    }

    /// Catalogue entry the command was built from.
    #[must_use]
    pub const fn definition(&self) -> &'static CommandDefinition {
        self.definition
    }

    /// Expected shape of the response payload.
    #[must_use]
    pub const fn result_format(&self) -> ResultFormat {
        self.definition.result_format
    }

    /// Current value of a parameter.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&ParamValue> {
        let index = self
            .definition
            .parameters
            .iter()
            .position(|parameter| parameter.name == name)?;
        self.values.get(index)
    }

    /// Wire text of the parameter that identifies this query, if any.
    #[must_use]
    pub fn correlation_value(&self) -> Option<String> {
        self.definition
            .correlation
            .and_then(|name| self.parameter(name))
            .map(ToString::to_string)
    }

    /// Serialises the command as one newline-terminated JSON frame.
    pub fn encode_frame(&self) -> Result<Vec<u8>, CommandError> {
        let parameter_defs = self
            .definition
            .parameters
            .iter()
            .zip(&self.values)
            .map(|(parameter, value)| WireParameter {
                id: parameter.id,
                name: parameter.name,
                value: value.to_string(),
                kind: parameter.kind.wire_tag(),
            })
            .collect();
        let wire = WireCommand {
            id: self.definition.id,
            returns_data: self.definition.returns_data,
            api_syntax: self.definition.syntax,
            parameter_count: self.definition.parameters.len(),
            parameter_defs,
            error_thrown: false,
            error_message: "",
            result: "",
            result_type: RESULT_TYPE_NIL,
        };
        let mut frame = serde_json::to_vec(&wire).map_err(|source| CommandError::Encode {
            command: self.definition.id,
            source,
        })?;
        frame.push(b'\n');
        Ok(frame)
    }

    fn slot(&self, name: &str) -> Result<(usize, ParamKind), CommandError> {
        self.definition
            .parameters
            .iter()
            .position(|parameter| parameter.name == name)
            .and_then(|index| {
                self.definition
                    .parameters
                    .get(index)
                    .map(|parameter| (index, parameter.kind))
            })
            .ok_or_else(|| CommandError::UnknownParameter {
                command: self.definition.id,
                syntax: self.definition.syntax.to_owned(),
                name: name.to_owned(),
            })
    }
}

#[derive(Serialize)]
struct WireCommand<'a> {
    id: u32,
    returns_data: bool,
    api_syntax: &'a str,
    parameter_count: usize,
    parameter_defs: Vec<WireParameter<'a>>,
    error_thrown: bool,
    error_message: &'a str,
    result: &'a str,
    result_type: &'a str,
}

#[derive(Serialize)]
struct WireParameter<'a> {
    id: u32,
    name: &'a str,
    value: String,
    #[serde(rename = "type")]
    kind: u8,
}
