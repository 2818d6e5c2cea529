//! The JSON envelope exchanged with the simulator.

use serde::{Deserialize, Deserializer, Serialize};

use super::FrameError;

/// A decoded response frame.
///
/// Missing fields take their defaults and loosely typed text fields accept
/// any JSON scalar, so older or newer export scripts still decode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ResponseEnvelope {
    /// Command identifier echoed back.
    pub id: u32,
    /// Whether the command produces a result.
    pub returns_data: bool,
    /// Human readable call syntax echoed back.
    #[serde(deserialize_with = "lenient_text")]
    pub api_syntax: String,
    /// Declared parameter count.
    pub parameter_count: usize,
    /// Parameters as the simulator saw them.
    pub parameter_defs: Vec<EchoedParameter>,
    /// Whether the remote call raised.
    pub error_thrown: bool,
    /// Remote error text when `error_thrown` is set.
    #[serde(deserialize_with = "lenient_text")]
    pub error_message: String,
    /// Raw payload: empty, indentation-tree text, or a scalar.
    #[serde(deserialize_with = "lenient_text")]
    pub result: String,
    /// Payload type tag, `"nil"` when unset.
    #[serde(deserialize_with = "lenient_text")]
    pub result_type: String,
}

/// One parameter as echoed in a response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EchoedParameter {
    /// Position of the parameter.
    pub id: u32,
    /// Parameter name.
    #[serde(deserialize_with = "lenient_text")]
    pub name: String,
    /// Value as text.
    #[serde(deserialize_with = "lenient_text")]
    pub value: String,
    /// Wire type tag: `0` numeric, `1` string.
    #[serde(rename = "type")]
    pub kind: u8,
}

impl ResponseEnvelope {
    /// Reads an envelope out of a decoded frame.
    pub fn from_frame(frame: serde_json::Value) -> Result<Self, FrameError> {
        serde_json::from_value(frame).map_err(|source| FrameError::Envelope { source })
    }

    /// Text of the echoed parameter called `name`.
    #[must_use]
    pub fn echoed(&self, name: &str) -> Option<&str> {
        self.parameter_defs
            .iter()
            .find(|parameter| parameter.name == name)
            .map(|parameter| parameter.value.as_str())
    }

    /// Remote error text when the call failed.
    #[must_use]
    pub fn remote_error(&self) -> Option<&str> {
        self.error_thrown.then_some(self.error_message.as_str())
    }
}

/// Accepts strings as-is, `null` as empty, and other JSON as its text.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(text) => text,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}
