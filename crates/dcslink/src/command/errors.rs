//! Errors raised while building or encoding a command.

use thiserror::Error;

use super::ParamKind;

/// Caller-side validation failures. None of them touch the queue.
#[derive(Debug, Error)]
pub enum CommandError {
    /// No catalogue entry has this id.
    #[error("unknown command id {0}")]
    UnknownCommand(u32),
    /// The command has no parameter with this name.
    #[error("command {command} ({syntax}) has no parameter named '{name}'")]
    UnknownParameter {
        /// Command id.
        command: u32,
        /// Command syntax.
        syntax: String,
        /// Requested parameter name.
        name: String,
    },
    /// The value cannot be converted to the parameter's slot type.
    #[error("parameter '{name}' expects a {expected} value, got '{value}'")]
    ParameterType {
        /// Parameter name.
        name: String,
        /// Slot type.
        expected: ParamKind,
        /// Offending value as text.
        value: String,
    },
    /// Serialising the outbound frame failed.
    #[error("failed to encode command {command}: {source}")]
    Encode {
        /// Command id.
        command: u32,
        /// Serializer failure.
        #[source]
        source: serde_json::Error,
    },
}
