//! Recoverable problems found while parsing the indentation tree.

use thiserror::Error;

/// A problem confined to one line; parsing continues past it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeDiagnostic {
    /// A field line without a `:` separator, or with an empty key. The line
    /// is skipped.
    #[error("line {line}: malformed field line {content:?}")]
    MalformedLine {
        /// One-based line number in the source text.
        line: usize,
        /// The offending line, without its indentation.
        content: String,
    },
    /// A root-id line whose digits do not fit in `u64`. The object is kept
    /// without an id.
    #[error("line {line}: root id {digits} is out of range")]
    RootIdOverflow {
        /// One-based line number in the source text.
        line: usize,
        /// The digits as written.
        digits: String,
    },
    /// A bracketed literal that is not valid JSON. The raw text is kept.
    #[error("line {line}: could not parse literal {literal:?}: {message}")]
    ValueParse {
        /// One-based line number in the source text.
        line: usize,
        /// The literal as written.
        literal: String,
        /// Parser message.
        message: String,
    },
}

impl TreeDiagnostic {
    pub(crate) fn malformed(line: usize, content: &str) -> Self {
        Self::MalformedLine {
            line,
            content: content.to_owned(),
        }
    }

    pub(crate) fn value_parse(line: usize, literal: &str, error: &serde_json::Error) -> Self {
        Self::ValueParse {
            line,
            literal: literal.to_owned(),
            message: error.to_string(),
        }
    }

    /// One-based line number the diagnostic refers to.
    #[must_use]
    pub const fn line(&self) -> usize {
        match self {
            Self::MalformedLine { line, .. }
            | Self::RootIdOverflow { line, .. }
            | Self::ValueParse { line, .. } => *line,
        }
    }
}
