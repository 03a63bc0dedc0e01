//! # Errors
//!
//! Error taxonomy for the conversion engine.
//!
//! Fatal kinds ([`ConvertError`]) abort a conversion call and produce no
//! result. Soft kinds ([`Warning`]) accumulate alongside a best-effort result
//! and are surfaced to the caller as display strings.

use thiserror::Error;

/// Fatal conversion failures. Any of these aborts the whole request.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Input exceeds the line ceiling; reported before any parsing work.
    #[error("input exceeds the maximum of {limit} lines (got {actual})")]
    InputTooLarge { limit: usize, actual: usize },

    /// No document in the input stream could be parsed at all.
    #[error("no Kubernetes manifest could be parsed from the input")]
    EmptyInput,

    /// Request-wide options are out of range; no document is processed.
    #[error("invalid conversion options: {0}")]
    InvalidOptions(String),

    /// The caller's cancellation signal fired between documents.
    #[error("conversion cancelled")]
    Cancelled,

    /// A generated document failed to render as YAML.
    #[error("error encoding external secret: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

impl ConvertError {
    /// Stable kind discriminator for boundary-layer error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            ConvertError::InputTooLarge { .. } => "InputTooLarge",
            ConvertError::EmptyInput => "EmptyInput",
            ConvertError::InvalidOptions(_) => "InvalidOptions",
            ConvertError::Cancelled => "Cancelled",
            ConvertError::Serialize(_) => "Serialize",
        }
    }
}

/// Non-fatal conditions collected during a conversion.
///
/// Warnings never abort the request; the affected document or placeholder is
/// excluded or left verbatim and the rest of the input proceeds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Warning {
    /// One document of the stream failed to parse; the rest continue.
    #[error("document {index} could not be parsed: {detail}")]
    MalformedDocument { index: usize, detail: String },

    /// A `data` value failed base64 decoding; the document is excluded.
    #[error("secret {document}: data key {key} could not be decoded: {detail}")]
    MalformedData {
        document: String,
        key: String,
        detail: String,
    },

    /// Non-Secret or duplicate-named document excluded from the output.
    #[error("document {index} skipped: {reason}")]
    SkippedDocument { index: usize, reason: String },

    /// A `${NAME}` placeholder had no mapping; left verbatim in the output.
    #[error("secret {document}: variable {variable} in key {key} is not defined, placeholder left as-is")]
    UnresolvedVariable {
        document: String,
        key: String,
        variable: String,
    },
}

impl Warning {
    /// Stable kind discriminator, used for metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Warning::MalformedDocument { .. } => "MalformedDocument",
            Warning::MalformedData { .. } => "MalformedData",
            Warning::SkippedDocument { .. } => "SkippedDocument",
            Warning::UnresolvedVariable { .. } => "UnresolvedVariable",
        }
    }
}
