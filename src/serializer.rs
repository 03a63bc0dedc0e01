//! # Serializer
//!
//! Renders generated `ExternalSecret` documents back into one YAML stream.
//!
//! Key order inside each document follows the struct definitions in
//! [`crate::generator`] (apiVersion, kind, metadata, spec), so output is
//! diff-friendly and byte-identical across runs. Multiple documents are
//! joined with `---` separators; zero documents render as the empty string.

use crate::error::ConvertError;
use crate::generator::ExternalSecretDocument;

/// Render `docs` to a YAML stream, preserving slice order.
///
/// # Errors
///
/// [`ConvertError::Serialize`] when a document fails to render, which only
/// happens on YAML-level encoding failures.
pub fn serialize(docs: &[ExternalSecretDocument]) -> Result<String, ConvertError> {
    let mut output = String::new();
    for (i, doc) in docs.iter().enumerate() {
        if i > 0 {
            output.push_str("---\n");
        }
        output.push_str(&serde_yaml::to_string(doc)?);
    }
    Ok(output)
}
