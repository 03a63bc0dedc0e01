//! # Conversion Service
//!
//! Orchestrates parser, resolver, generator and serializer behind the single
//! request/response contract consumed by the HTTP and CLI adapters.
//!
//! ## Flow
//!
//! 1. Parse and validate the request-wide options
//! 2. Parse the manifest stream into Secret documents
//! 3. Resolve `${NAME}` placeholders when requested
//! 4. Generate one `ExternalSecret` per document, in input order
//! 5. Serialize the generated documents into one YAML stream
//!
//! Fatal failures abort the call with a [`ConvertError`]; soft conditions
//! accumulate into the response's `warnings`. The engine holds no state
//! between calls and every conversion may run concurrently with others.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ConvertError;
use crate::generator::{self, ConversionOptions};
use crate::observability::metrics;
use crate::parser;
use crate::resolver;
use crate::serializer;

/// The conversion request as received from the boundary layer.
///
/// `store_type` and `creation_policy` arrive as raw strings and are parsed
/// into their typed forms before any document is processed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertRequest {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub store_type: String,
    #[serde(default)]
    pub store_name: String,
    #[serde(default)]
    pub creation_policy: String,
    #[serde(default)]
    pub resolve: bool,
    #[serde(default)]
    pub env_vars: IndexMap<String, String>,
    #[serde(default)]
    pub remote_key_template: Option<String>,
}

/// The conversion result: the rendered YAML stream plus collected warnings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvertResponse {
    pub result: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Request-scoped cancellation flag, checked between per-document steps.
///
/// The surrounding layer owns timeouts; flipping this flag makes the engine
/// stop before the next document instead of finishing the whole stream.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl ConversionOptions {
    /// Parse the raw option strings of a request into their typed forms.
    ///
    /// # Errors
    ///
    /// [`ConvertError::InvalidOptions`] for a store type or creation policy
    /// outside its enumerated set.
    pub fn from_request(request: &ConvertRequest) -> Result<Self, ConvertError> {
        Ok(ConversionOptions {
            store_type: request.store_type.parse()?,
            store_name: request.store_name.clone(),
            creation_policy: request.creation_policy.parse()?,
            resolve: request.resolve,
            env_vars: request.env_vars.clone(),
            remote_key_template: request.remote_key_template.clone(),
        })
    }
}

/// Convert a manifest stream in one synchronous call.
///
/// # Errors
///
/// Any fatal [`ConvertError`] kind; see the module docs for the propagation
/// policy.
pub fn convert(request: &ConvertRequest) -> Result<ConvertResponse, ConvertError> {
    convert_with_cancellation(request, &Cancellation::default())
}

/// [`convert`] with an externally owned cancellation flag.
///
/// # Errors
///
/// As [`convert`], plus [`ConvertError::Cancelled`] when the flag fires
/// between documents.
pub fn convert_with_cancellation(
    request: &ConvertRequest,
    cancellation: &Cancellation,
) -> Result<ConvertResponse, ConvertError> {
    let started = Instant::now();
    let result = run(request, cancellation);

    match &result {
        Ok(response) => {
            metrics::record_conversion(started.elapsed());
            info!(
                "conversion finished in {:?} with {} warning(s)",
                started.elapsed(),
                response.warnings.len()
            );
        }
        Err(err) => {
            metrics::record_conversion_error(err.kind());
            warn!("conversion failed: {err}");
        }
    }

    result
}

fn run(
    request: &ConvertRequest,
    cancellation: &Cancellation,
) -> Result<ConvertResponse, ConvertError> {
    // Options are request-wide; fail before touching any document
    let options = ConversionOptions::from_request(request)?;
    options.validate()?;

    let (documents, mut warnings) = parser::parse(&request.content)?;
    debug!("converting {} secret document(s)", documents.len());

    let mut generated = Vec::with_capacity(documents.len());
    for document in &documents {
        if cancellation.is_cancelled() {
            return Err(ConvertError::Cancelled);
        }

        let generated_doc = if options.resolve {
            let (resolved, mut resolve_warnings) =
                resolver::resolve(document, &options.env_vars);
            warnings.append(&mut resolve_warnings);
            generator::generate(&resolved, &options)
        } else {
            generator::generate(document, &options)
        };
        generated.push(generated_doc);
    }

    let result = serializer::serialize(&generated)?;

    for warning in &warnings {
        metrics::record_warning(warning.kind());
    }
    metrics::record_documents_converted(generated.len());

    Ok(ConvertResponse {
        result,
        warnings: warnings.iter().map(ToString::to_string).collect(),
    })
}
