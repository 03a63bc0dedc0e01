//! # secret2es
//!
//! Converts Kubernetes `Secret` manifests into `ExternalSecret` manifests
//! consumable by the External Secrets Operator.
//!
//! ## Overview
//!
//! The conversion engine is a pure, stateless text-to-text transformation:
//!
//! 1. **Parse** - decode one or more YAML documents into Secret records,
//!    tolerating multi-document streams and skipping non-Secret documents
//! 2. **Resolve** - optionally rewrite `${NAME}` placeholders in secret
//!    values against a caller-supplied environment-variable mapping
//! 3. **Generate** - map each Secret into one ExternalSecret referencing the
//!    chosen secret store, one `spec.data` entry per source key
//! 4. **Serialize** - render the generated documents back into a single YAML
//!    stream with stable key ordering
//!
//! Two thin adapters wrap the engine: an HTTP server (`secret2es-server`)
//! exposing `POST /api/convert`, and a CLI (`secret2es es-gen`).
//!
//! The engine holds no persistent state between calls, performs no I/O, and
//! produces deterministic output for a given input.

pub mod constants;
pub mod convert;
pub mod error;
pub mod generator;
pub mod observability;
pub mod parser;
pub mod resolver;
pub mod serializer;
pub mod server;

pub use convert::{convert, convert_with_cancellation, Cancellation, ConvertRequest, ConvertResponse};
pub use error::{ConvertError, Warning};
pub use generator::{ConversionOptions, CreationPolicy, StoreType};
pub use parser::SecretDocument;
pub use resolver::EnvVars;
