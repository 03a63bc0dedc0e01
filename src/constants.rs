//! # Constants
//!
//! Shared constants used throughout the converter.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration where applicable.

/// Maximum accepted input size in lines.
///
/// Mirrors the limit enforced by the web form in front of the conversion
/// endpoint; the engine re-checks it as a bound on memory use.
pub const MAX_INPUT_LINES: usize = 4080;

/// `apiVersion` emitted on every generated `ExternalSecret` document
pub const EXTERNAL_SECRET_API_VERSION: &str = "external-secrets.io/v1beta1";

/// `kind` emitted on every generated `ExternalSecret` document
pub const EXTERNAL_SECRET_KIND: &str = "ExternalSecret";

/// The only input `kind` the converter processes
pub const SECRET_KIND: &str = "Secret";

/// Secret `type` assumed when the manifest does not carry one
pub const DEFAULT_SECRET_TYPE: &str = "Opaque";

/// Default HTTP server port for the conversion endpoint and probes
pub const DEFAULT_SERVER_PORT: u16 = 8080;
