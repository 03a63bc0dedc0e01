//! # Generator
//!
//! Maps a parsed [`SecretDocument`] into one `ExternalSecret` document.
//!
//! Generation is a pure function of its inputs: the same (document, options)
//! pair always yields the same output. Every key of the source document maps
//! to exactly one `spec.data` entry, in source order; no keys are invented or
//! dropped.
//!
//! ## Remote key convention
//!
//! `remoteRef.key` defaults to `<namespace>/<name>` (or `<name>` when the
//! namespace is absent), so two distinct Secrets never collide on the same
//! remote path. The convention is configurable through
//! [`ConversionOptions::remote_key_template`], a template over `{namespace}`
//! and `{name}` placeholders.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::{EXTERNAL_SECRET_API_VERSION, EXTERNAL_SECRET_KIND};
use crate::error::ConvertError;
use crate::parser::SecretDocument;
use crate::resolver::EnvVars;

static TEMPLATE_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([a-z]+)\}")
        .expect("Failed to compile template placeholder regex - this should never happen")
});

/// Which store kind the generated documents reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreType {
    SecretStore,
    ClusterSecretStore,
}

impl FromStr for StoreType {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SecretStore" => Ok(StoreType::SecretStore),
            "ClusterSecretStore" => Ok(StoreType::ClusterSecretStore),
            other => Err(ConvertError::InvalidOptions(format!(
                "illegal store type: {other}, only support SecretStore, ClusterSecretStore"
            ))),
        }
    }
}

impl fmt::Display for StoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreType::SecretStore => f.write_str("SecretStore"),
            StoreType::ClusterSecretStore => f.write_str("ClusterSecretStore"),
        }
    }
}

/// Whether the operator owns or merely observes the target Secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreationPolicy {
    Owner,
    Orphan,
}

impl FromStr for CreationPolicy {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Owner" => Ok(CreationPolicy::Owner),
            "Orphan" => Ok(CreationPolicy::Orphan),
            other => Err(ConvertError::InvalidOptions(format!(
                "illegal creation policy: {other}, only support Owner, Orphan"
            ))),
        }
    }
}

impl fmt::Display for CreationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreationPolicy::Owner => f.write_str("Owner"),
            CreationPolicy::Orphan => f.write_str("Orphan"),
        }
    }
}

/// Request-wide conversion options, already parsed into their typed forms.
#[derive(Debug, Clone)]
pub struct ConversionOptions {
    pub store_type: StoreType,
    pub store_name: String,
    pub creation_policy: CreationPolicy,
    pub resolve: bool,
    pub env_vars: EnvVars,
    pub remote_key_template: Option<String>,
}

impl ConversionOptions {
    /// Validate the request-wide invariants before any document is processed.
    ///
    /// # Errors
    ///
    /// [`ConvertError::InvalidOptions`] for an empty store name or a remote
    /// key template referencing an unknown placeholder.
    pub fn validate(&self) -> Result<(), ConvertError> {
        if self.store_name.trim().is_empty() {
            return Err(ConvertError::InvalidOptions(
                "store name must not be empty".to_string(),
            ));
        }
        if let Some(template) = &self.remote_key_template {
            if template.trim().is_empty() {
                return Err(ConvertError::InvalidOptions(
                    "remote key template must not be empty".to_string(),
                ));
            }
            for caps in TEMPLATE_PLACEHOLDER.captures_iter(template) {
                let placeholder = &caps[1];
                if placeholder != "name" && placeholder != "namespace" {
                    return Err(ConvertError::InvalidOptions(format!(
                        "unknown remote key template placeholder: {{{placeholder}}}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// One generated `ExternalSecret` manifest.
///
/// Field order matters: serialization follows struct order, keeping the
/// rendered YAML diff-friendly and reproducible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSecretDocument {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: ExternalSecretSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectMeta {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub labels: IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSecretSpec {
    pub secret_store_ref: SecretStoreRef,
    pub target: ExternalSecretTarget,
    pub data: Vec<ExternalSecretData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecretStoreRef {
    pub kind: StoreType,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSecretTarget {
    pub name: String,
    pub creation_policy: CreationPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSecretData {
    pub secret_key: String,
    pub remote_ref: RemoteRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteRef {
    pub key: String,
    pub property: String,
}

/// Derive the backing-store path for a document under the chosen convention.
pub fn remote_key(doc: &SecretDocument, template: Option<&str>) -> String {
    match template {
        Some(template) => template
            .replace("{namespace}", doc.namespace.as_deref().unwrap_or(""))
            .replace("{name}", &doc.name),
        None => match &doc.namespace {
            Some(namespace) => format!("{namespace}/{}", doc.name),
            None => doc.name.clone(),
        },
    }
}

/// Generate one `ExternalSecret` document for `doc`.
///
/// Options are validated request-wide before any document reaches this
/// function, so generation itself cannot fail.
pub fn generate(doc: &SecretDocument, opts: &ConversionOptions) -> ExternalSecretDocument {
    let key = remote_key(doc, opts.remote_key_template.as_deref());

    let data = doc
        .data
        .keys()
        .map(|property| ExternalSecretData {
            secret_key: property.clone(),
            remote_ref: RemoteRef {
                key: key.clone(),
                property: property.clone(),
            },
        })
        .collect();

    ExternalSecretDocument {
        api_version: EXTERNAL_SECRET_API_VERSION.to_string(),
        kind: EXTERNAL_SECRET_KIND.to_string(),
        metadata: ObjectMeta {
            name: doc.name.clone(),
            namespace: doc.namespace.clone(),
            labels: doc.labels.clone(),
        },
        spec: ExternalSecretSpec {
            secret_store_ref: SecretStoreRef {
                kind: opts.store_type,
                name: opts.store_name.clone(),
            },
            target: ExternalSecretTarget {
                name: doc.name.clone(),
                creation_policy: opts.creation_policy,
            },
            data,
        },
    }
}
