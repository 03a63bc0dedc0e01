//! # Parser
//!
//! Parses Kubernetes `Secret` manifests out of a multi-document YAML stream.
//!
//! ## Behavior
//!
//! - Splits the stream on `---` separators and parses each document on its own;
//!   a parse failure on one document is a warning, not a hard failure.
//! - Documents whose `kind` is not `Secret` are skipped with a warning.
//! - Duplicate (namespace, name) pairs among retained Secrets are skipped.
//! - `data` values are base64-decoded and merged with `stringData` into one
//!   ordered plaintext mapping, `stringData` winning on key collisions.
//!
//! The whole call fails only when the input exceeds the line ceiling or when
//! not a single document of the stream could be parsed.

use std::collections::HashSet;
use std::sync::LazyLock;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use indexmap::IndexMap;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::constants::{DEFAULT_SECRET_TYPE, MAX_INPUT_LINES, SECRET_KIND};
use crate::error::{ConvertError, Warning};

static DOC_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^---$").expect("Failed to compile document separator regex - this should never happen")
});

/// One parsed Kubernetes Secret with its data decoded to plaintext.
///
/// `data` holds the merged key space of the manifest's `data` (decoded) and
/// `stringData` fields, in source key order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretDocument {
    pub api_version: String,
    pub name: String,
    pub namespace: Option<String>,
    pub labels: IndexMap<String, String>,
    pub secret_type: String,
    pub data: IndexMap<String, String>,
}

impl SecretDocument {
    /// `namespace/name` identity used for duplicate detection and messages.
    pub fn qualified_name(&self) -> String {
        match &self.namespace {
            Some(namespace) => format!("{namespace}/{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// Lenient manifest shape: every field optional so that kind and name checks
/// can produce targeted warnings instead of serde errors.
#[derive(Debug, Deserialize)]
struct RawManifest {
    #[serde(default, rename = "apiVersion")]
    api_version: Option<String>,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    metadata: RawMetadata,
    #[serde(default, rename = "type")]
    secret_type: Option<String>,
    // Option tolerates an explicit `data: null` in hand-written manifests
    #[serde(default)]
    data: Option<IndexMap<String, String>>,
    #[serde(default, rename = "stringData")]
    string_data: Option<IndexMap<String, String>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawMetadata {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    namespace: Option<String>,
    #[serde(default)]
    labels: Option<IndexMap<String, String>>,
}

/// Parse all Secret documents from `text`.
///
/// Returns the retained documents in input order plus the warnings collected
/// along the way.
///
/// # Errors
///
/// - [`ConvertError::InputTooLarge`] when the input exceeds the line ceiling,
///   checked before any parsing work
/// - [`ConvertError::EmptyInput`] when no document of the stream parsed
pub fn parse(text: &str) -> Result<(Vec<SecretDocument>, Vec<Warning>), ConvertError> {
    let line_count = text.lines().count();
    if line_count > MAX_INPUT_LINES {
        return Err(ConvertError::InputTooLarge {
            limit: MAX_INPUT_LINES,
            actual: line_count,
        });
    }

    let mut documents = Vec::new();
    let mut warnings = Vec::new();
    let mut seen_names: HashSet<(Option<String>, String)> = HashSet::new();
    let mut parsed_any = false;
    let mut index = 0usize;

    for chunk in DOC_SEPARATOR.split(text) {
        if chunk.trim().is_empty() {
            continue;
        }
        index += 1;

        let raw: RawManifest = match serde_yaml::from_str(chunk) {
            Ok(raw) => raw,
            Err(err) => {
                warn!("document {index} failed to parse: {err}");
                warnings.push(Warning::MalformedDocument {
                    index,
                    detail: err.to_string(),
                });
                continue;
            }
        };
        parsed_any = true;

        let kind = raw.kind.as_deref().unwrap_or("");
        if kind != SECRET_KIND {
            let shown = if kind.is_empty() { "<none>" } else { kind };
            debug!("document {index} has kind {shown}, skipping");
            warnings.push(Warning::SkippedDocument {
                index,
                reason: format!("kind is {shown}, not {SECRET_KIND}"),
            });
            continue;
        }

        let Some(name) = raw.metadata.name.clone().filter(|n| !n.is_empty()) else {
            warnings.push(Warning::MalformedDocument {
                index,
                detail: "metadata.name is missing or empty".to_string(),
            });
            continue;
        };

        let identity = (raw.metadata.namespace.clone(), name.clone());
        if !seen_names.insert(identity) {
            warnings.push(Warning::SkippedDocument {
                index,
                reason: format!("duplicate Secret name {}", qualified(&raw.metadata, &name)),
            });
            continue;
        }

        match decode_data(&raw, &name) {
            Ok(data) => documents.push(SecretDocument {
                api_version: raw
                    .api_version
                    .unwrap_or_else(|| "v1".to_string()),
                name,
                namespace: raw.metadata.namespace,
                labels: raw.metadata.labels.unwrap_or_default(),
                secret_type: raw
                    .secret_type
                    .unwrap_or_else(|| DEFAULT_SECRET_TYPE.to_string()),
                data,
            }),
            Err(warning) => {
                warn!("{warning}");
                warnings.push(warning);
            }
        }
    }

    if !parsed_any {
        return Err(ConvertError::EmptyInput);
    }

    debug!(
        "parsed {} secret document(s), {} warning(s)",
        documents.len(),
        warnings.len()
    );
    Ok((documents, warnings))
}

fn qualified(metadata: &RawMetadata, name: &str) -> String {
    match &metadata.namespace {
        Some(namespace) => format!("{namespace}/{name}"),
        None => name.to_string(),
    }
}

/// Decode `data` and merge `stringData` over it, preserving source key order.
fn decode_data(raw: &RawManifest, name: &str) -> Result<IndexMap<String, String>, Warning> {
    let capacity = raw.data.as_ref().map_or(0, IndexMap::len)
        + raw.string_data.as_ref().map_or(0, IndexMap::len);
    let mut merged = IndexMap::with_capacity(capacity);

    for (key, value) in raw.data.iter().flatten() {
        let bytes = BASE64.decode(value.trim()).map_err(|err| Warning::MalformedData {
            document: name.to_string(),
            key: key.clone(),
            detail: err.to_string(),
        })?;
        let plaintext = String::from_utf8(bytes).map_err(|_| Warning::MalformedData {
            document: name.to_string(),
            key: key.clone(),
            detail: "decoded value is not valid UTF-8".to_string(),
        })?;
        merged.insert(key.clone(), plaintext);
    }

    // stringData wins when the same key appears in both fields
    for (key, value) in raw.string_data.iter().flatten() {
        merged.insert(key.clone(), value.clone());
    }

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPAQUE_SECRET: &str = r"
apiVersion: v1
kind: Secret
metadata:
  name: db-credentials
  namespace: prod
type: Opaque
data:
  username: YWRtaW4=
  password: cGFzc3dvcmQ=
";

    #[test]
    fn test_parse_single_secret() {
        let (docs, warnings) = parse(OPAQUE_SECRET).unwrap();
        assert_eq!(docs.len(), 1);
        assert!(warnings.is_empty());
        let doc = &docs[0];
        assert_eq!(doc.name, "db-credentials");
        assert_eq!(doc.namespace.as_deref(), Some("prod"));
        assert_eq!(doc.secret_type, "Opaque");
        assert_eq!(doc.data.get("username").map(String::as_str), Some("admin"));
        assert_eq!(
            doc.data.get("password").map(String::as_str),
            Some("password")
        );
    }

    #[test]
    fn test_parse_preserves_key_order() {
        let input = r"
kind: Secret
metadata:
  name: ordered
data:
  zeta: YQ==
  alpha: Yg==
  mid: Yw==
";
        let (docs, _) = parse(input).unwrap();
        let keys: Vec<&String> = docs[0].data.keys().collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_string_data_wins_over_data() {
        let input = r"
kind: Secret
metadata:
  name: merged
data:
  shared: ZnJvbS1kYXRh
  only-data: eA==
stringData:
  shared: from-string-data
";
        let (docs, warnings) = parse(input).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(
            docs[0].data.get("shared").map(String::as_str),
            Some("from-string-data")
        );
        assert_eq!(docs[0].data.get("only-data").map(String::as_str), Some("x"));
    }

    #[test]
    fn test_non_secret_document_is_skipped_with_warning() {
        let input = r"
kind: ConfigMap
metadata:
  name: not-a-secret
data:
  key: value
";
        let (docs, warnings) = parse(input).unwrap();
        assert!(docs.is_empty());
        assert_eq!(warnings.len(), 1);
        assert!(matches!(warnings[0], Warning::SkippedDocument { .. }));
        assert!(warnings[0].to_string().contains("ConfigMap"));
    }

    #[test]
    fn test_multi_document_stream_keeps_input_order() {
        let input = format!(
            "{}\n---\nkind: Secret\nmetadata:\n  name: second\nstringData:\n  k: v\n",
            OPAQUE_SECRET.trim()
        );
        let (docs, _) = parse(&input).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].name, "db-credentials");
        assert_eq!(docs[1].name, "second");
    }

    #[test]
    fn test_bad_base64_excludes_document_but_not_the_rest() {
        let input = r"
kind: Secret
metadata:
  name: broken
data:
  key: '%%%not-base64%%%'
---
kind: Secret
metadata:
  name: healthy
stringData:
  k: v
";
        let (docs, warnings) = parse(input).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].name, "healthy");
        assert_eq!(warnings.len(), 1);
        match &warnings[0] {
            Warning::MalformedData { document, key, .. } => {
                assert_eq!(document, "broken");
                assert_eq!(key, "key");
            }
            other => panic!("unexpected warning: {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_named_secret_is_skipped() {
        let input = r"
kind: Secret
metadata:
  name: twice
stringData:
  a: first
---
kind: Secret
metadata:
  name: twice
stringData:
  a: second
";
        let (docs, warnings) = parse(input).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].data.get("a").map(String::as_str), Some("first"));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].to_string().contains("duplicate"));
    }

    #[test]
    fn test_same_name_in_different_namespaces_is_not_a_duplicate() {
        let input = r"
kind: Secret
metadata:
  name: app
  namespace: one
stringData:
  k: v
---
kind: Secret
metadata:
  name: app
  namespace: two
stringData:
  k: v
";
        let (docs, warnings) = parse(input).unwrap();
        assert_eq!(docs.len(), 2);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_explicit_null_data_is_tolerated() {
        let input = "kind: Secret\nmetadata:\n  name: nullish\ndata:\nstringData:\n  k: v\n";
        let (docs, warnings) = parse(input).unwrap();
        assert_eq!(docs.len(), 1);
        assert!(warnings.is_empty());
        assert_eq!(docs[0].data.get("k").map(String::as_str), Some("v"));
    }

    #[test]
    fn test_missing_name_is_a_malformed_document() {
        let input = r"
kind: Secret
metadata:
  namespace: prod
stringData:
  k: v
";
        let (docs, warnings) = parse(input).unwrap();
        assert!(docs.is_empty());
        assert!(warnings[0].to_string().contains("metadata.name"));
    }

    #[test]
    fn test_unparseable_document_among_valid_ones_is_a_warning() {
        let input = r"
kind: Secret
metadata:
  name: good
stringData:
  k: v
---
	this is not yaml: [unclosed
---
kind: Secret
metadata:
  name: also-good
stringData:
  k: v
";
        let (docs, warnings) = parse(input).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(warnings.len(), 1);
        assert!(matches!(warnings[0], Warning::MalformedDocument { index: 2, .. }));
    }

    #[test]
    fn test_empty_input_fails() {
        assert!(matches!(parse(""), Err(ConvertError::EmptyInput)));
        assert!(matches!(parse("   \n\n"), Err(ConvertError::EmptyInput)));
    }

    #[test]
    fn test_all_documents_unparseable_fails() {
        let input = "\t:::\n---\n\t:::\n";
        assert!(matches!(parse(input), Err(ConvertError::EmptyInput)));
    }

    #[test]
    fn test_line_ceiling_is_enforced_before_parsing() {
        let input = "kind: Secret\n".repeat(MAX_INPUT_LINES + 1);
        match parse(&input) {
            Err(ConvertError::InputTooLarge { limit, actual }) => {
                assert_eq!(limit, MAX_INPUT_LINES);
                assert_eq!(actual, MAX_INPUT_LINES + 1);
            }
            other => panic!("expected InputTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn test_input_at_the_ceiling_is_accepted() {
        let mut input = String::from("kind: Secret\nmetadata:\n  name: tall\nstringData:\n  k: v\n");
        let padding = MAX_INPUT_LINES - input.lines().count();
        for _ in 0..padding {
            input.push('\n');
        }
        assert_eq!(input.lines().count(), MAX_INPUT_LINES);
        let (docs, _) = parse(&input).unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[test]
    fn test_leading_separator_and_comments_are_tolerated() {
        let input = "---\n# a hand-written manifest\nkind: Secret\nmetadata:\n  name: commented\nstringData:\n  k: v\n";
        let (docs, warnings) = parse(input).unwrap();
        assert_eq!(docs.len(), 1);
        assert!(warnings.is_empty());
    }
}
