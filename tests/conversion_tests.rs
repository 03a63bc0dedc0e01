//! # Conversion Integration Tests
//!
//! End-to-end tests of the conversion service, covering:
//! - Round-trip key preservation between Secret and ExternalSecret
//! - Determinism and idempotence of generation and serialization
//! - Document order preservation across multi-document streams
//! - Placeholder resolution behavior
//! - Remote key derivation, default and templated

use indexmap::IndexMap;
use secret2es::convert::{convert, ConvertRequest};
use secret2es::generator::{generate, ConversionOptions, CreationPolicy, StoreType};
use secret2es::parser::parse;
use secret2es::resolver::resolve;
use secret2es::serializer::serialize;

fn request(content: &str) -> ConvertRequest {
    ConvertRequest {
        content: content.to_string(),
        store_type: "SecretStore".to_string(),
        store_name: "vault-backend".to_string(),
        creation_policy: "Owner".to_string(),
        resolve: false,
        env_vars: IndexMap::new(),
        remote_key_template: None,
    }
}

fn options() -> ConversionOptions {
    ConversionOptions {
        store_type: StoreType::SecretStore,
        store_name: "vault-backend".to_string(),
        creation_policy: CreationPolicy::Owner,
        resolve: false,
        env_vars: IndexMap::new(),
        remote_key_template: None,
    }
}

const MULTI_KEY_SECRET: &str = r"
apiVersion: v1
kind: Secret
metadata:
  name: db-credentials
  namespace: prod
type: Opaque
data:
  username: YWRtaW4=
  password: aHVudGVyMg==
stringData:
  host: db.internal
";

#[test]
fn test_round_trip_key_preservation() {
    let (docs, _) = parse(MULTI_KEY_SECRET).unwrap();
    let doc = &docs[0];
    let generated = generate(doc, &options());

    assert_eq!(generated.spec.data.len(), doc.data.len());
    let mut properties: Vec<&str> = generated
        .spec
        .data
        .iter()
        .map(|entry| entry.remote_ref.property.as_str())
        .collect();
    for key in doc.data.keys() {
        assert!(properties.contains(&key.as_str()), "missing key {key}");
    }
    properties.sort_unstable();
    properties.dedup();
    assert_eq!(properties.len(), doc.data.len(), "duplicate entries generated");
}

#[test]
fn test_generation_and_serialization_are_idempotent() {
    let (docs, _) = parse(MULTI_KEY_SECRET).unwrap();
    let first = generate(&docs[0], &options());
    let second = generate(&docs[0], &options());
    assert_eq!(first, second);
    assert_eq!(
        serialize(std::slice::from_ref(&first)).unwrap(),
        serialize(std::slice::from_ref(&second)).unwrap()
    );
}

#[test]
fn test_convert_twice_is_byte_identical() {
    let req = request(MULTI_KEY_SECRET);
    let first = convert(&req).unwrap();
    let second = convert(&req).unwrap();
    assert_eq!(first.result, second.result);
}

#[test]
fn test_document_order_is_input_order() {
    let content = r"
kind: Secret
metadata:
  name: alpha
stringData:
  k: v
---
kind: Secret
metadata:
  name: beta
stringData:
  k: v
---
kind: Secret
metadata:
  name: gamma
stringData:
  k: v
";
    let response = convert(&request(content)).unwrap();
    let alpha = response.result.find("name: alpha").unwrap();
    let beta = response.result.find("name: beta").unwrap();
    let gamma = response.result.find("name: gamma").unwrap();
    assert!(alpha < beta && beta < gamma);
    assert_eq!(response.result.matches("kind: ExternalSecret").count(), 3);
}

#[test]
fn test_spec_data_preserves_source_key_order() {
    let content = r"
kind: Secret
metadata:
  name: ordered
data:
  zeta: YQ==
  alpha: Yg==
stringData:
  omega: last
";
    let response = convert(&request(content)).unwrap();
    let zeta = response.result.find("secretKey: zeta").unwrap();
    let alpha = response.result.find("secretKey: alpha").unwrap();
    let omega = response.result.find("secretKey: omega").unwrap();
    assert!(zeta < alpha && alpha < omega);
}

#[test]
fn test_resolution_correctness() {
    let content = r"
kind: Secret
metadata:
  name: app
stringData:
  conn: host=${HOST}
";
    let (docs, _) = parse(content).unwrap();
    let mut env = IndexMap::new();
    env.insert("HOST".to_string(), "db.local".to_string());

    let (resolved, warnings) = resolve(&docs[0], &env);
    assert_eq!(
        resolved.data.get("conn").map(String::as_str),
        Some("host=db.local")
    );
    assert!(warnings.is_empty());

    let (unresolved, warnings) = resolve(&docs[0], &IndexMap::new());
    assert_eq!(
        unresolved.data.get("conn").map(String::as_str),
        Some("host=${HOST}")
    );
    assert_eq!(warnings.len(), 1);
}

#[test]
fn test_resolve_false_leaves_values_untouched() {
    let content = r"
kind: Secret
metadata:
  name: app
stringData:
  conn: host=${HOST}
";
    let response = convert(&request(content)).unwrap();
    assert!(response.warnings.is_empty());
}

#[test]
fn test_unresolved_variable_warning_reaches_response() {
    let content = r"
kind: Secret
metadata:
  name: app
stringData:
  conn: host=${HOST}
";
    let mut req = request(content);
    req.resolve = true;
    req.env_vars
        .insert("OTHER".to_string(), "value".to_string());
    let response = convert(&req).unwrap();
    assert_eq!(response.warnings.len(), 1);
    assert!(response.warnings[0].contains("HOST"));
}

#[test]
fn test_default_remote_key_uses_namespace_and_name() {
    let response = convert(&request(MULTI_KEY_SECRET)).unwrap();
    assert!(response.result.contains("key: prod/db-credentials"));
}

#[test]
fn test_remote_key_template_is_honored() {
    let mut req = request(MULTI_KEY_SECRET);
    req.remote_key_template = Some("secret/data/{namespace}/{name}".to_string());
    let response = convert(&req).unwrap();
    assert!(response
        .result
        .contains("key: secret/data/prod/db-credentials"));
}

#[test]
fn test_namespace_and_labels_survive_conversion() {
    let content = r"
kind: Secret
metadata:
  name: tagged
  namespace: infra
  labels:
    team: platform
stringData:
  k: v
";
    let response = convert(&request(content)).unwrap();
    assert!(response.result.contains("namespace: infra"));
    assert!(response.result.contains("team: platform"));
}

#[test]
fn test_cluster_store_and_orphan_policy() {
    let mut req = request(MULTI_KEY_SECRET);
    req.store_type = "ClusterSecretStore".to_string();
    req.creation_policy = "Orphan".to_string();
    let response = convert(&req).unwrap();
    assert!(response.result.contains("kind: ClusterSecretStore"));
    assert!(response.result.contains("creationPolicy: Orphan"));
}

#[test]
fn test_output_parses_back_as_yaml() {
    let response = convert(&request(MULTI_KEY_SECRET)).unwrap();
    let value: serde_yaml::Value = serde_yaml::from_str(&response.result).unwrap();
    assert_eq!(
        value["spec"]["secretStoreRef"]["name"],
        serde_yaml::Value::String("vault-backend".to_string())
    );
    assert_eq!(
        value["spec"]["target"]["creationPolicy"],
        serde_yaml::Value::String("Owner".to_string())
    );
}
