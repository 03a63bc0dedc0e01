//! # Resolver
//!
//! Rewrites `${NAME}` placeholders inside decoded secret values using a
//! caller-supplied environment-variable mapping.
//!
//! Resolution is best-effort: a placeholder whose name has no mapping is left
//! verbatim and reported as a warning. Substitution is single-pass, so a
//! substituted value that itself contains `${...}` is not expanded again.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::{Captures, Regex};
use tracing::debug;

use crate::error::Warning;
use crate::parser::SecretDocument;

/// Caller-supplied variable-name to substitution-value mapping.
pub type EnvVars = IndexMap<String, String>;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
        .expect("Failed to compile placeholder regex - this should never happen")
});

/// Collapse a list of key/value pairs into an [`EnvVars`] mapping.
///
/// Duplicate keys are last-write-wins, matching what a free-form per-row
/// editor in front of the engine produces when the same key is entered twice.
pub fn env_vars_from_pairs<I>(pairs: I) -> EnvVars
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut env = EnvVars::new();
    for (key, value) in pairs {
        env.insert(key, value);
    }
    env
}

/// Resolve every `${NAME}` placeholder in `doc`'s values against `env`.
///
/// Returns a new document; the input is not mutated. An explicitly present
/// key with an empty value counts as resolved-to-empty; an absent key leaves
/// the placeholder verbatim and records an [`Warning::UnresolvedVariable`].
pub fn resolve(doc: &SecretDocument, env: &EnvVars) -> (SecretDocument, Vec<Warning>) {
    let mut resolved = doc.clone();
    let mut warnings = Vec::new();

    for (key, value) in &doc.data {
        if !value.contains("${") {
            continue;
        }
        let replaced = PLACEHOLDER.replace_all(value, |caps: &Captures<'_>| {
            let variable = &caps[1];
            match env.get(variable) {
                Some(substitution) => substitution.clone(),
                None => {
                    warnings.push(Warning::UnresolvedVariable {
                        document: doc.qualified_name(),
                        key: key.clone(),
                        variable: variable.to_string(),
                    });
                    caps[0].to_string()
                }
            }
        });
        if replaced != *value {
            debug!("resolved placeholders in {}: key {key}", doc.qualified_name());
        }
        resolved.data.insert(key.clone(), replaced.into_owned());
    }

    (resolved, warnings)
}
