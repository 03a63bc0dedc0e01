//! # secret2es CLI
//!
//! Command-line interface for converting Kubernetes Secret manifests into
//! ExternalSecret manifests.
//!
//! ## Usage
//!
//! ```bash
//! # Convert a manifest file against a ClusterSecretStore named vault-backend
//! secret2es es-gen -i secrets.yaml -n vault-backend
//!
//! # Resolve ${NAME} placeholders from the given variables
//! secret2es es-gen -i secrets.yaml -n vault-backend --resolve \
//!     --env HOST=db.local --env PORT=5432
//!
//! # Print version and build information
//! secret2es version
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indexmap::IndexMap;
use tracing::warn;

use secret2es::convert::{convert, ConvertRequest};
use secret2es::resolver::env_vars_from_pairs;

/// Convert Kubernetes Secret manifests to ExternalSecret manifests
#[derive(Parser)]
#[command(name = "secret2es")]
#[command(
    about = "A tool to convert Kubernetes secrets to External Secrets",
    long_about = None,
    after_help = "\
Examples:
  secret2es es-gen -i input.yaml -n vault-backend
  secret2es es-gen -i input.yaml -n vault-backend -s SecretStore --creation-policy Orphan
  secret2es es-gen -i input.yaml -n vault-backend --resolve --env HOST=db.local
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate external secrets from corev1 secrets
    EsGen {
        /// Input path of corev1 secret file
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Store type
        #[arg(short = 's', long, default_value = "ClusterSecretStore")]
        storetype: String,

        /// Store name
        #[arg(short = 'n', long)]
        storename: String,

        /// Creation policy for the target secret
        #[arg(long, default_value = "Owner")]
        creation_policy: String,

        /// Resolve ${NAME} placeholders in secret values
        #[arg(long)]
        resolve: bool,

        /// Environment variable for resolution, repeatable (KEY=VALUE)
        #[arg(long = "env", value_name = "KEY=VALUE")]
        env: Vec<String>,

        /// Remote key template over {namespace} and {name} placeholders
        #[arg(long, value_name = "TEMPLATE")]
        remote_key_template: Option<String>,

        /// Output path external secret file (defaults to stdout)
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Print the version number of secret2es
    Version,
}

fn main() -> Result<()> {
    // Warnings and diagnostics go to stderr so stdout stays valid YAML
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::EsGen {
            input,
            storetype,
            storename,
            creation_policy,
            resolve,
            env,
            remote_key_template,
            output,
        } => es_gen(
            &input,
            storetype,
            storename,
            creation_policy,
            resolve,
            &env,
            remote_key_template,
            output.as_deref(),
        ),
        Commands::Version => {
            println!("secret2es version {}", env!("CARGO_PKG_VERSION"));
            println!("Built at {}", env!("BUILD_DATETIME"));
            println!("Git commit {}", env!("BUILD_GIT_HASH"));
            Ok(())
        }
    }
}

#[allow(
    clippy::too_many_arguments,
    reason = "Arguments mirror the es-gen flag set one to one"
)]
fn es_gen(
    input: &std::path::Path,
    storetype: String,
    storename: String,
    creation_policy: String,
    resolve: bool,
    env: &[String],
    remote_key_template: Option<String>,
    output: Option<&std::path::Path>,
) -> Result<()> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("error reading input secret file: {}", input.display()))?;

    let request = ConvertRequest {
        content,
        store_type: storetype,
        store_name: storename,
        creation_policy,
        resolve,
        env_vars: parse_env_flags(env)?,
        remote_key_template,
    };

    let response = convert(&request).context("error converting secret")?;

    for warning in &response.warnings {
        warn!("{warning}");
    }

    match output {
        Some(path) => std::fs::write(path, &response.result)
            .with_context(|| format!("error writing output file: {}", path.display()))?,
        None => {
            if !response.result.is_empty() {
                println!("{}", response.result.trim_end_matches('\n'));
            }
        }
    }

    Ok(())
}

/// Parse repeated `--env KEY=VALUE` flags; duplicate keys are last-write-wins.
fn parse_env_flags(flags: &[String]) -> Result<IndexMap<String, String>> {
    let mut pairs = Vec::with_capacity(flags.len());
    for flag in flags {
        let Some((key, value)) = flag.split_once('=') else {
            bail!("invalid --env value (expected KEY=VALUE): {flag}");
        };
        if key.is_empty() {
            bail!("invalid --env value (empty key): {flag}");
        }
        pairs.push((key.to_string(), value.to_string()));
    }
    Ok(env_vars_from_pairs(pairs))
}
