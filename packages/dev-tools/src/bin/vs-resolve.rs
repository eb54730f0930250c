//! Document Resolver Binary
//!
//! Restores a value tree from its JSON snapshot, resolves every context
//! reference, and prints the plain JSON view of the result.
//!
//! # Usage
//!
//! ```bash
//! # Resolve a document against itself
//! cargo run --bin vs-resolve -- document.json
//!
//! # Resolve a document against a separate context document
//! cargo run --bin vs-resolve -- document.json context.json
//!
//! # Print the resolved snapshot instead of the plain view
//! VS_RESOLVE_OUTPUT=snapshot cargo run --bin vs-resolve -- document.json
//! ```
//!
//! # Environment Variables
//!
//! - `VALUESPACE_CONFIG`: Path to a `ModelConfig` JSON file (default: built-in config)
//! - `VS_RESOLVE_OUTPUT`: `plain` (default) or `snapshot`
//! - `RUST_LOG`: Logging level (e.g., "info", "debug", "trace")
//!
//! Logs go to stderr so stdout carries only the resolved document.

use std::env;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use valuespace_core::services::{apply_context, apply_own_context, ContextMap};
use valuespace_core::{ModelConfig, NodeId, NodeSnapshot, ValueTree};

fn load_config() -> anyhow::Result<ModelConfig> {
    let Ok(path) = env::var("VALUESPACE_CONFIG") else {
        return Ok(ModelConfig::default());
    };

    let text = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path))?;
    let config: ModelConfig = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse config file {}", path))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid config {}: {}", path, e))?;

    tracing::info!("📋 Config: {}", path);
    Ok(config)
}

fn load_document(tree: &mut ValueTree, path: &Path) -> anyhow::Result<NodeId> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read document {}", path.display()))?;
    let snapshot = NodeSnapshot::from_json_str(&text)
        .with_context(|| format!("Failed to parse document {}", path.display()))?;
    let root = tree.restore(&snapshot)?;

    tracing::debug!("Restored {} ({} nodes)", path.display(), tree.len());
    Ok(root)
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let (document_path, context_path) = match args.as_slice() {
        [document] => (Path::new(document), None),
        [document, context] => (Path::new(document), Some(Path::new(context))),
        _ => bail!("Usage: vs-resolve <document.json> [context.json]"),
    };

    let config = load_config()?;
    let mut tree = ValueTree::with_config(config.clone())?;
    let root = load_document(&mut tree, document_path)?;

    let substituted = match context_path {
        Some(context_path) => {
            let mut context_tree = ValueTree::with_config(config)?;
            let context_root = load_document(&mut context_tree, context_path)?;
            let context = ContextMap::from_object(&context_tree, context_root)?;
            tracing::info!("🔗 Context: {} ({} paths)", context_path.display(), context.len());
            apply_context(&mut tree, root, &context)?
        }
        None => {
            tracing::info!("🔗 Context: document itself");
            apply_own_context(&mut tree, root, root)?
        }
    };
    tracing::info!("✅ Resolved {} reference(s)", substituted);

    let output = match env::var("VS_RESOLVE_OUTPUT").as_deref() {
        Ok("snapshot") => tree.snapshot(root)?.to_json_string()?,
        Ok("plain") | Err(_) => serde_json::to_string_pretty(&tree.to_plain_json(root)?)?,
        Ok(other) => bail!("Unknown VS_RESOLVE_OUTPUT '{}', expected plain or snapshot", other),
    };
    println!("{}", output);

    Ok(())
}
