//! Shared helpers for CLI commands.

use std::path::Path;

use anyhow::Context;
use reachcard_config::CardDescription;
use reachcard_core::{LinkTable, TopologyResolver};

/// Load a card description, naming the file on failure.
pub fn load(path: &Path) -> anyhow::Result<CardDescription> {
    CardDescription::load(path)
        .with_context(|| format!("cannot load card description {}", path.display()))
}

/// Resolve a description's available links.
pub fn resolve(description: &CardDescription) -> anyhow::Result<LinkTable> {
    let table = TopologyResolver::new(description.provider_table())
        .resolve(&description.endpoint_records())
        .context("topology resolution failed")?;
    Ok(table)
}
