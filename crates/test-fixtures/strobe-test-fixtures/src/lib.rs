//! Canned graph-definition fixtures shared by integration tests and benches.
//!
//! Fixtures live under the workspace-root `fixtures/` directory and are
//! listed in `fixtures/manifest.json`; this crate only hands out their raw
//! JSON. Consumers parse with their own loaders.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    graphs: HashMap<String, String>,
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

/// Raw JSON of the named graph fixture.
pub fn graph_json(name: &str) -> Result<String> {
    let rel = MANIFEST
        .graphs
        .get(name)
        .ok_or_else(|| anyhow!("unknown graph fixture '{name}'"))?;
    let path = fixtures_root().join(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

/// Names of all graph fixtures in the manifest, sorted for stable output.
pub fn graph_names() -> Vec<String> {
    let mut names: Vec<String> = MANIFEST.graphs.keys().cloned().collect();
    names.sort();
    names
}
