use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    scenes: HashMap<String, String>,
    documents: HashMap<String, DocumentEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DocumentEntry {
    Path(String),
    Detailed {
        path: String,
        #[serde(default)]
        note: Option<String>,
    },
}

impl DocumentEntry {
    fn as_path(&self) -> &str {
        match self {
            DocumentEntry::Path(path) => path,
            DocumentEntry::Detailed { path, .. } => path,
        }
    }
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn load_json<T: DeserializeOwned>(rel: &str) -> Result<T> {
    let text = read_to_string(rel)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
}

fn lookup<'a, T>(map: &'a HashMap<String, T>, kind: &str, name: &str) -> Result<&'a T> {
    map.get(name)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

/// Scene snapshots loadable into an in-memory scene adapter.
pub mod scenes {
    use super::*;

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        let rel = lookup(&MANIFEST.scenes, "scene", name)?;
        super::load_json(rel)
    }
}

/// Encoded `.xad` documents, including deliberately broken ones.
pub mod documents {
    use super::*;

    pub fn bytes(name: &str) -> Result<Vec<u8>> {
        let entry = lookup(&MANIFEST.documents, "document", name)?;
        let path = resolve_path(entry.as_path());
        fs::read(&path).with_context(|| format!("failed to read fixture at {}", path.display()))
    }

    pub fn json(name: &str) -> Result<String> {
        let entry = lookup(&MANIFEST.documents, "document", name)?;
        read_to_string(entry.as_path())
    }

    pub fn note(name: &str) -> Result<Option<String>> {
        let entry = lookup(&MANIFEST.documents, "document", name)?;
        Ok(match entry {
            DocumentEntry::Path(_) => None,
            DocumentEntry::Detailed { note, .. } => note.clone(),
        })
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        let entry = lookup(&MANIFEST.documents, "document", name)?;
        Ok(resolve_path(entry.as_path()))
    }
}
