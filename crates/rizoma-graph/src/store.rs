//! Flat-file persistence.
//!
//! The JSON files are the only source of truth between runs. A run loads
//! both files, mutates the in-memory [`Graph`] and commits. Both files are
//! first written to sibling temp files and only then renamed over their
//! targets, so a run that fails before or while writing leaves the previous
//! contents in place.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::GraphError;
use crate::graph::Graph;
use crate::model::{Concept, Relation};

pub const NODES_FILE: &str = "concepts.json";
pub const EDGES_FILE: &str = "relations.json";

/// Locations of the nodes and edges files.
#[derive(Debug, Clone)]
pub struct GraphStore {
    nodes_path: PathBuf,
    edges_path: PathBuf,
}

impl GraphStore {
    pub fn new(nodes_path: impl Into<PathBuf>, edges_path: impl Into<PathBuf>) -> Self {
        Self {
            nodes_path: nodes_path.into(),
            edges_path: edges_path.into(),
        }
    }

    /// `concepts.json` and `relations.json` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(NODES_FILE), dir.join(EDGES_FILE))
    }

    pub fn nodes_path(&self) -> &Path {
        &self.nodes_path
    }

    pub fn edges_path(&self) -> &Path {
        &self.edges_path
    }

    /// Load both files. Either file missing or malformed is fatal.
    pub fn load(&self) -> Result<Graph, GraphError> {
        let concepts: Vec<Concept> = read_json(&self.nodes_path)?;
        let relations: Vec<Relation> = read_json(&self.edges_path)?;
        tracing::debug!(
            concepts = concepts.len(),
            relations = relations.len(),
            nodes = %self.nodes_path.display(),
            "graph loaded"
        );
        Ok(Graph::new(concepts, relations))
    }

    /// Write both files back. Both temp files are written before either
    /// target is replaced, so a failed serialization or write leaves both
    /// files as they were.
    pub fn commit(&self, graph: &Graph) -> Result<(), GraphError> {
        let nodes_tmp = stage_json(&self.nodes_path, graph.concepts())?;
        let edges_tmp = match stage_json(&self.edges_path, graph.relations()) {
            Ok(tmp) => tmp,
            Err(e) => {
                let _ = fs::remove_file(&nodes_tmp);
                return Err(e);
            }
        };
        if let Err(e) = publish(&nodes_tmp, &self.nodes_path) {
            let _ = fs::remove_file(&edges_tmp);
            return Err(e);
        }
        publish(&edges_tmp, &self.edges_path)?;
        tracing::info!(
            concepts = graph.len(),
            relations = graph.relations().len(),
            "graph committed"
        );
        Ok(())
    }

    /// Copy the edges file to `<edges>.backup_<timestamp>`.
    pub fn backup_edges(&self, timestamp: u64) -> Result<PathBuf, GraphError> {
        let mut name = self.edges_path.as_os_str().to_owned();
        name.push(format!(".backup_{timestamp}"));
        let target = PathBuf::from(name);
        fs::copy(&self.edges_path, &target).map_err(|e| GraphError::io(&self.edges_path, e))?;
        tracing::info!(backup = %target.display(), "edges backed up");
        Ok(target)
    }
}

// ─────────────────────────────────────────────
// JSON helpers
// ─────────────────────────────────────────────

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, GraphError> {
    let raw = fs::read_to_string(path).map_err(|e| GraphError::io(path, e))?;
    serde_json::from_str(&raw).map_err(|source| GraphError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Pretty-print `value` to `path` through a sibling temp file and a rename.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), GraphError> {
    let tmp = stage_json(path, value)?;
    publish(&tmp, path)
}

/// Write `value` to the temp sibling of `path`. Returns the temp path.
fn stage_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<PathBuf, GraphError> {
    let mut body = serde_json::to_string_pretty(value)?;
    body.push('\n');

    let tmp = temp_sibling(path);
    fs::write(&tmp, body).map_err(|e| GraphError::io(&tmp, e))?;
    Ok(tmp)
}

fn publish(tmp: &Path, path: &Path) -> Result<(), GraphError> {
    fs::rename(tmp, path).map_err(|e| {
        let _ = fs::remove_file(tmp);
        GraphError::io(path, e)
    })
}

fn temp_sibling(path: &Path) -> PathBuf {
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "rizoma".to_string());
    path.with_file_name(format!(".{file}.tmp"))
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
