//! Layer-move history used by the rebalancer to avoid oscillation.
//!
//! The history is a bounded append-only log persisted as a JSON array of
//! `{id, from, to, timestamp}` records, oldest first.

use std::path::Path;

use serde::{Deserialize, Serialize};

use rizoma_graph::store::{read_json, write_json};
use rizoma_graph::GraphError;

use crate::config::HistoryConfig;
use crate::error::CurateError;

pub const HISTORY_FILE: &str = "rebalance_history.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub id: String,
    pub from: String,
    pub to: String,
    /// Unix seconds of the run that applied the move.
    #[serde(default)]
    pub timestamp: u64,
}

impl MoveRecord {
    pub fn new(id: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            to: to.into(),
            timestamp: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MoveHistory {
    records: Vec<MoveRecord>,
    capacity: usize,
    lookback: usize,
}

impl MoveHistory {
    pub fn new(cfg: HistoryConfig) -> Self {
        Self::with_records(Vec::new(), cfg)
    }

    pub fn with_records(records: Vec<MoveRecord>, cfg: HistoryConfig) -> Self {
        Self {
            records,
            capacity: cfg.capacity,
            lookback: cfg.lookback,
        }
    }

    /// Load from `path`. A missing file is an empty history.
    pub fn load(path: &Path, cfg: HistoryConfig) -> Result<Self, CurateError> {
        match read_json::<Vec<MoveRecord>>(path) {
            Ok(records) => {
                tracing::debug!(path = %path.display(), records = records.len(), "move history loaded");
                Ok(Self::with_records(records, cfg))
            }
            Err(GraphError::NotFound(_)) => Ok(Self::new(cfg)),
            Err(source) => Err(CurateError::History {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), CurateError> {
        write_json(path, &self.records).map_err(|source| CurateError::History {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Append the moves of one run, stamped with `timestamp`, then drop the
    /// oldest records beyond capacity.
    pub fn append_run(&mut self, moves: impl IntoIterator<Item = MoveRecord>, timestamp: u64) {
        self.records.extend(moves.into_iter().map(|mut m| {
            m.timestamp = timestamp;
            m
        }));
        if self.records.len() > self.capacity {
            let excess = self.records.len() - self.capacity;
            self.records.drain(..excess);
        }
    }

    /// The last `lookback` records, oldest first.
    pub fn recent(&self) -> &[MoveRecord] {
        let start = self.records.len().saturating_sub(self.lookback);
        &self.records[start..]
    }

    /// True if `id` moved `to → from` within the lookback window, i.e. a
    /// move `from → to` would undo it.
    pub fn is_reversal(&self, id: &str, from: &str, to: &str) -> bool {
        self.recent()
            .iter()
            .rev()
            .any(|m| m.id == id && m.from == to && m.to == from)
    }

    pub fn records(&self) -> &[MoveRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(capacity: usize, lookback: usize) -> HistoryConfig {
        HistoryConfig { capacity, lookback }
    }

    #[test]
    fn reversal_detected_only_in_lookback() {
        let mut h = MoveHistory::new(cfg(200, 2));
        h.append_run([MoveRecord::new("n", "a", "b")], 1);
        assert!(h.is_reversal("n", "b", "a"));
        assert!(!h.is_reversal("n", "a", "b"));
        assert!(!h.is_reversal("m", "b", "a"));

        h.append_run([MoveRecord::new("x", "a", "b"), MoveRecord::new("y", "a", "b")], 2);
        assert!(!h.is_reversal("n", "b", "a"), "pushed out of the window");
    }

    #[test]
    fn capacity_evicts_oldest() {
        let mut h = MoveHistory::new(cfg(3, 3));
        let moves: Vec<_> = (0..5).map(|i| MoveRecord::new(format!("c{i}"), "a", "b")).collect();
        h.append_run(moves, 42);
        let ids: Vec<_> = h.records().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["c2", "c3", "c4"]);
        assert!(h.records().iter().all(|m| m.timestamp == 42));
    }

    #[test]
    fn missing_file_is_empty_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(HISTORY_FILE);
        let mut h = MoveHistory::load(&path, HistoryConfig::default()).unwrap();
        assert!(h.is_empty());

        h.append_run([MoveRecord::new("n", "a", "b")], 7);
        h.save(&path).unwrap();
        let loaded = MoveHistory::load(&path, HistoryConfig::default()).unwrap();
        assert_eq!(loaded, h);
    }

    #[test]
    fn malformed_file_is_a_history_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(HISTORY_FILE);
        std::fs::write(&path, "{not json").unwrap();
        let err = MoveHistory::load(&path, HistoryConfig::default()).unwrap_err();
        assert!(matches!(err, CurateError::History { .. }));
    }
}
