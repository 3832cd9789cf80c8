use std::collections::{HashMap, HashSet};

use crate::model::{Concept, Relation};

// ─────────────────────────────────────────────
// PairKey
// ─────────────────────────────────────────────

/// Unordered pair of concept IDs, stored as `(min, max)`.
///
/// Two relations `a → b` and `b → a` map to the same key, which is how
/// a conceptual connection is identified regardless of direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey(String, String);

impl PairKey {
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            Self(a.to_string(), b.to_string())
        } else {
            Self(b.to_string(), a.to_string())
        }
    }

    pub fn of(relation: &Relation) -> Self {
        Self::new(&relation.from, &relation.to)
    }

    pub fn low(&self) -> &str {
        &self.0
    }

    pub fn high(&self) -> &str {
        &self.1
    }
}

// ─────────────────────────────────────────────
// AdjacencyIndex
// ─────────────────────────────────────────────

/// Undirected neighbor sets keyed by concept ID.
///
/// A read-only snapshot used by the analyzer and the candidate scorers:
/// it answers "are `a` and `b` connected" in O(1) where scanning a
/// `connections` list would be linear.
#[derive(Debug, Default, Clone)]
pub struct AdjacencyIndex {
    neighbors: HashMap<String, HashSet<String>>,
}

impl AdjacencyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the `connections` lists. A one-sided entry still yields
    /// an undirected edge so queries stay symmetric on drifted data.
    pub fn from_concepts(concepts: &[Concept]) -> Self {
        let mut idx = Self::new();
        for c in concepts {
            idx.neighbors.entry(c.id.clone()).or_default();
            for n in &c.connections {
                idx.add_edge(&c.id, n);
            }
        }
        idx
    }

    /// Build from relation records, ignoring direction and self-loops.
    pub fn from_relations(relations: &[Relation]) -> Self {
        let mut idx = Self::new();
        for r in relations {
            idx.add_edge(&r.from, &r.to);
        }
        idx
    }

    // ── Mutations ──────────────────────────────────────

    /// Register an undirected edge. Returns `false` for self-loops and
    /// edges already present.
    pub fn add_edge(&mut self, a: &str, b: &str) -> bool {
        if a == b {
            return false;
        }
        let fresh = self
            .neighbors
            .entry(a.to_string())
            .or_default()
            .insert(b.to_string());
        self.neighbors
            .entry(b.to_string())
            .or_default()
            .insert(a.to_string());
        fresh
    }

    pub fn remove_edge(&mut self, a: &str, b: &str) -> bool {
        let removed = self
            .neighbors
            .get_mut(a)
            .map(|s| s.remove(b))
            .unwrap_or(false);
        if let Some(s) = self.neighbors.get_mut(b) {
            s.remove(a);
        }
        removed
    }

    // ── Queries ────────────────────────────────────────

    pub fn neighbors(&self, id: &str) -> Option<&HashSet<String>> {
        self.neighbors.get(id)
    }

    pub fn degree(&self, id: &str) -> usize {
        self.neighbors.get(id).map(|s| s.len()).unwrap_or(0)
    }

    pub fn contains_edge(&self, a: &str, b: &str) -> bool {
        self.neighbors
            .get(a)
            .map(|s| s.contains(b))
            .unwrap_or(false)
    }

    /// Neighbors of neighbors, excluding `id` itself and its direct neighbors.
    pub fn second_neighbors(&self, id: &str) -> HashSet<&str> {
        let mut out = HashSet::new();
        let Some(direct) = self.neighbors.get(id) else {
            return out;
        };
        for n in direct {
            if let Some(nn) = self.neighbors.get(n) {
                for m in nn {
                    if m != id && !direct.contains(m) {
                        out.insert(m.as_str());
                    }
                }
            }
        }
        out
    }

    pub fn node_count(&self) -> usize {
        self.neighbors.len()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.neighbors.values().map(|s| s.len()).sum::<usize>() / 2
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.neighbors.keys().map(String::as_str)
    }

    /// Sorted neighbor list, the on-disk shape of `Concept::connections`.
    pub fn sorted_neighbors(&self, id: &str) -> Vec<String> {
        let mut v: Vec<String> = self
            .neighbors
            .get(id)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default();
        v.sort();
        v
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
