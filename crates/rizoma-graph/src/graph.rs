//! In-memory concept graph.
//!
//! [`Graph`] owns the concept and relation lists exactly as they are stored
//! on disk and keeps the two views consistent on every structural mutation:
//! `connections` lists on both endpoints plus the relation records.

use std::collections::{BTreeMap, HashMap};

use crate::adjacency::AdjacencyIndex;
use crate::error::GraphError;
use crate::model::{Concept, Relation};

#[derive(Debug, Clone, Default)]
pub struct Graph {
    concepts: Vec<Concept>,
    relations: Vec<Relation>,
    /// id → position in `concepts`. First occurrence wins for duplicate IDs.
    id_to_idx: HashMap<String, usize>,
}

impl Graph {
    pub fn new(concepts: Vec<Concept>, relations: Vec<Relation>) -> Self {
        let mut g = Self {
            concepts,
            relations,
            id_to_idx: HashMap::new(),
        };
        g.reindex();
        g
    }

    fn reindex(&mut self) {
        self.id_to_idx.clear();
        for (i, c) in self.concepts.iter().enumerate() {
            self.id_to_idx.entry(c.id.clone()).or_insert(i);
        }
    }

    // ── Read access ────────────────────────────────────

    pub fn concepts(&self) -> &[Concept] {
        &self.concepts
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.id_to_idx.contains_key(id)
    }

    pub fn concept(&self, id: &str) -> Option<&Concept> {
        self.id_to_idx.get(id).map(|&i| &self.concepts[i])
    }

    /// Degree of `id`, 0 for unknown IDs.
    pub fn degree(&self, id: &str) -> usize {
        self.concept(id).map(Concept::degree).unwrap_or(0)
    }

    /// Degrees in concept order.
    pub fn degrees(&self) -> Vec<usize> {
        self.concepts.iter().map(Concept::degree).collect()
    }

    pub fn is_connected(&self, a: &str, b: &str) -> bool {
        self.concept(a).map(|c| c.is_connected_to(b)).unwrap_or(false)
    }

    /// True if any relation record joins `a` and `b` in either direction.
    pub fn has_relation_between(&self, a: &str, b: &str) -> bool {
        self.relations.iter().any(|r| r.joins(a, b))
    }

    /// Concept counts per layer, sorted by layer name.
    pub fn layer_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for c in &self.concepts {
            *counts.entry(c.layer.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Undirected adjacency snapshot built from the `connections` lists.
    pub fn adjacency(&self) -> AdjacencyIndex {
        AdjacencyIndex::from_concepts(&self.concepts)
    }

    // ── Mutation ───────────────────────────────────────

    /// Mutable access to a concept's fields. The ID must not be changed.
    pub fn concept_mut(&mut self, id: &str) -> Option<&mut Concept> {
        let i = *self.id_to_idx.get(id)?;
        Some(&mut self.concepts[i])
    }

    /// Mutable access to relation records for in-place relabeling.
    pub fn relations_mut(&mut self) -> &mut [Relation] {
        &mut self.relations
    }

    /// Reassign the layer of `id`. Returns the previous layer.
    pub fn set_layer(&mut self, id: &str, layer: &str) -> Result<String, GraphError> {
        let c = self
            .concept_mut(id)
            .ok_or_else(|| GraphError::ConceptNotFound(id.to_string()))?;
        Ok(std::mem::replace(&mut c.layer, layer.to_string()))
    }

    /// Structural edit over both lists. The ID index is rebuilt afterwards,
    /// so the closure may add, remove or rename concepts.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut Vec<Concept>, &mut Vec<Relation>) -> R) -> R {
        let out = f(&mut self.concepts, &mut self.relations);
        self.reindex();
        out
    }

    /// Connect `a` and `b`: both adjacency lists gain the other ID and
    /// `relation` is appended as the single record for the pair.
    ///
    /// Returns `Ok(false)` without touching anything when `a == b` or the
    /// pair is already connected (adjacency entry or relation in either
    /// direction).
    pub fn connect(&mut self, a: &str, b: &str, relation: Relation) -> Result<bool, GraphError> {
        let ia = *self
            .id_to_idx
            .get(a)
            .ok_or_else(|| GraphError::ConceptNotFound(a.to_string()))?;
        let ib = *self
            .id_to_idx
            .get(b)
            .ok_or_else(|| GraphError::ConceptNotFound(b.to_string()))?;
        if a == b
            || self.concepts[ia].is_connected_to(b)
            || self.concepts[ib].is_connected_to(a)
            || self.has_relation_between(a, b)
        {
            return Ok(false);
        }
        self.concepts[ia].connections.push(b.to_string());
        self.concepts[ib].connections.push(a.to_string());
        self.relations.push(relation);
        Ok(true)
    }

    /// Remove the connection `a`–`b` from both adjacency lists and every
    /// relation record joining them in either direction.
    ///
    /// Returns `true` if anything was removed.
    pub fn disconnect(&mut self, a: &str, b: &str) -> bool {
        let mut changed = false;
        if let Some(c) = self.concept_mut(a) {
            let before = c.connections.len();
            c.connections.retain(|n| n != b);
            changed |= c.connections.len() != before;
        }
        if let Some(c) = self.concept_mut(b) {
            let before = c.connections.len();
            c.connections.retain(|n| n != a);
            changed |= c.connections.len() != before;
        }
        let before = self.relations.len();
        self.relations.retain(|r| !r.joins(a, b));
        changed | (self.relations.len() != before)
    }

    /// Physically remove a concept with cascading cleanup of every relation
    /// and adjacency entry that references it.
    pub fn remove_concept(&mut self, id: &str) -> Option<Concept> {
        let idx = *self.id_to_idx.get(id)?;
        let removed = self.concepts.remove(idx);
        for c in &mut self.concepts {
            c.connections.retain(|n| n != id);
        }
        self.relations.retain(|r| !r.touches(id));
        self.reindex();
        Some(removed)
    }

    pub fn into_parts(self) -> (Vec<Concept>, Vec<Relation>) {
        (self.concepts, self.relations)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
