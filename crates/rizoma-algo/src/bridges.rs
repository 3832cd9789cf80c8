//! Cross-layer bridge detection.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

use rizoma_graph::{AdjacencyIndex, Graph};

/// A node is a bridge when more than this share of its neighbors sit in
/// other layers.
pub const BRIDGE_THRESHOLD: f64 = 0.3;

#[derive(Debug, Clone, Serialize)]
pub struct Bridge {
    pub id: String,
    pub name: String,
    pub layer: String,
    pub bridge_ratio: f64,
    pub connections_by_layer: BTreeMap<String, usize>,
    pub total_connections: usize,
}

/// Share of `id`'s neighbors whose layer differs from its own.
/// Neighbors missing from the graph are ignored; 0 without neighbors.
pub fn bridge_ratio(graph: &Graph, adj: &AdjacencyIndex, id: &str) -> f64 {
    let (Some(concept), Some(neighbors)) = (graph.concept(id), adj.neighbors(id)) else {
        return 0.0;
    };
    if neighbors.is_empty() {
        return 0.0;
    }
    let external = neighbors
        .iter()
        .filter_map(|n| graph.concept(n))
        .filter(|n| n.layer != concept.layer)
        .count();
    external as f64 / neighbors.len() as f64
}

/// Every node with a bridge ratio above [`BRIDGE_THRESHOLD`], highest first.
pub fn bridges(graph: &Graph) -> Vec<Bridge> {
    let adj = graph.adjacency();
    let mut out = Vec::new();
    for c in graph.concepts() {
        let Some(neighbors) = adj.neighbors(&c.id) else {
            continue;
        };
        if neighbors.is_empty() {
            continue;
        }
        let mut by_layer: BTreeMap<String, usize> = BTreeMap::new();
        for n in neighbors.iter().filter_map(|n| graph.concept(n)) {
            *by_layer.entry(n.layer.clone()).or_insert(0) += 1;
        }
        let external: usize = by_layer
            .iter()
            .filter(|(layer, _)| **layer != c.layer)
            .map(|(_, n)| n)
            .sum();
        let ratio = external as f64 / neighbors.len() as f64;
        if ratio > BRIDGE_THRESHOLD {
            out.push(Bridge {
                id: c.id.clone(),
                name: c.name.clone(),
                layer: c.layer.clone(),
                bridge_ratio: ratio,
                connections_by_layer: by_layer,
                total_connections: neighbors.len(),
            });
        }
    }
    out.sort_by(|a, b| {
        b.bridge_ratio
            .partial_cmp(&a.bridge_ratio)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    out
}
