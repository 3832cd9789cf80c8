//! Local clustering coefficient and per-layer hub detection.
//!
//! Neighbor pairs are counted once: `C(v) = links among N(v) / (k(k−1)/2)`.
//! Layer density stays the ordered-pair figure `Σdeg / (n(n−1))`.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

use rizoma_graph::{AdjacencyIndex, Graph};

/// Fraction of `id`'s neighbor pairs that are themselves connected.
/// 0 when the node has fewer than two neighbors.
pub fn clustering_coefficient(adj: &AdjacencyIndex, id: &str) -> f64 {
    let Some(neighbors) = adj.neighbors(id) else {
        return 0.0;
    };
    let k = neighbors.len();
    if k < 2 {
        return 0.0;
    }
    let ns: Vec<&String> = neighbors.iter().collect();
    let mut links = 0usize;
    for i in 0..ns.len() {
        for j in (i + 1)..ns.len() {
            if adj.contains_edge(ns[i], ns[j]) {
                links += 1;
            }
        }
    }
    links as f64 / (k * (k - 1) / 2) as f64
}

/// `clustering_coefficient × degree`, the hub ranking key.
pub fn cluster_score(adj: &AdjacencyIndex, id: &str) -> f64 {
    clustering_coefficient(adj, id) * adj.degree(id) as f64
}

// ─────────────────────────────────────────────
// Layer clusters
// ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ClusterMember {
    pub id: String,
    pub name: String,
    pub degree: usize,
    pub clustering_coefficient: f64,
    pub cluster_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayerCluster {
    pub members: usize,
    /// Top members by cluster score.
    pub hubs: Vec<ClusterMember>,
    pub avg_degree: f64,
    pub avg_clustering: f64,
    pub density: f64,
}

/// Per-layer hub clusters. Each layer keeps `max(min_hubs, members / 5)`
/// hubs ranked by cluster score.
pub fn layer_clusters(graph: &Graph, min_hubs: usize) -> BTreeMap<String, LayerCluster> {
    let adj = graph.adjacency();
    let mut by_layer: BTreeMap<String, Vec<ClusterMember>> = BTreeMap::new();
    for c in graph.concepts() {
        let coef = clustering_coefficient(&adj, &c.id);
        let degree = adj.degree(&c.id);
        by_layer.entry(c.layer.clone()).or_default().push(ClusterMember {
            id: c.id.clone(),
            name: c.name.clone(),
            degree,
            clustering_coefficient: coef,
            cluster_score: coef * degree as f64,
        });
    }

    by_layer
        .into_iter()
        .map(|(layer, mut members)| {
            let n = members.len();
            let degree_sum: usize = members.iter().map(|m| m.degree).sum();
            let avg_clustering =
                members.iter().map(|m| m.clustering_coefficient).sum::<f64>() / n as f64;
            let density = if n > 1 {
                degree_sum as f64 / (n * (n - 1)) as f64
            } else {
                0.0
            };
            members.sort_by(|a, b| {
                b.cluster_score
                    .partial_cmp(&a.cluster_score)
                    .unwrap_or(Ordering::Equal)
            });
            members.truncate(min_hubs.max(n / 5));
            let cluster = LayerCluster {
                members: n,
                hubs: members,
                avg_degree: degree_sum as f64 / n as f64,
                avg_clustering,
                density,
            };
            (layer, cluster)
        })
        .collect()
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
