//! Degree queries: histogram, under-connected nodes, hubs.

use std::collections::BTreeMap;

use serde::Serialize;

use rizoma_graph::Graph;

/// One row of a degree listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DegreeEntry {
    pub id: String,
    pub name: String,
    pub layer: String,
    pub degree: usize,
}

fn entries<'a>(graph: &'a Graph) -> impl Iterator<Item = DegreeEntry> + 'a {
    graph.concepts().iter().map(|c| DegreeEntry {
        id: c.id.clone(),
        name: c.name.clone(),
        layer: c.layer.clone(),
        degree: c.degree(),
    })
}

/// degree → number of concepts with that degree.
pub fn degree_distribution(graph: &Graph) -> BTreeMap<usize, usize> {
    let mut dist = BTreeMap::new();
    for d in graph.degrees() {
        *dist.entry(d).or_insert(0) += 1;
    }
    dist
}

/// Threshold 0 selects exactly the isolated concepts; any other threshold
/// selects degree ≤ threshold. Lowest degree first.
pub fn underconnected(graph: &Graph, threshold: usize) -> Vec<DegreeEntry> {
    let mut out: Vec<DegreeEntry> = entries(graph)
        .filter(|e| {
            if threshold == 0 {
                e.degree == 0
            } else {
                e.degree <= threshold
            }
        })
        .collect();
    out.sort_by(|a, b| a.degree.cmp(&b.degree).then_with(|| a.id.cmp(&b.id)));
    out
}

/// The `limit` highest-degree concepts, highest first.
pub fn top_hubs(graph: &Graph, limit: usize) -> Vec<DegreeEntry> {
    let mut out: Vec<DegreeEntry> = entries(graph).collect();
    out.sort_by(|a, b| b.degree.cmp(&a.degree).then_with(|| a.id.cmp(&b.id)));
    out.truncate(limit);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::build_graph;

    fn sample() -> Graph {
        build_graph(
            &[("a", "l"), ("b", "l"), ("c", "l"), ("z", "l")],
            &[("a", "b"), ("a", "c")],
        )
    }

    #[test]
    fn isolated_node_matches_threshold_zero_and_three() {
        let g = sample();
        let zero: Vec<String> = underconnected(&g, 0).into_iter().map(|e| e.id).collect();
        assert_eq!(zero, vec!["z"]);
        let three = underconnected(&g, 3);
        assert!(three.iter().any(|e| e.id == "z"));
        assert_eq!(three.len(), 4);
        assert_eq!(three[0].id, "z");
    }

    #[test]
    fn threshold_one_excludes_degree_two() {
        let g = sample();
        let ids: Vec<String> = underconnected(&g, 1).into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["z", "b", "c"]);
    }

    #[test]
    fn distribution_and_hubs() {
        let g = sample();
        let dist = degree_distribution(&g);
        assert_eq!(dist[&0], 1);
        assert_eq!(dist[&1], 2);
        assert_eq!(dist[&2], 1);
        let hubs = top_hubs(&g, 2);
        assert_eq!(hubs[0].id, "a");
        assert_eq!(hubs.len(), 2);
    }
}
