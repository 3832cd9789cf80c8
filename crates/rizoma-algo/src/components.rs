//! Connected components over the undirected concept graph (Union-Find).

use std::collections::HashMap;

use serde::Serialize;

use rizoma_graph::Graph;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ComponentResult {
    /// `(concept id, component id)` in concept order.
    pub components: Vec<(String, usize)>,
    pub component_count: usize,
    pub largest_component_size: usize,
}

// ── Union-Find ──────────────────────────────────────────────────────────────

struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // path compression
        let mut cur = x;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    fn union(&mut self, x: usize, y: usize) {
        let rx = self.find(x);
        let ry = self.find(y);
        if rx == ry {
            return;
        }
        match self.rank[rx].cmp(&self.rank[ry]) {
            std::cmp::Ordering::Less => self.parent[rx] = ry,
            std::cmp::Ordering::Greater => self.parent[ry] = rx,
            std::cmp::Ordering::Equal => {
                self.parent[ry] = rx;
                self.rank[rx] += 1;
            }
        }
    }
}

/// Components of the graph formed by the `connections` lists. Entries
/// pointing at unknown concepts are ignored.
pub fn connected_components(graph: &Graph) -> ComponentResult {
    let concepts = graph.concepts();
    let n = concepts.len();
    if n == 0 {
        return ComponentResult::default();
    }

    let id_to_idx: HashMap<&str, usize> = concepts
        .iter()
        .enumerate()
        .map(|(i, c)| (c.id.as_str(), i))
        .collect();

    let mut uf = UnionFind::new(n);
    for (i, c) in concepts.iter().enumerate() {
        for neighbor in &c.connections {
            if let Some(&j) = id_to_idx.get(neighbor.as_str()) {
                uf.union(i, j);
            }
        }
    }

    let mut comp_map: HashMap<usize, usize> = HashMap::new();
    let mut comp_sizes: Vec<usize> = Vec::new();
    let components = concepts
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let root = uf.find(i);
            let next = comp_map.len();
            let comp_id = *comp_map.entry(root).or_insert(next);
            if comp_id == comp_sizes.len() {
                comp_sizes.push(0);
            }
            comp_sizes[comp_id] += 1;
            (c.id.clone(), comp_id)
        })
        .collect();

    ComponentResult {
        components,
        component_count: comp_sizes.len(),
        largest_component_size: comp_sizes.iter().copied().max().unwrap_or(0),
    }
}
