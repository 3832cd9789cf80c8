use rizoma_graph::{Concept, Graph, Relation};

/// Graph from `(id, layer)` pairs and undirected `(a, b)` edges.
pub fn build_graph(nodes: &[(&str, &str)], edges: &[(&str, &str)]) -> Graph {
    let concepts: Vec<Concept> = nodes
        .iter()
        .map(|(id, layer)| Concept::new(*id, id.to_uppercase(), *layer, ""))
        .collect();
    let mut g = Graph::new(concepts, vec![]);
    for (a, b) in edges {
        g.connect(a, b, Relation::new(*a, *b, "x", "")).unwrap();
    }
    g
}

