//! Read-only integrity checks over a loaded graph.
//!
//! Nothing here mutates the graph. Violations are counted and the first few
//! offending records are kept as samples for the report.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::graph::Graph;

/// How many offending records each finding keeps.
pub const SAMPLE_LIMIT: usize = 10;

/// Concepts at or below this degree count as low-connectivity.
pub const LOW_CONNECTIVITY: usize = 2;

/// One category of problem: total count plus a few sample descriptions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Finding {
    pub count: usize,
    pub samples: Vec<String>,
}

impl Finding {
    fn record(&mut self, sample: impl FnOnce() -> String) {
        if self.samples.len() < SAMPLE_LIMIT {
            self.samples.push(sample());
        }
        self.count += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub concepts: usize,
    pub relations: usize,

    // ── Integrity violations ──
    pub duplicate_ids: Finding,
    pub incomplete_concepts: Finding,
    pub incomplete_relations: Finding,
    pub orphan_relations: Finding,
    pub self_loops: Finding,
    pub duplicate_relations: Finding,
    pub duplicate_connections: Finding,
    pub dangling_connections: Finding,
    pub asymmetric_connections: Finding,
    pub degree_sum: usize,

    // ── Warnings ──
    pub duplicate_names: Finding,
    pub isolated: usize,
    pub low_connectivity: usize,
    pub layer_histogram: BTreeMap<String, usize>,
}

impl ValidationReport {
    /// Each undirected connection is listed on both endpoints, so a
    /// consistent graph always has an even degree sum.
    pub fn odd_degree_sum(&self) -> bool {
        self.degree_sum % 2 == 1
    }

    /// Named integrity findings, in report order.
    pub fn violations(&self) -> [(&'static str, &Finding); 9] {
        [
            ("duplicate concept ids", &self.duplicate_ids),
            ("concepts with empty required fields", &self.incomplete_concepts),
            ("relations with empty required fields", &self.incomplete_relations),
            ("relations with unknown endpoints", &self.orphan_relations),
            ("self-loop relations", &self.self_loops),
            ("duplicate relations", &self.duplicate_relations),
            ("repeated connection entries", &self.duplicate_connections),
            ("connections to unknown concepts", &self.dangling_connections),
            ("one-sided connections", &self.asymmetric_connections),
        ]
    }

    pub fn is_valid(&self) -> bool {
        self.violations().iter().all(|(_, f)| f.is_empty()) && !self.odd_degree_sum()
    }
}

pub fn validate(graph: &Graph) -> ValidationReport {
    let mut report = ValidationReport {
        concepts: graph.len(),
        relations: graph.relations().len(),
        ..Default::default()
    };

    // ── Concepts ──
    let mut seen_ids: HashSet<&str> = HashSet::new();
    let mut seen_names: HashMap<&str, &str> = HashMap::new();
    for c in graph.concepts() {
        if !seen_ids.insert(&c.id) {
            report.duplicate_ids.record(|| c.id.clone());
        }
        if !c.name.is_empty() {
            if let Some(first) = seen_names.insert(&c.name, &c.id) {
                report
                    .duplicate_names
                    .record(|| format!("{:?} ({first}, {})", c.name, c.id));
            }
        }
        let mut missing = Vec::new();
        if c.id.trim().is_empty() {
            missing.push("id");
        }
        if c.name.trim().is_empty() {
            missing.push("name");
        }
        if c.layer.trim().is_empty() {
            missing.push("layer");
        }
        if !missing.is_empty() {
            report
                .incomplete_concepts
                .record(|| format!("{:?} missing {}", c.id, missing.join(", ")));
        }

        *report.layer_histogram.entry(c.layer.clone()).or_insert(0) += 1;
        report.degree_sum += c.degree();
        match c.degree() {
            0 => report.isolated += 1,
            d if d <= LOW_CONNECTIVITY => report.low_connectivity += 1,
            _ => {}
        }

        let mut listed: HashSet<&str> = HashSet::new();
        for n in &c.connections {
            if !listed.insert(n) {
                report.duplicate_connections.record(|| format!("{} lists {n} twice", c.id));
                continue;
            }
            match graph.concept(n) {
                None => report
                    .dangling_connections
                    .record(|| format!("{} -> {n}", c.id)),
                Some(other) if !other.is_connected_to(&c.id) => report
                    .asymmetric_connections
                    .record(|| format!("{} -> {n}", c.id)),
                Some(_) => {}
            }
        }
    }

    // ── Relations ──
    let mut seen_triples: HashSet<(&str, &str, &str)> = HashSet::new();
    for (i, r) in graph.relations().iter().enumerate() {
        if r.from.trim().is_empty() || r.to.trim().is_empty() || r.name.trim().is_empty() {
            report
                .incomplete_relations
                .record(|| format!("#{i} {:?} -> {:?}", r.from, r.to));
        }
        let missing_from = !graph.contains(&r.from);
        let missing_to = !graph.contains(&r.to);
        if missing_from || missing_to {
            report
                .orphan_relations
                .record(|| format!("#{i} {} -> {}", r.from, r.to));
        }
        if r.is_self_loop() {
            report.self_loops.record(|| format!("#{i} {}", r.from));
        }
        if !seen_triples.insert(r.triple()) {
            report
                .duplicate_relations
                .record(|| format!("#{i} {} -[{}]-> {}", r.from, r.name, r.to));
        }
    }

    tracing::debug!(
        valid = report.is_valid(),
        degree_sum = report.degree_sum,
        "validation finished"
    );
    report
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Concept, Relation};

    fn make_concept(id: &str, conns: &[&str]) -> Concept {
        let mut c = Concept::new(id, id.to_uppercase(), "etica", "");
        c.connections = conns.iter().map(|s| s.to_string()).collect();
        c
    }

    #[test]
    fn clean_graph_is_valid() {
        let g = Graph::new(
            vec![make_concept("a", &["b"]), make_concept("b", &["a"])],
            vec![Relation::new("a", "b", "x", "")],
        );
        let r = validate(&g);
        assert!(r.is_valid());
        assert_eq!(r.degree_sum, 2);
        assert_eq!(r.low_connectivity, 2);
        assert_eq!(r.isolated, 0);
        assert_eq!(r.layer_histogram["etica"], 2);
    }

    #[test]
    fn odd_degree_sum_is_flagged() {
        let g = Graph::new(
            vec![make_concept("a", &["b"]), make_concept("b", &[])],
            vec![],
        );
        let r = validate(&g);
        assert!(r.odd_degree_sum());
        assert_eq!(r.asymmetric_connections.count, 1);
        assert!(!r.is_valid());
    }

    #[test]
    fn relation_problems_are_counted() {
        let g = Graph::new(
            vec![make_concept("p", &[]), make_concept("q", &[])],
            vec![
                Relation::new("p", "q", "x", ""),
                Relation::new("p", "q", "x", ""),
                Relation::new("p", "p", "x", ""),
                Relation::new("p", "ghost", "x", ""),
                Relation::new("q", "p", "", ""),
            ],
        );
        let r = validate(&g);
        assert_eq!(r.duplicate_relations.count, 1);
        assert_eq!(r.self_loops.count, 1);
        assert_eq!(r.orphan_relations.count, 1);
        assert_eq!(r.orphan_relations.samples, vec!["#3 p -> ghost"]);
        assert_eq!(r.incomplete_relations.count, 1);
        assert_eq!(r.isolated, 2);
        assert!(!r.is_valid());
    }

    #[test]
    fn duplicate_ids_and_names() {
        let mut twin = make_concept("a", &[]);
        twin.name = "Other".into();
        let mut same_name = make_concept("c", &[]);
        same_name.name = "A".into();
        let g = Graph::new(vec![make_concept("a", &[]), twin, same_name], vec![]);
        let r = validate(&g);
        assert_eq!(r.duplicate_ids.count, 1);
        assert_eq!(r.duplicate_names.count, 1);
        assert!(!r.is_valid());
    }

    #[test]
    fn duplicate_names_alone_do_not_invalidate() {
        let mut b = make_concept("b", &[]);
        b.name = "A".into();
        let g = Graph::new(vec![make_concept("a", &[]), b], vec![]);
        assert!(validate(&g).is_valid());
    }

    #[test]
    fn samples_are_capped() {
        let concepts = (0..15).map(|i| make_concept(&format!("c{i}"), &["ghost"])).collect();
        let r = validate(&Graph::new(concepts, vec![]));
        assert_eq!(r.dangling_connections.count, 15);
        assert_eq!(r.dangling_connections.samples.len(), SAMPLE_LIMIT);
    }
}
