use std::cmp::Ordering;

use rand::Rng;

use rizoma_algo::DegreeStats;
use rizoma_graph::{layer_dimension, Concept, Graph};

use super::{link, NormalizeMode, NormalizeReport};
use crate::config::NormalizeConfig;
use crate::error::CurateError;
use crate::labels::VerbTable;

/// Dimensions considered neighbors of each other for partner scoring.
const ADJACENT_DIMENSIONS: [(&str, &[&str]); 8] = [
    ("fundacional", &["ontologica", "temporal"]),
    ("ontologica", &["fundacional", "epistemica", "ecologica"]),
    ("epistemica", &["ontologica", "politica", "etica"]),
    ("politica", &["epistemica", "pratica", "etica"]),
    ("etica", &["epistemica", "politica", "pratica"]),
    ("temporal", &["fundacional", "ontologica", "pratica"]),
    ("ecologica", &["ontologica", "pratica", "etica"]),
    ("pratica", &["politica", "etica", "temporal", "ecologica"]),
];

fn adjacent(a: &str, b: &str) -> bool {
    ADJACENT_DIMENSIONS
        .iter()
        .find(|(d, _)| *d == a)
        .is_some_and(|(_, near)| near.contains(&b))
}

/// 2 for the same layer, 1 for the same or an adjacent dimension, else 0.5.
fn layer_score(a: &Concept, b: &Concept) -> f64 {
    if a.layer == b.layer {
        return 2.0;
    }
    let (da, db) = (layer_dimension(&a.layer), layer_dimension(&b.layer));
    if da == db || adjacent(da, db) {
        1.0
    } else {
        0.5
    }
}

/// Under-connected partners are preferred, over-connected ones last.
fn connectivity_score(degree: usize, low: f64, high: f64) -> f64 {
    let d = degree as f64;
    if d < low {
        3.0
    } else if d > high {
        1.0
    } else {
        2.0
    }
}

/// Raise concepts below `mean − σ` toward the mean.
///
/// The band is measured once before the pass. Concepts are processed most
/// under-connected first, at most `cfg.sigma_max_nodes` of them, each
/// receiving `max(1, floor(mean) − degree)` new connections.
pub fn boost_below_sigma<R: Rng + ?Sized>(
    graph: &mut Graph,
    cfg: &NormalizeConfig,
    verbs: &VerbTable,
    rng: &mut R,
) -> Result<NormalizeReport, CurateError> {
    let mut report = NormalizeReport::start(NormalizeMode::Sigma, graph);
    let stats = DegreeStats::from_graph(graph);
    let (low, high) = (stats.mean - stats.std_dev, stats.mean + stats.std_dev);

    let mut below: Vec<(usize, String)> = graph
        .concepts()
        .iter()
        .filter(|c| (c.degree() as f64) < low)
        .map(|c| (c.degree(), c.id.clone()))
        .collect();
    below.sort_by_key(|(d, _)| *d);
    below.truncate(cfg.sigma_max_nodes);
    tracing::info!(
        mean = stats.mean,
        std_dev = stats.std_dev,
        count = below.len(),
        "concepts below one sigma"
    );

    for (_, id) in &below {
        let current = graph.degree(id);
        let needed = (stats.mean.floor() as usize).saturating_sub(current).max(1);

        let Some(concept) = graph.concept(id) else {
            continue;
        };
        let mut scored: Vec<(f64, String)> = graph
            .concepts()
            .iter()
            .filter(|o| o.id != concept.id && !concept.is_connected_to(&o.id))
            .map(|o| {
                let score = layer_score(concept, o) * connectivity_score(o.degree(), low, high);
                (score, o.id.clone())
            })
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        scored.truncate(needed * 2);

        let mut added = 0;
        for (_, partner) in scored {
            if added >= needed {
                break;
            }
            if link(graph, id, &partner, |a, _| verbs.layer_verb(rng, a))? {
                added += 1;
            }
        }
        report.edges_added += added;
        report.nodes_processed += 1;
        if added < needed {
            report.short(id, needed, added);
        }
    }

    Ok(report.finish(graph))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::tests::{assert_consistent, build_graph};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn layer_score_by_dimension() {
        let c = |layer: &str| Concept::new("x", "X", layer, "");
        assert_eq!(layer_score(&c("etica-1"), &c("etica-1")), 2.0);
        assert_eq!(layer_score(&c("etica-1"), &c("etica-3")), 1.0);
        assert_eq!(layer_score(&c("etica"), &c("politica")), 1.0);
        assert_eq!(layer_score(&c("etica"), &c("fundacional")), 0.5);
        assert_eq!(layer_score(&c("misc"), &c("etica")), 0.5);
    }

    #[test]
    fn connectivity_prefers_underconnected() {
        assert_eq!(connectivity_score(1, 3.0, 8.0), 3.0);
        assert_eq!(connectivity_score(5, 3.0, 8.0), 2.0);
        assert_eq!(connectivity_score(9, 3.0, 8.0), 1.0);
    }

    /// Ten concepts of degree 6 (ring joined to 3 successors) plus `lo`
    /// hanging off `n0`.
    fn ring_with_outlier() -> Graph {
        let ids: Vec<String> = (0..10).map(|i| format!("n{i}")).collect();
        let mut nodes: Vec<(&str, &str, &str)> =
            ids.iter().map(|id| (id.as_str(), "etica", "")).collect();
        nodes.push(("lo", "politica", ""));
        let mut edges = Vec::new();
        for i in 0..10 {
            for k in 1..=3 {
                edges.push((ids[i].as_str(), ids[(i + k) % 10].as_str()));
            }
        }
        edges.push(("lo", "n0"));
        build_graph(&nodes, &edges)
    }

    #[test]
    fn outlier_raised_toward_mean() {
        let mut g = ring_with_outlier();
        let mut rng = StdRng::seed_from_u64(3);
        let report =
            boost_below_sigma(&mut g, &NormalizeConfig::default(), &VerbTable::default(), &mut rng).unwrap();
        // mean 62/11 ≈ 5.64, σ ≈ 1.49: only `lo` is below; floor(mean) − 1 = 4
        assert_eq!(report.nodes_processed, 1);
        assert_eq!(report.edges_added, 4);
        assert_eq!(g.degree("lo"), 5);
        assert_consistent(&g);
    }

    #[test]
    fn max_nodes_caps_the_pass() {
        let mut g = ring_with_outlier();
        let cfg = NormalizeConfig {
            sigma_max_nodes: 0,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let report = boost_below_sigma(&mut g, &cfg, &VerbTable::default(), &mut rng).unwrap();
        assert_eq!(report.edges_added, 0);
        assert_eq!(g.degree("lo"), 1);
    }
}
