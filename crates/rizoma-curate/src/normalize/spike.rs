use std::cmp::Ordering;

use rand::seq::SliceRandom;
use rand::Rng;

use rizoma_graph::Graph;

use super::{link, NormalizeMode, NormalizeReport};
use crate::config::NormalizeConfig;
use crate::error::CurateError;
use crate::labels::VerbTable;

fn ids_at_degree(graph: &Graph, degree: usize) -> Vec<String> {
    graph
        .concepts()
        .iter()
        .filter(|c| c.degree() == degree)
        .map(|c| c.id.clone())
        .collect()
}

/// First neighbor with degree ≥ `strong`, else the first neighbor.
fn weak_link(graph: &Graph, id: &str, strong: usize) -> Option<String> {
    let concept = graph.concept(id)?;
    concept
        .connections
        .iter()
        .find(|n| graph.degree(n) >= strong)
        .or_else(|| concept.connections.first())
        .cloned()
}

/// Unconnected partners for `id`, best first. Same-layer and moderate-degree
/// candidates score higher; equal scores are ordered randomly.
fn candidates<R: Rng + ?Sized>(
    graph: &Graph,
    id: &str,
    cfg: &NormalizeConfig,
    rng: &mut R,
) -> Vec<String> {
    let Some(concept) = graph.concept(id) else {
        return Vec::new();
    };
    let (lo, hi) = cfg.band;
    let mut scored: Vec<(f64, f64, &str)> = graph
        .concepts()
        .iter()
        .filter(|o| o.id != concept.id && !concept.is_connected_to(&o.id))
        .map(|o| {
            let mut score = 0.0;
            if o.layer == concept.layer {
                score += cfg.spike_same_layer_bonus;
            }
            if (lo..=hi).contains(&o.degree()) {
                score += cfg.band_bonus;
            }
            (score, rng.gen::<f64>(), o.id.as_str())
        })
        .collect();
    scored.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
    });
    scored.into_iter().map(|(_, _, id)| id.to_string()).collect()
}

/// Flatten the spike at `cfg.spike_degree`.
///
/// With `excess = count − floor(total × target_share)`, a shuffled
/// `floor(excess × reduce_fraction)` of the spike concepts each drop one
/// connection, preferring a strongly connected neighbor. The spike is then
/// re-bucketed and a shuffled `floor(excess × increase_fraction)` of it is
/// raised to one of `increase_targets`.
pub fn flatten_spike<R: Rng + ?Sized>(
    graph: &mut Graph,
    cfg: &NormalizeConfig,
    verbs: &VerbTable,
    rng: &mut R,
) -> Result<NormalizeReport, CurateError> {
    let mut report = NormalizeReport::start(NormalizeMode::Spike, graph);

    let target = (graph.len() as f64 * cfg.spike_target_share).floor() as usize;
    let mut spike = ids_at_degree(graph, cfg.spike_degree);
    let excess = spike.len().saturating_sub(target);
    tracing::info!(
        degree = cfg.spike_degree,
        count = spike.len(),
        target,
        excess,
        "spike measured"
    );
    if excess == 0 {
        return Ok(report.finish(graph));
    }

    // ── reduce ──
    let to_reduce = (excess as f64 * cfg.reduce_fraction).floor() as usize;
    spike.shuffle(rng);
    for id in spike.iter().take(to_reduce) {
        let Some(partner) = weak_link(graph, id, cfg.strong_degree) else {
            continue;
        };
        if graph.disconnect(id, &partner) {
            tracing::debug!(id = %id, partner = %partner, "connection removed");
            report.edges_removed += 1;
        }
        report.nodes_processed += 1;
    }

    // ── increase ──
    let to_increase = (excess as f64 * cfg.increase_fraction).floor() as usize;
    let mut spike = ids_at_degree(graph, cfg.spike_degree);
    spike.shuffle(rng);
    for id in spike.iter().take(to_increase) {
        let (low, high) = cfg.increase_targets;
        let wanted = if rng.gen::<f64>() < cfg.low_target_probability {
            low
        } else {
            high
        };
        let current = graph.degree(id);
        if current >= wanted {
            continue;
        }
        let needed = wanted - current;
        let mut added = 0;
        for partner in candidates(graph, id, cfg, rng) {
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

    /// Ring of `n` concepts where each is joined to its 3 successors:
    /// every concept has degree 6.
    fn ring(n: usize) -> Graph {
        let ids: Vec<String> = (0..n).map(|i| format!("c{i:02}")).collect();
        let nodes: Vec<(&str, &str, &str)> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), if i % 2 == 0 { "etica" } else { "politica" }, ""))
            .collect();
        let mut edges = Vec::new();
        for i in 0..n {
            for k in 1..=3 {
                edges.push((ids[i].as_str(), ids[(i + k) % n].as_str()));
            }
        }
        build_graph(&nodes, &edges)
    }

    #[test]
    fn flattens_uniform_spike() {
        let mut g = ring(40);
        assert!(g.degrees().iter().all(|&d| d == 6));
        let cfg = NormalizeConfig::default();
        let mut rng = StdRng::seed_from_u64(42);
        let report = flatten_spike(&mut g, &cfg, &VerbTable::default(), &mut rng).unwrap();

        // excess = 40 − 10 = 30 → 12 reduced, 18 raised
        assert_eq!(report.edges_removed, 12);
        assert!(report.edges_added > 0);
        let at_six = g.degrees().iter().filter(|&&d| d == 6).count();
        assert!(at_six < 40, "spike unchanged");
        assert_consistent(&g);
    }

    #[test]
    fn no_excess_is_a_no_op() {
        let mut g = build_graph(&[("a", "l", ""), ("b", "l", "")], &[("a", "b")]);
        let before = g.relations().to_vec();
        let mut rng = StdRng::seed_from_u64(1);
        let report =
            flatten_spike(&mut g, &NormalizeConfig::default(), &VerbTable::default(), &mut rng).unwrap();
        assert_eq!(report.edges_added + report.edges_removed, 0);
        assert_eq!(g.relations(), &before[..]);
    }

    #[test]
    fn same_seed_same_result() {
        let run = |seed| {
            let mut g = ring(30);
            let mut rng = StdRng::seed_from_u64(seed);
            flatten_spike(&mut g, &NormalizeConfig::default(), &VerbTable::default(), &mut rng).unwrap();
            g.into_parts().1
        };
        assert_eq!(run(7), run(7));
    }

    #[test]
    fn weak_link_prefers_strong_neighbor() {
        let mut edges = vec![("a", "b"), ("a", "h")];
        let leaves = ["l0", "l1", "l2", "l3", "l4", "l5", "l6", "l7", "l8"];
        for l in &leaves {
            edges.push(("h", l));
        }
        let mut nodes = vec![("a", "x", ""), ("b", "x", ""), ("h", "x", "")];
        nodes.extend(leaves.iter().map(|l| (*l, "x", "")));
        let g = build_graph(&nodes, &edges);
        assert_eq!(weak_link(&g, "a", 10).as_deref(), Some("h"));
        assert_eq!(weak_link(&g, "b", 10).as_deref(), Some("a"));
    }
}
