use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use rand::Rng;

use rizoma_graph::{AdjacencyIndex, Graph};

use super::{link, NormalizeMode, NormalizeReport};
use crate::config::NormalizeConfig;
use crate::error::CurateError;
use crate::labels::VerbTable;

fn word_set(text: &str) -> HashSet<String> {
    text.to_lowercase().split_whitespace().map(str::to_string).collect()
}

/// Partners for `id` scoring above `cfg.boost_min_score`, best first, at
/// most `limit`. Equal scores keep concept order.
fn candidates(
    graph: &Graph,
    adj: &AdjacencyIndex,
    words: &HashMap<String, HashSet<String>>,
    id: &str,
    cfg: &NormalizeConfig,
    limit: usize,
) -> Vec<String> {
    let Some(concept) = graph.concept(id) else {
        return Vec::new();
    };
    let friends_of_friends = adj.second_neighbors(id);
    let empty = HashSet::new();
    let own_words = words.get(id).unwrap_or(&empty);

    let mut scored: Vec<(f64, &str)> = graph
        .concepts()
        .iter()
        .filter(|o| o.id != concept.id && !adj.contains_edge(id, &o.id))
        .filter_map(|o| {
            let mut score = 0.0;
            if friends_of_friends.contains(o.id.as_str()) {
                score += cfg.friend_of_friend_weight;
            }
            if o.layer == concept.layer {
                score += cfg.boost_same_layer_bonus;
            }
            let shared = words
                .get(&o.id)
                .map(|w| w.intersection(own_words).count())
                .unwrap_or(0);
            score += shared as f64 * cfg.shared_word_weight;
            score += (adj.degree(&o.id) as f64 / cfg.popularity_divisor).min(cfg.popularity_cap);
            (score > cfg.boost_min_score).then_some((score, o.id.as_str()))
        })
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    scored.truncate(limit);
    scored.into_iter().map(|(_, id)| id.to_string()).collect()
}

/// Raise every concept with degree ≤ `cfg.boost_floor` toward
/// `cfg.boost_min_degree`.
///
/// Candidates are ranked by friend-of-friend, same layer, shared
/// description words and their own popularity; the top `2 × needed` are
/// tried in order.
pub fn boost_underconnected<R: Rng + ?Sized>(
    graph: &mut Graph,
    cfg: &NormalizeConfig,
    verbs: &VerbTable,
    rng: &mut R,
) -> Result<NormalizeReport, CurateError> {
    let mut report = NormalizeReport::start(NormalizeMode::Boost, graph);

    let low: Vec<String> = graph
        .concepts()
        .iter()
        .filter(|c| c.degree() <= cfg.boost_floor)
        .map(|c| c.id.clone())
        .collect();
    tracing::info!(floor = cfg.boost_floor, count = low.len(), "under-connected concepts");

    let words: HashMap<String, HashSet<String>> = graph
        .concepts()
        .iter()
        .map(|c| (c.id.clone(), word_set(&c.description)))
        .collect();
    let mut adj = graph.adjacency();

    for id in &low {
        let current = graph.degree(id);
        if current >= cfg.boost_min_degree {
            continue;
        }
        let needed = cfg.boost_min_degree - current;
        let mut added = 0;
        for partner in candidates(graph, &adj, &words, id, cfg, needed * 2) {
            if added >= needed {
                break;
            }
            if link(graph, id, &partner, |a, b| verbs.pair_verb(rng, a, b))? {
                adj.add_edge(id, &partner);
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
    fn shared_words_and_layer_qualify() {
        let g = build_graph(
            &[
                ("a", "etica", "cuidado da terra"),
                ("b", "etica", "cuidado da vida"),
                ("c", "politica", "estado"),
            ],
            &[],
        );
        let adj = g.adjacency();
        let words = g
            .concepts()
            .iter()
            .map(|c| (c.id.clone(), word_set(&c.description)))
            .collect();
        let found = candidates(&g, &adj, &words, "a", &NormalizeConfig::default(), 10);
        // b: layer 3 + 2 shared words × 0.5 = 4; c: 0 → filtered out
        assert_eq!(found, vec!["b"]);
    }

    #[test]
    fn isolated_without_partners_is_left_short() {
        let mut g = build_graph(
            &[("a", "etica", "um"), ("b", "politica", "dois")],
            &[],
        );
        let mut rng = StdRng::seed_from_u64(1);
        let report =
            boost_underconnected(&mut g, &NormalizeConfig::default(), &VerbTable::default(), &mut rng).unwrap();
        assert_eq!(report.edges_added, 0);
        assert_eq!(report.left_short, vec!["a", "b"]);
        assert!(g.relations().is_empty());
    }

    #[test]
    fn raises_low_nodes_and_keeps_symmetry() {
        let mut nodes = vec![];
        let ids: Vec<String> = (0..12).map(|i| format!("n{i}")).collect();
        for id in &ids {
            nodes.push((id.as_str(), "etica", "rede de cuidado"));
        }
        let edges = vec![(ids[0].as_str(), ids[1].as_str()), (ids[1].as_str(), ids[2].as_str())];
        let mut g = build_graph(&nodes, &edges);
        let mut rng = StdRng::seed_from_u64(5);
        let report =
            boost_underconnected(&mut g, &NormalizeConfig::default(), &VerbTable::default(), &mut rng).unwrap();
        assert!(report.edges_added > 0);
        assert!(g.degrees().iter().all(|&d| d >= 6), "{:?}", g.degrees());
        assert!(report.left_short.is_empty());
        assert_consistent(&g);
    }
}
