//! Layer rebalancer.
//!
//! One run analyzes the layer sizes, plans at most one move per concept out
//! of over-represented layers into under-represented ones, and applies the
//! best-scoring moves until the layers settle or the move budget is spent.
//! Applied moves are appended to the [`MoveHistory`] so a later run does not
//! move a concept straight back.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use rizoma_graph::{layer_dimension, Graph};

use crate::config::RebalanceConfig;
use crate::error::CurateError;
use crate::history::{MoveHistory, MoveRecord};
use crate::keywords::LayerAffinity;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedMove {
    pub id: String,
    pub name: String,
    pub from: String,
    pub to: String,
    /// Affinity of the concept for `to`, including the same-dimension bonus.
    pub score: f64,
}

/// Analysis and candidate moves of one run, before anything is applied.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RebalancePlan {
    /// `total / layers`, integer division.
    pub target: usize,
    pub counts: BTreeMap<String, usize>,
    /// Over-represented layers, largest first.
    pub over: Vec<(String, usize)>,
    /// Under-represented layers, smallest first.
    pub under: Vec<(String, usize)>,
    /// Candidate moves, best score first.
    pub moves: Vec<PlannedMove>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RebalanceReport {
    pub target: usize,
    pub before: BTreeMap<String, usize>,
    pub after: BTreeMap<String, usize>,
    pub over: Vec<(String, usize)>,
    pub under: Vec<(String, usize)>,
    pub planned: usize,
    pub applied: Vec<PlannedMove>,
    /// Largest over smallest layer count.
    pub ratio_before: f64,
    pub ratio_after: f64,
    /// Every layer ended inside the settle band.
    pub settled: bool,
}

fn size_ratio(counts: &BTreeMap<String, usize>) -> f64 {
    let max = counts.values().copied().max().unwrap_or(0);
    let min = counts.values().copied().min().unwrap_or(0);
    if min == 0 {
        return 0.0;
    }
    max as f64 / min as f64
}

fn settled(counts: &BTreeMap<String, usize>, target: usize, band: (f64, f64)) -> bool {
    let t = target as f64;
    counts
        .values()
        .all(|&c| (t * band.0..=t * band.1).contains(&(c as f64)))
}

/// Build the move plan for `graph` without modifying it.
///
/// The source/destination size gates use the counts at planning time.
pub fn plan<A: LayerAffinity + ?Sized>(
    graph: &Graph,
    affinity: &A,
    cfg: &RebalanceConfig,
    history: &MoveHistory,
) -> RebalancePlan {
    let counts = graph.layer_counts();
    if counts.is_empty() {
        return RebalancePlan::default();
    }
    let target = graph.len() / counts.len();
    let t = target as f64;

    let mut over: Vec<(String, usize)> = counts
        .iter()
        .filter(|&(_, &c)| c as f64 > t * cfg.over_factor)
        .map(|(l, &c)| (l.clone(), c))
        .collect();
    over.sort_by(|a, b| b.1.cmp(&a.1));
    let mut under: Vec<(String, usize)> = counts
        .iter()
        .filter(|&(_, &c)| (c as f64) < t * cfg.under_factor)
        .map(|(l, &c)| (l.clone(), c))
        .collect();
    under.sort_by(|a, b| a.1.cmp(&b.1));

    let mut moves = Vec::new();
    for concept in graph.concepts() {
        let from = concept.layer.as_str();
        if !over.iter().any(|(l, _)| l == from) {
            continue;
        }
        let scores = affinity.layer_scores(concept, graph);
        let current = scores.get(from).copied().unwrap_or(0.0);
        let from_dim = layer_dimension(from);

        let mut best: Option<(&str, f64)> = None;
        for (to, _) in &under {
            if history.is_reversal(&concept.id, from, to) {
                tracing::debug!(id = %concept.id, from, to = %to, "reverse of a recent move, skipped");
                continue;
            }
            let mut score = scores.get(to).copied().unwrap_or(0.0);
            if layer_dimension(to) == from_dim {
                score *= cfg.same_dimension_bonus;
            }
            if score >= current * cfg.acceptance_ratio && best.map_or(true, |(_, s)| score > s) {
                best = Some((to.as_str(), score));
            }
        }

        let Some((to, score)) = best else {
            continue;
        };
        let source_ok = (counts[from] - 1) as f64 >= t * cfg.min_source_ratio;
        let dest_ok = (counts[to] + 1) as f64 <= t * cfg.max_dest_ratio;
        if source_ok && dest_ok {
            moves.push(PlannedMove {
                id: concept.id.clone(),
                name: concept.name.clone(),
                from: from.to_string(),
                to: to.to_string(),
                score,
            });
        }
    }
    moves.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    RebalancePlan {
        target,
        counts,
        over,
        under,
        moves,
    }
}

/// Plan, apply and record one rebalancing run.
///
/// At most `cfg.max_moves` moves are applied, stopping early once every
/// layer is inside `target × cfg.settle_band`. Only applied moves enter the
/// history, all stamped with `timestamp`.
pub fn rebalance<A: LayerAffinity + ?Sized>(
    graph: &mut Graph,
    affinity: &A,
    cfg: &RebalanceConfig,
    history: &mut MoveHistory,
    timestamp: u64,
) -> Result<RebalanceReport, CurateError> {
    let plan = plan(graph, affinity, cfg, history);
    let mut counts = plan.counts.clone();
    let mut applied = Vec::new();

    let mut moved = HashSet::new();
    for m in plan.moves.iter().take(cfg.max_moves) {
        // one move per concept per run
        if !moved.insert(m.id.as_str()) {
            continue;
        }
        graph.set_layer(&m.id, &m.to)?;
        if let Some(c) = counts.get_mut(&m.from) {
            *c -= 1;
        }
        *counts.entry(m.to.clone()).or_default() += 1;
        tracing::debug!(id = %m.id, from = %m.from, to = %m.to, score = m.score, "layer move applied");
        applied.push(m.clone());
        // the band is only checked once a move has been applied
        if settled(&counts, plan.target, cfg.settle_band) {
            break;
        }
    }
    let done = settled(&counts, plan.target, cfg.settle_band);

    history.append_run(
        applied.iter().map(|m| MoveRecord::new(m.id.clone(), m.from.clone(), m.to.clone())),
        timestamp,
    );

    let report = RebalanceReport {
        target: plan.target,
        ratio_before: size_ratio(&plan.counts),
        ratio_after: size_ratio(&counts),
        before: plan.counts,
        after: counts,
        over: plan.over,
        under: plan.under,
        planned: plan.moves.len(),
        applied,
        settled: done,
    };
    tracing::info!(
        target = report.target,
        planned = report.planned,
        applied = report.applied.len(),
        ratio_before = report.ratio_before,
        ratio_after = report.ratio_after,
        settled = report.settled,
        "rebalance finished"
    );
    Ok(report)
}
