//! Externally proposed relations.

use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;

use rizoma_graph::store::read_json;
use rizoma_graph::{Graph, PairKey, Relation};

use crate::error::CurateError;

pub const PROPOSALS_FILE: &str = "new_relations_proposals.json";

/// Proposals split by verdict.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProposalFilter {
    pub accepted: Vec<Relation>,
    pub unknown_ids: usize,
    pub self_loops: usize,
    /// Pair already connected in the graph or earlier in the batch.
    pub duplicates: usize,
}

pub fn load_proposals(path: &Path) -> Result<Vec<Relation>, CurateError> {
    Ok(read_json(path)?)
}

/// Keep proposals whose endpoints exist, differ and are not yet connected.
/// Pairs are compared undirected, against both relation records and
/// adjacency lists.
pub fn filter_proposals(graph: &Graph, proposals: Vec<Relation>) -> ProposalFilter {
    let mut taken: HashSet<PairKey> = graph.relations().iter().map(PairKey::of).collect();
    for c in graph.concepts() {
        taken.extend(c.connections.iter().map(|n| PairKey::new(&c.id, n)));
    }

    let mut out = ProposalFilter::default();
    for p in proposals {
        if !graph.contains(&p.from) || !graph.contains(&p.to) {
            tracing::debug!(from = %p.from, to = %p.to, "proposal with unknown concept");
            out.unknown_ids += 1;
        } else if p.is_self_loop() {
            out.self_loops += 1;
        } else if !taken.insert(PairKey::of(&p)) {
            out.duplicates += 1;
        } else {
            out.accepted.push(p);
        }
    }
    tracing::info!(
        accepted = out.accepted.len(),
        unknown_ids = out.unknown_ids,
        self_loops = out.self_loops,
        duplicates = out.duplicates,
        "proposals filtered"
    );
    out
}

/// Connect every accepted proposal. Returns the number applied.
pub fn apply_proposals(graph: &mut Graph, accepted: Vec<Relation>) -> Result<usize, CurateError> {
    let mut applied = 0;
    for p in accepted {
        let (from, to) = (p.from.clone(), p.to.clone());
        if graph.connect(&from, &to, p)? {
            applied += 1;
        }
    }
    tracing::info!(applied, "proposals applied");
    Ok(applied)
}
