//! Degree-distribution normalizer.
//!
//! Three single-pass modes push the degree sequence toward a Gaussian-like
//! shape by adding and removing connections:
//!
//! - [`flatten_spike`]: split an over-represented degree value into the
//!   values around it
//! - [`boost_underconnected`]: raise every concept at or below a floor
//!   toward a minimum degree
//! - [`boost_below_sigma`]: raise concepts below `mean − σ` toward the mean
//!
//! Every mode keeps `connections` symmetric, creates one relation record per
//! new connection, never duplicates a pair, and removes relation records in
//! both directions when disconnecting. A concept with no qualifying partner
//! is left short and counted; there is no retry.

mod boost;
mod sigma;
mod spike;

use rand::Rng;
use serde::Serialize;

use rizoma_algo::{normality_score, NormalityScore};
use rizoma_graph::{Concept, Graph};

use crate::config::NormalizeConfig;
use crate::error::CurateError;
use crate::labels::{self, VerbTable};

pub use boost::boost_underconnected;
pub use sigma::boost_below_sigma;
pub use spike::flatten_spike;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NormalizeMode {
    Spike,
    Boost,
    Sigma,
}

impl NormalizeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spike => "spike",
            Self::Boost => "boost",
            Self::Sigma => "sigma",
        }
    }
}

/// Outcome of one normalizer pass.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizeReport {
    pub mode: NormalizeMode,
    pub before: NormalityScore,
    pub after: NormalityScore,
    pub nodes_processed: usize,
    pub edges_added: usize,
    pub edges_removed: usize,
    /// Concepts that ended the pass below their target degree.
    pub left_short: Vec<String>,
}

impl NormalizeReport {
    fn start(mode: NormalizeMode, graph: &Graph) -> Self {
        let before = normality_score(&graph.degrees());
        Self {
            mode,
            before,
            after: before,
            nodes_processed: 0,
            edges_added: 0,
            edges_removed: 0,
            left_short: Vec::new(),
        }
    }

    fn short(&mut self, id: &str, needed: usize, added: usize) {
        tracing::debug!(id, needed, added, "no qualifying candidate, left short");
        self.left_short.push(id.to_string());
    }

    fn finish(mut self, graph: &Graph) -> Self {
        self.after = normality_score(&graph.degrees());
        tracing::info!(
            mode = self.mode.as_str(),
            processed = self.nodes_processed,
            added = self.edges_added,
            removed = self.edges_removed,
            short = self.left_short.len(),
            score_before = self.before.score,
            score_after = self.after.score,
            "normalize pass finished"
        );
        self
    }

    /// True when the pass raised the normality score.
    pub fn improved(&self) -> bool {
        self.after.score > self.before.score
    }
}

/// Run the pass selected by `mode`.
pub fn normalize<R: Rng + ?Sized>(
    graph: &mut Graph,
    mode: NormalizeMode,
    cfg: &NormalizeConfig,
    verbs: &VerbTable,
    rng: &mut R,
) -> Result<NormalizeReport, CurateError> {
    match mode {
        NormalizeMode::Spike => flatten_spike(graph, cfg, verbs, rng),
        NormalizeMode::Boost => boost_underconnected(graph, cfg, verbs, rng),
        NormalizeMode::Sigma => boost_below_sigma(graph, cfg, verbs, rng),
    }
}

/// Connect `a` → `b` with a relation labelled by `verb(a, b)`.
/// `Ok(false)` when either concept is missing or the pair already exists.
fn link(
    graph: &mut Graph,
    a: &str,
    b: &str,
    verb: impl FnOnce(&Concept, &Concept) -> String,
) -> Result<bool, CurateError> {
    let relation = match (graph.concept(a), graph.concept(b)) {
        (Some(ca), Some(cb)) => labels::describe(ca, cb, verb(ca, cb)),
        _ => return Ok(false),
    };
    Ok(graph.connect(a, b, relation)?)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
