//! `rizoma-curate` — curation passes over the rizoma concept graph.
//!
//! Every pass takes a loaded [`rizoma_graph::Graph`], mutates it in memory and
//! returns a report. Persisting the result is the caller's decision, so a
//! dry run is simply a pass whose graph is never committed.
//!
//! - **Normalizer**: spike flattening, under-connected boosting, sigma boosting
//! - **Rebalancer**: layer moves guided by a pluggable [`LayerAffinity`],
//!   guarded by a bounded [`MoveHistory`]
//! - **Diversifier**: rule-driven relabeling of generic relation labels
//! - **Dedup**: concept merges, duplicate-ID renaming, consistency repair,
//!   adjacency rebuild
//! - **Proposals**: filtering and applying externally proposed relations
//!
//! ## Architecture
//!
//! ```text
//!   GraphStore::load ──► Graph ──► pass(graph, config, rng) ──► Report
//!                          │                                     │
//!                          └──── GraphStore::commit ◄── caller ──┘
//! ```

pub mod config;
pub mod dedup;
pub mod diversify;
pub mod error;
pub mod history;
pub mod keywords;
pub mod labels;
pub mod normalize;
pub mod proposals;
pub mod rebalance;

pub use config::{CurateConfig, HistoryConfig, NormalizeConfig, RebalanceConfig};
pub use dedup::{
    merge, rename_duplicate_ids, repair, sync_connections, FixReport, IdRemap, MergeDirective,
    MergeReport, RenameReport, RenamedId,
};
pub use diversify::{default_rules, diversify, DiversifyReport, DiversifyRule};
pub use error::CurateError;
pub use history::{MoveHistory, MoveRecord, HISTORY_FILE};
pub use keywords::{KeywordAffinity, KeywordTable, LayerAffinity};
pub use labels::VerbTable;
pub use normalize::{normalize, NormalizeMode, NormalizeReport};
pub use proposals::{apply_proposals, filter_proposals, ProposalFilter, PROPOSALS_FILE};
pub use rebalance::{plan, rebalance, PlannedMove, RebalancePlan, RebalanceReport};
