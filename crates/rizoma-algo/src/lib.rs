//! Connectivity analysis for the rizoma concept graph.
//!
//! Everything here is a read-only computation over a [`rizoma_graph::Graph`]
//! snapshot:
//!
//! - **Moments**: degree mean, population σ, skewness, excess kurtosis, normality score
//! - **Clustering**: local clustering coefficient, cluster score, per-layer hubs
//! - **Bridges**: cross-layer bridge ratio
//! - **Components**: connected components (Union-Find)
//! - **Balance**: layer-size balance verdict
//! - **Queries**: degree histogram, under-connected nodes, top hubs

pub mod balance;
pub mod bridges;
pub mod clustering;
pub mod components;
pub mod queries;
pub mod stats;

#[cfg(test)]
mod testutil;

pub use balance::{BalanceVerdict, LayerBalance};
pub use bridges::{bridge_ratio, bridges, Bridge, BRIDGE_THRESHOLD};
pub use clustering::{cluster_score, clustering_coefficient, layer_clusters, ClusterMember, LayerCluster};
pub use components::{connected_components, ComponentResult};
pub use queries::{degree_distribution, top_hubs, underconnected, DegreeEntry};
pub use stats::{degree_sequence, normality_score, DegreeStats, NormalityScore};
