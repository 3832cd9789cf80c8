//! # rizoma-graph
//!
//! Data model and persistence for the rizoma concept graph.
//!
//! - [`model::Concept`] / [`model::Relation`] — the two on-disk record types
//! - [`graph::Graph`]                        — in-memory graph keeping adjacency and relations in step
//! - [`adjacency::AdjacencyIndex`]           — undirected neighbor-set snapshot, [`adjacency::PairKey`]
//! - [`store::GraphStore`]                   — JSON load / atomic commit
//! - [`validation::validate`]                — read-only integrity report

pub mod adjacency;
pub mod error;
pub mod graph;
pub mod model;
pub mod store;
pub mod validation;

pub use adjacency::{AdjacencyIndex, PairKey};
pub use error::GraphError;
pub use graph::Graph;
pub use model::{layer_dimension, Concept, Relation};
pub use store::GraphStore;
pub use validation::{validate, ValidationReport};
