use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CurateError {
    #[error("graph error: {0}")]
    Graph(#[from] rizoma_graph::GraphError),

    #[error("move history {}: {source}", path.display())]
    History {
        path: PathBuf,
        #[source]
        source: rizoma_graph::GraphError,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}
