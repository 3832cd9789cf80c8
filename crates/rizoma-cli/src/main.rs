//! # rizoma
//!
//! Command-line curation passes over the rizoma concept graph.
//!
//! Every command loads `concepts.json` and `relations.json`, runs one pass,
//! prints a report on stdout and, for mutating commands, commits the files
//! back unless `--dry-run` is given. Logs go to stderr.
//!
//! ## Usage
//!
//! ```text
//! rizoma stats
//! rizoma validate
//! rizoma normalize --mode spike --seed 42 --require-improvement
//! rizoma rebalance --dry-run
//! rizoma merge --keep realismo-agencial --remove realismo_agencial
//! rizoma apply-proposals --yes
//! ```
//!
//! | Variable            | Default  | Description                         |
//! |---------------------|----------|-------------------------------------|
//! | `RIZOMA_ASSETS_DIR` | `assets` | Directory holding the graph files   |
//! | `RIZOMA_SEED`       | entropy  | RNG seed for randomized passes      |
//! | `RIZOMA_LOG`        | `warn`   | `tracing` filter directives         |

mod commands;
mod report;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use rizoma_curate::NormalizeMode;

#[derive(Parser)]
#[command(name = "rizoma")]
#[command(version, about = "Curation toolkit for the rizoma concept graph", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding concepts.json, relations.json and the side files
    #[arg(long, global = true, env = "RIZOMA_ASSETS_DIR", default_value = "assets")]
    assets: PathBuf,

    /// Nodes file (defaults to <assets>/concepts.json)
    #[arg(long, global = true)]
    nodes: Option<PathBuf>,

    /// Edges file (defaults to <assets>/relations.json)
    #[arg(long, global = true)]
    edges: Option<PathBuf>,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,
}

/// Options shared by every command that writes the graph.
#[derive(Args, Clone, Copy, Debug)]
pub struct MutateArgs {
    /// Run the pass and print the report without writing any file
    #[arg(long)]
    dry_run: bool,

    /// Seed for the random number generator
    #[arg(long, env = "RIZOMA_SEED")]
    seed: Option<u64>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ModeArg {
    /// Flatten the over-represented degree value
    Spike,
    /// Raise concepts at or below the degree floor
    Boost,
    /// Raise concepts below mean − σ toward the mean
    Sigma,
}

impl From<ModeArg> for NormalizeMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Spike => NormalizeMode::Spike,
            ModeArg::Boost => NormalizeMode::Boost,
            ModeArg::Sigma => NormalizeMode::Sigma,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Degree statistics, normality score and connected components
    Stats,

    /// Integrity check; exits 1 on any violation
    Validate,

    /// Layer-size balance; exits 1 when critical
    Balance,

    /// Per-layer hub clusters and cross-layer bridges
    Clusters {
        /// Minimum hubs reported per layer
        #[arg(long, default_value_t = 5)]
        min_hubs: usize,
        /// Metadata output (defaults to <assets>/cluster_metadata.json)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Print only, do not write the metadata file
        #[arg(long)]
        dry_run: bool,
    },

    /// Degree histogram
    Distribution,

    /// Highest-degree concepts
    Hubs {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Concepts at or below a degree threshold (0 = isolated only)
    Underconnected {
        #[arg(long, default_value_t = 3)]
        threshold: usize,
    },

    /// Push the degree distribution toward a Gaussian shape
    Normalize {
        #[arg(long, value_enum)]
        mode: ModeArg,
        /// Commit only if the normality score went up
        #[arg(long)]
        require_improvement: bool,
        #[command(flatten)]
        mutate: MutateArgs,
    },

    /// Move concepts out of over-represented layers
    Rebalance {
        /// Move history file (defaults to <assets>/rebalance_history.json)
        #[arg(long)]
        history: Option<PathBuf>,
        /// Override the per-run move budget
        #[arg(long)]
        max_moves: Option<usize>,
        #[command(flatten)]
        mutate: MutateArgs,
    },

    /// Replace generic relation labels with contextual ones
    Diversify {
        #[command(flatten)]
        mutate: MutateArgs,
    },

    /// Fold one concept into another
    Merge {
        /// Concept that survives
        #[arg(long, requires = "remove", conflicts_with = "directives")]
        keep: Option<String>,
        /// Concept folded into `--keep`
        #[arg(long, requires = "keep")]
        remove: Option<String>,
        /// JSON array of {keep_id, remove_id} directives
        #[arg(long)]
        directives: Option<PathBuf>,
        #[command(flatten)]
        mutate: MutateArgs,
    },

    /// Remap legacy IDs and drop orphan, self-loop and duplicate records
    Repair {
        /// JSON object mapping legacy IDs to current IDs
        #[arg(long)]
        remap: Option<PathBuf>,
        #[command(flatten)]
        mutate: MutateArgs,
    },

    /// Rebuild every connections list from the relation records
    Sync {
        #[command(flatten)]
        mutate: MutateArgs,
    },

    /// Apply proposed relations after filtering unknown and duplicate pairs
    ApplyProposals {
        /// Proposals file (defaults to <assets>/new_relations_proposals.json)
        #[arg(long)]
        proposals: Option<PathBuf>,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
        #[command(flatten)]
        mutate: MutateArgs,
    },
}

// ─────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────

fn init_tracing() {
    let filter = EnvFilter::try_from_env("RIZOMA_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() -> anyhow::Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();
    commands::run(cli)
}
