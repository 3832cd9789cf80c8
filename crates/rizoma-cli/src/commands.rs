//! Command implementations.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context as _};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use rizoma_algo::{
    bridges, connected_components, degree_distribution, layer_clusters, normality_score,
    top_hubs, underconnected, BalanceVerdict, Bridge, DegreeStats, LayerBalance, LayerCluster,
};
use rizoma_curate::dedup::load_directives;
use rizoma_curate::proposals::load_proposals;
use rizoma_curate::{
    apply_proposals, default_rules, diversify, filter_proposals, merge, normalize, rebalance, repair,
    sync_connections, CurateConfig, IdRemap, KeywordAffinity, MergeDirective, MoveHistory,
    VerbTable, HISTORY_FILE, PROPOSALS_FILE,
};
use rizoma_graph::store::write_json;
use rizoma_graph::{validate, Graph, GraphStore};

use crate::report;
use crate::{Cli, Commands, MutateArgs};

pub const CLUSTER_METADATA_FILE: &str = "cluster_metadata.json";
/// Bridges kept in the cluster metadata file.
const METADATA_BRIDGES: usize = 50;

/// Resolved paths and configuration for one invocation.
struct Context {
    assets: PathBuf,
    store: GraphStore,
    config: CurateConfig,
    json: bool,
}

impl Context {
    fn new(cli: &Cli) -> anyhow::Result<Self> {
        let nodes = cli
            .nodes
            .clone()
            .unwrap_or_else(|| cli.assets.join(rizoma_graph::store::NODES_FILE));
        let edges = cli
            .edges
            .clone()
            .unwrap_or_else(|| cli.assets.join(rizoma_graph::store::EDGES_FILE));
        let config = CurateConfig::from_env();
        config.validate()?;
        Ok(Self {
            assets: cli.assets.clone(),
            store: GraphStore::new(nodes, edges),
            config,
            json: cli.json,
        })
    }

    fn asset(&self, explicit: Option<PathBuf>, file: &str) -> PathBuf {
        explicit.unwrap_or_else(|| self.assets.join(file))
    }

    fn load(&self) -> anyhow::Result<Graph> {
        self.store.load().with_context(|| {
            format!(
                "loading {} and {}",
                self.store.nodes_path().display(),
                self.store.edges_path().display()
            )
        })
    }

    /// Commit `graph` unless this is a dry run.
    fn persist(&self, graph: &Graph, mutate: MutateArgs) -> anyhow::Result<()> {
        if mutate.dry_run {
            report::note("dry run: no files written");
            return Ok(());
        }
        self.store.commit(graph).context("committing graph")?;
        report::note(&format!(
            "written: {} ({} concepts), {} ({} relations)",
            self.store.nodes_path().display(),
            graph.len(),
            self.store.edges_path().display(),
            graph.relations().len()
        ));
        Ok(())
    }

    /// Print `value` as JSON, or run `text` for the human-readable report.
    fn emit<T: Serialize + ?Sized>(&self, value: &T, text: impl FnOnce(&T)) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            text(value);
        }
        Ok(())
    }
}

fn rng(mutate: MutateArgs) -> StdRng {
    match mutate.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

pub fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let ctx = Context::new(&cli)?;
    match cli.command {
        Commands::Stats => cmd_stats(&ctx),
        Commands::Validate => cmd_validate(&ctx),
        Commands::Balance => cmd_balance(&ctx),
        Commands::Clusters {
            min_hubs,
            output,
            dry_run,
        } => cmd_clusters(&ctx, min_hubs, output, dry_run),
        Commands::Distribution => {
            let g = ctx.load()?;
            ctx.emit(&degree_distribution(&g), report::distribution)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Hubs { limit } => {
            let g = ctx.load()?;
            ctx.emit(&top_hubs(&g, limit), |e| report::entries("Top hubs", e))?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Underconnected { threshold } => {
            let g = ctx.load()?;
            let title = format!("Concepts with degree ≤ {threshold}");
            ctx.emit(&underconnected(&g, threshold), |e| report::entries(&title, e))?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Normalize {
            mode,
            require_improvement,
            mutate,
        } => cmd_normalize(&ctx, mode.into(), require_improvement, mutate),
        Commands::Rebalance {
            history,
            max_moves,
            mutate,
        } => cmd_rebalance(&ctx, history, max_moves, mutate),
        Commands::Diversify { mutate } => {
            let mut g = ctx.load()?;
            let out = diversify(&mut g, &default_rules());
            ctx.emit(&out, report::diversify)?;
            ctx.persist(&g, mutate)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Merge {
            keep,
            remove,
            directives,
            mutate,
        } => cmd_merge(&ctx, keep, remove, directives, mutate),
        Commands::Repair { remap, mutate } => {
            let remap = match remap {
                Some(path) => IdRemap::load(&path)
                    .with_context(|| format!("loading ID remap {}", path.display()))?,
                None => IdRemap::default(),
            };
            let mut g = ctx.load()?;
            let out = repair(&mut g, &remap);
            ctx.emit(&out, report::fix)?;
            ctx.persist(&g, mutate)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Sync { mutate } => {
            let mut g = ctx.load()?;
            let changed = sync_connections(&mut g);
            ctx.emit(&changed, |n| println!("Connections rebuilt: {n} concepts changed"))?;
            ctx.persist(&g, mutate)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::ApplyProposals {
            proposals,
            yes,
            mutate,
        } => cmd_apply_proposals(&ctx, proposals, yes, mutate),
    }
}

// ─────────────────────────────────────────────
// Analysis commands
// ─────────────────────────────────────────────

#[derive(Serialize)]
struct StatsOutput {
    concepts: usize,
    relations: usize,
    degree: DegreeStats,
    normality: rizoma_algo::NormalityScore,
    components: rizoma_algo::ComponentResult,
}

fn cmd_stats(ctx: &Context) -> anyhow::Result<ExitCode> {
    let g = ctx.load()?;
    let out = StatsOutput {
        concepts: g.len(),
        relations: g.relations().len(),
        degree: DegreeStats::from_graph(&g),
        normality: normality_score(&g.degrees()),
        components: connected_components(&g),
    };
    ctx.emit(&out, |o| {
        report::stats(o.concepts, o.relations, &o.degree, &o.normality, &o.components)
    })?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_validate(ctx: &Context) -> anyhow::Result<ExitCode> {
    let g = ctx.load()?;
    let out = validate(&g);
    ctx.emit(&out, report::validation)?;
    Ok(if out.is_valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn cmd_balance(ctx: &Context) -> anyhow::Result<ExitCode> {
    let g = ctx.load()?;
    let out = LayerBalance::from_graph(&g);
    ctx.emit(&out, report::balance)?;
    Ok(if out.verdict == BalanceVerdict::Critical {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

#[derive(Serialize)]
struct GlobalStats {
    total_concepts: usize,
    total_relations: usize,
    avg_degree: f64,
    layers: Vec<String>,
}

#[derive(Serialize)]
struct ClusterMetadata<'a> {
    layer_clusters: &'a std::collections::BTreeMap<String, LayerCluster>,
    bridges: &'a [Bridge],
    global_stats: GlobalStats,
}

fn cmd_clusters(
    ctx: &Context,
    min_hubs: usize,
    output: Option<PathBuf>,
    dry_run: bool,
) -> anyhow::Result<ExitCode> {
    let g = ctx.load()?;
    let clusters = layer_clusters(&g, min_hubs);
    let mut found = bridges(&g);
    found.truncate(METADATA_BRIDGES);

    let metadata = ClusterMetadata {
        layer_clusters: &clusters,
        bridges: &found,
        global_stats: GlobalStats {
            total_concepts: g.len(),
            total_relations: g.relations().len(),
            avg_degree: DegreeStats::from_graph(&g).mean,
            layers: clusters.keys().cloned().collect(),
        },
    };
    ctx.emit(&metadata, |m| report::clusters(m.layer_clusters, m.bridges))?;

    if !dry_run {
        let path = ctx.asset(output, CLUSTER_METADATA_FILE);
        write_json(&path, &metadata).with_context(|| format!("writing {}", path.display()))?;
        report::note(&format!("written: {}", path.display()));
    }
    Ok(ExitCode::SUCCESS)
}

// ─────────────────────────────────────────────
// Curation commands
// ─────────────────────────────────────────────

fn cmd_normalize(
    ctx: &Context,
    mode: rizoma_curate::NormalizeMode,
    require_improvement: bool,
    mutate: MutateArgs,
) -> anyhow::Result<ExitCode> {
    let mut g = ctx.load()?;
    let mut rng = rng(mutate);
    let out = normalize(&mut g, mode, &ctx.config.normalize, &VerbTable::default(), &mut rng)?;
    ctx.emit(&out, report::normalize)?;

    if require_improvement && !out.improved() {
        report::note(&format!(
            "normality score did not improve ({:.1} → {:.1}); nothing written",
            out.before.score, out.after.score
        ));
        return Ok(ExitCode::SUCCESS);
    }
    ctx.persist(&g, mutate)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_rebalance(
    ctx: &Context,
    history: Option<PathBuf>,
    max_moves: Option<usize>,
    mutate: MutateArgs,
) -> anyhow::Result<ExitCode> {
    let mut cfg = ctx.config.rebalance.clone();
    if let Some(n) = max_moves {
        cfg.max_moves = n;
    }
    let history_path = ctx.asset(history, HISTORY_FILE);
    let mut moves = MoveHistory::load(&history_path, ctx.config.history)?;

    let mut g = ctx.load()?;
    let out = rebalance(&mut g, &KeywordAffinity::default(), &cfg, &mut moves, unix_now())?;
    ctx.emit(&out, report::rebalance)?;

    if out.applied.is_empty() {
        report::note("no moves applied");
        return Ok(ExitCode::SUCCESS);
    }
    ctx.persist(&g, mutate)?;
    if !mutate.dry_run {
        moves.save(&history_path)?;
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_merge(
    ctx: &Context,
    keep: Option<String>,
    remove: Option<String>,
    directives: Option<PathBuf>,
    mutate: MutateArgs,
) -> anyhow::Result<ExitCode> {
    let directives = match (keep, remove, directives) {
        (Some(keep), Some(remove), None) => vec![MergeDirective::new(keep, remove)],
        (None, None, Some(path)) => load_directives(&path)
            .with_context(|| format!("loading merge directives {}", path.display()))?,
        _ => bail!("give either --keep and --remove, or --directives"),
    };

    let mut g = ctx.load()?;
    let reports: Vec<_> = directives
        .iter()
        .map(|d| (d.clone(), merge(&mut g, d)))
        .collect();
    ctx.emit(&reports, |r| report::merges(r))?;
    ctx.persist(&g, mutate)?;
    Ok(ExitCode::SUCCESS)
}

/// Read one line from stdin; only `y` / `yes` confirm.
fn confirm(prompt: &str) -> anyhow::Result<bool> {
    eprint!("{prompt} [y/N]: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn cmd_apply_proposals(
    ctx: &Context,
    proposals: Option<PathBuf>,
    yes: bool,
    mutate: MutateArgs,
) -> anyhow::Result<ExitCode> {
    let path = ctx.asset(proposals, PROPOSALS_FILE);
    let incoming = load_proposals(&path).with_context(|| format!("loading proposals {}", path.display()))?;

    let mut g = ctx.load()?;
    let filtered = filter_proposals(&g, incoming);
    ctx.emit(&filtered, report::proposals)?;

    if filtered.accepted.is_empty() {
        report::note("no valid proposals to apply");
        return Ok(ExitCode::SUCCESS);
    }
    if mutate.dry_run {
        report::note("dry run: no files written");
        return Ok(ExitCode::SUCCESS);
    }
    if !yes && !confirm(&format!("Apply {} new relations?", filtered.accepted.len()))? {
        report::note("cancelled");
        return Ok(ExitCode::SUCCESS);
    }

    let backup = backup_edges(&ctx.store)?;
    report::note(&format!("backup: {}", backup.display()));
    let applied = apply_proposals(&mut g, filtered.accepted)?;
    report::note(&format!("applied {applied} relations"));
    ctx.persist(&g, mutate)?;
    Ok(ExitCode::SUCCESS)
}

fn backup_edges(store: &GraphStore) -> anyhow::Result<PathBuf> {
    let edges: &Path = store.edges_path();
    store
        .backup_edges(unix_now())
        .with_context(|| format!("backing up {}", edges.display()))
}
