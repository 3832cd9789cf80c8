//! Human-readable report printers. Reports go to stdout, notes to stderr.

use std::collections::BTreeMap;

use rizoma_algo::{Bridge, ComponentResult, DegreeEntry, DegreeStats, LayerBalance, LayerCluster, NormalityScore};
use rizoma_curate::{DiversifyReport, FixReport, MergeDirective, MergeReport, NormalizeReport, ProposalFilter, RebalanceReport};
use rizoma_graph::ValidationReport;

/// Rows shown for long listings.
const PREVIEW: usize = 10;
const RULE: &str = "════════════════════════════════════════════════════════════";

fn header(title: &str) {
    println!("{RULE}");
    println!("  {title}");
    println!("{RULE}");
}

pub fn note(msg: &str) {
    eprintln!("{msg}");
}

fn score_line(label: &str, s: &NormalityScore) {
    println!(
        "  {label:<8} score {:>5.1}/100  mean {:.2}  σ {:.2}  skew {:+.3}  kurt {:+.3}",
        s.score, s.stats.mean, s.stats.std_dev, s.stats.skewness, s.stats.kurtosis
    );
}

// ── analysis ──

pub fn stats(
    concepts: usize,
    relations: usize,
    degree: &DegreeStats,
    normality: &NormalityScore,
    components: &ComponentResult,
) {
    header("Graph statistics");
    println!("  concepts   {concepts}");
    println!("  relations  {relations}");
    println!();
    println!("  degree     mean {:.2}  median {:.1}  σ {:.2}", degree.mean, degree.median, degree.std_dev);
    println!("             min {}  max {}", degree.min, degree.max);
    println!("             skewness {:+.3}  kurtosis {:+.3}", degree.skewness, degree.kurtosis);
    println!(
        "             within 1σ {:.1}%  within 2σ {:.1}%",
        degree.within_1sigma_pct, degree.within_2sigma_pct
    );
    println!();
    println!("  normality  {:.1}/100", normality.score);
    println!(
        "    penalties: 1σ {:.1}  2σ {:.1}  skew {:.1}  kurtosis {:.1}",
        normality.sigma1_penalty,
        normality.sigma2_penalty,
        normality.skew_penalty,
        normality.kurtosis_penalty
    );
    println!();
    println!(
        "  components {}  (largest {})",
        components.component_count, components.largest_component_size
    );
}

pub fn validation(r: &ValidationReport) {
    header("Validation");
    println!("  concepts {}  relations {}  degree sum {}", r.concepts, r.relations, r.degree_sum);
    for (name, finding) in r.violations() {
        if finding.is_empty() {
            continue;
        }
        println!("  ✗ {name}: {}", finding.count);
        for s in &finding.samples {
            println!("      {s}");
        }
    }
    if r.odd_degree_sum() {
        println!("  ✗ odd degree sum: {}", r.degree_sum);
    }
    if !r.duplicate_names.is_empty() {
        println!("  ! duplicate names: {}", r.duplicate_names.count);
    }
    println!("  ! isolated: {}  low connectivity: {}", r.isolated, r.low_connectivity);
    println!();
    if r.is_valid() {
        println!("  ✓ graph is consistent");
    } else {
        println!("  ✗ graph has integrity violations");
    }
}

pub fn balance(b: &LayerBalance) {
    header("Layer balance");
    println!("  total {}  layers {}  ideal {:.1}", b.total, b.counts.len(), b.ideal);
    println!("  mean {:.1}  median {:.1}  σ {:.1}", b.mean, b.median, b.std_dev);
    println!();
    for (layer, n) in &b.counts {
        let bar = "█".repeat((*n as f64 / b.ideal.max(1.0) * 10.0).round() as usize);
        println!("  {layer:<24} {n:>5}  {bar}");
    }
    println!();
    for (layer, n) in &b.over_represented {
        println!("  over   {layer} ({n})");
    }
    for (layer, n) in &b.under_represented {
        println!("  under  {layer} ({n})");
    }
    println!("  ratio {:.2}  verdict {}", b.ratio, b.verdict.label());
}

pub fn clusters(clusters: &BTreeMap<String, LayerCluster>, bridges: &[Bridge]) {
    header("Layer clusters");
    for (layer, c) in clusters {
        println!(
            "  {layer}: {} members  avg degree {:.2}  avg clustering {:.3}  density {:.3}",
            c.members, c.avg_degree, c.avg_clustering, c.density
        );
        for h in &c.hubs {
            println!(
                "      {:<32} degree {:>3}  cc {:.3}  score {:.2}",
                h.name, h.degree, h.clustering_coefficient, h.cluster_score
            );
        }
    }
    println!();
    println!("  bridges: {}", bridges.len());
    for b in bridges.iter().take(PREVIEW) {
        println!(
            "      {:<32} {:<20} ratio {:.2}  ({} connections)",
            b.name, b.layer, b.bridge_ratio, b.total_connections
        );
    }
}

pub fn distribution(dist: &BTreeMap<usize, usize>) {
    header("Degree distribution");
    let peak = dist.values().copied().max().unwrap_or(1).max(1);
    for (degree, n) in dist {
        let bar = "█".repeat(n * 40 / peak);
        println!("  {degree:>4} │ {n:>5} {bar}");
    }
}

pub fn entries(title: &str, rows: &[DegreeEntry]) {
    header(title);
    if rows.is_empty() {
        println!("  (none)");
    }
    for e in rows {
        println!("  {:>4}  {:<32} {:<24} {}", e.degree, e.name, e.layer, e.id);
    }
}

// ── curation ──

pub fn normalize(r: &NormalizeReport) {
    header(&format!("Normalize ({})", r.mode.as_str()));
    score_line("before", &r.before);
    score_line("after", &r.after);
    println!();
    println!("  processed {}  added {}  removed {}", r.nodes_processed, r.edges_added, r.edges_removed);
    if !r.left_short.is_empty() {
        println!("  left short: {}", r.left_short.len());
        for id in r.left_short.iter().take(PREVIEW) {
            println!("      {id}");
        }
    }
}

pub fn rebalance(r: &RebalanceReport) {
    header("Rebalance");
    println!("  target per layer {}", r.target);
    for (layer, before) in &r.before {
        let after = r.after.get(layer).copied().unwrap_or(0);
        println!("  {layer:<24} {before:>5} → {after:<5}");
    }
    println!();
    println!("  planned {}  applied {}", r.planned, r.applied.len());
    for m in r.applied.iter().take(PREVIEW) {
        println!("      {:<32} {} → {}  ({:.1})", m.name, m.from, m.to, m.score);
    }
    println!("  ratio {:.2} → {:.2}  settled {}", r.ratio_before, r.ratio_after, r.settled);
}

pub fn diversify(r: &DiversifyReport) {
    header("Diversify");
    for (rule, n) in &r.changes {
        println!("  {rule:<24} {n}");
    }
    println!("  total changes {}", r.total_changes());
    println!();
    println!("  top labels:");
    for (label, n) in &r.top_labels {
        println!("      {n:>5}  {label}");
    }
}

pub fn merges(rows: &[(MergeDirective, MergeReport)]) {
    header("Merge");
    for (d, r) in rows {
        if !r.merged {
            println!("  - {} → {}: nothing to merge", d.remove_id, d.keep_id);
            continue;
        }
        println!(
            "  ✓ {} → {}: {} redirected, {} self-loops and {} duplicates dropped",
            d.remove_id, d.keep_id, r.relations_redirected, r.self_loops_dropped, r.duplicates_dropped
        );
    }
}

pub fn fix(r: &FixReport) {
    header("Repair");
    println!("  concepts {}", r.concepts);
    println!("  relations  {} → {}", r.relations_before, r.relations_after);
    println!("  degree sum {} → {}", r.degree_sum_before, r.degree_sum_after);
    println!();
    for id in &r.renamed_ids {
        println!("  renamed duplicate {} ({}) → {}", id.id, id.layer, id.renamed);
    }
    let rows = [
        ("ids remapped", r.ids_remapped),
        ("orphan relations", r.orphan_relations),
        ("self-loops", r.self_loops),
        ("duplicate relations", r.duplicate_relations),
        ("dangling connections", r.dangling_connections),
        ("duplicate connections", r.duplicate_connections),
        ("mirrored connections", r.mirrored_connections),
    ];
    for (name, n) in rows {
        println!("  {name:<24} {n}");
    }
    if !r.changed() {
        println!("  ✓ nothing to fix");
    }
}

pub fn proposals(f: &ProposalFilter) {
    header("Proposals");
    println!(
        "  valid {}  unknown ids {}  self-loops {}  duplicates {}",
        f.accepted.len(),
        f.unknown_ids,
        f.self_loops,
        f.duplicates
    );
    for p in f.accepted.iter().take(PREVIEW) {
        println!("      {} --[{}]--> {}", p.from, p.name, p.to);
    }
    if f.accepted.len() > PREVIEW {
        println!("      ... and {} more", f.accepted.len() - PREVIEW);
    }
}
