// ────────────────────────────────────────────────────────────────
//  rizoma-curate  — integration tests
//
//  Strategy:
//    • Every test writes a small graph into a temp dir, runs a pass
//      through the public API, commits through GraphStore and reloads,
//      so the on-disk shape is what gets asserted.
//    • Seeded StdRng everywhere; no test depends on entropy.
// ────────────────────────────────────────────────────────────────

use rand::rngs::StdRng;
use rand::SeedableRng;

use rizoma_algo::{clustering_coefficient, underconnected};
use rizoma_curate::{
    apply_proposals, filter_proposals, merge, normalize, rebalance, repair, HistoryConfig, IdRemap,
    KeywordAffinity, MergeDirective, MoveHistory, NormalizeConfig, NormalizeMode, RebalanceConfig,
    VerbTable, HISTORY_FILE,
};
use rizoma_graph::store::write_json;
use rizoma_graph::{validate, Concept, Graph, GraphStore, Relation};

fn concept(id: &str, layer: &str, connections: &[&str]) -> Concept {
    let mut c = Concept::new(id, id.to_uppercase(), layer, format!("conceito {id}"));
    c.connections = connections.iter().map(|s| s.to_string()).collect();
    c
}

fn seed_store(dir: &std::path::Path, concepts: &[Concept], relations: &[Relation]) -> GraphStore {
    let store = GraphStore::in_dir(dir);
    write_json(store.nodes_path(), concepts).unwrap();
    write_json(store.edges_path(), relations).unwrap();
    store
}

// ═══════════════════════════════════════════════════════════════
// 1. Normalizer
// ═══════════════════════════════════════════════════════════════

#[test]
fn boost_closes_open_triangle_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = seed_store(
        dir.path(),
        &[
            concept("a", "etica", &["b"]),
            concept("b", "etica", &["a", "c"]),
            concept("c", "etica", &["b"]),
        ],
        &[Relation::new("a", "b", "cuida de", ""), Relation::new("b", "c", "cuida de", "")],
    );

    let mut g = store.load().unwrap();
    assert_eq!(clustering_coefficient(&g.adjacency(), "b"), 0.0);

    let cfg = NormalizeConfig {
        boost_floor: 1,
        boost_min_degree: 2,
        ..Default::default()
    };
    let mut rng = StdRng::seed_from_u64(11);
    let report = normalize(&mut g, NormalizeMode::Boost, &cfg, &VerbTable::default(), &mut rng).unwrap();
    assert_eq!(report.edges_added, 1);
    store.commit(&g).unwrap();

    let reloaded = store.load().unwrap();
    assert!(reloaded.is_connected("a", "c"));
    assert!(reloaded.is_connected("c", "a"));
    assert_eq!(clustering_coefficient(&reloaded.adjacency(), "b"), 1.0);
    assert!(validate(&reloaded).is_valid());
}

#[test]
fn every_mode_keeps_the_graph_consistent() {
    let ids: Vec<String> = (0..30).map(|i| format!("c{i:02}")).collect();
    let layers = ["etica", "politica", "temporal"];
    let concepts: Vec<Concept> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| Concept::new(id.clone(), id.clone(), layers[i % 3], "rede de cuidado"))
        .collect();

    for mode in [NormalizeMode::Spike, NormalizeMode::Boost, NormalizeMode::Sigma] {
        let mut g = Graph::new(concepts.clone(), vec![]);
        for i in 0..30 {
            let span = if i % 5 == 0 { 1 } else { 3 };
            for k in 1..=span {
                let (a, b) = (&ids[i], &ids[(i + k) % 30]);
                g.connect(a, b, Relation::new(a.clone(), b.clone(), "x", "")).unwrap();
            }
        }
        let mut rng = StdRng::seed_from_u64(21);
        normalize(&mut g, mode, &NormalizeConfig::default(), &VerbTable::default(), &mut rng).unwrap();

        let report = validate(&g);
        assert!(report.is_valid(), "{}: {:#?}", mode.as_str(), report.violations());
        assert_eq!(report.degree_sum, 2 * g.relations().len(), "{}", mode.as_str());
    }
}

// ═══════════════════════════════════════════════════════════════
// 2. Rebalancer with on-disk history
// ═══════════════════════════════════════════════════════════════

#[test]
fn history_survives_between_runs() {
    let dir = tempfile::tempdir().unwrap();
    let history_path = dir.path().join(HISTORY_FILE);

    let mut concepts = Vec::new();
    for i in 0..30 {
        concepts.push(concept(&format!("e{i}"), "etica-1", &[]));
    }
    for i in 0..10 {
        concepts.push(concept(&format!("p{i}"), "etica-2", &[]));
    }
    let mut g = Graph::new(concepts, vec![]);

    let mut history = MoveHistory::load(&history_path, HistoryConfig::default()).unwrap();
    assert!(history.is_empty());
    let report = rebalance(
        &mut g,
        &KeywordAffinity::default(),
        &RebalanceConfig::default(),
        &mut history,
        1_700_000_000,
    )
    .unwrap();
    assert!(!report.applied.is_empty());
    history.save(&history_path).unwrap();

    let reloaded = MoveHistory::load(&history_path, HistoryConfig::default()).unwrap();
    assert_eq!(reloaded.len(), report.applied.len());
    let first = &report.applied[0];
    assert!(reloaded.is_reversal(&first.id, &first.to, &first.from));
    assert!(reloaded.records().iter().all(|m| m.timestamp == 1_700_000_000));
}

// ═══════════════════════════════════════════════════════════════
// 3. Dedup and proposals
// ═══════════════════════════════════════════════════════════════

#[test]
fn merge_then_repair_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    let store = seed_store(
        dir.path(),
        &[
            concept("x", "l", &["z"]),
            concept("y", "l", &["z", "w"]),
            concept("z", "l", &["x", "y"]),
            concept("w", "l", &["y"]),
        ],
        &[
            Relation::new("x", "z", "a", ""),
            Relation::new("y", "z", "a", ""),
            Relation::new("y", "w", "b", ""),
        ],
    );
    let mut g = store.load().unwrap();
    merge(&mut g, &MergeDirective::new("x", "y"));
    assert_eq!(g.concept("x").unwrap().connections, ["z", "w"]);
    assert!(!g.contains("y"));

    let fix = repair(&mut g, &IdRemap::default());
    assert!(!fix.changed(), "{fix:?}");
    store.commit(&g).unwrap();

    let reloaded = store.load().unwrap();
    assert!(reloaded.relations().iter().all(|r| !r.touches("y")));
    assert!(validate(&reloaded).is_valid());
}

#[test]
fn proposals_applied_with_backup() {
    let dir = tempfile::tempdir().unwrap();
    let store = seed_store(
        dir.path(),
        &[concept("a", "l", &["b"]), concept("b", "l", &["a"]), concept("c", "l", &[])],
        &[Relation::new("a", "b", "r", "")],
    );
    let mut g = store.load().unwrap();
    let filtered = filter_proposals(
        &g,
        vec![Relation::new("c", "a", "r", ""), Relation::new("a", "c", "r", "")],
    );
    assert_eq!(filtered.duplicates, 1);

    let backup = store.backup_edges(42).unwrap();
    assert!(backup.to_string_lossy().ends_with("relations.json.backup_42"));
    assert_eq!(apply_proposals(&mut g, filtered.accepted).unwrap(), 1);
    store.commit(&g).unwrap();

    let reloaded = store.load().unwrap();
    assert_eq!(reloaded.relations().len(), 2);
    let before: Vec<Relation> = serde_json::from_str(&std::fs::read_to_string(backup).unwrap()).unwrap();
    assert_eq!(before.len(), 1);
}

#[test]
fn isolated_concept_is_underconnected_at_any_threshold() {
    let g = Graph::new(vec![concept("solo", "l", &[])], vec![]);
    assert_eq!(underconnected(&g, 0).len(), 1);
    assert_eq!(underconnected(&g, 3)[0].id, "solo");
}
