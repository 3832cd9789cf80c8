//! Deduplication and consistency fixes.
//!
//! [`merge`] folds one concept into another, [`rename_duplicate_ids`] gives
//! later copies of a repeated concept ID an ID of their own, [`repair`]
//! brings a drifted graph back to a consistent state and
//! [`sync_connections`] rebuilds the adjacency lists from the relation
//! records. All of them are idempotent.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use rizoma_graph::store::read_json;
use rizoma_graph::{layer_dimension, AdjacencyIndex, Concept, Graph, Relation};

use crate::error::CurateError;

// ─────────────────────────────────────────────
// Shared helpers
// ─────────────────────────────────────────────

/// Drop relations repeating an earlier `(from, to, name)`. Returns the count.
fn drop_duplicate_relations(relations: &mut Vec<Relation>) -> usize {
    let before = relations.len();
    let mut seen: HashSet<(String, String, String)> = HashSet::new();
    relations.retain(|r| seen.insert((r.from.clone(), r.to.clone(), r.name.clone())));
    before - relations.len()
}

/// Keep the first occurrence of every entry. Returns the count removed.
fn dedup_in_order(list: &mut Vec<String>) -> usize {
    let before = list.len();
    let mut seen = HashSet::new();
    list.retain(|n| seen.insert(n.clone()));
    before - list.len()
}

// ─────────────────────────────────────────────
// Merge
// ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeDirective {
    #[serde(alias = "keep")]
    pub keep_id: String,
    #[serde(alias = "remove")]
    pub remove_id: String,
}

impl MergeDirective {
    pub fn new(keep_id: impl Into<String>, remove_id: impl Into<String>) -> Self {
        Self {
            keep_id: keep_id.into(),
            remove_id: remove_id.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// False when the directive was a no-op.
    pub merged: bool,
    pub relations_redirected: usize,
    pub self_loops_dropped: usize,
    pub duplicates_dropped: usize,
}

/// Fold `remove_id` into `keep_id`.
///
/// The kept concept gains the removed one's neighbors, every reference to
/// `remove_id` is redirected, and self-loops or exact duplicates created by
/// the redirect are dropped. The kept list keeps its own entries first, then
/// the new ones in the removed concept's order.
///
/// A directive whose `remove_id` no longer exists is a no-op.
pub fn merge(graph: &mut Graph, directive: &MergeDirective) -> MergeReport {
    let MergeDirective { keep_id, remove_id } = directive;
    if keep_id == remove_id || !graph.contains(remove_id) {
        tracing::debug!(keep = %keep_id, remove = %remove_id, "nothing to merge");
        return MergeReport::default();
    }
    if !graph.contains(keep_id) {
        tracing::warn!(keep = %keep_id, remove = %remove_id, "merge target missing, directive skipped");
        return MergeReport::default();
    }

    let report = graph.edit(|concepts, relations| {
        let mut report = MergeReport {
            merged: true,
            ..Default::default()
        };

        let inherited = concepts
            .iter()
            .find(|c| &c.id == remove_id)
            .map(|c| c.connections.clone())
            .unwrap_or_default();
        concepts.retain(|c| &c.id != remove_id);

        for c in concepts.iter_mut() {
            if &c.id == keep_id {
                c.connections.extend(inherited.iter().cloned());
            }
            for n in c.connections.iter_mut() {
                if *n == *remove_id {
                    *n = keep_id.clone();
                }
            }
            let own = c.id.clone();
            c.connections.retain(|n| *n != own);
            dedup_in_order(&mut c.connections);
        }

        for r in relations.iter_mut() {
            let mut touched = false;
            if &r.from == remove_id {
                r.from = keep_id.clone();
                touched = true;
            }
            if &r.to == remove_id {
                r.to = keep_id.clone();
                touched = true;
            }
            if touched {
                report.relations_redirected += 1;
            }
        }
        let before = relations.len();
        relations.retain(|r| !r.is_self_loop());
        report.self_loops_dropped = before - relations.len();
        report.duplicates_dropped = drop_duplicate_relations(relations);
        report
    });

    tracing::info!(
        keep = %keep_id,
        remove = %remove_id,
        redirected = report.relations_redirected,
        self_loops = report.self_loops_dropped,
        duplicates = report.duplicates_dropped,
        "concepts merged"
    );
    report
}

/// Load merge directives from a JSON array.
pub fn load_directives(path: &Path) -> Result<Vec<MergeDirective>, CurateError> {
    Ok(read_json(path)?)
}

// ─────────────────────────────────────────────
// Duplicate IDs
// ─────────────────────────────────────────────

/// A later copy of `id` that now lives under `renamed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenamedId {
    pub id: String,
    pub layer: String,
    pub renamed: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenameReport {
    pub renamed: Vec<RenamedId>,
    pub connections_repointed: usize,
    pub relations_repointed: usize,
}

/// `<dimension>-<id>`, then `<dimension>-<id>-2`, `-3`, ... until unused.
fn fresh_id(id: &str, layer: &str, taken: &HashSet<String>) -> String {
    let dimension = layer_dimension(layer);
    let base = if dimension.is_empty() {
        id.to_string()
    } else {
        format!("{dimension}-{id}")
    };
    let mut candidate = base.clone();
    let mut n = 2;
    while taken.contains(&candidate) {
        candidate = format!("{base}-{n}");
        n += 1;
    }
    candidate
}

/// Whether the `end` side of `r` (`"from"` or `"to"`) refers to the renamed
/// copy rather than the first concept with the same ID.
fn claims(r: &Relation, end: &str, layer: &str, own: &HashSet<String>, kept: &HashSet<String>) -> bool {
    let hint = r.extra.get(&format!("{end}_layer")).and_then(|v| v.as_str());
    if let Some(hint) = hint {
        return hint == layer;
    }
    let other = if end == "from" { &r.to } else { &r.from };
    own.contains(other) && !kept.contains(other)
}

/// Give every repeated concept ID after the first a fresh ID derived from
/// its layer (`escala` in `politica` becomes `politica-escala`).
///
/// Neighbors listed by the renamed copy are re-pointed to the new ID: the
/// entry is replaced when the neighbor is not also linked to the first
/// concept, and added otherwise. A relation endpoint moves when its
/// `from_layer` / `to_layer` hint names the copy's layer or, without a
/// hint, when the other endpoint is a neighbor of the copy only.
pub fn rename_duplicate_ids(graph: &mut Graph) -> RenameReport {
    let report = graph.edit(|concepts, relations| {
        let mut report = RenameReport::default();
        let mut taken: HashSet<String> = concepts.iter().map(|c| c.id.clone()).collect();
        let mut first: HashMap<String, usize> = HashMap::new();
        let mut copies = Vec::new();
        for (i, c) in concepts.iter().enumerate() {
            match first.get(&c.id) {
                Some(&f) => copies.push((f, i)),
                None => {
                    first.insert(c.id.clone(), i);
                }
            }
        }

        for (f, i) in copies {
            let old = concepts[i].id.clone();
            let layer = concepts[i].layer.clone();
            let new = fresh_id(&old, &layer, &taken);
            taken.insert(new.clone());
            concepts[i].id = new.clone();

            let own: HashSet<String> = concepts[i].connections.iter().cloned().collect();
            let kept: HashSet<String> = concepts[f].connections.iter().cloned().collect();

            for (j, other) in concepts.iter_mut().enumerate() {
                if j == i || j == f || !own.contains(&other.id) {
                    continue;
                }
                let Some(pos) = other.connections.iter().position(|n| *n == old) else {
                    continue;
                };
                if kept.contains(&other.id) {
                    if !other.connections.contains(&new) {
                        other.connections.push(new.clone());
                    }
                } else {
                    other.connections[pos] = new.clone();
                }
                report.connections_repointed += 1;
            }

            for r in relations.iter_mut() {
                if r.from == old && claims(r, "from", &layer, &own, &kept) {
                    r.from = new.clone();
                    report.relations_repointed += 1;
                }
                if r.to == old && claims(r, "to", &layer, &own, &kept) {
                    r.to = new.clone();
                    report.relations_repointed += 1;
                }
            }

            tracing::warn!(id = %old, layer = %layer, renamed = %new, "duplicate concept id renamed");
            report.renamed.push(RenamedId {
                id: old,
                layer,
                renamed: new,
            });
        }
        report
    });
    if !report.renamed.is_empty() {
        tracing::info!(
            renamed = report.renamed.len(),
            connections = report.connections_repointed,
            relations = report.relations_repointed,
            "duplicate ids resolved"
        );
    }
    report
}

// ─────────────────────────────────────────────
// Repair
// ─────────────────────────────────────────────

/// Legacy ID → current ID. Applied in a single step; chains are not followed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdRemap(pub BTreeMap<String, String>);

impl IdRemap {
    pub fn load(path: &Path) -> Result<Self, CurateError> {
        Ok(read_json(path)?)
    }

    pub fn insert(&mut self, legacy: impl Into<String>, current: impl Into<String>) {
        self.0.insert(legacy.into(), current.into());
    }

    /// Replace `id` if it is a legacy ID. Returns whether it changed.
    fn apply(&self, id: &mut String) -> bool {
        match self.0.get(id.as_str()) {
            Some(current) if *current != *id => {
                *id = current.clone();
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FixReport {
    pub concepts: usize,
    /// Repeated concept IDs given a fresh ID before the other fixes ran.
    pub renamed_ids: Vec<RenamedId>,
    pub relations_before: usize,
    pub relations_after: usize,
    pub degree_sum_before: usize,
    pub degree_sum_after: usize,
    pub ids_remapped: usize,
    pub orphan_relations: usize,
    pub self_loops: usize,
    pub duplicate_relations: usize,
    pub dangling_connections: usize,
    pub duplicate_connections: usize,
    /// One-sided adjacency entries mirrored onto the other endpoint.
    pub mirrored_connections: usize,
}

impl FixReport {
    pub fn changed(&self) -> bool {
        !self.renamed_ids.is_empty()
            || self.ids_remapped
            + self.orphan_relations
            + self.self_loops
            + self.duplicate_relations
            + self.dangling_connections
            + self.duplicate_connections
            + self.mirrored_connections
            > 0
    }
}

fn degree_sum(concepts: &[Concept]) -> usize {
    concepts.iter().map(Concept::degree).sum()
}

/// Bring relations and adjacency lists back to a consistent state.
///
/// Repeated concept IDs are renamed first ([`rename_duplicate_ids`]).
/// Relations: legacy endpoints remapped, orphans and self-loops dropped,
/// exact `(from, to, name)` duplicates dropped. Adjacency: legacy entries
/// remapped, entries to unknown IDs or to the concept itself dropped,
/// duplicates dropped, one-sided entries mirrored.
pub fn repair(graph: &mut Graph, remap: &IdRemap) -> FixReport {
    let renamed_ids = rename_duplicate_ids(graph).renamed;
    let report = graph.edit(|concepts, relations| {
        let mut report = FixReport {
            concepts: concepts.len(),
            renamed_ids,
            relations_before: relations.len(),
            degree_sum_before: degree_sum(concepts),
            ..Default::default()
        };
        let ids: HashSet<String> = concepts.iter().map(|c| c.id.clone()).collect();

        // ── relations ──
        for r in relations.iter_mut() {
            report.ids_remapped += usize::from(remap.apply(&mut r.from));
            report.ids_remapped += usize::from(remap.apply(&mut r.to));
        }
        relations.retain(|r| {
            if !ids.contains(&r.from) || !ids.contains(&r.to) {
                tracing::debug!(from = %r.from, to = %r.to, "orphan relation dropped");
                report.orphan_relations += 1;
                false
            } else if r.is_self_loop() {
                report.self_loops += 1;
                false
            } else {
                true
            }
        });
        report.duplicate_relations = drop_duplicate_relations(relations);

        // ── adjacency ──
        for c in concepts.iter_mut() {
            for n in c.connections.iter_mut() {
                report.ids_remapped += usize::from(remap.apply(n));
            }
            let own = c.id.clone();
            let before = c.connections.len();
            c.connections.retain(|n| n != &own && ids.contains(n));
            report.dangling_connections += before - c.connections.len();
            report.duplicate_connections += dedup_in_order(&mut c.connections);
        }

        let adj = AdjacencyIndex::from_concepts(concepts);
        for c in concepts.iter_mut() {
            let Some(neighbors) = adj.neighbors(&c.id) else {
                continue;
            };
            let mut missing: Vec<&String> = neighbors
                .iter()
                .filter(|n| !c.connections.contains(*n))
                .collect();
            missing.sort();
            report.mirrored_connections += missing.len();
            c.connections.extend(missing.into_iter().cloned());
        }

        report.relations_after = relations.len();
        report.degree_sum_after = degree_sum(concepts);
        report
    });

    tracing::info!(
        renamed = report.renamed_ids.len(),
        remapped = report.ids_remapped,
        orphans = report.orphan_relations,
        self_loops = report.self_loops,
        duplicates = report.duplicate_relations,
        dangling = report.dangling_connections,
        mirrored = report.mirrored_connections,
        "graph repaired"
    );
    report
}

// ─────────────────────────────────────────────
// Sync
// ─────────────────────────────────────────────

/// Rebuild every `connections` list from the relation records, treating
/// relations as undirected. Relations touching unknown IDs are ignored.
/// Returns the number of concepts whose list changed.
pub fn sync_connections(graph: &mut Graph) -> usize {
    let changed = graph.edit(|concepts, relations| {
        let ids: HashSet<&str> = concepts.iter().map(|c| c.id.as_str()).collect();
        let known: Vec<Relation> = relations
            .iter()
            .filter(|r| ids.contains(r.from.as_str()) && ids.contains(r.to.as_str()))
            .cloned()
            .collect();
        let adj = AdjacencyIndex::from_relations(&known);

        let mut changed = 0;
        for c in concepts.iter_mut() {
            let rebuilt = adj.sorted_neighbors(&c.id);
            if rebuilt != c.connections {
                c.connections = rebuilt;
                changed += 1;
            }
        }
        changed
    });
    tracing::info!(changed, "connections rebuilt from relations");
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use rizoma_graph::validate;

    fn concept(id: &str, connections: &[&str]) -> Concept {
        let mut c = Concept::new(id, id.to_uppercase(), "l", "");
        c.connections = connections.iter().map(|s| s.to_string()).collect();
        c
    }

    fn rel(from: &str, to: &str, name: &str) -> Relation {
        Relation::new(from, to, name, "")
    }

    fn merge_fixture() -> Graph {
        Graph::new(
            vec![
                concept("x", &["z"]),
                concept("y", &["z", "w"]),
                concept("z", &["x", "y"]),
                concept("w", &["y"]),
            ],
            vec![rel("x", "z", "a"), rel("y", "z", "a"), rel("y", "w", "b"), rel("x", "y", "c")],
        )
    }

    #[test]
    fn merge_folds_removed_concept() {
        let mut g = merge_fixture();
        let report = merge(&mut g, &MergeDirective::new("x", "y"));

        assert!(report.merged);
        assert!(!g.contains("y"));
        assert_eq!(g.concept("x").unwrap().connections, ["z", "w"]);
        assert_eq!(g.concept("z").unwrap().connections, ["x"]);
        assert_eq!(g.concept("w").unwrap().connections, ["x"]);
        assert!(g.relations().iter().all(|r| !r.touches("y")));
        // x→y became a self-loop; y→z duplicated x→z
        assert_eq!(report.self_loops_dropped, 1);
        assert_eq!(report.duplicates_dropped, 1);
        assert_eq!(g.relations().len(), 2);
        assert!(validate(&g).is_valid());
    }

    #[test]
    fn merge_is_idempotent() {
        let mut g = merge_fixture();
        merge(&mut g, &MergeDirective::new("x", "y"));
        let (concepts, relations) = g.clone().into_parts();
        let again = merge(&mut g, &MergeDirective::new("x", "y"));
        assert!(!again.merged);
        assert_eq!(g.into_parts(), (concepts, relations));
    }

    #[test]
    fn directives_accept_short_keys() {
        let d: MergeDirective = serde_json::from_str(r#"{"keep": "x", "remove": "y"}"#).unwrap();
        assert_eq!(d, MergeDirective::new("x", "y"));
    }

    #[test]
    fn repair_drops_duplicate_relation() {
        let mut g = Graph::new(
            vec![concept("p", &["q"]), concept("q", &["p"])],
            vec![rel("p", "q", "x"), rel("p", "q", "x")],
        );
        let report = repair(&mut g, &IdRemap::default());
        assert_eq!(report.duplicate_relations, 1);
        assert_eq!(g.relations().len(), 1);
    }

    #[test]
    fn repair_fixes_every_kind_of_drift() {
        let mut remap = IdRemap::default();
        remap.insert("old-b", "b");
        let mut g = Graph::new(
            vec![
                concept("a", &["old-b", "ghost", "a", "c", "c"]),
                concept("b", &[]),
                concept("c", &["a"]),
            ],
            vec![
                rel("a", "old-b", "r"),
                rel("a", "ghost", "r"),
                rel("c", "c", "r"),
                rel("a", "c", "r"),
            ],
        );
        let report = repair(&mut g, &remap);

        assert_eq!(report.ids_remapped, 2);
        assert_eq!(report.orphan_relations, 1);
        assert_eq!(report.self_loops, 1);
        assert_eq!(report.dangling_connections, 2);
        assert_eq!(report.duplicate_connections, 1);
        assert_eq!(report.mirrored_connections, 1);
        assert_eq!(g.concept("a").unwrap().connections, ["b", "c"]);
        assert_eq!(g.concept("b").unwrap().connections, ["a"]);
        assert_eq!(report.relations_after, 2);
        assert!(validate(&g).is_valid());

        let again = repair(&mut g, &remap);
        assert!(!again.changed(), "{again:?}");
    }

    /// Two concepts share `escala`; the political copy links to `praxis`,
    /// the first links to `tempo`, both link to `rede`.
    fn duplicate_fixture() -> Graph {
        let mut ontologica = Concept::new("escala", "Escala", "ontologica", "");
        ontologica.connections = vec!["tempo".into(), "rede".into()];
        let mut politica = Concept::new("escala", "Escala", "politica-2", "");
        politica.connections = vec!["praxis".into(), "rede".into()];
        Graph::new(
            vec![
                ontologica,
                politica,
                concept("tempo", &["escala"]),
                concept("praxis", &["escala"]),
                concept("rede", &["escala"]),
            ],
            vec![
                rel("escala", "tempo", "a"),
                rel("praxis", "escala", "b"),
                rel("rede", "escala", "c"),
            ],
        )
    }

    #[test]
    fn duplicate_id_gets_layer_prefixed_id() {
        let mut g = duplicate_fixture();
        assert_eq!(validate(&g).duplicate_ids.count, 1);

        let report = rename_duplicate_ids(&mut g);
        assert_eq!(
            report.renamed,
            [RenamedId {
                id: "escala".into(),
                layer: "politica-2".into(),
                renamed: "politica-escala".into(),
            }]
        );
        assert_eq!(g.concept("politica-escala").unwrap().layer, "politica-2");
        assert_eq!(g.concept("escala").unwrap().layer, "ontologica");

        // praxis only knew the copy; rede knew both
        assert_eq!(g.concept("praxis").unwrap().connections, ["politica-escala"]);
        assert_eq!(g.concept("rede").unwrap().connections, ["escala", "politica-escala"]);
        assert_eq!(g.concept("tempo").unwrap().connections, ["escala"]);
        assert_eq!(report.connections_repointed, 2);

        assert!(g.relations().iter().any(|r| r.from == "praxis" && r.to == "politica-escala"));
        assert!(g.relations().iter().any(|r| r.from == "rede" && r.to == "escala"));
        assert_eq!(report.relations_repointed, 1);

        let after = validate(&g);
        assert!(after.duplicate_ids.is_empty());
        assert!(after.is_valid(), "{:#?}", after.violations());
    }

    #[test]
    fn renaming_is_idempotent() {
        let mut g = duplicate_fixture();
        rename_duplicate_ids(&mut g);
        let (concepts, relations) = g.clone().into_parts();
        let again = rename_duplicate_ids(&mut g);
        assert!(again.renamed.is_empty());
        assert_eq!(g.into_parts(), (concepts, relations));
    }

    #[test]
    fn fresh_id_skips_taken_ids() {
        let mut g = Graph::new(
            vec![
                Concept::new("escala", "E", "politica", ""),
                Concept::new("escala", "E", "politica", ""),
                Concept::new("escala", "E", "politica", ""),
                Concept::new("politica-escala", "P", "politica", ""),
            ],
            vec![],
        );
        let report = rename_duplicate_ids(&mut g);
        let renamed: Vec<&str> = report.renamed.iter().map(|r| r.renamed.as_str()).collect();
        assert_eq!(renamed, ["politica-escala-2", "politica-escala-3"]);
        assert!(validate(&g).duplicate_ids.is_empty());
    }

    #[test]
    fn layer_hint_decides_relation_endpoint() {
        let mut g = duplicate_fixture();
        let mut hinted = rel("rede", "escala", "d");
        hinted.extra.insert("to_layer".into(), serde_json::json!("politica-2"));
        g.edit(|_, rels| rels.push(hinted));

        rename_duplicate_ids(&mut g);
        assert!(g.relations().iter().any(|r| r.name == "d" && r.to == "politica-escala"));
        assert!(g.relations().iter().any(|r| r.name == "c" && r.to == "escala"));
    }

    #[test]
    fn repair_resolves_duplicate_ids_then_settles() {
        let mut g = duplicate_fixture();
        let report = repair(&mut g, &IdRemap::default());
        assert_eq!(report.renamed_ids.len(), 1);
        assert!(report.changed());
        assert!(validate(&g).is_valid());

        let again = repair(&mut g, &IdRemap::default());
        assert!(!again.changed(), "{again:?}");
    }

    #[test]
    fn sync_rebuilds_from_relations() {
        let mut g = Graph::new(
            vec![concept("a", &["c"]), concept("b", &[]), concept("c", &[])],
            vec![rel("b", "a", "r"), rel("a", "ghost", "r")],
        );
        assert_eq!(sync_connections(&mut g), 2);
        assert_eq!(g.concept("a").unwrap().connections, ["b"]);
        assert_eq!(g.concept("b").unwrap().connections, ["a"]);
        assert!(g.concept("c").unwrap().connections.is_empty());
        assert_eq!(sync_connections(&mut g), 0);
    }
}
