//! Relation-label diversifier.
//!
//! Replaces generic relation labels with context-specific variants. Rules
//! are data: a rule applies to edges whose label is in its generic set, the
//! first matching context wins, otherwise a fallback is picked by edge
//! position. Only labels change; endpoints and descriptions are untouched.

use std::collections::BTreeMap;

use serde::Serialize;

use rizoma_graph::{Graph, Relation};

/// Number of labels listed in [`DiversifyReport::top_labels`].
pub const TOP_LABELS: usize = 10;

/// Relation field a context inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Lowercased description.
    Description,
    From,
    To,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    pub field: Field,
    pub keywords: Vec<String>,
    pub label: String,
}

impl Context {
    fn new(field: Field, keywords: &[&str], label: &str) -> Self {
        Self {
            field,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            label: label.to_string(),
        }
    }

    fn matches(&self, relation: &Relation, description: &str) -> bool {
        let text = match self.field {
            Field::Description => description,
            Field::From => relation.from.as_str(),
            Field::To => relation.to.as_str(),
        };
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiversifyRule {
    /// Key under which changes are counted.
    pub name: String,
    pub generic_labels: Vec<String>,
    pub contexts: Vec<Context>,
    pub fallbacks: Vec<String>,
}

impl DiversifyRule {
    pub fn applies_to(&self, label: &str) -> bool {
        self.generic_labels.iter().any(|g| g == label)
    }

    /// Label for the relation at position `index`.
    pub fn relabel(&self, relation: &Relation, index: usize) -> Option<String> {
        let description = relation.description.to_lowercase();
        self.contexts
            .iter()
            .find(|c| c.matches(relation, &description))
            .map(|c| c.label.clone())
            .or_else(|| {
                (!self.fallbacks.is_empty())
                    .then(|| self.fallbacks[index % self.fallbacks.len()].clone())
            })
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// The built-in rules for `emancipa-se via`, `compõe` and `possibilita`.
pub fn default_rules() -> Vec<DiversifyRule> {
    use Field::{Description as D, From as F, To as T};
    vec![
        DiversifyRule {
            name: "emancipa-se via".into(),
            generic_labels: owned(&["emancipa-se via", "emancipa-se por meio de"]),
            contexts: vec![
                Context::new(D, &["transcende", "supera", "ultrapassa", "vai além"], "transcende via"),
                Context::new(D, &["rompe", "quebra", "desconstrói", "desfaz", "quebrar"], "rompe com"),
                Context::new(D, &["resiste", "luta", "combate", "enfrenta"], "libera-se através de"),
                Context::new(D, &["desativa", "neutraliza", "dissolve"], "desativa através de"),
                Context::new(D, &["abre", "possibilita", "permite", "habilita"], "liberta-se via"),
                Context::new(F, &["vulnerabilidade", "precariedade", "despossessao"], "reconstitui-se por"),
                Context::new(T, &["cuidado", "justica", "etica", "responsabilidade"], "se afirma através de"),
                Context::new(T, &["autonomia", "commons", "decrescimento", "cooperativas"], "se transforma via"),
            ],
            fallbacks: owned(&[
                "liberta-se por",
                "autonomiza-se via",
                "se desprende através de",
                "transcende por meio de",
                "se emancipa em",
            ]),
        },
        DiversifyRule {
            name: "compõe".into(),
            generic_labels: owned(&["compõe", "co-compõe"]),
            contexts: vec![
                Context::new(D, &["mutuamente", "reciprocamente", "co-"], "co-constitui"),
                Context::new(D, &["articula", "conecta", "liga", "une"], "articula-se com"),
                Context::new(D, &["age", "atua", "opera", "funciona"], "agencia através de"),
                Context::new(D, &["tece", "entrelaça", "emaranha", "entretece"], "tece com"),
                Context::new(D, &["integra", "sintetiza", "incorpora", "inclui"], "integra"),
                Context::new(F, &["ontologia", "processo"], "fundamenta-se em"),
                Context::new(T, &["holobionte", "simbiose", "micorrizas", "ecologia"], "simbiosa com"),
                Context::new(F, &["devir", "processo", "ocasioes"], "desdobra-se em"),
            ],
            fallbacks: owned(&[
                "compõe-se com",
                "estrutura-se através de",
                "constrói-se com",
                "forma-se por",
                "se organiza em",
            ]),
        },
        DiversifyRule {
            name: "possibilita".into(),
            generic_labels: owned(&["possibilita", "viabiliza"]),
            contexts: vec![
                Context::new(D, &["habilita", "capacita", "permite que"], "habilita"),
                Context::new(D, &["abre", "inaugura", "inicia"], "abre caminho para"),
                Context::new(D, &["condição", "condicionante", "necessário"], "condiciona"),
                Context::new(D, &["potencializa", "amplifica", "intensifica"], "potencializa"),
            ],
            fallbacks: owned(&["viabiliza", "torna possível", "faculta", "propicia"]),
        },
    ]
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DiversifyReport {
    /// Relabelled edges per rule name.
    pub changes: BTreeMap<String, usize>,
    /// Most frequent labels after the pass, most frequent first.
    pub top_labels: Vec<(String, usize)>,
}

impl DiversifyReport {
    pub fn total_changes(&self) -> usize {
        self.changes.values().sum()
    }
}

/// Label histogram, most frequent first, ties by label.
pub fn label_histogram(relations: &[Relation]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for r in relations {
        *counts.entry(r.name.as_str()).or_default() += 1;
    }
    let mut out: Vec<(String, usize)> = counts.into_iter().map(|(l, n)| (l.to_string(), n)).collect();
    out.sort_by(|a, b| b.1.cmp(&a.1));
    out
}

/// Relabel every edge matched by the first applicable rule.
pub fn diversify(graph: &mut Graph, rules: &[DiversifyRule]) -> DiversifyReport {
    let mut report = DiversifyReport::default();
    for (index, relation) in graph.relations_mut().iter_mut().enumerate() {
        let Some(rule) = rules.iter().find(|r| r.applies_to(&relation.name)) else {
            continue;
        };
        let Some(label) = rule.relabel(relation, index) else {
            continue;
        };
        if label != relation.name {
            *report.changes.entry(rule.name.clone()).or_default() += 1;
            relation.name = label;
        }
    }

    report.top_labels = label_histogram(graph.relations());
    report.top_labels.truncate(TOP_LABELS);
    tracing::info!(changed = report.total_changes(), "relation labels diversified");
    report
}
