//! Keyword classifiers.
//!
//! Text classification is a scoring strategy over keyword tables. The
//! tables are plain data so they can be swapped without touching the
//! passes that consume the scores.

use std::collections::BTreeMap;

use rizoma_graph::{Concept, Graph};

// ─────────────────────────────────────────────
// KeywordTable
// ─────────────────────────────────────────────

/// Ordered `category → keywords` table. A keyword hits when it occurs as a
/// substring of the lowercased text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeywordTable {
    entries: Vec<(String, Vec<String>)>,
}

impl KeywordTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, category: &str, keywords: &[&str]) -> Self {
        self.entries.push((
            category.to_string(),
            keywords.iter().map(|k| k.to_lowercase()).collect(),
        ));
        self
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(c, _)| c.as_str())
    }

    /// Number of keywords of each category found in any of `texts`.
    /// Each keyword counts once even if it occurs in several texts.
    pub fn hits(&self, texts: &[&str]) -> Vec<(&str, usize)> {
        let lowered: Vec<String> = texts.iter().map(|t| t.to_lowercase()).collect();
        self.entries
            .iter()
            .map(|(cat, kws)| {
                let n = kws
                    .iter()
                    .filter(|kw| lowered.iter().any(|t| t.contains(kw.as_str())))
                    .count();
                (cat.as_str(), n)
            })
            .collect()
    }

    /// Dimension keywords for the eight base layers.
    pub fn dimensions() -> Self {
        Self::new()
            .with("ontologica", &["ontologia", "ser", "existência", "realidade", "fenômeno", "matéria", "natureza"])
            .with("epistemica", &["conhecimento", "epistemologia", "saber", "cognição", "método", "ciência"])
            .with("etica", &["ética", "moral", "justiça", "valor", "bem", "responsabilidade", "cuidado"])
            .with("politica", &["política", "poder", "estado", "governo", "democracia", "resistência", "luta"])
            .with("pratica", &["prática", "ação", "fazer", "praxis", "agir", "método", "técnica"])
            .with("temporal", &["tempo", "temporal", "duração", "devir", "mudança", "processo", "história"])
            .with("ecologica", &["ecologia", "ambiente", "natureza", "ecosistema", "clima", "terra", "planeta"])
            .with("fundacional", &["fundamento", "base", "princípio", "origem", "raiz", "fundação"])
    }

    /// Abstraction-level keywords, level 0 (most abstract) to 3 (most concrete).
    pub fn levels() -> Self {
        Self::new()
            .with("0", &["universal", "fundamental", "princípio", "categoria", "essência", "estrutura", "base"])
            .with("1", &["teoria", "sistema", "modelo", "conceitual", "abstrato", "paradigma", "framework"])
            .with("2", &["aplicação", "metodologia", "técnica", "processo", "dinâmica", "mecanismo"])
            .with("3", &["concreto", "específico", "caso", "exemplo", "implementação", "prática", "experiência"])
    }
}

// ─────────────────────────────────────────────
// Abstraction level
// ─────────────────────────────────────────────

pub const LEVELS: usize = 4;
const DEFAULT_LEVEL: usize = 1;

/// Infer the abstraction level (0–3) of a concept.
///
/// Level keywords in name and description give the base scores. Relations
/// whose label contains `marker` shift the result: a concept that grounds
/// more than twice as many others as ground it leans abstract (+3 level 0,
/// +1 level 1), the reverse leans concrete (+1 level 2, +3 level 3).
/// All-zero scores give level 1; ties resolve to the lowest level.
pub fn infer_level(levels: &KeywordTable, concept: &Concept, graph: &Graph, marker: &str) -> usize {
    let mut scores = [0usize; LEVELS];
    for (i, (_, n)) in levels
        .hits(&[&concept.description, &concept.name])
        .into_iter()
        .take(LEVELS)
        .enumerate()
    {
        scores[i] = n;
    }

    let (mut outgoing, mut incoming) = (0usize, 0usize);
    for r in graph.relations() {
        if !r.name.contains(marker) {
            continue;
        }
        if r.from == concept.id {
            outgoing += 1;
        }
        if r.to == concept.id {
            incoming += 1;
        }
    }
    if outgoing > incoming * 2 {
        scores[0] += 3;
        scores[1] += 1;
    } else if incoming > outgoing * 2 {
        scores[2] += 1;
        scores[3] += 3;
    }

    if scores.iter().all(|&s| s == 0) {
        return DEFAULT_LEVEL;
    }
    let best = scores.iter().copied().max().unwrap_or(0);
    scores.iter().position(|&s| s == best).unwrap_or(DEFAULT_LEVEL)
}

// ─────────────────────────────────────────────
// LayerAffinity
// ─────────────────────────────────────────────

/// Scores how well a concept fits each candidate layer.
pub trait LayerAffinity {
    /// Affinity per layer label. Layers absent from the map score 0.
    fn layer_scores(&self, concept: &Concept, graph: &Graph) -> BTreeMap<String, f64>;
}

/// Keyword affinity over `"<dimension>-<level>"` layers.
///
/// A dimension's keyword hits are weighted by the distance between each
/// level and the concept's inferred level: ×2 exact, ×1.5 adjacent, ×0.5
/// otherwise.
#[derive(Debug, Clone)]
pub struct KeywordAffinity {
    pub dimensions: KeywordTable,
    pub levels: KeywordTable,
    /// Relation-label fragment marking grounding relations.
    pub marker: String,
}

impl Default for KeywordAffinity {
    fn default() -> Self {
        Self {
            dimensions: KeywordTable::dimensions(),
            levels: KeywordTable::levels(),
            marker: "fundament".to_string(),
        }
    }
}

impl LayerAffinity for KeywordAffinity {
    fn layer_scores(&self, concept: &Concept, graph: &Graph) -> BTreeMap<String, f64> {
        let ideal = infer_level(&self.levels, concept, graph, &self.marker);
        let mut scores = BTreeMap::new();
        for (dimension, hits) in self.dimensions.hits(&[&concept.description, &concept.name]) {
            let base = hits as f64;
            for level in 0..LEVELS {
                let weight = match level.abs_diff(ideal) {
                    0 => 2.0,
                    1 => 1.5,
                    _ => 0.5,
                };
                scores.insert(format!("{dimension}-{level}"), base * weight);
            }
        }
        scores
    }
}
