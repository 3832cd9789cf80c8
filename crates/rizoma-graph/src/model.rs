use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Unknown keys carried through a load/commit cycle untouched.
pub type Extra = BTreeMap<String, serde_json::Value>;

// ─────────────────────────────────────────────
// Concept
// ─────────────────────────────────────────────

/// A concept (node) of the ontology.
///
/// `connections` is the undirected adjacency of the concept and is treated
/// as a set. Invariant: if `b` is in `a.connections` then `a` is in
/// `b.connections`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub id: String,
    pub name: String,
    /// Partition label, e.g. `"epistemica"` or `"epistemica-2"`.
    /// Older files used `category` for the same field.
    #[serde(alias = "category")]
    pub layer: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub connections: Vec<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Concept {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        layer: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            layer: layer.into(),
            description: description.into(),
            connections: Vec::new(),
            extra: Extra::new(),
        }
    }

    /// Number of listed neighbors.
    #[inline]
    pub fn degree(&self) -> usize {
        self.connections.len()
    }

    #[inline]
    pub fn is_connected_to(&self, other: &str) -> bool {
        self.connections.iter().any(|c| c == other)
    }

    /// Base category of the layer, without a numeric sub-partition suffix.
    pub fn dimension(&self) -> &str {
        layer_dimension(&self.layer)
    }
}

/// `"etica-2"` → `"etica"`, `"etica"` → `"etica"`, `"pos-humano"` → `"pos-humano"`.
pub fn layer_dimension(layer: &str) -> &str {
    match layer.rsplit_once('-') {
        Some((base, suffix))
            if !base.is_empty()
                && !suffix.is_empty()
                && suffix.bytes().all(|b| b.is_ascii_digit()) =>
        {
            base
        }
        _ => layer,
    }
}

// ─────────────────────────────────────────────
// Relation
// ─────────────────────────────────────────────

/// A labeled, directed relation record between two concepts.
///
/// Direction carries the semantics of the label; connectivity treats the
/// pair as undirected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub from: String,
    pub to: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Relation {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            name: name.into(),
            description: description.into(),
            extra: Extra::new(),
        }
    }

    #[inline]
    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }

    /// True if the relation joins `a` and `b` in either direction.
    #[inline]
    pub fn joins(&self, a: &str, b: &str) -> bool {
        (self.from == a && self.to == b) || (self.from == b && self.to == a)
    }

    #[inline]
    pub fn touches(&self, id: &str) -> bool {
        self.from == id || self.to == id
    }

    /// Identity used for exact-duplicate detection.
    pub fn triple(&self) -> (&str, &str, &str) {
        (&self.from, &self.to, &self.name)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_strips_numeric_suffix_only() {
        assert_eq!(layer_dimension("epistemica-2"), "epistemica");
        assert_eq!(layer_dimension("epistemica"), "epistemica");
        assert_eq!(layer_dimension("pos-humano"), "pos-humano");
        assert_eq!(layer_dimension("-3"), "-3");
        assert_eq!(layer_dimension("etica-"), "etica-");
    }

    #[test]
    fn concept_accepts_legacy_category_key() {
        let c: Concept = serde_json::from_value(serde_json::json!({
            "id": "a", "name": "A", "category": "etica"
        }))
        .unwrap();
        assert_eq!(c.layer, "etica");
        assert!(c.connections.is_empty());
        assert_eq!(c.description, "");
    }

    #[test]
    fn concept_missing_id_is_rejected() {
        let r: Result<Concept, _> = serde_json::from_value(serde_json::json!({
            "name": "A", "layer": "etica"
        }));
        assert!(r.is_err());
    }

    #[test]
    fn unknown_fields_survive_roundtrip() {
        let v = serde_json::json!({
            "id": "a", "name": "A", "layer": "etica",
            "description": "d", "connections": [], "chapter": 3
        });
        let c: Concept = serde_json::from_value(v).unwrap();
        assert_eq!(c.extra.get("chapter"), Some(&serde_json::json!(3)));
        let back = serde_json::to_value(&c).unwrap();
        assert_eq!(back["chapter"], 3);
    }

    #[test]
    fn relation_joins_both_directions() {
        let r = Relation::new("a", "b", "x", "");
        assert!(r.joins("a", "b"));
        assert!(r.joins("b", "a"));
        assert!(!r.joins("a", "c"));
        assert!(!r.is_self_loop());
    }
}
