//! Labels for relations created by the curation passes.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;

use rizoma_graph::{layer_dimension, Concept, Relation};

pub const FALLBACK_VERB: &str = "relaciona-se com";

/// Verb vocabulary for new relations.
///
/// `by_dimension` picks a verb from the source concept's base layer;
/// `same_layer` / `cross_layer` pick by whether both endpoints share a layer.
#[derive(Debug, Clone)]
pub struct VerbTable {
    pub by_dimension: BTreeMap<String, Vec<String>>,
    pub same_layer: Vec<String>,
    pub cross_layer: Vec<String>,
    pub fallback: String,
}

fn owned(verbs: &[&str]) -> Vec<String> {
    verbs.iter().map(|s| s.to_string()).collect()
}

impl Default for VerbTable {
    fn default() -> Self {
        let verbs: [(&str, &[&str]); 8] = [
            ("fundacional", &["fundamenta-se em", "emerge de", "sustenta-se em", "condiciona"]),
            ("ontologica", &["constitui", "articula-se com", "entrelaça-se com", "co-constitui"]),
            ("epistemica", &["conhece através de", "aprende de", "questiona", "dialoga com"]),
            ("politica", &["mobiliza", "articula-se politicamente com", "resiste a", "organiza-se em"]),
            ("etica", &["cuida de", "responsabiliza-se por", "orienta-se eticamente por", "respeita"]),
            ("temporal", &["desdobra-se em", "temporaliza-se em", "evolui para", "atualiza"]),
            ("ecologica", &["simbiosa com", "co-habita", "flui em", "entrelaça-se ecologicamente com"]),
            ("pratica", &["pratica", "implementa", "performa", "efetiva-se em"]),
        ];
        let by_dimension = verbs
            .into_iter()
            .map(|(d, v)| (d.to_string(), owned(v)))
            .collect();

        Self {
            by_dimension,
            same_layer: owned(&["relaciona-se", "articula-se", "conecta-se", "dialoga com", "ressoa com"]),
            cross_layer: owned(&["relaciona-se", "atravessa", "conecta-se", "entrelaça-se", "articula-se"]),
            fallback: FALLBACK_VERB.to_string(),
        }
    }
}

impl VerbTable {
    /// Verb for a relation out of `from`, chosen from its dimension's list.
    pub fn layer_verb<R: Rng + ?Sized>(&self, rng: &mut R, from: &Concept) -> String {
        self.by_dimension
            .get(layer_dimension(&from.layer))
            .and_then(|verbs| verbs.choose(rng))
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }

    /// Verb chosen by whether `a` and `b` share a layer.
    pub fn pair_verb<R: Rng + ?Sized>(&self, rng: &mut R, a: &Concept, b: &Concept) -> String {
        let pool = if a.layer == b.layer {
            &self.same_layer
        } else {
            &self.cross_layer
        };
        pool.choose(rng).cloned().unwrap_or_else(|| self.fallback.clone())
    }
}

/// `from → to` relation labelled `verb`, described as `"<from> <verb> <to>"`.
pub fn describe(from: &Concept, to: &Concept, verb: String) -> Relation {
    let description = format!("{} {} {}", from.name, verb, to.name);
    Relation::new(from.id.clone(), to.id.clone(), verb, description)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn layer_verb_uses_dimension_of_suffixed_layer() {
        let table = VerbTable::default();
        let mut rng = StdRng::seed_from_u64(1);
        let c = Concept::new("a", "A", "etica-2", "");
        let verb = table.layer_verb(&mut rng, &c);
        assert!(table.by_dimension["etica"].contains(&verb));
    }

    #[test]
    fn unknown_layer_falls_back() {
        let table = VerbTable::default();
        let mut rng = StdRng::seed_from_u64(1);
        let c = Concept::new("a", "A", "misc", "");
        assert_eq!(table.layer_verb(&mut rng, &c), FALLBACK_VERB);
    }

    #[test]
    fn pair_verb_picks_pool_by_layer() {
        let table = VerbTable::default();
        let mut rng = StdRng::seed_from_u64(3);
        let a = Concept::new("a", "A", "etica", "");
        let b = Concept::new("b", "B", "politica", "");
        assert!(table.cross_layer.contains(&table.pair_verb(&mut rng, &a, &b)));
        assert!(table.same_layer.contains(&table.pair_verb(&mut rng, &a, &a)));
    }

    #[test]
    fn describe_formats_names() {
        let a = Concept::new("a", "Cuidado", "etica", "");
        let b = Concept::new("b", "Terra", "ecologica", "");
        let r = describe(&a, &b, "cuida de".into());
        assert_eq!(r.description, "Cuidado cuida de Terra");
        assert_eq!((r.from.as_str(), r.to.as_str()), ("a", "b"));
    }
}
