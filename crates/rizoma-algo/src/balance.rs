//! Layer-size balance report.

use std::collections::BTreeMap;

use serde::Serialize;

use rizoma_graph::Graph;

/// Layers above `ideal × OVER_FACTOR` are over-represented.
pub const OVER_FACTOR: f64 = 1.3;
/// Layers below `ideal × UNDER_FACTOR` are under-represented.
pub const UNDER_FACTOR: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum BalanceVerdict {
    /// max/min ratio below 3.
    #[default]
    Good,
    /// max/min ratio below 5.
    Moderate,
    Critical,
}

impl BalanceVerdict {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio < 3.0 {
            Self::Good
        } else if ratio < 5.0 {
            Self::Moderate
        } else {
            Self::Critical
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Good => "GOOD",
            Self::Moderate => "MODERATE",
            Self::Critical => "CRITICAL",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LayerBalance {
    pub total: usize,
    pub counts: BTreeMap<String, usize>,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation of the layer sizes.
    pub std_dev: f64,
    /// Size every layer would have under an even split.
    pub ideal: f64,
    /// Largest layer size / smallest layer size.
    pub ratio: f64,
    /// `(layer, count)`, largest first.
    pub over_represented: Vec<(String, usize)>,
    /// `(layer, count)`, smallest first.
    pub under_represented: Vec<(String, usize)>,
    pub verdict: BalanceVerdict,
}

impl LayerBalance {
    pub fn from_graph(graph: &Graph) -> Self {
        Self::from_counts(graph.layer_counts())
    }

    pub fn from_counts(counts: BTreeMap<String, usize>) -> Self {
        if counts.is_empty() {
            return Self::default();
        }
        let total: usize = counts.values().sum();
        let k = counts.len() as f64;
        let mut sizes: Vec<usize> = counts.values().copied().collect();
        sizes.sort_unstable();

        let mean = total as f64 / k;
        let mid = sizes.len() / 2;
        let median = if sizes.len() % 2 == 0 {
            (sizes[mid - 1] + sizes[mid]) as f64 / 2.0
        } else {
            sizes[mid] as f64
        };
        let std_dev = if sizes.len() > 1 {
            let ss: f64 = sizes.iter().map(|&s| (s as f64 - mean).powi(2)).sum();
            (ss / (k - 1.0)).sqrt()
        } else {
            0.0
        };
        let (min, max) = (sizes[0], sizes[sizes.len() - 1]);
        let ratio = if min == 0 { f64::INFINITY } else { max as f64 / min as f64 };

        let ideal = mean;
        let mut over: Vec<(String, usize)> = counts
            .iter()
            .filter(|&(_, &c)| c as f64 > ideal * OVER_FACTOR)
            .map(|(l, &c)| (l.clone(), c))
            .collect();
        over.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        let mut under: Vec<(String, usize)> = counts
            .iter()
            .filter(|&(_, &c)| (c as f64) < ideal * UNDER_FACTOR)
            .map(|(l, &c)| (l.clone(), c))
            .collect();
        under.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

        Self {
            total,
            counts,
            mean,
            median,
            std_dev,
            ideal,
            ratio,
            over_represented: over,
            under_represented: under,
            verdict: BalanceVerdict::from_ratio(ratio),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(pairs: &[(&str, usize)]) -> BTreeMap<String, usize> {
        pairs.iter().map(|(l, c)| (l.to_string(), *c)).collect()
    }

    #[test]
    fn verdict_thresholds() {
        assert_eq!(BalanceVerdict::from_ratio(2.9), BalanceVerdict::Good);
        assert_eq!(BalanceVerdict::from_ratio(3.0), BalanceVerdict::Moderate);
        assert_eq!(BalanceVerdict::from_ratio(4.99), BalanceVerdict::Moderate);
        assert_eq!(BalanceVerdict::from_ratio(5.0), BalanceVerdict::Critical);
    }

    #[test]
    fn over_and_under_against_ideal() {
        let b = LayerBalance::from_counts(counts(&[("a", 120), ("b", 40), ("c", 80)]));
        assert_eq!(b.total, 240);
        assert!((b.ideal - 80.0).abs() < 1e-12);
        assert_eq!(b.over_represented, vec![("a".to_string(), 120)]);
        assert_eq!(b.under_represented, vec![("b".to_string(), 40)]);
        assert!((b.ratio - 3.0).abs() < 1e-12);
        assert_eq!(b.verdict, BalanceVerdict::Moderate);
        assert_eq!(b.median, 80.0);
        assert!((b.std_dev - 40.0).abs() < 1e-12);
    }

    #[test]
    fn critical_imbalance() {
        let b = LayerBalance::from_counts(counts(&[("a", 50), ("b", 5)]));
        assert_eq!(b.verdict, BalanceVerdict::Critical);
    }

    #[test]
    fn empty_is_default() {
        let b = LayerBalance::from_counts(BTreeMap::new());
        assert_eq!(b.total, 0);
        assert_eq!(b.verdict, BalanceVerdict::Good);
    }
}
