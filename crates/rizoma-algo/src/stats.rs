//! Degree-distribution moments and the normality score.
//!
//! All moments are population moments (divide by `n`, not `n − 1`).

use serde::Serialize;

use rizoma_graph::Graph;

/// Share of a normal distribution within ±1σ, in percent.
const NORMAL_1SIGMA_PCT: f64 = 68.0;
/// Share of a normal distribution within ±2σ, in percent.
const NORMAL_2SIGMA_PCT: f64 = 95.0;

/// Degrees in concept order.
pub fn degree_sequence(graph: &Graph) -> Vec<usize> {
    graph.degrees()
}

// ─────────────────────────────────────────────
// DegreeStats
// ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DegreeStats {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    /// Third standardized moment.
    pub skewness: f64,
    /// Fourth standardized moment − 3.
    pub kurtosis: f64,
    pub median: f64,
    pub min: usize,
    pub max: usize,
    /// Percent of values with |x − mean| ≤ σ.
    pub within_1sigma_pct: f64,
    /// Percent of values with |x − mean| ≤ 2σ.
    pub within_2sigma_pct: f64,
}

impl DegreeStats {
    /// All zero for an empty slice. With σ = 0 skewness and kurtosis are 0.
    pub fn from_degrees(degrees: &[usize]) -> Self {
        if degrees.is_empty() {
            return Self::default();
        }
        let n = degrees.len() as f64;
        let xs: Vec<f64> = degrees.iter().map(|&d| d as f64).collect();
        let mean = xs.iter().sum::<f64>() / n;
        let variance = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();

        let (skewness, kurtosis) = if std_dev > 0.0 {
            let m3 = xs.iter().map(|x| (x - mean).powi(3)).sum::<f64>() / n;
            let m4 = xs.iter().map(|x| (x - mean).powi(4)).sum::<f64>() / n;
            (m3 / std_dev.powi(3), m4 / std_dev.powi(4) - 3.0)
        } else {
            (0.0, 0.0)
        };

        let within = |k: f64| {
            let hits = xs.iter().filter(|&&x| (x - mean).abs() <= k * std_dev).count();
            hits as f64 / n * 100.0
        };

        let mut sorted = degrees.to_vec();
        sorted.sort_unstable();
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) as f64 / 2.0
        } else {
            sorted[mid] as f64
        };

        Self {
            count: degrees.len(),
            mean,
            std_dev,
            skewness,
            kurtosis,
            median,
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            within_1sigma_pct: within(1.0),
            within_2sigma_pct: within(2.0),
        }
    }

    pub fn from_graph(graph: &Graph) -> Self {
        Self::from_degrees(&graph.degrees())
    }
}

// ─────────────────────────────────────────────
// NormalityScore
// ─────────────────────────────────────────────

/// How closely a degree distribution resembles a Gaussian, in `[0, 100]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct NormalityScore {
    pub score: f64,
    pub sigma1_penalty: f64,
    pub sigma2_penalty: f64,
    pub skew_penalty: f64,
    pub kurtosis_penalty: f64,
    pub stats: DegreeStats,
}

impl NormalityScore {
    pub fn from_stats(stats: DegreeStats) -> Self {
        let sigma1_penalty = ((stats.within_1sigma_pct - NORMAL_1SIGMA_PCT).abs() * 2.0).min(30.0);
        let sigma2_penalty = (stats.within_2sigma_pct - NORMAL_2SIGMA_PCT).abs().min(20.0);
        let skew_penalty = (stats.skewness.abs() * 20.0).min(20.0);
        let kurtosis_penalty = (stats.kurtosis.abs() * 10.0).min(15.0);
        let total = sigma1_penalty + sigma2_penalty + skew_penalty + kurtosis_penalty;
        Self {
            score: (100.0 - total).clamp(0.0, 100.0),
            sigma1_penalty,
            sigma2_penalty,
            skew_penalty,
            kurtosis_penalty,
            stats,
        }
    }
}

pub fn normality_score(degrees: &[usize]) -> NormalityScore {
    NormalityScore::from_stats(DegreeStats::from_degrees(degrees))
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_all_zero() {
        let s = DegreeStats::from_degrees(&[]);
        assert_eq!(s.count, 0);
        assert_eq!(s.mean, 0.0);
    }

    #[test]
    fn constant_sequence_has_zero_shape_moments() {
        let s = DegreeStats::from_degrees(&[4, 4, 4, 4]);
        assert_eq!(s.std_dev, 0.0);
        assert_eq!(s.skewness, 0.0);
        assert_eq!(s.kurtosis, 0.0);
        assert_eq!(s.within_1sigma_pct, 100.0);
        assert_eq!(s.median, 4.0);
    }

    #[test]
    fn population_moments() {
        let s = DegreeStats::from_degrees(&[2, 4, 4, 4, 5, 5, 7, 9]);
        assert!((s.mean - 5.0).abs() < 1e-12);
        assert!((s.std_dev - 2.0).abs() < 1e-12);
        assert_eq!(s.median, 4.5);
        assert_eq!(s.min, 2);
        assert_eq!(s.max, 9);
        // 4,4,4,5,5,7 within [3, 7]
        assert!((s.within_1sigma_pct - 75.0).abs() < 1e-9);
        assert!(s.skewness > 0.0);
    }

    #[test]
    fn constant_sequence_score() {
        // 100% within both bands: penalties 30 (capped) + 5.
        let n = normality_score(&[6, 6, 6]);
        assert!((n.score - 65.0).abs() < 1e-9);
    }

    #[test]
    fn score_stays_in_bounds_for_extreme_sequences() {
        let seqs: Vec<Vec<usize>> = vec![
            vec![0, 1000],
            vec![0, 0, 0, 0, 0, 0, 0, 0, 0, 500],
            vec![1, 2],
            (0..200).map(|i| i * i).collect(),
        ];
        for s in seqs {
            let n = normality_score(&s);
            assert!((0.0..=100.0).contains(&n.score), "{s:?} -> {}", n.score);
        }
    }

    #[test]
    fn penalties_are_capped() {
        let n = normality_score(&[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 100]);
        assert!(n.sigma1_penalty <= 30.0);
        assert!(n.sigma2_penalty <= 20.0);
        assert_eq!(n.skew_penalty, 20.0);
        assert_eq!(n.kurtosis_penalty, 15.0);
    }
}
