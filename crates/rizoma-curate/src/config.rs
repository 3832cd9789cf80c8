//! Curation configuration loaded from environment variables.
//!
//! Every field has a default matching the tuned values of the curation
//! passes. CLI flags override individual fields after loading.
//!
//! | Variable                         | Default | Description                                          |
//! |----------------------------------|---------|------------------------------------------------------|
//! | `RIZOMA_SPIKE_DEGREE`            | `6`     | Degree value whose share `normalize --mode spike` flattens |
//! | `RIZOMA_SPIKE_TARGET_SHARE`      | `0.25`  | Share of all concepts the spike should shrink to     |
//! | `RIZOMA_STRONG_DEGREE`           | `10`    | Neighbors at or above this degree lose edges first   |
//! | `RIZOMA_BOOST_FLOOR`             | `5`     | Concepts at or below this degree get boosted         |
//! | `RIZOMA_BOOST_MIN_DEGREE`        | `6`     | Degree boosted concepts are raised toward            |
//! | `RIZOMA_BOOST_MIN_SCORE`         | `2.0`   | Candidate score a boost partner must exceed          |
//! | `RIZOMA_SIGMA_MAX_NODES`         | `100`   | Concepts processed per `normalize --mode sigma` run  |
//! | `RIZOMA_REBALANCE_MAX_MOVES`     | `40`    | Layer moves applied per rebalance run                |
//! | `RIZOMA_REBALANCE_OVER`          | `1.1`   | Over-represented when count > target × this          |
//! | `RIZOMA_REBALANCE_UNDER`         | `0.9`   | Under-represented when count < target × this        |
//! | `RIZOMA_HISTORY_CAPACITY`        | `200`   | Move records kept in the history file                |
//! | `RIZOMA_HISTORY_LOOKBACK`        | `80`    | Recent moves scanned for reversals                   |

// ─────────────────────────────────────────────
// NormalizeConfig
// ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeConfig {
    // -- spike flattening --
    /// Over-represented degree value.
    pub spike_degree: usize,
    /// Share of all concepts allowed to remain at the spike.
    pub spike_target_share: f64,
    /// Fraction of the excess that loses one edge.
    pub reduce_fraction: f64,
    /// Fraction of the excess that gains edges.
    pub increase_fraction: f64,
    /// Neighbors with at least this degree are removed first.
    pub strong_degree: usize,
    /// Candidate degree band that earns the moderate-degree bonus.
    pub band: (usize, usize),
    /// Degrees the increase group is pushed to: `.0` with probability
    /// `low_target_probability`, else `.1`.
    pub increase_targets: (usize, usize),
    pub low_target_probability: f64,
    pub spike_same_layer_bonus: f64,
    pub band_bonus: f64,

    // -- under-connected boosting --
    pub boost_floor: usize,
    pub boost_min_degree: usize,
    pub friend_of_friend_weight: f64,
    pub boost_same_layer_bonus: f64,
    pub shared_word_weight: f64,
    /// Candidate popularity bonus is `min(degree / divisor, cap)`.
    pub popularity_divisor: f64,
    pub popularity_cap: f64,
    /// Candidates must score strictly above this.
    pub boost_min_score: f64,

    // -- sigma boosting --
    pub sigma_max_nodes: usize,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            spike_degree: 6,
            spike_target_share: 0.25,
            reduce_fraction: 0.4,
            increase_fraction: 0.6,
            strong_degree: 10,
            band: (6, 9),
            increase_targets: (7, 8),
            low_target_probability: 0.6,
            spike_same_layer_bonus: 2.0,
            band_bonus: 1.0,
            boost_floor: 5,
            boost_min_degree: 6,
            friend_of_friend_weight: 10.0,
            boost_same_layer_bonus: 3.0,
            shared_word_weight: 0.5,
            popularity_divisor: 10.0,
            popularity_cap: 2.0,
            boost_min_score: 2.0,
            sigma_max_nodes: 100,
        }
    }
}

// ─────────────────────────────────────────────
// RebalanceConfig / HistoryConfig
// ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct RebalanceConfig {
    pub over_factor: f64,
    pub under_factor: f64,
    /// A candidate layer must score at least this share of the current layer.
    pub acceptance_ratio: f64,
    /// Multiplier for candidate layers sharing the current dimension.
    pub same_dimension_bonus: f64,
    /// Source layer must keep at least `target × min_source_ratio`.
    pub min_source_ratio: f64,
    /// Destination layer may grow to at most `target × max_dest_ratio`.
    pub max_dest_ratio: f64,
    pub max_moves: usize,
    /// Applying stops once every layer is inside `target × band`.
    pub settle_band: (f64, f64),
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        Self {
            over_factor: 1.1,
            under_factor: 0.9,
            acceptance_ratio: 0.5,
            same_dimension_bonus: 1.5,
            min_source_ratio: 0.8,
            max_dest_ratio: 1.2,
            max_moves: 40,
            settle_band: (0.7, 1.3),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Records kept after each append.
    pub capacity: usize,
    /// Most recent records scanned for a reversal.
    pub lookback: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: 200,
            lookback: 80,
        }
    }
}

// ─────────────────────────────────────────────
// CurateConfig
// ─────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurateConfig {
    pub normalize: NormalizeConfig,
    pub rebalance: RebalanceConfig,
    pub history: HistoryConfig,
}

impl CurateConfig {
    /// Load from environment variables, applying defaults where a variable
    /// is absent or unparseable.
    pub fn from_env() -> Self {
        let n = NormalizeConfig::default();
        let r = RebalanceConfig::default();
        let h = HistoryConfig::default();
        Self {
            normalize: NormalizeConfig {
                spike_degree:       env_parse("RIZOMA_SPIKE_DEGREE", n.spike_degree),
                spike_target_share: env_parse("RIZOMA_SPIKE_TARGET_SHARE", n.spike_target_share),
                strong_degree:      env_parse("RIZOMA_STRONG_DEGREE", n.strong_degree),
                boost_floor:        env_parse("RIZOMA_BOOST_FLOOR", n.boost_floor),
                boost_min_degree:   env_parse("RIZOMA_BOOST_MIN_DEGREE", n.boost_min_degree),
                boost_min_score:    env_parse("RIZOMA_BOOST_MIN_SCORE", n.boost_min_score),
                sigma_max_nodes:    env_parse("RIZOMA_SIGMA_MAX_NODES", n.sigma_max_nodes),
                ..n
            },
            rebalance: RebalanceConfig {
                max_moves:    env_parse("RIZOMA_REBALANCE_MAX_MOVES", r.max_moves),
                over_factor:  env_parse("RIZOMA_REBALANCE_OVER", r.over_factor),
                under_factor: env_parse("RIZOMA_REBALANCE_UNDER", r.under_factor),
                ..r
            },
            history: HistoryConfig {
                capacity: env_parse("RIZOMA_HISTORY_CAPACITY", h.capacity),
                lookback: env_parse("RIZOMA_HISTORY_LOOKBACK", h.lookback),
            },
        }
    }

    /// Reject combinations the passes cannot run with.
    pub fn validate(&self) -> Result<(), crate::CurateError> {
        let n = &self.normalize;
        if !(0.0..=1.0).contains(&n.spike_target_share) {
            return Err(crate::CurateError::Config(format!(
                "spike target share must be within [0, 1], got {}",
                n.spike_target_share
            )));
        }
        if n.popularity_divisor <= 0.0 {
            return Err(crate::CurateError::Config(
                "popularity divisor must be positive".into(),
            ));
        }
        if self.history.capacity == 0 {
            return Err(crate::CurateError::Config(
                "history capacity must be at least 1".into(),
            ));
        }
        if self.rebalance.under_factor >= self.rebalance.over_factor {
            return Err(crate::CurateError::Config(format!(
                "rebalance under factor {} must be below over factor {}",
                self.rebalance.under_factor, self.rebalance.over_factor
            )));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
