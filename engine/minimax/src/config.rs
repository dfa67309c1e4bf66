//! Search configuration parameters.

/// Configuration for the budgeted minimax search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Expansion credit handed to every root child.
    ///
    /// Each expanded node divides its credit evenly among its legal moves;
    /// a subtree stops growing once its share drops below 1. The number of
    /// nodes expanded per root move is therefore roughly bounded by this value.
    pub dilution_limit: f64,

    /// Number of greedy rollouts run from the root after expansion.
    /// Rollouts add sparse, deep lines the dilution budget cannot reach.
    pub rollouts: u32,

    /// New plies a single rollout may add before it stops.
    pub rollout_depth: u32,

    /// Hard cap on expansion depth below the root children.
    pub max_depth: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            dilution_limit: 256.0,
            rollouts: 64,
            rollout_depth: 5,
            max_depth: 64,
        }
    }
}

impl SearchConfig {
    /// Create config for self-play data generation.
    pub fn for_training() -> Self {
        Self::default()
    }

    /// Create config for arena games (wider expansion, more rollouts).
    pub fn for_evaluation() -> Self {
        Self {
            dilution_limit: 1024.0,
            rollouts: 256,
            rollout_depth: 8,
            max_depth: 64,
        }
    }

    /// Create a fast config for testing.
    pub fn for_testing() -> Self {
        Self {
            dilution_limit: 64.0,
            rollouts: 8,
            rollout_depth: 3,
            max_depth: 16,
        }
    }

    /// Builder pattern: set dilution limit.
    pub fn with_dilution_limit(mut self, limit: f64) -> Self {
        self.dilution_limit = limit;
        self
    }

    /// Builder pattern: set number of rollouts.
    pub fn with_rollouts(mut self, n: u32) -> Self {
        self.rollouts = n;
        self
    }

    /// Builder pattern: set rollout depth.
    pub fn with_rollout_depth(mut self, depth: u32) -> Self {
        self.rollout_depth = depth;
        self
    }

    /// Builder pattern: set maximum expansion depth.
    pub fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SearchConfig::default();
        assert!((config.dilution_limit - 256.0).abs() < 1e-9);
        assert_eq!(config.rollouts, 64);
        assert_eq!(config.rollout_depth, 5);
    }

    #[test]
    fn test_builder_pattern() {
        let config = SearchConfig::default()
            .with_dilution_limit(16.0)
            .with_rollouts(0)
            .with_max_depth(2);

        assert!((config.dilution_limit - 16.0).abs() < 1e-9);
        assert_eq!(config.rollouts, 0);
        assert_eq!(config.max_depth, 2);
    }

    #[test]
    fn test_evaluation_config_is_wider() {
        let eval = SearchConfig::for_evaluation();
        let train = SearchConfig::for_training();
        assert!(eval.dilution_limit > train.dilution_limit);
        assert!(eval.rollouts > train.rollouts);
    }
}
