//! Search configuration.

use crate::constants::{DEFAULT_ALPHA_BETA_DEPTH, DEFAULT_MAX_DEPTH, DEFAULT_ROLLOUTS};

/// Runtime parameters for a [`Bot`](crate::bot::Bot).
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Rollouts performed by [`Bot::mcts`](crate::bot::Bot::mcts).
    pub rollouts: usize,

    /// Maximum node depth a rollout descends to.
    pub max_depth: usize,

    /// Depth used by [`Bot::search_alpha_beta`](crate::bot::Bot::search_alpha_beta).
    pub alpha_beta_depth: usize,

    /// Evaluate the board at the alpha-beta horizon instead of returning 0.
    ///
    /// Off by default: the depth-limited cutoff historically returns a constant
    /// 0 and existing depth calibrations rely on that.
    pub score_horizon: bool,

    /// Seed for the bot's random number generator. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            rollouts: DEFAULT_ROLLOUTS,
            max_depth: DEFAULT_MAX_DEPTH,
            alpha_beta_depth: DEFAULT_ALPHA_BETA_DEPTH,
            score_horizon: false,
            seed: None,
        }
    }
}

impl SearchConfig {
    /// Small, seeded configuration for tests.
    pub fn for_testing() -> Self {
        Self {
            rollouts: 20,
            max_depth: 4,
            alpha_beta_depth: 2,
            score_horizon: false,
            seed: Some(7),
        }
    }

    /// Builder pattern: set number of rollouts.
    pub fn with_rollouts(mut self, n: usize) -> Self {
        self.rollouts = n;
        self
    }

    /// Builder pattern: set rollout depth limit.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Builder pattern: set alpha-beta depth.
    pub fn with_alpha_beta_depth(mut self, depth: usize) -> Self {
        self.alpha_beta_depth = depth;
        self
    }

    /// Builder pattern: toggle horizon evaluation.
    pub fn with_score_horizon(mut self, enabled: bool) -> Self {
        self.score_horizon = enabled;
        self
    }

    /// Builder pattern: set RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SearchConfig::default();
        assert_eq!(config.rollouts, 50);
        assert_eq!(config.max_depth, 6);
        assert_eq!(config.alpha_beta_depth, 4);
        assert!(!config.score_horizon);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_builder_pattern() {
        let config = SearchConfig::default()
            .with_rollouts(10)
            .with_max_depth(3)
            .with_score_horizon(true)
            .with_seed(42);

        assert_eq!(config.rollouts, 10);
        assert_eq!(config.max_depth, 3);
        assert!(config.score_horizon);
        assert_eq!(config.seed, Some(42));
    }
}
