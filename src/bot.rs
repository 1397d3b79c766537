//! The search engine.
//!
//! A [`Bot`] runs one of three strategies on a root [`SearchNode`]:
//!
//! - [`Bot::choose_baseline`] - uniformly random legal move
//! - [`Bot::run_mcts`] - rollouts guided by the node's selection policy, then the
//!   child with the best mean result
//! - [`Bot::alpha_beta`] - depth-limited minimax with alpha-beta pruning
//!
//! The bot keeps a cumulative count of processed nodes for telemetry. It has no
//! influence on the search itself.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, trace};

use crate::config::SearchConfig;
use crate::network::NeuralGuide;
use crate::node::SearchNode;
use crate::policy::{self, PolicyContext};
use crate::state::{GameState, Side};

/// Shared flag that asks a running search to stop early.
///
/// Checked before every rollout and before every alpha-beta child, so a
/// cancelled search returns after at most one more rollout or leaf.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Clear the flag so the token can be reused for the next search.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Search engine state carried across calls.
pub struct Bot<S> {
    nodes_processed: u64,
    rng: fastrand::Rng,
    config: SearchConfig,
    guide: Option<NeuralGuide<S>>,
    cancel: CancelToken,
}

impl<S: GameState> Default for Bot<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: GameState> Bot<S> {
    pub fn new() -> Self {
        Self::with_config(SearchConfig::default())
    }

    pub fn with_config(config: SearchConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        Self {
            nodes_processed: 0,
            rng,
            config,
            guide: None,
            cancel: CancelToken::new(),
        }
    }

    /// Attach the encoder and model used by nodes with the neural-weighted policy.
    pub fn with_guide(mut self, guide: NeuralGuide<S>) -> Self {
        self.guide = Some(guide);
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Cumulative processed-node count across all searches.
    pub fn nodes_processed(&self) -> u64 {
        self.nodes_processed
    }

    pub fn reset_counter(&mut self) {
        self.nodes_processed = 0;
    }

    /// Uniformly random child of `node`, or `None` if it has no moves.
    pub fn choose_baseline<'n>(&mut self, node: &'n mut SearchNode<S>) -> Option<&'n SearchNode<S>> {
        let index = policy::uniform_random(node, &mut self.rng)?;
        let node: &'n SearchNode<S> = node;
        node.expanded_children()?.get(index)
    }

    /// [`run_mcts`](Self::run_mcts) with the configured rollout count and depth.
    pub fn mcts<'n>(&mut self, node: &'n mut SearchNode<S>) -> Option<(usize, &'n SearchNode<S>)> {
        let (rollouts, max_depth) = (self.config.rollouts, self.config.max_depth);
        self.run_mcts(node, rollouts, max_depth)
    }

    /// Run `rollouts` rollouts from `node`, then pick the child with the highest
    /// score estimate.
    ///
    /// Returns the index of that child together with `node` itself, or `None` if
    /// `node` has no children. Ties go to the lowest index.
    pub fn run_mcts<'n>(
        &mut self,
        node: &'n mut SearchNode<S>,
        rollouts: usize,
        max_depth: usize,
    ) -> Option<(usize, &'n SearchNode<S>)> {
        let mut completed = 0;
        for _ in 0..rollouts {
            if self.cancel.is_cancelled() {
                debug!("mcts cancelled after {completed} of {rollouts} rollouts");
                break;
            }
            self.rollout(node, max_depth);
            completed += 1;
        }

        if node.children().is_empty() {
            return None;
        }
        let processed = node.subtree_nodes_processed();
        self.nodes_processed += processed;

        let estimates = node.score_estimates();
        let best = argmax(&estimates)?;
        debug!(
            "mcts: {completed} rollouts, {processed} nodes, best child {best} ({:.3})",
            estimates[best]
        );
        let node: &'n SearchNode<S> = node;
        Some((best, node))
    }

    /// One rollout: ask the selection policy for a child (expanding the node),
    /// stop at a terminal position, the depth limit, or a node with no pick, and
    /// otherwise descend. The leaf score is added unchanged to every node on the
    /// way back up.
    fn rollout(&mut self, node: &mut SearchNode<S>, max_depth: usize) -> f64 {
        let mut ctx = PolicyContext {
            rng: &mut self.rng,
            guide: self.guide.as_ref(),
        };
        let choice = node.choose_child(&mut ctx);
        let result = match choice {
            Some(index) if !node.state.is_terminal() && node.depth < max_depth => {
                self.rollout(&mut node.children()[index], max_depth)
            }
            _ => node.state.score(),
        };
        node.record_result(result);
        result
    }

    /// Alpha-beta search with the configured depth and an unbounded window.
    ///
    /// The root maximises when side one is to move.
    pub fn search_alpha_beta<'n>(
        &mut self,
        node: &'n mut SearchNode<S>,
    ) -> (f64, Option<&'n SearchNode<S>>) {
        let depth = self.config.alpha_beta_depth;
        let maximizing = Side::to_move(node.state.total_moves()) == Side::One;
        self.alpha_beta(node, depth, f64::NEG_INFINITY, f64::INFINITY, maximizing)
    }

    /// Minimax with alpha-beta pruning.
    ///
    /// At `depth == 0` returns `(0.0, Some(node))` (or the board score when
    /// [`SearchConfig::score_horizon`] is set). A node without children returns
    /// the initial `-inf` / `+inf` sentinel and no move. Each child searched
    /// without triggering the cut-off adds one to the processed-node count.
    pub fn alpha_beta<'n>(
        &mut self,
        node: &'n mut SearchNode<S>,
        depth: usize,
        mut alpha: f64,
        mut beta: f64,
        maximizing: bool,
    ) -> (f64, Option<&'n SearchNode<S>>) {
        if depth == 0 {
            let evaluation = if self.config.score_horizon {
                node.state.score()
            } else {
                0.0
            };
            let node: &'n SearchNode<S> = node;
            return (evaluation, Some(node));
        }

        let count = node.children().len();
        let mut best: Option<usize> = None;
        let mut best_evaluation = if maximizing {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };

        for j in 0..count {
            if self.cancel.is_cancelled() {
                debug!("alpha-beta cancelled at depth {depth}");
                break;
            }
            let (evaluation, _) =
                self.alpha_beta(&mut node.children()[j], depth - 1, alpha, beta, !maximizing);
            if maximizing {
                if best_evaluation < evaluation {
                    best_evaluation = evaluation;
                    best = Some(j);
                    alpha = alpha.max(best_evaluation);
                }
            } else if best_evaluation > evaluation {
                best_evaluation = evaluation;
                best = Some(j);
                beta = beta.min(best_evaluation);
            }
            if beta <= alpha {
                trace!("pruned {} siblings at depth {depth}", count - j - 1);
                break;
            }
            self.nodes_processed += 1;
        }

        let node: &'n SearchNode<S> = node;
        let best_move = best.and_then(|j| node.expanded_children()?.get(j));
        (best_evaluation, best_move)
    }
}

/// Index of the first maximum.
fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if b >= v => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}
