//! Child selection policies.
//!
//! A policy looks at a node and picks one of its children by index, or returns
//! `None` when there is nothing to pick. `None` is also the answer whenever a
//! policy cannot produce a usable distribution (missing model, encoding error,
//! non-finite scores); callers treat it the same as a position without moves.
//!
//! All three policies sample rather than maximise, so repeated rollouts from the
//! same node spread over its children.

use log::debug;

use crate::network::NeuralGuide;
use crate::node::SearchNode;
use crate::state::GameState;

/// Which policy a subtree uses to pick children during rollouts.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum SelectionPolicy {
    /// Every child equally likely.
    UniformRandom,
    /// Softmax over UCT values.
    #[default]
    UctSoftmax,
    /// Softmax over scoring-model outputs for each child position.
    NeuralWeighted,
}

/// What a policy may draw on besides the node itself.
pub struct PolicyContext<'a, S> {
    pub rng: &'a mut fastrand::Rng,
    pub guide: Option<&'a NeuralGuide<S>>,
}

impl SelectionPolicy {
    /// Select a child of `node`.
    pub fn choose<S: GameState>(
        self,
        node: &mut SearchNode<S>,
        ctx: &mut PolicyContext<'_, S>,
    ) -> Option<usize> {
        match self {
            SelectionPolicy::UniformRandom => uniform_random(node, ctx.rng),
            SelectionPolicy::UctSoftmax => uct_softmax(node, ctx.rng),
            SelectionPolicy::NeuralWeighted => neural_weighted(node, ctx.guide, ctx.rng),
        }
    }
}

/// UCT value of a child with mean `q` and `child_visits` visits under a parent
/// visited `parent_visits` times.
#[inline]
pub fn compute_uct(q: f64, parent_visits: u32, child_visits: u32) -> f64 {
    q + ((parent_visits as f64 + 1.0).ln() / (child_visits as f64 + 1.0)).sqrt()
}

/// Normalised exponentials of `values`.
///
/// Shifted by the maximum before exponentiating. Returns `None` for an empty
/// input or when any value is not finite.
pub fn softmax(values: &[f64]) -> Option<Vec<f64>> {
    if values.is_empty() || values.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exp: Vec<f64> = values.iter().map(|v| (v - max).exp()).collect();
    let sum: f64 = exp.iter().sum();
    if !(sum.is_finite() && sum > 0.0) {
        return None;
    }
    Some(exp.into_iter().map(|e| e / sum).collect())
}

/// Draw an index with probability proportional to `probs`.
pub fn sample_index(probs: &[f64], rng: &mut fastrand::Rng) -> Option<usize> {
    let total: f64 = probs.iter().sum();
    if probs.is_empty() || !(total.is_finite() && total > 0.0) {
        return None;
    }
    let mut target = rng.f64() * total;
    for (i, &p) in probs.iter().enumerate() {
        if target < p {
            return Some(i);
        }
        target -= p;
    }
    // Rounding left a sliver past the end; fall back to the last live index.
    probs.iter().rposition(|&p| p > 0.0)
}

/// Softmax of the UCT values of `node`'s expanded children.
pub fn uct_probs<S: GameState>(node: &SearchNode<S>) -> Option<Vec<f64>> {
    let parent_visits = node.visit_count;
    let uct: Vec<f64> = node
        .score_estimates()
        .into_iter()
        .zip(node.visit_counts())
        .map(|(q, n)| compute_uct(q, parent_visits, n))
        .collect();
    softmax(&uct)
}

pub fn uniform_random<S: GameState>(
    node: &mut SearchNode<S>,
    rng: &mut fastrand::Rng,
) -> Option<usize> {
    let n = node.children().len();
    if n == 0 {
        return None;
    }
    Some(rng.usize(..n))
}

pub fn uct_softmax<S: GameState>(
    node: &mut SearchNode<S>,
    rng: &mut fastrand::Rng,
) -> Option<usize> {
    node.children();
    let probs = uct_probs(node)?;
    sample_index(&probs, rng)
}

pub fn neural_weighted<S: GameState>(
    node: &mut SearchNode<S>,
    guide: Option<&NeuralGuide<S>>,
    rng: &mut fastrand::Rng,
) -> Option<usize> {
    let Some(guide) = guide else {
        debug!("neural policy requested without a scoring model");
        return None;
    };
    let children = node.children();
    if children.is_empty() {
        return None;
    }
    let weights = match guide.evaluate(children.iter().map(|c| &c.state)) {
        Ok(weights) => weights,
        Err(err) => {
            debug!("neural policy degraded to no choice: {err}");
            return None;
        }
    };
    let probs = softmax(&weights)?;
    sample_index(&probs, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;

    #[test]
    fn test_compute_uct() {
        // Unvisited parent and child: exploration term is sqrt(ln 1 / 1) = 0.
        assert_eq!(compute_uct(0.5, 0, 0), 0.5);
        let fresh = compute_uct(0.0, 10, 0);
        let visited = compute_uct(0.0, 10, 9);
        assert!(fresh > visited);
        assert!((fresh - (11f64).ln().sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0, -4.0]).unwrap();
        let sum: f64 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(probs.iter().all(|&p| p > 0.0));
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
    }

    #[test]
    fn test_softmax_large_values_stay_finite() {
        let probs = softmax(&[1000.0, 1000.0]).unwrap();
        assert!((probs[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_softmax_rejects_bad_input() {
        assert!(softmax(&[]).is_none());
        assert!(softmax(&[1.0, f64::NAN]).is_none());
        assert!(softmax(&[f64::INFINITY]).is_none());
    }

    #[test]
    fn test_sample_index_follows_weights() {
        let mut rng = fastrand::Rng::with_seed(3);
        assert_eq!(sample_index(&[0.0, 1.0, 0.0], &mut rng), Some(1));
        assert_eq!(sample_index(&[], &mut rng), None);
        assert_eq!(sample_index(&[0.0, 0.0], &mut rng), None);

        let mut hits = [0usize; 2];
        for _ in 0..2000 {
            hits[sample_index(&[0.9, 0.1], &mut rng).unwrap()] += 1;
        }
        assert!(hits[0] > hits[1] * 4);
    }

    #[test]
    fn test_uniform_random_on_terminal() {
        let mut rng = fastrand::Rng::with_seed(1);
        let mut node = SearchNode::new(Board::new(8, 0));
        assert_eq!(uniform_random(&mut node, &mut rng), None);
    }

    #[test]
    fn test_uct_softmax_picks_existing_child() {
        let mut rng = fastrand::Rng::with_seed(1);
        let mut node = SearchNode::new(Board::new(6, 6));
        let n = node.children().len();
        for _ in 0..50 {
            let pick = uct_softmax(&mut node, &mut rng).unwrap();
            assert!(pick < n);
        }
        let probs = uct_probs(&node).unwrap();
        assert_eq!(probs.len(), n);
        assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_neural_without_guide_is_no_choice() {
        let mut rng = fastrand::Rng::with_seed(1);
        let mut node = SearchNode::with_policy(Board::new(6, 6), SelectionPolicy::NeuralWeighted);
        let mut ctx = PolicyContext { rng: &mut rng, guide: None };
        assert_eq!(node.choose_child(&mut ctx), None);
    }
}
