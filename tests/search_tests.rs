//! Integration tests for the search engine.
//!
//! Most tests run on a hand-built game tree where every position is a node id,
//! every node has a fixed score, and the only "pawn" moves to a child id. That
//! keeps expected values easy to work out by hand.

use std::sync::Arc;

use draughts_search::bot::{Bot, CancelToken};
use draughts_search::config::SearchConfig;
use draughts_search::error::ModelError;
use draughts_search::network::{ModelCache, NeuralGuide, ScoringModel};
use draughts_search::node::SearchNode;
use draughts_search::policy::{PolicyContext, SelectionPolicy, uct_probs};
use draughts_search::state::{GameState, Side, StateEncoder};

// =============================================================================
// Fixture: an explicit game tree
// =============================================================================

struct Tree {
    children: Vec<Vec<usize>>,
    scores: Vec<f64>,
}

#[derive(Clone)]
struct TreeGame {
    tree: Arc<Tree>,
    at: usize,
    total_moves: u32,
}

impl TreeGame {
    fn new(children: Vec<Vec<usize>>, scores: Vec<f64>) -> Self {
        assert_eq!(children.len(), scores.len());
        Self {
            tree: Arc::new(Tree { children, scores }),
            at: 0,
            total_moves: 0,
        }
    }

    fn with_total_moves(mut self, total_moves: u32) -> Self {
        self.total_moves = total_moves;
        self
    }

    fn moves(&self) -> &[usize] {
        &self.tree.children[self.at]
    }
}

impl GameState for TreeGame {
    type Move = usize;

    fn movable_pawns(&self, _side: Side) -> Vec<usize> {
        if self.moves().is_empty() { vec![] } else { vec![0] }
    }

    fn legal_moves(&self, _side: Side, _pawn: usize) -> Vec<usize> {
        self.moves().to_vec()
    }

    fn apply_move(&mut self, _side: Side, _pawn: usize, mv: &usize) {
        self.at = *mv;
        self.total_moves += 1;
    }

    fn is_terminal(&self) -> bool {
        self.moves().is_empty()
    }

    fn score(&self) -> f64 {
        self.tree.scores[self.at]
    }

    fn total_moves(&self) -> u32 {
        self.total_moves
    }

    fn board_size(&self) -> usize {
        1
    }

    fn pawn_count(&self) -> usize {
        1
    }
}

/// Root with two children; each child has two leaves.
///
/// ```text
///          0
///       /     \
///      1       2
///     / \     / \
///    3   4   5   6
///   3.0 5.0 2.0 9.0
/// ```
fn two_ply() -> TreeGame {
    TreeGame::new(
        vec![vec![1, 2], vec![3, 4], vec![5, 6], vec![], vec![], vec![], vec![]],
        vec![0.0, 0.0, 0.0, 3.0, 5.0, 2.0, 9.0],
    )
}

/// Root with a winning and a losing terminal child.
fn win_or_lose() -> TreeGame {
    TreeGame::new(vec![vec![1, 2], vec![], vec![]], vec![0.0, 1.0, -1.0])
}

fn lone_root() -> TreeGame {
    TreeGame::new(vec![vec![]], vec![0.25])
}

fn bot() -> Bot<TreeGame> {
    Bot::with_config(SearchConfig::for_testing())
}

fn horizon_bot() -> Bot<TreeGame> {
    Bot::with_config(SearchConfig::for_testing().with_score_horizon(true))
}

// =============================================================================
// Node expansion and statistics
// =============================================================================

#[test]
fn test_children_idempotent() {
    let mut root = SearchNode::new(two_ply());
    let first: Vec<usize> = root.children().iter().map(|c| c.state.at).collect();
    let second: Vec<usize> = root.children().iter().map(|c| c.state.at).collect();
    assert_eq!(first, vec![1, 2]);
    assert_eq!(first, second);
}

#[test]
fn test_children_follow_move_order() {
    let mut root = SearchNode::new(two_ply());
    let leaves: Vec<usize> = root.children()[1].children().iter().map(|c| c.state.at).collect();
    assert_eq!(leaves, vec![5, 6]);
    assert!(root.children()[1].children().iter().all(|c| c.depth == 2));
}

fn estimates_at(total_moves: u32) -> Vec<f64> {
    let mut root = SearchNode::new(win_or_lose().with_total_moves(total_moves));
    let children = root.children();
    children[0].visit_count = 10;
    children[0].score_total = 5.0;
    root.score_estimates()
}

#[test]
fn test_score_estimates_even_parity() {
    assert_eq!(estimates_at(0), vec![0.5, 0.0]);
    assert_eq!(estimates_at(4), vec![0.5, 0.0]);
}

#[test]
fn test_score_estimates_odd_parity() {
    let estimates = estimates_at(3);
    assert_eq!(estimates[0], -0.5);
    assert_eq!(estimates[1], 0.0);
}

// =============================================================================
// MCTS
// =============================================================================

#[test]
fn test_visit_count_matches_rollouts() {
    for k in [1, 7, 25] {
        let mut root = SearchNode::new(two_ply());
        let (_, node) = bot().run_mcts(&mut root, k, 10).unwrap();
        assert_eq!(node.visit_count, k as u32);
    }
}

#[test]
fn test_mcts_prefers_winning_child() {
    let mut bot = bot();
    let mut root = SearchNode::new(win_or_lose());
    let (best, node) = bot.run_mcts(&mut root, 40, 5).unwrap();
    assert_eq!(best, 0);
    assert_eq!(node.expanded_children().unwrap()[best].state.at, 1);
}

#[test]
fn test_rollout_expands_depth_limit_node() {
    let mut root = SearchNode::new(two_ply());
    bot().run_mcts(&mut root, 10, 1);
    // Nodes at the limit are expanded by the policy pick but scored where they
    // stand, so their children are never visited.
    let children = root.expanded_children().unwrap();
    let visited: Vec<_> = children.iter().filter(|c| c.visit_count > 0).collect();
    assert!(!visited.is_empty());
    for child in visited {
        assert!(child.is_expanded());
        assert_eq!(child.score_total, 0.0);
        assert!(child.visit_counts().iter().all(|&n| n == 0));
    }
    assert_eq!(root.visit_count, 10);
}

#[test]
fn test_rollout_adds_same_result_along_path() {
    let mut root = SearchNode::new(two_ply());
    bot().run_mcts(&mut root, 1, 10);
    let child = root
        .expanded_children()
        .unwrap()
        .iter()
        .find(|c| c.visit_count == 1)
        .unwrap();
    let leaf = child
        .expanded_children()
        .unwrap()
        .iter()
        .find(|c| c.visit_count == 1)
        .unwrap();
    assert_eq!(root.score_total, leaf.score_total);
    assert_eq!(child.score_total, leaf.score_total);
    assert_eq!(leaf.score_total, leaf.state.score());
}

#[test]
fn test_mcts_counts_processed_nodes() {
    let mut bot = bot();
    let mut root = SearchNode::new(two_ply());
    bot.run_mcts(&mut root, 30, 10);
    assert_eq!(bot.nodes_processed(), root.subtree_nodes_processed());
    assert!(bot.nodes_processed() >= 2);
}

#[test]
fn test_uct_probs_sum_to_one() {
    let mut root = SearchNode::new(two_ply());
    bot().run_mcts(&mut root, 15, 10);
    let probs = uct_probs(&root).unwrap();
    assert_eq!(probs.len(), 2);
    assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-9);
}

// =============================================================================
// Positions without moves
// =============================================================================

#[test]
fn test_zero_move_root_mcts() {
    let mut root = SearchNode::new(lone_root());
    assert!(bot().run_mcts(&mut root, 20, 6).is_none());
}

#[test]
fn test_zero_move_root_baseline() {
    let mut root = SearchNode::new(lone_root());
    assert!(bot().choose_baseline(&mut root).is_none());
}

#[test]
fn test_zero_move_root_alpha_beta_sentinel() {
    let mut bot = bot();
    let mut root = SearchNode::new(lone_root());
    let (evaluation, best) = bot.alpha_beta(&mut root, 3, f64::NEG_INFINITY, f64::INFINITY, true);
    assert_eq!(evaluation, f64::NEG_INFINITY);
    assert!(best.is_none());

    let (evaluation, best) = bot.alpha_beta(&mut root, 1, f64::NEG_INFINITY, f64::INFINITY, false);
    assert_eq!(evaluation, f64::INFINITY);
    assert!(best.is_none());
    assert_eq!(bot.nodes_processed(), 0);
}

// =============================================================================
// Alpha-beta
// =============================================================================

#[test]
fn test_alpha_beta_depth_zero_returns_node_itself() {
    let mut bot = bot();
    let mut root = SearchNode::new(two_ply());
    let (evaluation, best) = bot.alpha_beta(&mut root, 0, f64::NEG_INFINITY, f64::INFINITY, true);
    let best = best.unwrap();
    assert_eq!(evaluation, 0.0);
    assert_eq!(best.state.at, 0);
    assert_eq!(best.depth, 0);
    assert!(!best.is_expanded());
}

#[test]
fn test_alpha_beta_finds_minimax_move() {
    let mut bot = horizon_bot();
    let mut root = SearchNode::new(two_ply());
    let (evaluation, best) = bot.search_alpha_beta(&mut root);
    // Node 1 guarantees min(3, 5) = 3; node 2 only min(2, 9) = 2.
    assert_eq!(evaluation, 3.0);
    assert_eq!(best.unwrap().state.at, 1);
}

#[test]
fn test_alpha_beta_prunes() {
    let mut bot = horizon_bot();
    let mut root = SearchNode::new(two_ply());
    bot.alpha_beta(&mut root, 2, f64::NEG_INFINITY, f64::INFINITY, true);
    // Six child iterations without pruning; leaf 6 is cut off after leaf 5.
    assert_eq!(bot.nodes_processed(), 4);
    let pruned_parent = &root.expanded_children().unwrap()[1];
    assert_eq!(pruned_parent.expanded_children().unwrap().len(), 2);
}

#[test]
fn test_alpha_beta_window_widening_keeps_move() {
    let mut narrow_bot = horizon_bot();
    let mut narrow_root = SearchNode::new(two_ply());
    let (narrow_eval, narrow_best) = narrow_bot.alpha_beta(&mut narrow_root, 2, 2.5, 4.0, true);
    let narrow_at = narrow_best.unwrap().state.at;

    let mut wide_bot = horizon_bot();
    let mut wide_root = SearchNode::new(two_ply());
    let (wide_eval, wide_best) =
        wide_bot.alpha_beta(&mut wide_root, 2, f64::NEG_INFINITY, f64::INFINITY, true);

    assert_eq!(narrow_at, wide_best.unwrap().state.at);
    assert_eq!(narrow_eval, wide_eval);
}

#[test]
fn test_alpha_beta_minimizing_root() {
    let mut bot = horizon_bot();
    let mut root = SearchNode::new(two_ply().with_total_moves(1));
    let (evaluation, best) = bot.search_alpha_beta(&mut root);
    // Side two minimises: node 1 allows max(3, 5) = 5, node 2 allows 9.
    assert_eq!(evaluation, 5.0);
    assert_eq!(best.unwrap().state.at, 1);
}

// =============================================================================
// Cancellation
// =============================================================================

#[test]
fn test_cancelled_alpha_beta_returns_sentinel() {
    let token = CancelToken::new();
    let mut bot = horizon_bot().with_cancel_token(token.clone());
    token.cancel();
    let mut root = SearchNode::new(two_ply());
    let (evaluation, best) = bot.alpha_beta(&mut root, 2, f64::NEG_INFINITY, f64::INFINITY, true);
    assert_eq!(evaluation, f64::NEG_INFINITY);
    assert!(best.is_none());
    assert_eq!(bot.nodes_processed(), 0);
}

#[test]
fn test_cancel_from_another_thread() {
    let token = CancelToken::new();
    let remote = token.clone();
    std::thread::spawn(move || remote.cancel()).join().unwrap();

    let mut bot = bot().with_cancel_token(token);
    let mut root = SearchNode::new(two_ply());
    let (_, node) = bot.run_mcts(&mut root, 1000, 10).unwrap();
    assert_eq!(node.visit_count, 0);
}

// =============================================================================
// Neural-weighted policy
// =============================================================================

struct NodeIdEncoder;

impl StateEncoder<TreeGame> for NodeIdEncoder {
    fn encode(&self, state: &TreeGame) -> Result<Vec<f32>, ModelError> {
        Ok(vec![state.at as f32])
    }
}

/// Strongly prefers one node id.
struct FavouriteModel(f32);

impl ScoringModel for FavouriteModel {
    fn score_batch(&self, batch: &[Vec<f32>]) -> Result<Vec<f32>, ModelError> {
        Ok(batch
            .iter()
            .map(|x| if x[0] == self.0 { 50.0 } else { -50.0 })
            .collect())
    }
}

struct BrokenModel;

impl ScoringModel for BrokenModel {
    fn score_batch(&self, _batch: &[Vec<f32>]) -> Result<Vec<f32>, ModelError> {
        Err(ModelError::Encoding("model unavailable".to_string()))
    }
}

/// Returns one score too few.
struct ShortModel;

impl ScoringModel for ShortModel {
    fn score_batch(&self, batch: &[Vec<f32>]) -> Result<Vec<f32>, ModelError> {
        Ok(vec![0.0; batch.len().saturating_sub(1)])
    }
}

fn guide_from(cache: &ModelCache, model: Arc<dyn ScoringModel>) -> NeuralGuide<TreeGame> {
    let model = cache.get_or_load((1, 1), || Ok(model)).unwrap();
    NeuralGuide::new(Arc::new(NodeIdEncoder), model)
}

#[test]
fn test_neural_policy_follows_model() {
    let cache = ModelCache::new();
    let guide = guide_from(&cache, Arc::new(FavouriteModel(2.0)));
    let mut rng = fastrand::Rng::with_seed(11);
    let mut root = SearchNode::with_policy(two_ply(), SelectionPolicy::NeuralWeighted);

    for _ in 0..20 {
        let mut ctx = PolicyContext {
            rng: &mut rng,
            guide: Some(&guide),
        };
        assert_eq!(root.choose_child(&mut ctx), Some(1));
    }
}

#[test]
fn test_neural_policy_uses_cached_model() {
    let cache = ModelCache::new();
    let first = guide_from(&cache, Arc::new(FavouriteModel(1.0)));
    // Second request for the same key reuses the first model.
    let second = guide_from(&cache, Arc::new(BrokenModel));
    assert_eq!(cache.len(), 1);

    let positions = [two_ply()];
    let scores = second.evaluate(positions.iter()).unwrap();
    assert_eq!(scores, first.evaluate(positions.iter()).unwrap());
}

#[test]
fn test_neural_policy_model_error_is_no_choice() {
    let cache = ModelCache::new();
    let guide = guide_from(&cache, Arc::new(BrokenModel));
    let mut rng = fastrand::Rng::with_seed(11);
    let mut root = SearchNode::with_policy(two_ply(), SelectionPolicy::NeuralWeighted);
    let mut ctx = PolicyContext {
        rng: &mut rng,
        guide: Some(&guide),
    };
    assert_eq!(root.choose_child(&mut ctx), None);
}

#[test]
fn test_neural_policy_short_batch_is_no_choice() {
    let guide = NeuralGuide::<TreeGame>::new(
        Arc::new(NodeIdEncoder),
        Arc::new(ShortModel) as Arc<dyn ScoringModel>,
    );
    let mut rng = fastrand::Rng::with_seed(11);
    let mut root = SearchNode::with_policy(two_ply(), SelectionPolicy::NeuralWeighted);
    let mut ctx = PolicyContext {
        rng: &mut rng,
        guide: Some(&guide),
    };
    assert_eq!(root.choose_child(&mut ctx), None);
}

#[test]
fn test_neural_mcts_descends_into_favourite() {
    let cache = ModelCache::new();
    let guide = guide_from(&cache, Arc::new(FavouriteModel(2.0)));
    let mut bot = bot().with_guide(guide);
    let mut root = SearchNode::with_policy(two_ply(), SelectionPolicy::NeuralWeighted);
    let (_, node) = bot.run_mcts(&mut root, 10, 10).unwrap();

    let visits = node.visit_counts();
    assert_eq!(visits, vec![0, 10]);
}
