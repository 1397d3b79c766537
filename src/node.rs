//! Search tree nodes.
//!
//! A [`SearchNode`] owns one game state, the statistics gathered by rollouts
//! through it, and (once asked for) its children. Children are generated lazily
//! on the first call to [`SearchNode::children`] and never regenerated; only the
//! statistics of a node change after that. Every node owns its children
//! outright, so the tree never shares a subtree between two parents.

use crate::policy::{PolicyContext, SelectionPolicy};
use crate::state::{GameState, Side};

/// Expansion state of a node.
#[derive(Debug, Clone)]
pub enum Children<S> {
    /// Successors have not been generated yet.
    Unexpanded,
    /// Successors in generation order. Empty for a blocked or finished position.
    Expanded(Vec<SearchNode<S>>),
}

/// A node in the search tree.
#[derive(Debug, Clone)]
pub struct SearchNode<S> {
    /// The position this node represents
    pub state: S,
    /// Plies from the tree root
    pub depth: usize,
    /// Number of completed rollouts through this node
    pub visit_count: u32,
    /// Sum of rollout results
    pub score_total: f64,
    /// Mean rollout result (0 until the first rollout)
    pub score_estimate: f64,
    /// Children materialised directly under this node
    pub nodes_processed: u64,
    children: Children<S>,
    policy: SelectionPolicy,
}

impl<S: GameState> SearchNode<S> {
    /// Create a root node using the default (UCT softmax) selection policy.
    pub fn new(state: S) -> Self {
        Self::with_policy(state, SelectionPolicy::default())
    }

    /// Create a root node with an explicit selection policy, inherited by every
    /// node generated below it.
    pub fn with_policy(state: S, policy: SelectionPolicy) -> Self {
        Self::at_depth(state, 0, policy)
    }

    fn at_depth(state: S, depth: usize, policy: SelectionPolicy) -> Self {
        Self {
            state,
            depth,
            visit_count: 0,
            score_total: 0.0,
            score_estimate: 0.0,
            nodes_processed: 0,
            children: Children::Unexpanded,
            policy,
        }
    }

    #[inline]
    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    #[inline]
    pub fn is_expanded(&self) -> bool {
        matches!(self.children, Children::Expanded(_))
    }

    /// Successors of this node, generating them on first use.
    ///
    /// The side to move follows the parity of the state's move counter. Every
    /// (pawn, destination) pair of that side yields one child, in pawn order
    /// then move order. An empty slice means the position has no legal move.
    pub fn children(&mut self) -> &mut [SearchNode<S>] {
        if !self.is_expanded() {
            let generated = self.generate_children();
            self.nodes_processed += generated.len() as u64;
            self.children = Children::Expanded(generated);
        }
        match &mut self.children {
            Children::Expanded(children) => children,
            Children::Unexpanded => &mut [],
        }
    }

    /// Successors if they have already been generated.
    pub fn expanded_children(&self) -> Option<&[SearchNode<S>]> {
        match &self.children {
            Children::Expanded(children) => Some(children),
            Children::Unexpanded => None,
        }
    }

    fn generate_children(&self) -> Vec<SearchNode<S>> {
        let side = Side::to_move(self.state.total_moves());
        let mut out = Vec::new();
        for pawn in self.state.movable_pawns(side) {
            for mv in self.state.legal_moves(side, pawn) {
                let mut next = self.state.clone();
                next.apply_move(side, pawn, &mv);
                out.push(SearchNode::at_depth(next, self.depth + 1, self.policy));
            }
        }
        out
    }

    /// Mean result of each child, seen from side one.
    ///
    /// When this node's move counter is odd (side two produced the children) the
    /// estimates are negated. Unvisited children report 0. Empty if the node has
    /// not been expanded.
    pub fn score_estimates(&self) -> Vec<f64> {
        let flip = self.state.total_moves() % 2 != 0;
        self.expanded_children()
            .unwrap_or_default()
            .iter()
            .map(|child| {
                let q = if child.visit_count != 0 {
                    child.score_total / child.visit_count as f64
                } else {
                    0.0
                };
                if flip { -q } else { q }
            })
            .collect()
    }

    /// Visit count of each child, aligned with [`score_estimates`](Self::score_estimates).
    pub fn visit_counts(&self) -> Vec<u32> {
        self.expanded_children()
            .unwrap_or_default()
            .iter()
            .map(|child| child.visit_count)
            .collect()
    }

    /// Pick a child index with this node's selection policy.
    pub fn choose_child(&mut self, ctx: &mut PolicyContext<'_, S>) -> Option<usize> {
        self.policy.choose(self, ctx)
    }

    /// Fold one rollout result into the statistics.
    pub fn record_result(&mut self, result: f64) {
        self.visit_count += 1;
        self.score_total += result;
        self.score_estimate = self.score_total / self.visit_count as f64;
    }

    /// Children materialised anywhere in this subtree, this node included.
    pub fn subtree_nodes_processed(&self) -> u64 {
        self.nodes_processed
            + self
                .expanded_children()
                .unwrap_or_default()
                .iter()
                .map(SearchNode::subtree_nodes_processed)
                .sum::<u64>()
    }

    /// Detach child `index` as a new root, keeping its explored subtree.
    pub fn into_child(self, index: usize) -> Option<SearchNode<S>> {
        let Children::Expanded(mut children) = self.children else {
            return None;
        };
        if index >= children.len() {
            return None;
        }
        let mut child = children.swap_remove(index);
        child.rebase(self.depth + 1);
        Some(child)
    }

    fn rebase(&mut self, by: usize) {
        self.depth -= by;
        if let Children::Expanded(children) = &mut self.children {
            for child in children {
                child.rebase(by);
            }
        }
    }
}
