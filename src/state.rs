//! The game-state capability consumed by the search engine.
//!
//! The engine never inspects board contents. Everything it needs (who can move,
//! where to, what a position is worth) goes through [`GameState`]. Expansion
//! always clones the parent state before applying a move, so implementations
//! must make `clone` a full value copy.

use crate::error::ModelError;

/// One of the two sides of the game.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Side {
    /// Moves on even move counts. Positive scores favour this side.
    One,
    /// Moves on odd move counts.
    Two,
}

impl Side {
    /// Side to move after `total_moves` moves have been played.
    #[inline]
    pub fn to_move(total_moves: u32) -> Side {
        if total_moves % 2 == 0 { Side::One } else { Side::Two }
    }

    /// The other side.
    #[inline]
    pub fn opponent(self) -> Side {
        match self {
            Side::One => Side::Two,
            Side::Two => Side::One,
        }
    }
}

/// A position of a two-player, pawn-based board game.
pub trait GameState: Clone {
    /// A destination (or any other move description) for a single pawn.
    type Move;

    /// Indices of `side`'s pawns that have at least one legal move.
    fn movable_pawns(&self, side: Side) -> Vec<usize>;

    /// Legal moves for pawn `pawn` of `side`.
    fn legal_moves(&self, side: Side, pawn: usize) -> Vec<Self::Move>;

    /// Apply `mv` for pawn `pawn` of `side`, advancing the move counter.
    fn apply_move(&mut self, side: Side, pawn: usize, mv: &Self::Move);

    /// Whether the game is over.
    fn is_terminal(&self) -> bool;

    /// Signed evaluation; positive favours [`Side::One`].
    fn score(&self) -> f64;

    /// Number of moves played so far. Its parity decides the side to move.
    fn total_moves(&self) -> u32;

    /// Board edge length, part of the scoring-model cache key.
    fn board_size(&self) -> usize;

    /// Starting pawns per side, part of the scoring-model cache key.
    fn pawn_count(&self) -> usize;
}

/// Turns a game state into the fixed-length input of a scoring model.
pub trait StateEncoder<S>: Send + Sync {
    /// Encode `state`. Every state of one board configuration must yield the same
    /// length.
    fn encode(&self, state: &S) -> Result<Vec<f32>, ModelError>;
}
