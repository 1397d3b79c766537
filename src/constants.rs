//! Constants for board configurations and search parameters.
//!
//! These are the defaults the engine and the command line driver fall back to
//! when nothing else is configured. Runtime overrides go through
//! [`SearchConfig`](crate::config::SearchConfig).

// =============================================================================
// Board Configurations
// =============================================================================

/// Board sizes the driver knows how to set up.
pub const SUPPORTED_BOARD_SIZES: [usize; 3] = [6, 8, 10];

/// Board size used when an unsupported size is requested.
pub const DEFAULT_BOARD_SIZE: usize = 8;

/// Pawn counts (per side) accepted on an 8x8 board.
pub const PAWN_OPTIONS_8X8: [usize; 3] = [6, 9, 12];

/// Pawns per side on a 6x6 board.
pub const PAWNS_6X6: usize = 6;

/// Pawns per side on a 10x10 board.
pub const PAWNS_10X10: usize = 20;

/// Number of games simulated when none (or a negative count) is given.
pub const DEFAULT_NUM_GAMES: usize = 100;

// =============================================================================
// Search Parameters
// =============================================================================

/// Default number of rollouts per MCTS call.
pub const DEFAULT_ROLLOUTS: usize = 50;

/// Default maximum depth of a single rollout (in plies from the tree root).
pub const DEFAULT_MAX_DEPTH: usize = 6;

/// Default alpha-beta search depth used by the match driver.
pub const DEFAULT_ALPHA_BETA_DEPTH: usize = 4;

// =============================================================================
// Game Limits
// =============================================================================

/// Hard cap on turns per game so that a match always terminates.
pub const MAX_GAME_TURNS: usize = 400;

/// Consecutive turns without progress of the move counter before a game is
/// abandoned.
pub const MAX_PASSES: usize = 5;

/// Returns the pawn count used for a board size, or `None` when the size needs
/// an explicit choice (8x8 offers several).
pub fn fixed_pawn_count(board_size: usize) -> Option<usize> {
    match board_size {
        6 => Some(PAWNS_6X6),
        10 => Some(PAWNS_10X10),
        _ => None,
    }
}

/// Normalise a requested board size: anything unsupported becomes the default.
pub fn accept_board_size(size: i64) -> usize {
    match usize::try_from(size) {
        Ok(s) if SUPPORTED_BOARD_SIZES.contains(&s) => s,
        _ => DEFAULT_BOARD_SIZE,
    }
}

/// Normalise a requested game count: negative values become the default.
pub fn accept_num_games(games: i64) -> usize {
    usize::try_from(games).unwrap_or(DEFAULT_NUM_GAMES)
}
