//! Draughts-Search: game-tree search for a checkers-like board game.
//!
//! This crate provides three ways to pick a move from a position:
//! uniformly random baseline play, Monte Carlo Tree Search guided by a
//! pluggable selection policy, and alpha-beta minimax.
//!
//! ## Modules
//!
//! - [`constants`] - Board configurations and search defaults
//! - [`config`] - Runtime search configuration
//! - [`state`] - The game-state capability the search consumes
//! - [`board`] - A small race game on a checkerboard implementing it
//! - [`node`] - Search tree nodes with lazy expansion
//! - [`policy`] - Child selection policies (uniform, UCT softmax, neural)
//! - [`network`] - Scoring models, encoders and the model cache
//! - [`bot`] - The search engine
//! - [`arena`] - Game and match driver
//! - [`error`] - Model errors
//!
//! ## Example
//!
//! ```
//! use draughts_search::board::Board;
//! use draughts_search::bot::Bot;
//! use draughts_search::node::SearchNode;
//!
//! let mut bot = Bot::new();
//! let mut root = SearchNode::new(Board::new(8, 12));
//!
//! // 50 rollouts, 6 plies deep
//! if let Some((index, root)) = bot.run_mcts(&mut root, 50, 6) {
//!     let next = &root.expanded_children().unwrap()[index];
//!     println!("{}", next.state);
//! }
//! println!("nodes processed: {}", bot.nodes_processed());
//! ```

pub mod arena;
pub mod board;
pub mod bot;
pub mod config;
pub mod constants;
pub mod error;
pub mod network;
pub mod node;
pub mod policy;
pub mod state;
