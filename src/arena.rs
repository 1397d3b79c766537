//! Game driver.
//!
//! Plays complete games between two [`Player`]s and collects the numbers the
//! match report needs: moves per game, final scores, winners, and how many nodes
//! each side's bot processed.
//!
//! ## Example
//!
//! ```
//! use draughts_search::arena::{play_game, Player, Strategy};
//! use draughts_search::board::Board;
//! use draughts_search::bot::Bot;
//! use draughts_search::config::SearchConfig;
//!
//! let config = SearchConfig::for_testing();
//! let mut first = Player::new(Strategy::Mcts, Bot::with_config(config.clone()));
//! let mut second = Player::new(Strategy::Baseline, Bot::with_config(config));
//! let record = play_game(Board::new(6, 6), &mut first, &mut second);
//! println!("{} moves, score {:.2}", record.moves, record.score);
//! ```

use std::fmt;

use log::{debug, info};

use crate::bot::Bot;
use crate::constants::{MAX_GAME_TURNS, MAX_PASSES};
use crate::node::SearchNode;
use crate::policy::SelectionPolicy;
use crate::state::{GameState, Side};

/// How a player picks its move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Strategy {
    /// Uniformly random legal move
    Baseline,
    /// MCTS with UCT-softmax rollouts
    Mcts,
    /// MCTS with rollouts weighted by a scoring model
    NeuralMcts,
    /// Alpha-beta minimax
    AlphaBeta,
}

impl Strategy {
    /// Selection policy for the search tree built each turn.
    pub fn policy(self) -> SelectionPolicy {
        match self {
            Strategy::Baseline => SelectionPolicy::UniformRandom,
            Strategy::NeuralMcts => SelectionPolicy::NeuralWeighted,
            Strategy::Mcts | Strategy::AlphaBeta => SelectionPolicy::UctSoftmax,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Strategy::Baseline => "Baseline AI",
            Strategy::Mcts => "MCTS",
            Strategy::NeuralMcts => "NN + MCTS",
            Strategy::AlphaBeta => "Alpha-Beta AI",
        }
    }
}

/// A strategy bound to the bot that executes it.
pub struct Player<S> {
    strategy: Strategy,
    bot: Bot<S>,
}

impl<S: GameState> Player<S> {
    pub fn new(strategy: Strategy, bot: Bot<S>) -> Self {
        Self { strategy, bot }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn bot(&self) -> &Bot<S> {
        &self.bot
    }

    pub fn bot_mut(&mut self) -> &mut Bot<S> {
        &mut self.bot
    }

    /// Search a fresh tree rooted at `state` and return the position after the
    /// chosen move, or `None` if the strategy found nothing to play.
    pub fn choose_move(&mut self, state: &S) -> Option<S> {
        let mut root = SearchNode::with_policy(state.clone(), self.strategy.policy());
        let chosen = match self.strategy {
            Strategy::Baseline => self.bot.choose_baseline(&mut root),
            Strategy::Mcts | Strategy::NeuralMcts => self
                .bot
                .mcts(&mut root)
                .and_then(|(index, node)| node.expanded_children()?.get(index)),
            Strategy::AlphaBeta => self.bot.search_alpha_beta(&mut root).1,
        };
        chosen.map(|node| node.state.clone())
    }
}

/// Why a game stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEnd {
    /// The position is finished.
    Terminal,
    /// The given side's strategy returned no move.
    NoChoice(Side),
    /// Several turns in a row left the move counter unchanged.
    Stalled,
    /// The turn cap was reached.
    TurnLimit,
}

/// Outcome of one game.
#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    /// Turns played
    pub moves: usize,
    /// Final score (positive favours side one)
    pub score: f64,
    /// `None` for a draw
    pub winner: Option<Side>,
    pub end: GameEnd,
    /// Nodes processed by side one's and side two's bot during the game
    pub nodes_processed: [u64; 2],
}

/// Play one game; `first` moves on even turns, `second` on odd turns.
pub fn play_game<S: GameState>(initial: S, first: &mut Player<S>, second: &mut Player<S>) -> GameRecord {
    first.bot_mut().reset_counter();
    second.bot_mut().reset_counter();

    let mut state = initial;
    let mut turns = 0;
    let mut passes = 0;

    let end = loop {
        if state.is_terminal() {
            break GameEnd::Terminal;
        }
        if turns >= MAX_GAME_TURNS {
            break GameEnd::TurnLimit;
        }

        let side = if turns % 2 == 0 { Side::One } else { Side::Two };
        let player = match side {
            Side::One => &mut *first,
            Side::Two => &mut *second,
        };
        let before = player.bot().nodes_processed();
        let prev_moves = state.total_moves();

        let Some(next) = player.choose_move(&state) else {
            break GameEnd::NoChoice(side);
        };
        debug!(
            "turn {turns}: {} moved, {} nodes processed this turn",
            player.strategy().label(),
            player.bot().nodes_processed() - before
        );
        state = next;
        turns += 1;

        if state.total_moves() == prev_moves {
            passes += 1;
        } else {
            passes = 0;
        }
        if passes == MAX_PASSES {
            break GameEnd::Stalled;
        }
    };

    let score = state.score();
    let winner = if score > 0.0 {
        Some(Side::One)
    } else if score < 0.0 {
        Some(Side::Two)
    } else {
        None
    };

    GameRecord {
        moves: turns,
        score,
        winner,
        end,
        nodes_processed: [first.bot().nodes_processed(), second.bot().nodes_processed()],
    }
}

/// Aggregated results of several games between the same two strategies.
#[derive(Debug, Clone)]
pub struct MatchSummary {
    pub first: Strategy,
    pub second: Strategy,
    pub first_wins: usize,
    pub second_wins: usize,
    pub draws: usize,
    pub moves: Vec<usize>,
    pub scores: Vec<f64>,
    pub nodes_first: Vec<u64>,
    pub nodes_second: Vec<u64>,
}

impl MatchSummary {
    pub fn new(first: Strategy, second: Strategy) -> Self {
        Self {
            first,
            second,
            first_wins: 0,
            second_wins: 0,
            draws: 0,
            moves: Vec::new(),
            scores: Vec::new(),
            nodes_first: Vec::new(),
            nodes_second: Vec::new(),
        }
    }

    pub fn record(&mut self, game: &GameRecord) {
        match game.winner {
            Some(Side::One) => self.first_wins += 1,
            Some(Side::Two) => self.second_wins += 1,
            None => self.draws += 1,
        }
        self.moves.push(game.moves);
        self.scores.push(game.score);
        self.nodes_first.push(game.nodes_processed[0]);
        self.nodes_second.push(game.nodes_processed[1]);
    }

    pub fn games(&self) -> usize {
        self.moves.len()
    }
}

impl fmt::Display for MatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (a, b) = (self.first.label(), self.second.label());
        writeln!(f, "Moves List: {:?}", self.moves)?;
        writeln!(f, "Scores List: {:?}", self.scores)?;
        writeln!(f, "Nodes Processed List {a}: {:?}", self.nodes_first)?;
        writeln!(f, "Nodes Processed List {b}: {:?}", self.nodes_second)?;
        writeln!(f, "{a} WON: {}", self.first_wins)?;
        writeln!(f, "{b} WON: {}", self.second_wins)?;
        write!(f, "DRAWS: {}", self.draws)
    }
}

/// Play `games` games, each from a fresh `new_state()`.
pub fn play_match<S, F>(
    games: usize,
    mut new_state: F,
    first: &mut Player<S>,
    second: &mut Player<S>,
) -> MatchSummary
where
    S: GameState,
    F: FnMut() -> S,
{
    let mut summary = MatchSummary::new(first.strategy(), second.strategy());
    for game in 1..=games {
        let record = play_game(new_state(), first, second);
        let verdict = match record.winner {
            Some(Side::One) => format!("{} won", first.strategy().label()),
            Some(Side::Two) => format!("{} won", second.strategy().label()),
            None => "draw".to_string(),
        };
        info!(
            "game {game}/{games}: {verdict} after {} moves ({:?}), score {:.3}, nodes {:?}",
            record.moves, record.end, record.score, record.nodes_processed
        );
        summary.record(&record);
    }
    summary
}
