//! Draughts-Search: pit search strategies against each other.
//!
//! ## Usage
//!
//! - `draughts-search` - Show a demo
//! - `draughts-search match --first mcts --second baseline` - Play a match
//! - `draughts-search demo` - Play one short game and print the board

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use log::info;

use draughts_search::arena::{Player, Strategy, play_game, play_match};
use draughts_search::board::Board;
use draughts_search::bot::Bot;
use draughts_search::config::SearchConfig;
use draughts_search::constants::{
    DEFAULT_ALPHA_BETA_DEPTH, DEFAULT_BOARD_SIZE, DEFAULT_MAX_DEPTH, DEFAULT_NUM_GAMES,
    DEFAULT_ROLLOUTS, PAWN_OPTIONS_8X8, PAWNS_6X6, accept_board_size, accept_num_games,
    fixed_pawn_count,
};
use draughts_search::network::{self, ModelCache};

/// Draughts-Search: MCTS and alpha-beta on a checkerboard race game
#[derive(Parser)]
#[command(name = "draughts-search")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a series of games between two strategies and print the report
    Match(MatchArgs),
    /// Play one game on a small board
    Demo,
}

#[derive(Args)]
struct MatchArgs {
    /// Board edge length (6, 8 or 10; anything else falls back to 8)
    #[arg(long, default_value_t = DEFAULT_BOARD_SIZE as i64, allow_negative_numbers = true)]
    board_size: i64,

    /// Pawns per side (only selectable on 8x8: 6, 9 or 12)
    #[arg(long)]
    pawns: Option<usize>,

    /// Number of games (negative values fall back to the default)
    #[arg(long, default_value_t = DEFAULT_NUM_GAMES as i64, allow_negative_numbers = true)]
    games: i64,

    /// Strategy moving first
    #[arg(long, value_enum, default_value_t = Strategy::Mcts)]
    first: Strategy,

    /// Strategy moving second
    #[arg(long, value_enum, default_value_t = Strategy::Baseline)]
    second: Strategy,

    /// Rollouts per MCTS move
    #[arg(long, default_value_t = DEFAULT_ROLLOUTS)]
    rollouts: usize,

    /// Rollout depth limit
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Alpha-beta search depth
    #[arg(long, default_value_t = DEFAULT_ALPHA_BETA_DEPTH)]
    ab_depth: usize,

    /// Directory holding `model{size}_{pawns}.txt` weight files
    #[arg(long, default_value = "models")]
    weights_dir: PathBuf,

    /// Seed for reproducible games
    #[arg(long)]
    seed: Option<u64>,

    /// Evaluate alpha-beta leaves with the board score instead of 0
    #[arg(long)]
    score_horizon: bool,
}

fn main() -> anyhow::Result<()> {
    let _logger = flexi_logger::Logger::try_with_env_or_str("info")?.start()?;

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Match(args)) => run_match(args),
        Some(Commands::Demo) | None => {
            run_demo();
            Ok(())
        }
    }
}

fn resolve_pawns(board_size: usize, requested: Option<usize>) -> anyhow::Result<usize> {
    if let Some(fixed) = fixed_pawn_count(board_size) {
        if requested.is_some_and(|p| p != fixed) {
            bail!("a {board_size}x{board_size} board always has {fixed} pawns per side");
        }
        return Ok(fixed);
    }
    let pawns = requested.unwrap_or(PAWN_OPTIONS_8X8[PAWN_OPTIONS_8X8.len() - 1]);
    if !PAWN_OPTIONS_8X8.contains(&pawns) {
        bail!("unsupported pawn count {pawns}, expected one of {PAWN_OPTIONS_8X8:?}");
    }
    Ok(pawns)
}

fn make_player(
    strategy: Strategy,
    config: SearchConfig,
    weights_dir: &Path,
    board: &Board,
) -> anyhow::Result<Player<Board>> {
    let mut bot = Bot::with_config(config);
    if strategy == Strategy::NeuralMcts {
        let guide = network::board_guide(ModelCache::global(), weights_dir, board)
            .with_context(|| format!("cannot load scoring model from {}", weights_dir.display()))?;
        bot = bot.with_guide(guide);
    }
    Ok(Player::new(strategy, bot))
}

fn run_match(args: MatchArgs) -> anyhow::Result<()> {
    let board_size = accept_board_size(args.board_size);
    let pawns = resolve_pawns(board_size, args.pawns)?;
    let games = accept_num_games(args.games);

    let config = SearchConfig::default()
        .with_rollouts(args.rollouts)
        .with_max_depth(args.max_depth)
        .with_alpha_beta_depth(args.ab_depth)
        .with_score_horizon(args.score_horizon);
    // Distinct streams per side so a mirrored match is not a mirrored game.
    let (first_config, second_config) = match args.seed {
        Some(seed) => (
            config.clone().with_seed(seed),
            config.with_seed(seed.wrapping_add(1)),
        ),
        None => (config.clone(), config),
    };

    let template = Board::new(board_size, pawns);
    let mut first = make_player(args.first, first_config, &args.weights_dir, &template)?;
    let mut second = make_player(args.second, second_config, &args.weights_dir, &template)?;

    info!(
        "{} vs {} on {board_size}x{board_size} with {pawns} pawns, {games} games",
        args.first.label(),
        args.second.label()
    );
    let summary = play_match(games, || template.clone(), &mut first, &mut second);
    println!("{summary}");
    Ok(())
}

fn run_demo() {
    println!("Draughts-Search: MCTS vs random play\n");

    let board = Board::new(6, PAWNS_6X6);
    println!("=== Starting position ===");
    println!("{board}");

    let mut first = Player::new(Strategy::Mcts, Bot::new());
    let mut second = Player::new(Strategy::Baseline, Bot::new());
    let record = play_game(board, &mut first, &mut second);

    println!("=== Result ===");
    println!("Moves: {}", record.moves);
    println!("Score: {:.3}", record.score);
    println!("Ended by: {:?}", record.end);
    match record.winner {
        Some(side) => println!("Winner: {side:?}"),
        None => println!("Draw"),
    }
    println!("Nodes processed by MCTS: {}", record.nodes_processed[0]);
}
