mod bidirectional;
mod deadlocks;
mod game;
mod heuristic;
mod levels;
mod node;
mod search;
mod solver;
mod strategy;
mod worker;

use clap::{Parser, ValueEnum};
use deadlocks::Deadlocks;
use game::Direction;
use levels::{Level, Levels};
use solver::{FAILURE, Report, SolveOptions, Solver};
use std::time::Duration;
use strategy::Strategy;
use worker::Worker;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    /// Single puzzle: size line, start line, then rows of w . t c $
    Grid,
    /// XSB collection: # wall, $ crate, . goal, @ player
    Xsb,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    Bfts,
    Dfts,
    Iddfts,
    GreedyTree,
    GreedyGraph,
    Bidirectional,
    AstarTree,
    AstarGraph,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Bfts => Strategy::BreadthFirstTree,
            StrategyArg::Dfts => Strategy::DepthFirstTree,
            StrategyArg::Iddfts => Strategy::IterativeDeepening,
            StrategyArg::GreedyTree => Strategy::GreedyTree,
            StrategyArg::GreedyGraph => Strategy::GreedyGraph,
            StrategyArg::Bidirectional => Strategy::Bidirectional,
            StrategyArg::AstarTree => Strategy::AStarTree,
            StrategyArg::AstarGraph => Strategy::AStarGraph,
        }
    }
}

fn print_solution(level: &Level, solution: &[Direction]) {
    println!(
        "\nStarting position:\n{}",
        level
            .board
            .render_with_player(level.player, &level.crates)
            .join("\n")
    );

    let deadlocks = Deadlocks::disabled();
    let mut player = level.player;
    let mut crates = level.crates.clone();
    let total = solution.len();
    for (count, &dir) in solution.iter().enumerate() {
        let Some((next, next_crates)) = level.board.apply_move(&deadlocks, player, &crates, dir)
        else {
            eprintln!("Move {} ({}) is illegal from {}", count + 1, dir, player);
            return;
        };
        player = next;
        crates = next_crates;
        println!(
            "Move {} ({}/{}):\n{}",
            dir,
            count + 1,
            total,
            level.board.render_with_player(player, &crates).join("\n")
        );
    }
}

fn print_report(report: &Report) {
    println!("{}", report);
    println!("---");
    println!(
        "strategy: {}  expanded: {:<12}  generated: {:<12}  elapsed: {} ms",
        report.strategy,
        report.stats.nodes_expanded,
        report.stats.nodes_generated,
        report.elapsed.as_millis()
    );
}

#[derive(Parser)]
#[command(name = "crate-crawler")]
#[command(about = "A crate-pushing puzzle solver", long_about = None)]
struct Args {
    /// Path to the puzzle file
    #[arg(value_name = "FILE")]
    puzzle_file: String,

    /// Puzzle file format
    #[arg(short, long, value_enum, default_value = "grid")]
    format: Format,

    /// Level number within an XSB collection (1-indexed)
    #[arg(short, long, default_value = "1")]
    level: usize,

    /// Search strategy
    #[arg(short, long, value_enum, default_value = "astar-graph")]
    strategy: StrategyArg,

    /// Disable dead-cell pruning
    #[arg(long, default_value = "false")]
    no_deadlocks: bool,

    /// Disable crate pulling in the reverse half of bidirectional search
    #[arg(long, default_value = "false")]
    no_pull: bool,

    /// Maximum number of nodes to expand before giving up
    #[arg(short = 'n', long, default_value = "5000000")]
    max_nodes: usize,

    /// Deepest bound iterative deepening will try
    #[arg(long, default_value = "500")]
    max_depth: u32,

    /// Print the solution step-by-step
    #[arg(short, long)]
    print_solution: bool,

    /// Run the solve on a worker thread and give up after this many
    /// milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
}

fn load_level(args: &Args) -> Result<Level, String> {
    match args.format {
        Format::Grid => Level::from_file(&args.puzzle_file).map_err(|e| e.to_string()),
        Format::Xsb => {
            let levels = Levels::from_file(&args.puzzle_file).map_err(|e| e.to_string())?;
            if args.level == 0 {
                return Err("level numbers must be at least 1".to_string());
            }
            levels.get(args.level - 1).cloned().ok_or_else(|| {
                format!(
                    "level {} not found (file contains {} levels)",
                    args.level,
                    levels.len()
                )
            })
        }
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let level = match load_level(&args) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Error loading level: {}", e);
            std::process::exit(1);
        }
    };

    let options = SolveOptions {
        deadlocks: !args.no_deadlocks,
        pull: !args.no_pull,
        max_nodes: args.max_nodes,
        max_depth: args.max_depth,
    };
    let solver = Solver::new(args.strategy.into(), options);

    let report = match args.timeout_ms {
        None => solver.solve(&level),
        Some(timeout_ms) => {
            let worker = Worker::new();
            let ticket = worker.launch(solver, level.clone());
            match ticket.wait(Some(Duration::from_millis(timeout_ms))) {
                Some(report) => report,
                None => {
                    worker.cancel();
                    println!("{}", FAILURE);
                    eprintln!(
                        "Gave up on run {} after {} ms (stale: {})",
                        ticket.run_id(),
                        timeout_ms,
                        ticket.is_stale()
                    );
                    std::process::exit(1);
                }
            }
        }
    };

    print_report(&report);

    if args.print_solution {
        if let Some(moves) = report.moves() {
            print_solution(&level, moves);
        }
    }
}
