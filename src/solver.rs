use crate::bidirectional;
use crate::deadlocks::Deadlocks;
use crate::game::Direction;
use crate::levels::Level;
use crate::search::{Search, SearchConfig, SearchStats, SolveResult};
use crate::strategy::Strategy;
use log::{debug, info};
use std::fmt;
use std::time::{Duration, Instant};

/// Printed in place of a report when no solution was found.
pub const FAILURE: &str = "Failure. No solution found.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolveOptions {
    /// Reject pushes onto statically dead cells.
    pub deadlocks: bool,
    /// Let the reverse half of a bidirectional search pull crates.
    pub pull: bool,
    pub max_nodes: usize,
    pub max_depth: u32,
}

impl Default for SolveOptions {
    fn default() -> Self {
        let config = SearchConfig::default();
        SolveOptions {
            deadlocks: true,
            pull: true,
            max_nodes: config.max_nodes,
            max_depth: config.max_depth,
        }
    }
}

/// Everything a caller gets back from one solve.
#[derive(Debug, Clone)]
pub struct Report {
    pub strategy: Strategy,
    pub result: SolveResult,
    pub stats: SearchStats,
    pub elapsed: Duration,
    width: usize,
    height: usize,
    rows: Vec<String>,
}

impl Report {
    fn new(
        level: &Level,
        strategy: Strategy,
        result: SolveResult,
        stats: SearchStats,
        elapsed: Duration,
    ) -> Self {
        let rows = match &result {
            SolveResult::Solved(solution) => level.board.render(&solution.crates),
            _ => Vec::new(),
        };

        Report {
            strategy,
            result,
            stats,
            elapsed,
            width: level.board.width(),
            height: level.board.height(),
            rows,
        }
    }

    pub fn is_solved(&self) -> bool {
        matches!(self.result, SolveResult::Solved(_))
    }

    pub fn moves(&self) -> Option<&[Direction]> {
        match &self.result {
            SolveResult::Solved(solution) => Some(&solution.moves),
            _ => None,
        }
    }

    /// The result record, one entry per output line: elapsed milliseconds,
    /// move count, move letters, board size, final player position and the
    /// final board rows. A failed solve is the single sentinel line.
    pub fn lines(&self) -> Vec<String> {
        let SolveResult::Solved(solution) = &self.result else {
            return vec![FAILURE.to_string()];
        };

        let mut lines = vec![
            self.elapsed.as_millis().to_string(),
            solution.moves.len().to_string(),
            solution.moves.iter().map(|d| d.letter()).collect::<String>(),
            format!("{} {}", self.width, self.height),
            format!("{} {}", solution.player.x, solution.player.y),
        ];
        lines.extend(self.rows.iter().cloned());
        lines
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lines().join("\n"))
    }
}

/// Runs one strategy against one level.
#[derive(Debug, Clone, Copy)]
pub struct Solver {
    strategy: Strategy,
    options: SolveOptions,
}

impl Solver {
    pub fn new(strategy: Strategy, options: SolveOptions) -> Self {
        Solver { strategy, options }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn solve(&self, level: &Level) -> Report {
        let deadlocks = Deadlocks::new(&level.board, self.options.deadlocks);
        let config = SearchConfig {
            max_nodes: self.options.max_nodes,
            max_depth: self.options.max_depth,
            ..self.strategy.config()
        };

        info!(
            "solving {}x{} level with {} crates using {}",
            level.board.width(),
            level.board.height(),
            level.crates.len(),
            self.strategy
        );
        if deadlocks.is_enabled() {
            debug!("{} dead cells", deadlocks.count());
        }

        let start = Instant::now();
        let (result, stats) = match self.strategy {
            Strategy::Bidirectional => bidirectional::solve(
                &level.board,
                &deadlocks,
                level.player,
                &level.crates,
                &config,
                self.options.pull,
            ),
            _ => {
                let mut search = Search::new(&level.board, &deadlocks, config);
                let result = search.run(level.player, &level.crates);
                (result, search.stats())
            }
        };
        let elapsed = start.elapsed();

        let outcome = match &result {
            SolveResult::Solved(solution) => format!("solved in {} moves", solution.moves.len()),
            SolveResult::Cutoff => "cut off".to_string(),
            SolveResult::Impossible => "impossible".to_string(),
        };
        info!(
            "{} after {} ms: {} nodes expanded, {} generated",
            outcome,
            elapsed.as_millis(),
            stats.nodes_expanded,
            stats.nodes_generated
        );

        Report::new(level, self.strategy, result, stats, elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Position;
    use crate::strategy::ALL_STRATEGIES;

    fn level(start: (u8, u8), rows: &[&str]) -> Level {
        Level::from_rows(Position::new(start.0, start.1), rows).unwrap()
    }

    #[test]
    fn test_report_lines() {
        let level = Level::from_grid_text("3 3\n1 0\nw.w\nwcw\nwtw\n").unwrap();
        let report = Solver::new(Strategy::BreadthFirstTree, SolveOptions::default()).solve(&level);

        let lines = report.lines();
        assert!(lines[0].parse::<u128>().is_ok());
        assert_eq!(
            &lines[1..],
            &["1", "D", "3 3", "1 1", "w.w", "w.w", "w$w"]
        );
        assert!(report.is_solved());
        assert_eq!(report.moves(), Some(&[Direction::Down][..]));
    }

    #[test]
    fn test_failure_sentinel() {
        let level = level((3, 1), &["wwwww", "wc..w", "w..tw", "wwwww"]);
        let report = Solver::new(Strategy::AStarGraph, SolveOptions::default()).solve(&level);

        assert_eq!(report.result, SolveResult::Impossible);
        assert_eq!(report.lines(), vec![FAILURE.to_string()]);
        assert_eq!(report.to_string(), FAILURE);
        assert_eq!(report.moves(), None);
    }

    #[test]
    fn test_every_strategy_solves_corridor() {
        let level = level((1, 1), &["wwwwwww", "w.c..tw", "wwwwwww"]);

        for strategy in ALL_STRATEGIES {
            let report = Solver::new(strategy, SolveOptions::default()).solve(&level);
            let moves = report.moves().unwrap_or_else(|| panic!("{} failed", strategy));

            let (_, crates) = level
                .board
                .replay(&Deadlocks::disabled(), level.player, &level.crates, moves)
                .unwrap();
            assert_eq!(report.lines()[5..], level.board.render(&crates)[..], "{}", strategy);
            assert_eq!(report.lines()[5..][1], "w....$w", "{}", strategy);
        }
    }

    #[test]
    fn test_without_deadlock_pruning() {
        let level = level((1, 1), &["wwwwww", "w....w", "w.c..w", "w...tw", "wwwwww"]);
        let options = SolveOptions {
            deadlocks: false,
            ..SolveOptions::default()
        };
        let report = Solver::new(Strategy::BreadthFirstTree, options).solve(&level);

        assert_eq!(report.moves().map(|m| m.len()), Some(6));
    }

    #[test]
    fn test_node_budget_reported_as_failure() {
        let level = level((1, 1), &["wwwwww", "w....w", "w.c..w", "w...tw", "wwwwww"]);
        let options = SolveOptions {
            max_nodes: 1,
            ..SolveOptions::default()
        };
        let report = Solver::new(Strategy::BreadthFirstTree, options).solve(&level);

        assert_eq!(report.result, SolveResult::Cutoff);
        assert_eq!(report.lines(), vec![FAILURE.to_string()]);
    }
}
