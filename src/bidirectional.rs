use crate::deadlocks::Deadlocks;
use crate::game::{Board, Crates, Direction, Position};
use crate::node::NodeId;
use crate::search::{Motion, Search, SearchConfig, SearchStats, SolveResult, Step};
use log::debug;

/// The reverse engine pulls crates back from the targets, where the static
/// dead-cell analysis does not apply.
static NO_DEADLOCKS: Deadlocks = Deadlocks::disabled();

/// Turn a reverse-play move list into the forward moves that undo it.
pub fn invert_path(moves: &[Direction]) -> Vec<Direction> {
    moves.iter().rev().map(|d| d.opposite()).collect()
}

pub fn splice(head: &[Direction], tail: &[Direction]) -> Vec<Direction> {
    let mut moves = Vec::with_capacity(head.len() + tail.len());
    moves.extend_from_slice(head);
    moves.extend_from_slice(tail);
    moves
}

/// Solve by growing a push search from the start and a pull search from the
/// solved position until they meet.
pub fn solve(
    board: &Board,
    deadlocks: &Deadlocks,
    player: Position,
    crates: &Crates,
    config: &SearchConfig,
    pull: bool,
) -> (SolveResult, SearchStats) {
    let reverse_board = board.with_targets(crates.as_slice());
    let mut meeting = Bidirectional::new(board, &reverse_board, deadlocks, config, pull);
    let result = meeting.run(player, crates);
    (result, meeting.stats())
}

pub struct Bidirectional<'a> {
    board: &'a Board,
    deadlocks: &'a Deadlocks,
    forward: Search<'a>,
    reverse: Search<'a>,
    forward_checked: usize,
    reverse_checked: usize,
    max_nodes: usize,
}

impl<'a> Bidirectional<'a> {
    pub fn new(
        board: &'a Board,
        reverse_board: &'a Board,
        deadlocks: &'a Deadlocks,
        config: &SearchConfig,
        pull: bool,
    ) -> Self {
        let forward_config = SearchConfig {
            reject_duplicates: true,
            motion: Motion::Push,
            ..config.clone()
        };
        let reverse_config = SearchConfig {
            reject_duplicates: true,
            motion: Motion::Walk { pull },
            ..config.clone()
        };

        Bidirectional {
            board,
            deadlocks,
            forward: Search::new(board, deadlocks, forward_config),
            reverse: Search::new(reverse_board, &NO_DEADLOCKS, reverse_config),
            forward_checked: 0,
            reverse_checked: 0,
            max_nodes: config.max_nodes,
        }
    }

    pub fn stats(&self) -> SearchStats {
        self.forward.stats() + self.reverse.stats()
    }

    pub fn run(&mut self, player: Position, crates: &Crates) -> SolveResult {
        // Reverse play starts with every crate on a target. The player is
        // seeded next to each crate start, the targets of the reverse board.
        let solved: Crates = self.board.targets().iter().copied().collect();
        for start in crates.iter() {
            self.reverse.seed_around(start, solved.clone());
        }
        self.forward.push_root(player, crates.clone());

        while !(self.forward.is_exhausted() && self.reverse.is_exhausted()) {
            if self.stats().nodes_expanded >= self.max_nodes {
                debug!(
                    "node budget of {} spent with {} forward and {} reverse nodes queued",
                    self.max_nodes,
                    self.forward.frontier_len(),
                    self.reverse.frontier_len()
                );
                return SolveResult::Cutoff;
            }

            if let Step::Solved(id) = self.forward.step() {
                debug!("forward search reached the goal on its own");
                return SolveResult::Solved(self.forward.solution(id));
            }
            if let Step::Solved(_) = self.reverse.step() {
                debug!("reverse search reached the start configuration");
            }

            if let Some(id) = self.meet() {
                return SolveResult::Solved(self.forward.solution(id));
            }
        }

        SolveResult::Impossible
    }

    /// Check every explored pair recorded since the last round. On success
    /// returns the last node of the joined chain in the forward engine.
    fn meet(&mut self) -> Option<NodeId> {
        let forward = self.forward.explored();
        let reverse = self.reverse.explored();
        let mut candidates = Vec::new();

        // New forward entries against every reverse entry.
        for (_, forward_id) in forward.since(self.forward_checked) {
            let player = self.forward.node(forward_id).player;
            for &(_, reverse_id) in reverse.at(player) {
                candidates.push((forward_id, reverse_id));
            }
        }
        // New reverse entries against the forward entries of earlier rounds.
        for (_, reverse_id) in reverse.since(self.reverse_checked) {
            let player = self.reverse.node(reverse_id).player;
            for &(seq, forward_id) in forward.at(player) {
                if seq < self.forward_checked {
                    candidates.push((forward_id, reverse_id));
                }
            }
        }

        self.forward_checked = forward.len();
        self.reverse_checked = reverse.len();

        for (forward_id, reverse_id) in candidates {
            let Some(tail) = self.join(forward_id, reverse_id) else {
                continue;
            };
            debug!(
                "searches met at {} with a tail of {} moves",
                self.forward.node(forward_id).player,
                tail.len()
            );
            let head = self.forward.path(forward_id);
            let joined = self.forward.graft(forward_id, &tail);
            debug_assert_eq!(self.forward.path(joined), splice(&head, &tail));
            return Some(joined);
        }

        None
    }

    /// The forward moves that finish the puzzle from `forward_id` by undoing
    /// the reverse path of `reverse_id`, if they are all legal.
    fn join(&self, forward_id: NodeId, reverse_id: NodeId) -> Option<Vec<Direction>> {
        let node = self.forward.node(forward_id);
        if self.board.is_solved(&node.crates) {
            return Some(Vec::new());
        }

        let tail = invert_path(&self.reverse.path(reverse_id));
        let (_, crates) = self
            .board
            .replay(self.deadlocks, node.player, &node.crates, &tail)?;

        if self.board.is_solved(&crates) {
            Some(tail)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::Level;
    use crate::strategy::Strategy;
    use Direction::*;

    fn level(start: (u8, u8), rows: &[&str]) -> Level {
        Level::from_rows(Position::new(start.0, start.1), rows).unwrap()
    }

    fn run(level: &Level, pull: bool) -> (SolveResult, SearchStats) {
        let deadlocks = Deadlocks::new(&level.board, true);
        solve(
            &level.board,
            &deadlocks,
            level.player,
            &level.crates,
            &Strategy::Bidirectional.config(),
            pull,
        )
    }

    fn assert_solves(level: &Level, result: &SolveResult) {
        let SolveResult::Solved(solution) = result else {
            panic!("expected a solution, got {:?}", result);
        };
        let deadlocks = Deadlocks::disabled();
        let (player, crates) = level
            .board
            .replay(&deadlocks, level.player, &level.crates, &solution.moves)
            .unwrap();
        assert!(level.board.is_solved(&crates));
        assert_eq!(player, solution.player);
        assert_eq!(crates, solution.crates);
    }

    #[test]
    fn test_invert_path() {
        assert!(invert_path(&[]).is_empty());
        assert_eq!(invert_path(&[Up]), vec![Down]);
        assert_eq!(invert_path(&[Up, Up, Left]), vec![Right, Down, Down]);
        assert_eq!(invert_path(&invert_path(&[Down, Right])), vec![Down, Right]);
    }

    #[test]
    fn test_splice() {
        assert_eq!(splice(&[Down], &[Right, Up]), vec![Down, Right, Up]);
        assert_eq!(splice(&[], &[Left]), vec![Left]);
        assert!(splice(&[], &[]).is_empty());
    }

    #[test]
    fn test_single_push_scenario() {
        let level = level((1, 0), &["w.w", "wcw", "wtw"]);
        let (result, _) = run(&level, true);

        assert_solves(&level, &result);
        let SolveResult::Solved(solution) = result else {
            unreachable!();
        };
        assert_eq!(solution.moves, vec![Down]);
    }

    #[test]
    fn test_reverse_seeded_around_crate_starts() {
        let level = level((1, 1), &["wwwwww", "w....w", "w.c..w", "w...tw", "wwwwww"]);
        let deadlocks = Deadlocks::new(&level.board, true);
        let reverse_board = level.board.with_targets(level.crates.as_slice());
        let config = SearchConfig {
            max_nodes: 0,
            ..Strategy::Bidirectional.config()
        };
        let mut meeting =
            Bidirectional::new(&level.board, &reverse_board, &deadlocks, &config, true);
        assert_eq!(meeting.run(level.player, &level.crates), SolveResult::Cutoff);

        let solved: Crates = level.board.targets().iter().copied().collect();
        let mut seeds = Vec::new();
        for (_, id) in meeting.reverse.explored().since(0) {
            let node = meeting.reverse.node(id);
            assert_eq!(node.crates, solved);
            assert_eq!(node.parent, None);
            seeds.push(node.player);
        }
        seeds.sort();

        // Neighbours of the crate start (2, 2), not of the target (4, 3).
        assert_eq!(
            seeds,
            vec![
                Position::new(1, 2),
                Position::new(2, 1),
                Position::new(2, 3),
                Position::new(3, 2),
            ]
        );
    }

    #[test]
    fn test_solved_forward_entry_needs_no_tail() {
        let level = level((1, 0), &["w.w", "wcw", "wtw"]);
        let deadlocks = Deadlocks::new(&level.board, true);
        let reverse_board = level.board.with_targets(level.crates.as_slice());
        let config = Strategy::Bidirectional.config();
        let mut meeting =
            Bidirectional::new(&level.board, &reverse_board, &deadlocks, &config, true);

        let SolveResult::Solved(solution) = meeting.run(level.player, &level.crates) else {
            panic!("expected a solution");
        };
        // The first round already met at (1, 1); no walk back up is added.
        assert_eq!(solution.moves, vec![Down]);
        assert_eq!(meeting.stats().nodes_expanded, 2);
    }

    #[test]
    fn test_solves_with_and_without_pull() {
        let levels = [
            level((1, 1), &["wwwwww", "w.c.tw", "wwwwww"]),
            level((1, 1), &["wwwwww", "w....w", "w.c..w", "w...tw", "wwwwww"]),
            level(
                (1, 1),
                &["wwwwwww", "w.....w", "w.cc..w", "w..w..w", "w.tt..w", "wwwwwww"],
            ),
        ];

        for level in &levels {
            for pull in [true, false] {
                let (result, stats) = run(level, pull);
                assert_solves(level, &result);
                assert!(stats.nodes_expanded > 0);
            }
        }
    }

    #[test]
    fn test_already_solved() {
        let level = level((1, 1), &["wwwww", "w.$.w", "wwwww"]);
        let (result, _) = run(&level, true);

        let SolveResult::Solved(solution) = result else {
            panic!("expected a solution");
        };
        assert!(solution.moves.is_empty());
    }

    #[test]
    fn test_impossible_when_both_sides_exhaust() {
        let level = level((3, 1), &["wwwww", "wc..w", "w..tw", "wwwww"]);
        let (result, _) = run(&level, true);
        assert_eq!(result, SolveResult::Impossible);
    }

    #[test]
    fn test_budget_cutoff() {
        let level = level(
            (1, 1),
            &["wwwwwww", "w.....w", "w.cc..w", "w..w..w", "w.tt..w", "wwwwwww"],
        );
        let deadlocks = Deadlocks::new(&level.board, true);
        let config = SearchConfig {
            max_nodes: 2,
            ..Strategy::Bidirectional.config()
        };
        let (result, stats) = solve(
            &level.board,
            &deadlocks,
            level.player,
            &level.crates,
            &config,
            true,
        );

        assert_eq!(result, SolveResult::Cutoff);
        assert_eq!(stats.nodes_expanded, 2);
    }
}
