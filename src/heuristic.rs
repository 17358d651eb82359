use crate::game::{ALL_DIRECTIONS, Board, Crates, MAX_SIZE, Position, Tile};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

/// Added once for every target without a crate on it.
pub const UNFILLED_TARGET_PENALTY: u32 = 10;

/// Trait for estimating how far a crate configuration is from solved.
pub trait Heuristic {
    fn estimate(&mut self, crates: &Crates) -> u32;
}

pub struct NullHeuristic;

impl Heuristic for NullHeuristic {
    fn estimate(&mut self, _crates: &Crates) -> u32 {
        0
    }
}

/// Walking distances from one target to every cell it can reach.
pub struct DistanceMap {
    distances: Box<[[u16; MAX_SIZE]; MAX_SIZE]>,
}

impl DistanceMap {
    /// Flood fill outward from `target`. Walls block the fill, as does every
    /// other target cell. Cells never reached read as 0.
    pub fn flood(board: &Board, target: Position) -> Self {
        let mut distances = Box::new([[0u16; MAX_SIZE]; MAX_SIZE]);
        let mut visited = [[false; MAX_SIZE]; MAX_SIZE];
        let mut queue = VecDeque::new();

        visited[target.y as usize][target.x as usize] = true;
        queue.push_back((target, 0u16));

        while let Some((pos, dist)) = queue.pop_front() {
            distances[pos.y as usize][pos.x as usize] = dist;

            for dir in ALL_DIRECTIONS {
                let Some(next) = board.move_position(pos, dir) else {
                    continue;
                };
                if visited[next.y as usize][next.x as usize]
                    || board.get_tile(next) != Tile::Floor
                {
                    continue;
                }
                visited[next.y as usize][next.x as usize] = true;
                queue.push_back((next, dist + 1));
            }
        }

        DistanceMap { distances }
    }

    pub fn get(&self, pos: Position) -> u16 {
        self.distances[pos.y as usize][pos.x as usize]
    }
}

/// Sum over targets of the distance of every crate to that target, plus a
/// flat penalty per empty target. Distance maps are built lazily and kept
/// for the life of the heuristic.
pub struct DistanceHeuristic<'a> {
    board: &'a Board,
    maps: FxHashMap<Position, DistanceMap>,
}

impl<'a> DistanceHeuristic<'a> {
    pub fn new(board: &'a Board) -> Self {
        DistanceHeuristic {
            board,
            maps: FxHashMap::default(),
        }
    }

    #[cfg(test)]
    pub fn cached_maps(&self) -> usize {
        self.maps.len()
    }
}

impl Heuristic for DistanceHeuristic<'_> {
    fn estimate(&mut self, crates: &Crates) -> u32 {
        let board = self.board;
        let mut total = 0u32;

        for &target in board.targets() {
            let map = self
                .maps
                .entry(target)
                .or_insert_with(|| DistanceMap::flood(board, target));
            total += crates.iter().map(|c| map.get(c) as u32).sum::<u32>();
        }

        let unfilled = board.targets().len() - board.goals_achieved(crates);
        total + UNFILLED_TARGET_PENALTY * unfilled as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::Level;

    fn level(start: (u8, u8), rows: &[&str]) -> Level {
        Level::from_rows(Position::new(start.0, start.1), rows).unwrap()
    }

    fn pos(x: u8, y: u8) -> Position {
        Position::new(x, y)
    }

    #[test]
    fn test_flood_corridor() {
        let level = level((1, 1), &["wwwwwww", "w..c.tw", "wwwwwww"]);
        let map = DistanceMap::flood(&level.board, pos(5, 1));

        assert_eq!(map.get(pos(5, 1)), 0);
        assert_eq!(map.get(pos(4, 1)), 1);
        assert_eq!(map.get(pos(3, 1)), 2);
        assert_eq!(map.get(pos(1, 1)), 4);
        // Walls are never reached.
        assert_eq!(map.get(pos(0, 0)), 0);
    }

    #[test]
    fn test_flood_blocked_by_other_target() {
        let level = level((4, 2), &["wwwwwww", "wc.t.tw", "w.c...w", "wwwwwww"]);
        let board = &level.board;

        let map = DistanceMap::flood(board, pos(5, 1));
        // (3, 1) is another target: unreachable and does not pass the fill.
        assert_eq!(map.get(pos(3, 1)), 0);
        assert_eq!(map.get(pos(2, 2)), 4);
        assert_eq!(map.get(pos(2, 1)), 5);
        assert_eq!(map.get(pos(1, 1)), 6);
    }

    #[test]
    fn test_null_heuristic() {
        let level = level((1, 1), &["wwwwwww", "w..c.tw", "wwwwwww"]);
        assert_eq!(NullHeuristic.estimate(&level.crates), 0);
    }

    #[test]
    fn test_distance_heuristic() {
        let level = level((1, 1), &["wwwwwww", "w..c.tw", "wwwwwww"]);
        let mut heuristic = DistanceHeuristic::new(&level.board);

        // Crate two cells from the only target, which is empty.
        assert_eq!(heuristic.estimate(&level.crates), 2 + UNFILLED_TARGET_PENALTY);
        assert_eq!(heuristic.cached_maps(), 1);

        let solved: Crates = [pos(5, 1)].into_iter().collect();
        assert_eq!(heuristic.estimate(&solved), 0);
        assert_eq!(heuristic.cached_maps(), 1);
    }

    #[test]
    fn test_distance_heuristic_solved_is_zero() {
        let level = level((1, 2), &["wwwwwww", "w.$.$.w", "w.....w", "wwwwwww"]);
        let mut heuristic = DistanceHeuristic::new(&level.board);

        assert_eq!(heuristic.estimate(&level.crates), 0);
        assert_eq!(heuristic.cached_maps(), 2);
    }
}
