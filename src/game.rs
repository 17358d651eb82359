use arrayvec::ArrayVec;
use std::fmt;

use crate::deadlocks::Deadlocks;

pub const MAX_SIZE: usize = 64;
pub const MAX_CRATES: usize = 32;

pub const WALL: char = 'w';
pub const FLOOR: char = '.';
pub const TARGET: char = 't';
pub const CRATE: char = 'c';
pub const CRATE_ON_TARGET: char = '$';
pub const PLAYER: char = 'p';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    Wall,
    Floor,
    Target,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub x: u8,
    pub y: u8,
}

impl Position {
    pub const fn new(x: u8, y: u8) -> Self {
        Position { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

pub const ALL_DIRECTIONS: [Direction; 4] = [
    Direction::Up,
    Direction::Down,
    Direction::Left,
    Direction::Right,
];

impl Direction {
    pub fn delta(&self) -> (i8, i8) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Single-letter token used in move strings.
    pub fn letter(&self) -> char {
        match self {
            Direction::Up => 'U',
            Direction::Down => 'D',
            Direction::Left => 'L',
            Direction::Right => 'R',
        }
    }

    /// The direction that takes the player from `from` to `to`.
    /// Panics if the two positions are not orthogonally adjacent.
    pub fn between(from: Position, to: Position) -> Direction {
        let dx = to.x as i16 - from.x as i16;
        let dy = to.y as i16 - from.y as i16;
        match (dx, dy) {
            (0, -1) => Direction::Up,
            (0, 1) => Direction::Down,
            (-1, 0) => Direction::Left,
            (1, 0) => Direction::Right,
            _ => panic!("positions {} and {} are not adjacent", from, to),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "Up"),
            Direction::Down => write!(f, "Down"),
            Direction::Left => write!(f, "Left"),
            Direction::Right => write!(f, "Right"),
        }
    }
}

/// The set of crate positions making up one search state. The number of
/// crates never changes once a level is loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Crates {
    positions: ArrayVec<Position, MAX_CRATES>,
}

impl Crates {
    pub fn new() -> Self {
        Crates {
            positions: ArrayVec::new(),
        }
    }

    pub fn add(&mut self, pos: Position) {
        assert!(
            !self.positions.is_full(),
            "Cannot add crate: maximum of {} crates exceeded",
            MAX_CRATES
        );
        assert!(!self.contains(pos), "Crate already present at {}", pos);
        self.positions.push(pos);
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.positions.contains(&pos)
    }

    pub fn index_of(&self, pos: Position) -> Option<usize> {
        self.positions.iter().position(|&p| p == pos)
    }

    pub fn iter(&self) -> impl Iterator<Item = Position> + '_ {
        self.positions.iter().copied()
    }

    pub fn as_slice(&self) -> &[Position] {
        &self.positions
    }

    /// Copy of this configuration with crate `index` relocated to `to`.
    fn moved(&self, index: usize, to: Position) -> Crates {
        let mut crates = self.clone();
        crates.positions[index] = to;
        crates
    }
}

impl FromIterator<Position> for Crates {
    fn from_iter<I: IntoIterator<Item = Position>>(iter: I) -> Self {
        let mut crates = Crates::new();
        for pos in iter {
            crates.add(pos);
        }
        crates
    }
}

/// Static puzzle layout: walls and targets. Crates and the player are
/// tracked separately by the search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    tiles: [[Tile; MAX_SIZE]; MAX_SIZE],
    width: u8,
    height: u8,
    targets: ArrayVec<Position, MAX_CRATES>,
}

impl Board {
    /// An all-floor board of the given size.
    pub fn new(width: usize, height: usize) -> Result<Self, String> {
        if width == 0 || height == 0 {
            return Err("Board must be at least 1x1".to_string());
        }
        if width > MAX_SIZE {
            return Err(format!(
                "Board width {} exceeds maximum size {}",
                width, MAX_SIZE
            ));
        }
        if height > MAX_SIZE {
            return Err(format!(
                "Board height {} exceeds maximum size {}",
                height, MAX_SIZE
            ));
        }

        Ok(Board {
            tiles: [[Tile::Floor; MAX_SIZE]; MAX_SIZE],
            width: width as u8,
            height: height as u8,
            targets: ArrayVec::new(),
        })
    }

    pub fn set_wall(&mut self, pos: Position) {
        self.tiles[pos.y as usize][pos.x as usize] = Tile::Wall;
    }

    pub fn add_target(&mut self, pos: Position) -> Result<(), String> {
        if self.is_wall(pos) {
            return Err(format!("Target {} is on a wall", pos));
        }
        if self.targets.contains(&pos) {
            return Ok(());
        }
        if self.targets.is_full() {
            return Err(format!("More than {} targets", MAX_CRATES));
        }
        self.tiles[pos.y as usize][pos.x as usize] = Tile::Target;
        self.targets.push(pos);
        Ok(())
    }

    /// Same walls with a different target set. The reverse search uses this
    /// to treat the crate start cells as its goals.
    pub fn with_targets(&self, targets: &[Position]) -> Board {
        let mut board = self.clone();
        for &pos in &self.targets {
            board.tiles[pos.y as usize][pos.x as usize] = Tile::Floor;
        }
        board.targets.clear();
        for &pos in targets {
            if !board.is_wall(pos) && !board.targets.contains(&pos) {
                board.tiles[pos.y as usize][pos.x as usize] = Tile::Target;
                board.targets.push(pos);
            }
        }
        board
    }

    pub fn width(&self) -> usize {
        self.width as usize
    }

    pub fn height(&self) -> usize {
        self.height as usize
    }

    pub fn targets(&self) -> &[Position] {
        &self.targets
    }

    pub fn get_tile(&self, pos: Position) -> Tile {
        self.tiles[pos.y as usize][pos.x as usize]
    }

    pub fn is_wall(&self, pos: Position) -> bool {
        self.get_tile(pos) == Tile::Wall
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width as i32 && y < self.height as i32
    }

    /// Step from `pos` in the given direction.
    /// Returns None if the new position is off the board.
    pub fn move_position(&self, pos: Position, dir: Direction) -> Option<Position> {
        let (dx, dy) = dir.delta();
        let new_x = pos.x as i32 + dx as i32;
        let new_y = pos.y as i32 + dy as i32;

        if self.in_bounds(new_x, new_y) {
            Some(Position::new(new_x as u8, new_y as u8))
        } else {
            None
        }
    }

    /// Push the crate at `crate_at` one cell in `dir`. Fails if the
    /// destination is off the board, a wall, another crate or a dead cell.
    pub fn attempt_push(
        &self,
        deadlocks: &Deadlocks,
        crates: &Crates,
        crate_at: Position,
        dir: Direction,
    ) -> Option<Crates> {
        let index = crates.index_of(crate_at)?;
        let dest = self.move_position(crate_at, dir)?;

        if self.is_wall(dest) || crates.contains(dest) || deadlocks.is_dead(dest) {
            return None;
        }

        Some(crates.moved(index, dest))
    }

    /// Move the player one step, pushing a crate if one is in the way.
    /// A blocked push blocks the player too.
    pub fn apply_move(
        &self,
        deadlocks: &Deadlocks,
        player: Position,
        crates: &Crates,
        dir: Direction,
    ) -> Option<(Position, Crates)> {
        let next = self.move_position(player, dir)?;

        if crates.contains(next) {
            let pushed = self.attempt_push(deadlocks, crates, next, dir)?;
            return Some((next, pushed));
        }

        if self.is_wall(next) {
            return None;
        }

        Some((next, crates.clone()))
    }

    /// Move the player one step without pushing anything. Used by the
    /// reverse search, where crates only move by being pulled.
    pub fn walk(&self, player: Position, crates: &Crates, dir: Direction) -> Option<Position> {
        let next = self.move_position(player, dir)?;
        if self.is_wall(next) || crates.contains(next) {
            None
        } else {
            Some(next)
        }
    }

    /// Pull the crate sitting directly behind `from` (relative to a step in
    /// `dir`) onto `from` itself.
    pub fn pull(&self, from: Position, crates: &Crates, dir: Direction) -> Option<Crates> {
        let behind = self.move_position(from, dir.opposite())?;
        let index = crates.index_of(behind)?;
        Some(crates.moved(index, from))
    }

    pub fn goals_achieved(&self, crates: &Crates) -> usize {
        self.targets.iter().filter(|&&t| crates.contains(t)).count()
    }

    /// Check if every target holds a crate (win condition)
    pub fn is_solved(&self, crates: &Crates) -> bool {
        self.goals_achieved(crates) == self.targets.len()
    }

    /// Apply a sequence of moves, failing on the first illegal one.
    pub fn replay(
        &self,
        deadlocks: &Deadlocks,
        player: Position,
        crates: &Crates,
        moves: &[Direction],
    ) -> Option<(Position, Crates)> {
        let mut player = player;
        let mut crates = crates.clone();
        for &dir in moves {
            let (next, next_crates) = self.apply_move(deadlocks, player, &crates, dir)?;
            player = next;
            crates = next_crates;
        }
        Some((player, crates))
    }

    /// One line per row with crates drawn in.
    pub fn render(&self, crates: &Crates) -> Vec<String> {
        self.render_rows(crates, None)
    }

    pub fn render_with_player(&self, player: Position, crates: &Crates) -> Vec<String> {
        self.render_rows(crates, Some(player))
    }

    fn render_rows(&self, crates: &Crates, player: Option<Position>) -> Vec<String> {
        let mut rows = Vec::with_capacity(self.height as usize);
        for y in 0..self.height {
            let mut line = String::with_capacity(self.width as usize);
            for x in 0..self.width {
                let pos = Position::new(x, y);
                let tile = self.get_tile(pos);
                let ch = if crates.contains(pos) {
                    match tile {
                        Tile::Target => CRATE_ON_TARGET,
                        _ => CRATE,
                    }
                } else if player == Some(pos) {
                    PLAYER
                } else {
                    match tile {
                        Tile::Wall => WALL,
                        Tile::Floor => FLOOR,
                        Tile::Target => TARGET,
                    }
                };
                line.push(ch);
            }
            rows.push(line);
        }
        rows
    }
}
