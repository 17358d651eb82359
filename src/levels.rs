use crate::game::{
    Board, CRATE, CRATE_ON_TARGET, Crates, FLOOR, MAX_SIZE, Position, TARGET, WALL,
};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Error type for level parsing operations.
#[derive(Debug, Error)]
pub enum LevelError {
    /// IO error when reading from file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Invalid level content
    #[error("Invalid level: {0}")]
    InvalidLevel(String),
}

impl From<String> for LevelError {
    fn from(err: String) -> Self {
        LevelError::InvalidLevel(err)
    }
}

/// A puzzle ready to be solved: static board, player start and crates.
#[derive(Debug, Clone)]
pub struct Level {
    pub board: Board,
    pub player: Position,
    pub crates: Crates,
}

impl Level {
    /// Parse the single-puzzle grid format:
    ///
    /// ```text
    /// 3 3
    /// 1 0
    /// w.w
    /// wcw
    /// wtw
    /// ```
    ///
    /// Line one holds the width and height, line two the player start, and
    /// the remaining lines the rows using `w` wall, `.` floor, `t` target,
    /// `c` crate and `$` crate on target.
    pub fn from_grid_text(text: &str) -> Result<Self, LevelError> {
        let mut lines = text.lines();
        let (width, height) = parse_pair(lines.next(), "dimensions")?;
        let (x, y) = parse_pair(lines.next(), "player start")?;

        let rows: Vec<&str> = lines
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.is_empty())
            .collect();

        if rows.len() != height {
            return Err(LevelError::InvalidLevel(format!(
                "Expected {} rows, found {}",
                height,
                rows.len()
            )));
        }
        if let Some((y, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.chars().count() != width)
        {
            return Err(LevelError::InvalidLevel(format!(
                "Row {} has {} cells, expected {}",
                y,
                row.chars().count(),
                width
            )));
        }
        if x >= MAX_SIZE || y >= MAX_SIZE {
            return Err(LevelError::InvalidLevel(format!(
                "Player start ({}, {}) is off the board",
                x, y
            )));
        }

        Self::from_rows(Position::new(x as u8, y as u8), &rows)
    }

    /// Build a level from rows in the grid symbols. The board width is the
    /// length of the first row; every row must match it.
    pub fn from_rows(player: Position, rows: &[&str]) -> Result<Self, LevelError> {
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.chars().count());
        let mut board = Board::new(width, height)?;
        let mut crates = Crates::new();

        for (y, row) in rows.iter().enumerate() {
            if row.chars().count() != width {
                return Err(LevelError::InvalidLevel(format!(
                    "Row {} has {} cells, expected {}",
                    y,
                    row.chars().count(),
                    width
                )));
            }
            for (x, ch) in row.chars().enumerate() {
                let pos = Position::new(x as u8, y as u8);
                match ch {
                    WALL => board.set_wall(pos),
                    FLOOR => {}
                    TARGET => board.add_target(pos)?,
                    CRATE => add_crate(&mut crates, pos)?,
                    CRATE_ON_TARGET => {
                        board.add_target(pos)?;
                        add_crate(&mut crates, pos)?;
                    }
                    _ => {
                        return Err(LevelError::InvalidLevel(format!(
                            "Invalid character '{}' at {}",
                            ch, pos
                        )));
                    }
                }
            }
        }

        Self::validated(board, player, crates)
    }

    /// Parse one level in XSB notation.
    pub fn from_xsb(text: &str) -> Result<Self, LevelError> {
        let lines: Vec<&str> = text.lines().collect();
        let height = lines.len();
        let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let mut board = Board::new(width, height)?;
        let mut crates = Crates::new();
        let mut player = None;

        for (y, line) in lines.iter().enumerate() {
            for (x, ch) in line.chars().enumerate() {
                let pos = Position::new(x as u8, y as u8);
                match ch {
                    '#' => board.set_wall(pos),
                    ' ' | '-' | '_' => {}
                    '.' => board.add_target(pos)?,
                    '$' => add_crate(&mut crates, pos)?,
                    '*' => {
                        board.add_target(pos)?;
                        add_crate(&mut crates, pos)?;
                    }
                    '@' | '+' => {
                        if player.is_some() {
                            return Err(LevelError::InvalidLevel(
                                "Multiple players found".to_string(),
                            ));
                        }
                        if ch == '+' {
                            board.add_target(pos)?;
                        }
                        player = Some(pos);
                    }
                    _ => {
                        return Err(LevelError::InvalidLevel(format!(
                            "Invalid character '{}' at {}",
                            ch, pos
                        )));
                    }
                }
            }
        }

        let player =
            player.ok_or_else(|| LevelError::InvalidLevel("No player found".to_string()))?;
        Self::validated(board, player, crates)
    }

    /// Read a grid-format puzzle file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LevelError> {
        let contents = fs::read_to_string(path)?;
        Self::from_grid_text(&contents)
    }

    fn validated(board: Board, player: Position, crates: Crates) -> Result<Self, LevelError> {
        if !board.in_bounds(player.x as i32, player.y as i32) {
            return Err(LevelError::InvalidLevel(format!(
                "Player start {} is off the board",
                player
            )));
        }
        if board.is_wall(player) {
            return Err(LevelError::InvalidLevel(format!(
                "Player start {} is a wall",
                player
            )));
        }
        if crates.contains(player) {
            return Err(LevelError::InvalidLevel(format!(
                "Player start {} is occupied by a crate",
                player
            )));
        }
        if crates.len() != board.targets().len() {
            return Err(LevelError::InvalidLevel(format!(
                "Crate count ({}) does not match target count ({})",
                crates.len(),
                board.targets().len()
            )));
        }

        Ok(Level {
            board,
            player,
            crates,
        })
    }
}

fn add_crate(crates: &mut Crates, pos: Position) -> Result<(), LevelError> {
    if crates.len() == crate::game::MAX_CRATES {
        return Err(LevelError::InvalidLevel(format!(
            "More than {} crates",
            crate::game::MAX_CRATES
        )));
    }
    crates.add(pos);
    Ok(())
}

fn parse_pair(line: Option<&str>, what: &str) -> Result<(usize, usize), LevelError> {
    let line = line.ok_or_else(|| LevelError::InvalidLevel(format!("Missing {} line", what)))?;
    let mut parts = line.split_whitespace().map(str::parse::<usize>);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(Ok(a)), Some(Ok(b)), None) => Ok((a, b)),
        _ => Err(LevelError::InvalidLevel(format!(
            "Malformed {} line: '{}'",
            what,
            line.trim()
        ))),
    }
}

/// A collection of levels in XSB format.
#[derive(Debug)]
pub struct Levels {
    levels: Vec<Level>,
}

impl Levels {
    /// Parse XSB-formatted levels from a string.
    ///
    /// Lines starting with `;` and blank lines separate levels.
    pub fn from_text(contents: &str) -> Result<Self, LevelError> {
        let mut levels = Vec::new();
        let mut current = String::new();

        for line in contents.lines() {
            if line.trim_start().starts_with(';') || line.trim().is_empty() {
                if !current.is_empty() {
                    levels.push(Level::from_xsb(current.trim_end_matches('\n'))?);
                    current.clear();
                }
                continue;
            }

            current.push_str(line.trim_end_matches('\r'));
            current.push('\n');
        }

        if !current.is_empty() {
            levels.push(Level::from_xsb(current.trim_end_matches('\n'))?);
        }

        Ok(Levels { levels })
    }

    /// Parse XSB-formatted levels from a text file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LevelError> {
        let contents = fs::read_to_string(path)?;
        Self::from_text(&contents)
    }

    /// Get the nth level (0-indexed).
    pub fn get(&self, index: usize) -> Option<&Level> {
        self.levels.get(index)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_grid_text_basic() {
        let level = Level::from_grid_text("3 3\n1 0\nw.w\nwcw\nwtw\n").unwrap();

        assert_eq!(level.board.width(), 3);
        assert_eq!(level.board.height(), 3);
        assert_eq!(level.player, Position::new(1, 0));
        assert_eq!(level.crates.as_slice(), &[Position::new(1, 1)]);
        assert_eq!(level.board.targets(), &[Position::new(1, 2)]);
        assert_eq!(level.board.render(&level.crates), vec!["w.w", "wcw", "wtw"]);
    }

    #[test]
    fn test_from_grid_text_crate_on_target() {
        let level = Level::from_grid_text("5 3\n1 1\nwwwww\nw.$.w\nwwwww").unwrap();
        assert!(level.board.is_solved(&level.crates));
        assert_eq!(level.board.render(&level.crates)[1], "w.$.w");
    }

    #[test]
    fn test_from_grid_text_count_mismatch() {
        let result = Level::from_grid_text("5 3\n1 1\nwwwww\nwcctw\nwwwww");
        assert!(matches!(result.unwrap_err(), LevelError::InvalidLevel(_)));
    }

    #[test]
    fn test_from_grid_text_bad_row_width() {
        let result = Level::from_grid_text("3 3\n1 0\nw.w\nwcww\nwtw");
        assert!(matches!(result.unwrap_err(), LevelError::InvalidLevel(_)));
    }

    #[test]
    fn test_from_grid_text_missing_rows() {
        let result = Level::from_grid_text("3 3\n1 0\nw.w\nwcw");
        assert!(matches!(result.unwrap_err(), LevelError::InvalidLevel(_)));
    }

    #[test]
    fn test_from_grid_text_bad_header() {
        let result = Level::from_grid_text("three 3\n1 0\nw.w\nwcw\nwtw");
        assert!(matches!(result.unwrap_err(), LevelError::InvalidLevel(_)));

        let result = Level::from_grid_text("");
        assert!(matches!(result.unwrap_err(), LevelError::InvalidLevel(_)));
    }

    #[test]
    fn test_from_grid_text_invalid_symbol() {
        let result = Level::from_grid_text("3 3\n1 0\nw.w\nwcw\nw#w");
        let err = result.unwrap_err();
        assert!(matches!(err, LevelError::InvalidLevel(_)));
        assert!(err.to_string().contains("Invalid character '#'"));
    }

    #[test]
    fn test_player_on_wall() {
        let result = Level::from_grid_text("3 3\n0 0\nw.w\nwcw\nwtw");
        assert!(matches!(result.unwrap_err(), LevelError::InvalidLevel(_)));
    }

    #[test]
    fn test_from_xsb_collection() {
        let level1 = "####
# .#
#  ###
#*@  #
#  $ #
#  ###
####";

        let level2 = "######
#    #
# #@ #
# $* #
# .* #
#    #
######";

        let xsb_content = format!("; 1\n\n{}\n\n; 2\n\n{}\n", level1, level2);
        let levels = Levels::from_text(&xsb_content).unwrap();

        assert_eq!(levels.len(), 2);

        let first = levels.get(0).unwrap();
        assert_eq!(first.player, Position::new(2, 3));
        assert_eq!(first.crates.len(), 2);
        assert_eq!(first.board.targets().len(), 2);
        assert_eq!(first.board.width(), 6);

        let second = levels.get(1).unwrap();
        assert_eq!(second.player, Position::new(3, 2));
        assert_eq!(second.crates.len(), 3);
        assert_eq!(second.board.goals_achieved(&second.crates), 2);
    }

    #[test]
    fn test_from_xsb_invalid_level() {
        let xsb_content = "; 1

####
# .#
#@@  #
####
";

        let result = Levels::from_text(xsb_content);
        assert!(matches!(result.unwrap_err(), LevelError::InvalidLevel(_)));
    }

    #[test]
    fn test_from_file_no_file() {
        let result = Levels::from_file("nonexistent_file.xsb");
        assert!(matches!(result.unwrap_err(), LevelError::Io(_)));

        let result = Level::from_file("nonexistent_file.txt");
        assert!(matches!(result.unwrap_err(), LevelError::Io(_)));
    }
}
