use crate::game::{Board, MAX_SIZE, Position, Tile};

/// Cells a crate may never be pushed into. Computed once per board from the
/// walls and targets alone.
pub struct Deadlocks {
    dead: [[bool; MAX_SIZE]; MAX_SIZE],
    enabled: bool,
}

impl Deadlocks {
    pub fn new(board: &Board, enabled: bool) -> Self {
        let mut dead = [[false; MAX_SIZE]; MAX_SIZE];

        if enabled {
            Self::mark_runs(board, &mut dead, true);
            Self::mark_runs(board, &mut dead, false);
        }

        Deadlocks { dead, enabled }
    }

    /// A dead-cell set that never rejects a push.
    pub const fn disabled() -> Self {
        Deadlocks {
            dead: [[false; MAX_SIZE]; MAX_SIZE],
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_dead(&self, pos: Position) -> bool {
        self.enabled && self.dead[pos.y as usize][pos.x as usize]
    }

    pub fn count(&self) -> usize {
        self.dead.iter().flatten().filter(|&&d| d).count()
    }

    /// Scan rows (or columns) for runs of floor cells pinned against a wall
    /// on one side. A corner is dead on its own; a run that starts and ends
    /// on corners is dead in full.
    fn mark_runs(board: &Board, dead: &mut [[bool; MAX_SIZE]; MAX_SIZE], along_rows: bool) {
        let (lines, cells) = if along_rows {
            (board.height(), board.width())
        } else {
            (board.width(), board.height())
        };
        let at = |line: usize, cell: usize| {
            if along_rows {
                Position::new(cell as u8, line as u8)
            } else {
                Position::new(line as u8, cell as u8)
            }
        };

        for line in 0..lines {
            let mut run_start: Option<usize> = None;

            for cell in 0..cells {
                let pos = at(line, cell);
                if board.get_tile(pos) != Tile::Floor {
                    run_start = None;
                    continue;
                }

                let (pinned, along) = if along_rows {
                    (Self::vertically_stuck(board, pos), Self::horizontally_stuck(board, pos))
                } else {
                    (Self::horizontally_stuck(board, pos), Self::vertically_stuck(board, pos))
                };

                if !pinned {
                    run_start = None;
                    continue;
                }

                if along {
                    // Corner: closes any open run and opens a new one.
                    if let Some(start) = run_start {
                        for c in start..cell {
                            let p = at(line, c);
                            dead[p.y as usize][p.x as usize] = true;
                        }
                    }
                    dead[pos.y as usize][pos.x as usize] = true;
                    run_start = Some(cell);
                }
            }
        }
    }

    fn blocked(board: &Board, x: i32, y: i32) -> bool {
        !board.in_bounds(x, y) || board.is_wall(Position::new(x as u8, y as u8))
    }

    fn vertically_stuck(board: &Board, pos: Position) -> bool {
        let (x, y) = (pos.x as i32, pos.y as i32);
        Self::blocked(board, x, y - 1) || Self::blocked(board, x, y + 1)
    }

    fn horizontally_stuck(board: &Board, pos: Position) -> bool {
        let (x, y) = (pos.x as i32, pos.y as i32);
        Self::blocked(board, x - 1, y) || Self::blocked(board, x + 1, y)
    }
}
