//! Plain-text save files shared with earlier sessions.
//!
//! * `maze.txt`: one row per line, `#` wall, `C` checkpoint, `M` monster,
//!   space for path.
//! * `minefield.txt`: `X` mine, `1`-`8` neighbour counts, space for blank.
//! * `status.txt`: `row col hp offset`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::MazeError;
use crate::grid::{Grid, Pos, Tile};
use crate::minefield::{Minefield, Square};
use crate::session::Player;

pub const DEFAULT_DIR: &str = ".gameConfig";
const MAZE_FILE: &str = "maze.txt";
const MINEFIELD_FILE: &str = "minefield.txt";
const STATUS_FILE: &str = "status.txt";
pub const LOG_FILE: &str = "session.log";

pub fn parse_grid(text: &str) -> Result<Grid, MazeError> {
    let mut rows = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let row = line
            .chars()
            .map(|c| {
                Tile::from_char(c).ok_or_else(|| MazeError::Malformed {
                    line: idx + 1,
                    reason: format!("unexpected maze character {:?}", c),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(row);
    }
    Grid::from_rows(rows)
}

pub fn format_grid(grid: &Grid) -> String {
    let mut out = String::with_capacity(grid.rows() * (grid.cols() + 1));
    for row in 0..grid.rows() {
        out.extend(grid.row_tiles(row).iter().map(|t| t.to_char()));
        out.push('\n');
    }
    out
}

pub fn parse_minefield(text: &str) -> Result<Minefield, MazeError> {
    let mut rows = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let row = line
            .chars()
            .map(|c| {
                Square::from_char(c).ok_or_else(|| MazeError::Malformed {
                    line: idx + 1,
                    reason: format!("unexpected minefield character {:?}", c),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(row);
    }
    Minefield::from_rows(rows)
}

pub fn format_minefield(field: &Minefield) -> String {
    let mut out = String::new();
    for row in field.rows() {
        out.extend(row.iter().map(|s| s.to_char()));
        out.push('\n');
    }
    out
}

pub fn parse_status(text: &str) -> Result<Player, MazeError> {
    let malformed = |reason: &str| MazeError::Malformed {
        line: 1,
        reason: reason.to_string(),
    };
    let fields = text
        .split_whitespace()
        .map(|f| f.parse::<usize>().map_err(|_| malformed("status fields must be non-negative integers")))
        .collect::<Result<Vec<_>, _>>()?;
    match fields[..] {
        [row, col, hp, offset] => Ok(Player {
            pos: Pos::new(row, col),
            hp: u32::try_from(hp).map_err(|_| malformed("hit points out of range"))?,
            offset,
        }),
        _ => Err(malformed("expected four fields: row col hp offset")),
    }
}

pub fn format_status(player: &Player) -> String {
    format!(
        "{} {} {} {}",
        player.pos.row, player.pos.col, player.hp, player.offset
    )
}

/// Directory holding the save files.
#[derive(Clone, Debug)]
pub struct SaveDir {
    root: PathBuf,
}

impl SaveDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.root.join(file)
    }

    /// Creates the directory on first use and seeds a fresh status file.
    /// Returns whether anything was created.
    pub fn ensure(&self, hp: u32) -> Result<bool, MazeError> {
        if self.root.is_dir() {
            return Ok(false);
        }
        fs::create_dir_all(&self.root).map_err(|e| MazeError::io(&self.root, e))?;
        self.save_status(&Player::at_entrance(hp))?;
        Ok(true)
    }

    fn read(&self, file: &str) -> Result<String, MazeError> {
        let path = self.path(file);
        fs::read_to_string(&path).map_err(|e| MazeError::io(path, e))
    }

    fn write(&self, file: &str, contents: &str) -> Result<(), MazeError> {
        let path = self.path(file);
        fs::write(&path, contents).map_err(|e| MazeError::io(path, e))
    }

    pub fn save_grid(&self, grid: &Grid) -> Result<(), MazeError> {
        self.write(MAZE_FILE, &format_grid(grid))
    }

    pub fn load_grid(&self) -> Result<Grid, MazeError> {
        parse_grid(&self.read(MAZE_FILE)?)
    }

    pub fn save_minefield(&self, field: &Minefield) -> Result<(), MazeError> {
        self.write(MINEFIELD_FILE, &format_minefield(field))
    }

    pub fn load_minefield(&self) -> Result<Minefield, MazeError> {
        parse_minefield(&self.read(MINEFIELD_FILE)?)
    }

    pub fn save_status(&self, player: &Player) -> Result<(), MazeError> {
        self.write(STATUS_FILE, &format_status(player))
    }

    pub fn load_status(&self) -> Result<Player, MazeError> {
        parse_status(&self.read(STATUS_FILE)?)
    }
}
