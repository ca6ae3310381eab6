//! Minefield truth grid and the player's reveal board.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{MazeError, RevealError};
use crate::grid::Pos;

pub const DEFAULT_FIELD_SIZE: usize = 10;
pub const DEFAULT_MINES: usize = 12;
/// Never mined, so the cursor's starting cell is always safe.
pub const SAFE_CORNER: Pos = Pos::new(0, 0);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Square {
    Mine,
    Blank,
    /// Number of mines among the 8 neighbours, 1 to 8.
    Count(u8),
}

impl Square {
    pub fn to_char(self) -> char {
        match self {
            Square::Mine => 'X',
            Square::Blank => ' ',
            Square::Count(n) => char::from(b'0' + n),
        }
    }

    pub fn from_char(c: char) -> Option<Square> {
        match c {
            'X' => Some(Square::Mine),
            ' ' => Some(Square::Blank),
            '1'..='8' => Some(Square::Count(c as u8 - b'0')),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Minefield {
    size: usize,
    squares: Vec<Vec<Square>>,
}

fn neighbors8(pos: Pos, size: usize) -> impl Iterator<Item = Pos> {
    (-1isize..=1)
        .flat_map(|dr| (-1isize..=1).map(move |dc| (dr, dc)))
        .filter(|&(dr, dc)| dr != 0 || dc != 0)
        .filter_map(move |(dr, dc)| pos.offset(dr, dc))
        .filter(move |p| p.row < size && p.col < size)
}

impl Minefield {
    /// Lays `mines` mines on distinct cells, never on [`SAFE_CORNER`].
    pub fn generate(size: usize, mines: usize, rng: &mut impl Rng) -> Self {
        let mut spots: Vec<Pos> = (0..size)
            .flat_map(|row| (0..size).map(move |col| Pos::new(row, col)))
            .filter(|p| *p != SAFE_CORNER)
            .collect();
        spots.shuffle(rng);
        spots.truncate(mines);

        let mut mined = vec![vec![false; size]; size];
        for p in &spots {
            mined[p.row][p.col] = true;
        }
        Self::from_mines(&mined)
    }

    /// Builds the truth grid from a square mine mask, computing counts.
    pub fn from_mines(mined: &[Vec<bool>]) -> Self {
        let size = mined.len();
        let mut squares = vec![vec![Square::Blank; size]; size];
        for row in 0..size {
            for col in 0..size {
                let pos = Pos::new(row, col);
                squares[row][col] = if mined[row][col] {
                    Square::Mine
                } else {
                    let n = neighbors8(pos, size).filter(|p| mined[p.row][p.col]).count();
                    if n == 0 {
                        Square::Blank
                    } else {
                        Square::Count(n as u8)
                    }
                };
            }
        }
        Self { size, squares }
    }

    /// Wraps already-classified squares, e.g. from a saved minefield.
    pub fn from_rows(squares: Vec<Vec<Square>>) -> Result<Self, MazeError> {
        let size = squares.len();
        if size == 0 || squares[0].is_empty() {
            return Err(MazeError::EmptyGrid);
        }
        if let Some(line) = squares.iter().position(|r| r.len() != size) {
            return Err(MazeError::Malformed {
                line: line + 1,
                reason: format!("minefield must be {size}x{size}"),
            });
        }
        Ok(Self { size, squares })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, pos: Pos) -> Option<Square> {
        self.squares.get(pos.row).and_then(|r| r.get(pos.col)).copied()
    }

    pub fn mine_count(&self) -> usize {
        self.squares
            .iter()
            .flatten()
            .filter(|s| **s == Square::Mine)
            .count()
    }

    pub fn rows(&self) -> &[Vec<Square>] {
        &self.squares
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cover {
    Hidden,
    Flagged,
    Revealed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reveal {
    /// The chosen cell was a mine; the game is lost.
    Mine,
    /// Cells uncovered by this call, in visiting order.
    Opened(Vec<Pos>),
}

/// What the player can see of a minefield.
#[derive(Clone, Debug)]
pub struct Board {
    size: usize,
    covers: Vec<Vec<Cover>>,
}

impl Board {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            covers: vec![vec![Cover::Hidden; size]; size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn cover(&self, pos: Pos) -> Option<Cover> {
        self.covers.get(pos.row).and_then(|r| r.get(pos.col)).copied()
    }

    pub fn hidden_count(&self) -> usize {
        self.covers
            .iter()
            .flatten()
            .filter(|c| **c == Cover::Hidden)
            .count()
    }

    /// No hidden cell remains. Flagged cells count as settled whether or not
    /// they cover a mine.
    pub fn is_cleared(&self) -> bool {
        self.hidden_count() == 0
    }

    /// Uncovers `pos`. Blank cells flood through their 8 neighbours; each
    /// coordinate is visited at most once and flagged cells are left alone.
    pub fn reveal(&mut self, field: &Minefield, pos: Pos) -> Result<Reveal, RevealError> {
        match self.cover(pos) {
            None => return Err(RevealError::OutOfBounds),
            Some(Cover::Revealed) => return Err(RevealError::AlreadyRevealed),
            Some(Cover::Flagged) => return Err(RevealError::Flagged),
            Some(Cover::Hidden) => {}
        }
        let Some(square) = field.get(pos) else {
            return Err(RevealError::OutOfBounds);
        };
        self.covers[pos.row][pos.col] = Cover::Revealed;
        if square == Square::Mine {
            return Ok(Reveal::Mine);
        }

        let mut opened = vec![pos];
        let mut visited: HashSet<Pos> = HashSet::from([pos]);
        let mut stack = if square == Square::Blank { vec![pos] } else { Vec::new() };
        while let Some(cur) = stack.pop() {
            for next in neighbors8(cur, self.size) {
                if !visited.insert(next) {
                    continue;
                }
                if self.covers[next.row][next.col] != Cover::Hidden {
                    continue;
                }
                let Some(sq) = field.get(next) else {
                    continue;
                };
                if sq == Square::Mine {
                    continue;
                }
                self.covers[next.row][next.col] = Cover::Revealed;
                opened.push(next);
                if sq == Square::Blank {
                    stack.push(next);
                }
            }
        }
        Ok(Reveal::Opened(opened))
    }

    /// Toggles a flag on a hidden cell. Returns whether the cell is now flagged.
    pub fn toggle_flag(&mut self, pos: Pos) -> Result<bool, RevealError> {
        let cell = self
            .covers
            .get_mut(pos.row)
            .and_then(|r| r.get_mut(pos.col))
            .ok_or(RevealError::OutOfBounds)?;
        match *cell {
            Cover::Hidden => {
                *cell = Cover::Flagged;
                Ok(true)
            }
            Cover::Flagged => {
                *cell = Cover::Hidden;
                Ok(false)
            }
            Cover::Revealed => Err(RevealError::AlreadyRevealed),
        }
    }
}
