use crate::error::MazeError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tile {
    Wall,
    Path,
    Checkpoint,
    Monster,
}

impl Tile {
    pub fn is_wall(self) -> bool {
        self == Tile::Wall
    }

    pub fn to_char(self) -> char {
        match self {
            Tile::Wall => '#',
            Tile::Path => ' ',
            Tile::Checkpoint => 'C',
            Tile::Monster => 'M',
        }
    }

    pub fn from_char(c: char) -> Option<Tile> {
        match c {
            '#' => Some(Tile::Wall),
            ' ' => Some(Tile::Path),
            'C' => Some(Tile::Checkpoint),
            'M' => Some(Tile::Monster),
            _ => None,
        }
    }
}

/// A grid coordinate, row first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl Pos {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    pub fn manhattan(self, other: Pos) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// Offset by a signed delta. `None` when the result would be negative.
    pub fn offset(self, dr: isize, dc: isize) -> Option<Pos> {
        let row = self.row.checked_add_signed(dr)?;
        let col = self.col.checked_add_signed(dc)?;
        Some(Pos { row, col })
    }

    pub fn step(self, dir: Dir) -> Option<Pos> {
        let (dr, dc) = dir.delta();
        self.offset(dr, dc)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

impl Dir {
    pub const ALL: [Dir; 4] = [Dir::Up, Dir::Down, Dir::Left, Dir::Right];

    /// (row, col) delta.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Dir::Up => (-1, 0),
            Dir::Down => (1, 0),
            Dir::Left => (0, -1),
            Dir::Right => (0, 1),
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Dir::Up | Dir::Down)
    }

    pub fn reverse(self) -> Dir {
        match self {
            Dir::Up => Dir::Down,
            Dir::Down => Dir::Up,
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Vec<Tile>>,
}

impl Grid {
    pub fn filled(rows: usize, cols: usize, tile: Tile) -> Self {
        Self {
            rows,
            cols,
            cells: vec![vec![tile; cols]; rows],
        }
    }

    /// Builds a grid from rows of tiles. Rejects empty and ragged input.
    pub fn from_rows(cells: Vec<Vec<Tile>>) -> Result<Self, MazeError> {
        let cols = match cells.first() {
            None => return Err(MazeError::EmptyGrid),
            Some(first) if first.is_empty() => return Err(MazeError::EmptyGrid),
            Some(first) => first.len(),
        };
        if let Some(line) = cells.iter().position(|row| row.len() != cols) {
            return Err(MazeError::Malformed {
                line: line + 1,
                reason: format!("expected {} columns, found {}", cols, cells[line].len()),
            });
        }
        Ok(Self {
            rows: cells.len(),
            cols,
            cells,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    pub fn get(&self, pos: Pos) -> Option<Tile> {
        self.cells.get(pos.row).and_then(|row| row.get(pos.col)).copied()
    }

    /// Writes `tile` at `pos`; out-of-bounds writes are ignored.
    pub fn set(&mut self, pos: Pos, tile: Tile) {
        if let Some(cell) = self.cells.get_mut(pos.row).and_then(|row| row.get_mut(pos.col)) {
            *cell = tile;
        }
    }

    pub fn swap(&mut self, a: Pos, b: Pos) {
        if let (Some(ta), Some(tb)) = (self.get(a), self.get(b)) {
            self.set(a, tb);
            self.set(b, ta);
        }
    }

    pub fn is_wall(&self, pos: Pos) -> bool {
        self.get(pos).map_or(true, Tile::is_wall)
    }

    /// In bounds and not a wall.
    pub fn is_open(&self, pos: Pos) -> bool {
        !self.is_wall(pos)
    }

    /// In-bounds 4-neighbours in up, down, left, right order.
    pub fn neighbors(&self, pos: Pos) -> impl Iterator<Item = Pos> + '_ {
        Dir::ALL
            .into_iter()
            .filter_map(move |dir| pos.step(dir))
            .filter(move |p| self.in_bounds(*p))
    }

    pub fn open_neighbors(&self, pos: Pos) -> usize {
        self.neighbors(pos).filter(|p| self.is_open(*p)).count()
    }

    pub fn positions(&self) -> impl Iterator<Item = Pos> {
        let cols = self.cols;
        (0..self.rows).flat_map(move |row| (0..cols).map(move |col| Pos { row, col }))
    }

    pub fn find_all(&self, tile: Tile) -> Vec<Pos> {
        self.positions().filter(|p| self.get(*p) == Some(tile)).collect()
    }

    /// Entrance cell: row 0, column 1.
    pub fn entrance(&self) -> Pos {
        Pos::new(0, 1)
    }

    /// Exit cell: last row, second-to-last column.
    pub fn exit(&self) -> Pos {
        Pos::new(self.rows.saturating_sub(1), self.cols.saturating_sub(2))
    }

    pub fn row_tiles(&self, row: usize) -> &[Tile] {
        self.cells.get(row).map_or(&[], |r| r.as_slice())
    }
}
