//! Randomized Prim's maze generation.

use std::collections::{HashSet, VecDeque};

use rand::Rng;

use crate::error::MazeError;
use crate::grid::{Grid, Pos, Tile};

pub const DEFAULT_START: Pos = Pos::new(1, 1);

/// A wall cell two steps away from an already carved cell.
#[derive(Clone, Copy, Debug)]
struct FrontierEntry {
    from: Pos,
    to: Pos,
}

/// Frontier list with at most one entry per target coordinate.
struct Frontier {
    entries: Vec<FrontierEntry>,
    queued: HashSet<Pos>,
}

impl Frontier {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            queued: HashSet::new(),
        }
    }

    fn push(&mut self, entry: FrontierEntry) {
        if self.queued.insert(entry.to) {
            self.entries.push(entry);
        }
    }

    fn take_random(&mut self, rng: &mut impl Rng) -> Option<FrontierEntry> {
        if self.entries.is_empty() {
            return None;
        }
        let idx = rng.gen_range(0..self.entries.len());
        let entry = self.entries.swap_remove(idx);
        self.queued.remove(&entry.to);
        Some(entry)
    }
}

/// Generates an N x N maze carved from `start`, with the entrance at
/// `(0, 1)` and the exit at `(N-1, N-2)` opened afterwards.
pub fn generate(size: usize, start: Pos, rng: &mut impl Rng) -> Result<Grid, MazeError> {
    if size < 5 || size % 2 == 0 {
        return Err(MazeError::InvalidSize(size));
    }
    let mut grid = Grid::filled(size, size, Tile::Wall);
    if !is_interior(start, size) {
        return Err(MazeError::Malformed {
            line: start.row + 1,
            reason: format!("start {:?} is not inside the border", start),
        });
    }

    let mut frontier = Frontier::new();
    grid.set(start, Tile::Path);
    add_frontier(&grid, start, size, &mut frontier);

    while let Some(FrontierEntry { from, to }) = frontier.take_random(rng) {
        let wall = Pos::new((from.row + to.row) / 2, (from.col + to.col) / 2);
        if grid.is_wall(wall) && grid.is_wall(to) {
            grid.set(wall, Tile::Path);
            grid.set(to, Tile::Path);
            add_frontier(&grid, to, size, &mut frontier);
        }
    }

    let entrance = grid.entrance();
    let exit = grid.exit();
    grid.set(entrance, Tile::Path);
    grid.set(exit, Tile::Path);

    tracing::debug!(size, ?start, "maze carved");
    Ok(grid)
}

fn is_interior(pos: Pos, size: usize) -> bool {
    pos.row > 0 && pos.col > 0 && pos.row < size - 1 && pos.col < size - 1
}

fn add_frontier(grid: &Grid, from: Pos, size: usize, frontier: &mut Frontier) {
    for (dr, dc) in [(-2isize, 0isize), (2, 0), (0, -2), (0, 2)] {
        let Some(to) = from.offset(dr, dc) else {
            continue;
        };
        if is_interior(to, size) && grid.is_wall(to) {
            frontier.push(FrontierEntry { from, to });
        }
    }
}

/// Open cells reachable from `start` through 4-neighbour steps.
pub fn reachable(grid: &Grid, start: Pos) -> Vec<Vec<bool>> {
    let mut seen = vec![vec![false; grid.cols()]; grid.rows()];
    if !grid.is_open(start) {
        return seen;
    }
    let mut q = VecDeque::new();
    seen[start.row][start.col] = true;
    q.push_back(start);
    while let Some(pos) = q.pop_front() {
        for next in grid.neighbors(pos) {
            if seen[next.row][next.col] || !grid.is_open(next) {
                continue;
            }
            seen[next.row][next.col] = true;
            q.push_back(next);
        }
    }
    seen
}

/// True when every open cell can be reached from the entrance.
pub fn is_connected(grid: &Grid) -> bool {
    let seen = reachable(grid, grid.entrance());
    grid.positions()
        .filter(|p| grid.is_open(*p))
        .all(|p| seen[p.row][p.col])
}
