use rand::Rng;

use crate::grid::{Dir, Grid, Pos, Tile};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Monster {
    pub id: usize,
    pub pos: Pos,
    pub dir: Dir,
}

impl Monster {
    pub fn new(id: usize, pos: Pos, dir: Dir) -> Self {
        Self { id, pos, dir }
    }

    /// Spawns at `pos` facing the initial direction for that cell.
    pub fn spawn(id: usize, pos: Pos, grid: &Grid, rng: &mut impl Rng) -> Self {
        Self::new(id, pos, initial_dir(grid, pos, rng))
    }

    /// One tick of patrol movement.
    ///
    /// A blocked vertical mover turns left, then right, and reverses only when
    /// both sides are closed. A blocked horizontal mover reverses. The move is
    /// committed only if the resulting target is free; otherwise the monster
    /// keeps its cell for this tick. Returns whether it moved.
    pub fn advance(&mut self, grid: &mut Grid) -> bool {
        if !is_free_step(grid, self.pos, self.dir) {
            self.dir = if self.dir.is_vertical() {
                if is_free_step(grid, self.pos, Dir::Left) {
                    Dir::Left
                } else if is_free_step(grid, self.pos, Dir::Right) {
                    Dir::Right
                } else {
                    self.dir.reverse()
                }
            } else {
                self.dir.reverse()
            };
        }

        match self.pos.step(self.dir) {
            Some(target) if is_free(grid, target) => {
                grid.swap(self.pos, target);
                self.pos = target;
                true
            }
            _ => false,
        }
    }
}

/// Vertical when the cell above or below is a wall, horizontal otherwise;
/// the sign is a coin flip.
pub fn initial_dir(grid: &Grid, pos: Pos, rng: &mut impl Rng) -> Dir {
    let above = pos.step(Dir::Up).map_or(true, |p| grid.is_wall(p));
    let below = grid.is_wall(Pos::new(pos.row + 1, pos.col));
    let forward: bool = rng.gen();
    match (above || below, forward) {
        (true, true) => Dir::Down,
        (true, false) => Dir::Up,
        (false, true) => Dir::Right,
        (false, false) => Dir::Left,
    }
}

/// A cell a monster may step into: in bounds, plain path and not the entrance.
pub fn is_free(grid: &Grid, pos: Pos) -> bool {
    pos != grid.entrance() && grid.get(pos) == Some(Tile::Path)
}

fn is_free_step(grid: &Grid, pos: Pos, dir: Dir) -> bool {
    pos.step(dir).map_or(false, |p| is_free(grid, p))
}

/// Recovers monsters from the markers of a loaded grid, in row-major order.
pub fn scan_monsters(grid: &Grid, rng: &mut impl Rng) -> Vec<Monster> {
    grid.find_all(Tile::Monster)
        .into_iter()
        .enumerate()
        .map(|(id, pos)| Monster::spawn(id, pos, grid, rng))
        .collect()
}
