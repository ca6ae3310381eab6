//! Checkpoint and monster placement on a generated maze.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::MazeError;
use crate::grid::{Grid, Pos, Tile};
use crate::monster::{scan_monsters, Monster};
use crate::path::find_path;

/// Half-width of the monster-free square around a checkpoint.
pub const CHECKPOINT_ZONE_RADIUS: usize = 3;
/// Minimum Chebyshev distance between two monster spawns, exclusive.
pub const MONSTER_SPACING: usize = 5;

/// Cells where monsters may never be placed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoMonsterZone {
    rows: usize,
    cols: usize,
    mask: Vec<bool>,
}

impl NoMonsterZone {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            mask: vec![false; rows * cols],
        }
    }

    /// Marks the square of half-width `radius` around `center`, clipped to the grid.
    pub fn mark(&mut self, center: Pos, radius: usize) {
        let r0 = center.row.saturating_sub(radius);
        let c0 = center.col.saturating_sub(radius);
        let r1 = (center.row + radius).min(self.rows.saturating_sub(1));
        let c1 = (center.col + radius).min(self.cols.saturating_sub(1));
        for row in r0..=r1 {
            for col in c0..=c1 {
                self.mask[row * self.cols + col] = true;
            }
        }
    }

    pub fn contains(&self, pos: Pos) -> bool {
        pos.row < self.rows && pos.col < self.cols && self.mask[pos.row * self.cols + pos.col]
    }
}

#[derive(Clone, Debug)]
pub struct Placement {
    pub checkpoints: Vec<Pos>,
    pub zone: NoMonsterZone,
    pub monsters: Vec<Monster>,
}

/// Six targets at quarter offsets, as (row, col): top-left, top-right,
/// middle-left, middle-right, bottom-left, bottom-right.
pub fn checkpoint_targets(size: usize) -> [Pos; 6] {
    let q = size / 4;
    let mid = size / 2;
    let far = size.saturating_sub(q + 1);
    [
        Pos::new(q, q),
        Pos::new(q, far),
        Pos::new(mid, q),
        Pos::new(mid, far),
        Pos::new(far, q),
        Pos::new(far, far),
    ]
}

/// Places up to six checkpoints and returns them with the zone they exclude.
///
/// A wall target falls back to the first path cell of its 3x3 neighbourhood,
/// scanning column offsets outer and row offsets inner. Targets with no path
/// cell nearby are skipped.
pub fn place_checkpoints(grid: &mut Grid) -> (Vec<Pos>, NoMonsterZone) {
    let mut zone = NoMonsterZone::new(grid.rows(), grid.cols());
    let mut placed = Vec::new();
    for target in checkpoint_targets(grid.rows()) {
        let Some(spot) = checkpoint_spot(grid, target) else {
            tracing::debug!(?target, "no room for checkpoint");
            continue;
        };
        grid.set(spot, Tile::Checkpoint);
        zone.mark(spot, CHECKPOINT_ZONE_RADIUS);
        placed.push(spot);
    }
    (placed, zone)
}

fn checkpoint_spot(grid: &Grid, target: Pos) -> Option<Pos> {
    if grid.get(target) == Some(Tile::Path) {
        return Some(target);
    }
    for dc in -1isize..=1 {
        for dr in -1isize..=1 {
            if let Some(pos) = target.offset(dr, dc) {
                if grid.get(pos) == Some(Tile::Path) {
                    return Some(pos);
                }
            }
        }
    }
    None
}

/// Interior path cells with exactly one open neighbour, row-major.
pub fn dead_ends(grid: &Grid) -> Vec<Pos> {
    let rows = grid.rows();
    let cols = grid.cols();
    grid.positions()
        .filter(|p| p.row > 0 && p.col > 0 && p.row + 1 < rows && p.col + 1 < cols)
        .filter(|p| grid.get(*p) == Some(Tile::Path) && grid.open_neighbors(*p) == 1)
        .collect()
}

fn within(a: Pos, b: Pos, radius: usize) -> bool {
    a.row.abs_diff(b.row) <= radius && a.col.abs_diff(b.col) <= radius
}

/// Scatters monsters over dead ends outside `zone`, off `path`, and spaced
/// from each other. `density` is the clamped share of candidates to fill.
pub fn place_monsters(
    grid: &mut Grid,
    zone: &NoMonsterZone,
    path: &[Pos],
    density: f32,
    rng: &mut impl Rng,
) -> Vec<Monster> {
    let existing = grid.find_all(Tile::Monster);
    let mut candidates: Vec<Pos> = dead_ends(grid)
        .into_iter()
        .filter(|p| !zone.contains(*p))
        .filter(|p| !path.contains(p))
        .filter(|p| !existing.iter().any(|m| within(*m, *p, MONSTER_SPACING)))
        .collect();

    let wanted = (density.clamp(0.0, 1.0) * candidates.len() as f32) as usize;
    candidates.shuffle(rng);

    let mut chosen: Vec<Pos> = Vec::with_capacity(wanted);
    for pos in candidates {
        if chosen.len() >= wanted {
            break;
        }
        if chosen.iter().any(|m| within(*m, pos, MONSTER_SPACING)) {
            continue;
        }
        chosen.push(pos);
    }

    let first_id = existing.len();
    let mut monsters = Vec::with_capacity(chosen.len());
    for (i, pos) in chosen.into_iter().enumerate() {
        let monster = Monster::spawn(first_id + i, pos, grid, rng);
        grid.set(pos, Tile::Monster);
        monsters.push(monster);
    }
    monsters
}

/// Solves the maze, then places checkpoints and monsters on it.
pub fn populate(grid: &mut Grid, density: f32, rng: &mut impl Rng) -> Result<Placement, MazeError> {
    let from = grid.entrance();
    let to = grid.exit();
    let path = find_path(grid, from, to).ok_or(MazeError::NoPath { from, to })?;
    let (checkpoints, zone) = place_checkpoints(grid);
    let monsters = place_monsters(grid, &zone, &path, density, rng);
    tracing::info!(
        path_len = path.len(),
        checkpoints = checkpoints.len(),
        monsters = monsters.len(),
        "maze populated"
    );
    Ok(Placement {
        checkpoints,
        zone,
        monsters,
    })
}

/// Rebuilds placement state from the markers of a saved grid.
pub fn recover(grid: &Grid, rng: &mut impl Rng) -> Placement {
    let checkpoints = grid.find_all(Tile::Checkpoint);
    let mut zone = NoMonsterZone::new(grid.rows(), grid.cols());
    for cp in &checkpoints {
        zone.mark(*cp, CHECKPOINT_ZONE_RADIUS);
    }
    Placement {
        checkpoints,
        zone,
        monsters: scan_monsters(grid, rng),
    }
}
