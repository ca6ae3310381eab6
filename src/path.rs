//! Depth-first route finding between two open cells.

use crate::grid::{Dir, Grid, Pos, Tile};

struct Frame {
    pos: Pos,
    next_dir: usize,
}

/// Finds a route from `start` to `goal`, trying up, down, left, right at
/// each cell. Visited cells are walled off in a private copy so the caller's
/// grid is left untouched.
///
/// Returns `None` when either endpoint is out of bounds or a wall, or when
/// the goal cannot be reached.
pub fn find_path(grid: &Grid, start: Pos, goal: Pos) -> Option<Vec<Pos>> {
    if grid.is_wall(start) || grid.is_wall(goal) {
        return None;
    }
    if start == goal {
        return Some(vec![start]);
    }

    let mut scratch = grid.clone();
    scratch.set(start, Tile::Wall);
    let mut stack = vec![Frame {
        pos: start,
        next_dir: 0,
    }];

    while let Some(frame) = stack.last_mut() {
        let Some(&dir) = Dir::ALL.get(frame.next_dir) else {
            stack.pop();
            continue;
        };
        frame.next_dir += 1;
        let Some(next) = frame.pos.step(dir) else {
            continue;
        };
        if scratch.is_wall(next) {
            continue;
        }
        if next == goal {
            let mut path: Vec<Pos> = stack.iter().map(|f| f.pos).collect();
            path.push(goal);
            return Some(path);
        }
        scratch.set(next, Tile::Wall);
        stack.push(Frame {
            pos: next,
            next_dir: 0,
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::parse_grid;

    fn grid(text: &str) -> Grid {
        parse_grid(text).unwrap()
    }

    #[test]
    fn follows_the_only_corridor() {
        let g = grid("# ###\n#   #\n### #\n#   #\n# ###\n");
        let path = find_path(&g, Pos::new(0, 1), Pos::new(4, 1)).unwrap();
        assert_eq!(path.first(), Some(&Pos::new(0, 1)));
        assert_eq!(path.last(), Some(&Pos::new(4, 1)));
        assert_eq!(path.len(), 9);
        for pair in path.windows(2) {
            assert_eq!(pair[0].manhattan(pair[1]), 1);
        }
    }

    #[test]
    fn caller_grid_is_untouched() {
        let g = grid("# ###\n#   #\n### #\n");
        let before = g.clone();
        let _ = find_path(&g, Pos::new(0, 1), Pos::new(2, 3));
        assert_eq!(g, before);
    }

    #[test]
    fn wall_or_out_of_bounds_endpoints() {
        let g = grid("# #\n# #\n# #\n");
        assert_eq!(find_path(&g, Pos::new(0, 0), Pos::new(2, 1)), None);
        assert_eq!(find_path(&g, Pos::new(0, 1), Pos::new(9, 1)), None);
    }

    #[test]
    fn unreachable_goal() {
        let g = grid("# #\n###\n# #\n");
        assert_eq!(find_path(&g, Pos::new(0, 1), Pos::new(2, 1)), None);
    }

    #[test]
    fn explores_up_before_down() {
        // Both branches reach the goal; the upward one is tried first.
        let g = grid("#####\n#   #\n#   #\n#   #\n#####\n");
        let path = find_path(&g, Pos::new(2, 1), Pos::new(2, 3)).unwrap();
        assert_eq!(path[1], Pos::new(1, 1));
    }
}
