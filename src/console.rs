//! The seam between the game core and whatever draws it and reads keys.

use std::io;
use std::time::Duration;

use crate::grid::{Dir, Grid, Pos};
use crate::minefield::{Board, Minefield};
use crate::session::Player;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    /// Reveal (or flag, in flag mode) the tile under the cursor.
    Select,
    /// Toggle flag mode in the mini-game.
    Flag,
    Quit,
    Other,
}

impl Key {
    pub fn dir(self) -> Option<Dir> {
        match self {
            Key::Up => Some(Dir::Up),
            Key::Down => Some(Dir::Down),
            Key::Left => Some(Dir::Left),
            Key::Right => Some(Dir::Right),
            _ => None,
        }
    }
}

pub struct MazeView<'a> {
    pub grid: &'a Grid,
    pub player: Player,
}

pub struct BoardView<'a> {
    pub field: &'a Minefield,
    pub board: &'a Board,
    pub cursor: Pos,
    pub flag_mode: bool,
    pub message: &'a str,
}

/// Shared by both session actors, hence `Sync`.
pub trait Console: Sync {
    /// Waits up to `timeout` for a key.
    fn poll_key(&self, timeout: Duration) -> io::Result<Option<Key>>;

    /// Blocks until a key arrives.
    fn read_key(&self) -> io::Result<Key>;

    /// Puts back a key that was read too early; the next read returns it first.
    fn unread(&self, key: Key);

    /// Number of maze rows that fit on screen.
    fn viewport_rows(&self) -> io::Result<usize>;

    fn draw_maze(&self, view: &MazeView<'_>) -> io::Result<()>;

    fn draw_board(&self, view: &BoardView<'_>) -> io::Result<()>;
}
