//! Maze crawler: a generated maze patrolled by monsters, explored in the
//! terminal, with a minefield duel whenever a monster catches the player.

pub mod config;
pub mod console;
pub mod error;
pub mod grid;
pub mod maze;
pub mod minefield;
pub mod minigame;
pub mod monster;
pub mod path;
pub mod placement;
pub mod session;
pub mod store;
pub mod terminal;

pub use error::{MazeError, RevealError};
pub use grid::{Dir, Grid, Pos, Tile};
pub use session::{Outcome, Player, Session, SessionConfig, SessionReport, World};
