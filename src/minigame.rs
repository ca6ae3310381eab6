//! Interactive minefield played when a monster catches the player.

use rand::Rng;

use crate::console::{BoardView, Console, Key};
use crate::error::{MazeError, RevealError};
use crate::grid::Pos;
use crate::minefield::{Board, Minefield, Reveal, DEFAULT_FIELD_SIZE, DEFAULT_MINES};
use crate::session::{Challenge, ChallengeOutcome};
use crate::store::SaveDir;

const HINT: &str = "Use spacebar to select tile, 'f' to flag";
const CLEARED: &str = "Cleared!";
const LOST: &str = "GAME OVER! You Lose!";

pub struct Minesweeper<R> {
    size: usize,
    mines: usize,
    rng: R,
    store: Option<SaveDir>,
}

impl<R: Rng> Minesweeper<R> {
    pub fn new(rng: R) -> Self {
        Self {
            size: DEFAULT_FIELD_SIZE,
            mines: DEFAULT_MINES,
            rng,
            store: None,
        }
    }

    pub fn with_field(mut self, size: usize, mines: usize) -> Self {
        self.size = size.max(2);
        self.mines = mines.min(self.size * self.size - 1);
        self
    }

    /// Persists every fresh minefield to `store`.
    pub fn with_store(mut self, store: SaveDir) -> Self {
        self.store = Some(store);
        self
    }

    /// Lays out a new field. With a store, the field is saved and the copy
    /// read back from disk is the one played.
    pub fn next_field(&mut self) -> Result<Minefield, MazeError> {
        let field = Minefield::generate(self.size, self.mines, &mut self.rng);
        match &self.store {
            Some(store) => {
                store.save_minefield(&field)?;
                store.load_minefield()
            }
            None => Ok(field),
        }
    }
}

impl<R: Rng> Challenge for Minesweeper<R> {
    fn play(&mut self, console: &dyn Console) -> Result<ChallengeOutcome, MazeError> {
        let field = self.next_field()?;
        let outcome = play_field(&field, console)?;
        tracing::info!(?outcome, mines = field.mine_count(), "minefield finished");
        Ok(outcome)
    }
}

/// Runs the reveal loop on `field` until the board is cleared or a mine is hit.
pub fn play_field(field: &Minefield, console: &dyn Console) -> Result<ChallengeOutcome, MazeError> {
    let mut board = Board::new(field.size());
    let mut cursor = Pos::new(0, 0);
    let mut flag_mode = false;
    let mut message = String::from(HINT);

    loop {
        if board.is_cleared() {
            draw(console, field, &board, cursor, flag_mode, CLEARED)?;
            return Ok(ChallengeOutcome::Won);
        }
        draw(console, field, &board, cursor, flag_mode, &message)?;

        match console.read_key()? {
            Key::Flag => flag_mode = !flag_mode,
            Key::Select if flag_mode => {
                flag_mode = false;
                message = match board.toggle_flag(cursor) {
                    Ok(_) => String::from(HINT),
                    Err(RevealError::AlreadyRevealed) => {
                        String::from("Unable to flag revealed tiles. Please choose another one.")
                    }
                    Err(e) => e.to_string(),
                };
            }
            Key::Select => match board.reveal(field, cursor) {
                Ok(Reveal::Mine) => {
                    draw(console, field, &board, cursor, flag_mode, LOST)?;
                    return Ok(ChallengeOutcome::Lost);
                }
                Ok(Reveal::Opened(_)) => message = String::from(HINT),
                Err(e) => message = e.to_string(),
            },
            key => {
                if let Some(next) = key.dir().and_then(|d| cursor.step(d)) {
                    if next.row < field.size() && next.col < field.size() {
                        cursor = next;
                    }
                }
            }
        }
    }
}

fn draw(
    console: &dyn Console,
    field: &Minefield,
    board: &Board,
    cursor: Pos,
    flag_mode: bool,
    message: &str,
) -> Result<(), MazeError> {
    console.draw_board(&BoardView {
        field,
        board,
        cursor,
        flag_mode,
        message,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::MazeView;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::VecDeque;
    use std::io;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Keys {
        keys: Mutex<VecDeque<Key>>,
        messages: Mutex<Vec<String>>,
        hidden: Mutex<Vec<usize>>,
    }

    impl Keys {
        fn new(keys: &[Key]) -> Self {
            Self {
                keys: Mutex::new(keys.iter().copied().collect()),
                ..Self::default()
            }
        }
    }

    impl Console for Keys {
        fn poll_key(&self, _timeout: Duration) -> io::Result<Option<Key>> {
            Ok(self.keys.lock().unwrap().pop_front())
        }

        fn read_key(&self) -> io::Result<Key> {
            self.keys
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted"))
        }

        fn unread(&self, key: Key) {
            self.keys.lock().unwrap().push_front(key);
        }

        fn viewport_rows(&self) -> io::Result<usize> {
            Ok(10)
        }

        fn draw_maze(&self, _view: &MazeView<'_>) -> io::Result<()> {
            Ok(())
        }

        fn draw_board(&self, view: &BoardView<'_>) -> io::Result<()> {
            self.messages.lock().unwrap().push(view.message.to_string());
            self.hidden.lock().unwrap().push(view.board.hidden_count());
            Ok(())
        }
    }

    fn field(mines: &[(usize, usize)], size: usize) -> Minefield {
        let mut mask = vec![vec![false; size]; size];
        for &(r, c) in mines {
            mask[r][c] = true;
        }
        Minefield::from_mines(&mask)
    }

    #[test]
    fn clearing_by_flood_and_flag_wins() {
        let f = field(&[(2, 2)], 3);
        let console = Keys::new(&[
            Key::Select,
            Key::Down,
            Key::Down,
            Key::Right,
            Key::Right,
            Key::Flag,
            Key::Select,
        ]);
        assert_eq!(play_field(&f, &console).unwrap(), ChallengeOutcome::Won);
        assert_eq!(console.messages.lock().unwrap().last().unwrap(), CLEARED);
    }

    #[test]
    fn stepping_on_a_mine_loses() {
        let f = field(&[(0, 1)], 3);
        let console = Keys::new(&[Key::Right, Key::Select]);
        assert_eq!(play_field(&f, &console).unwrap(), ChallengeOutcome::Lost);
        assert_eq!(console.messages.lock().unwrap().last().unwrap(), LOST);
    }

    #[test]
    fn repeated_reveal_reports_and_continues() {
        let f = field(&[(2, 2)], 3);
        let console = Keys::new(&[
            Key::Right,
            Key::Right,
            Key::Down,
            Key::Select,
            Key::Select,
            Key::Down,
            Key::Right,
        ]);
        let err = play_field(&f, &console).unwrap_err();
        assert!(matches!(err, MazeError::Terminal(_)));
        let messages = console.messages.lock().unwrap();
        assert!(messages.iter().any(|m| m == &RevealError::AlreadyRevealed.to_string()));
    }

    #[test]
    fn flagging_a_revealed_tile_is_refused() {
        let f = field(&[(0, 0)], 3);
        let console = Keys::new(&[
            Key::Down,
            Key::Down,
            Key::Right,
            Key::Right,
            Key::Select,
            Key::Up,
            Key::Flag,
            Key::Select,
        ]);
        assert!(play_field(&f, &console).is_err());
        let messages = console.messages.lock().unwrap();
        assert!(messages.last().unwrap().starts_with("Unable to flag"));
    }

    #[test]
    fn hidden_count_never_grows() {
        let f = field(&[(0, 4), (4, 0)], 5);
        let console = Keys::new(&[
            Key::Down,
            Key::Down,
            Key::Select,
            Key::Flag,
            Key::Select,
            Key::Select,
            Key::Up,
            Key::Up,
            Key::Select,
        ]);
        let _ = play_field(&f, &console);
        let hidden = console.hidden.lock().unwrap();
        assert!(hidden.windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn cursor_stays_on_the_board() {
        let f = field(&[(1, 1)], 3);
        let console = Keys::new(&[Key::Up, Key::Left, Key::Select]);
        assert!(play_field(&f, &console).is_err());
        assert_eq!(console.hidden.lock().unwrap().last(), Some(&8));
    }

    #[test]
    fn stored_field_is_the_one_played() {
        let dir = tempfile::tempdir().unwrap();
        let store = SaveDir::new(dir.path());
        let mut game = Minesweeper::new(ChaCha8Rng::seed_from_u64(9))
            .with_field(4, 3)
            .with_store(store.clone());
        let field = game.next_field().unwrap();
        assert_eq!(field.mine_count(), 3);
        assert_eq!(store.load_minefield().unwrap(), field);

        let mut empty = Minesweeper::new(ChaCha8Rng::seed_from_u64(1))
            .with_field(3, 0)
            .with_store(store.clone());
        let console = Keys::new(&[Key::Select]);
        assert_eq!(empty.play(&console).unwrap(), ChallengeOutcome::Won);
        assert_eq!(store.load_minefield().unwrap().mine_count(), 0);
    }
}
