//! crossterm front end: raw-mode terminal, diffing maze renderer and the
//! minefield board.

use std::collections::VecDeque;
use std::io::{self, Stdout, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{ExecutableCommand, QueueableCommand};
use unicode_width::UnicodeWidthStr;

use crate::console::{BoardView, Console, Key, MazeView};
use crate::grid::{Pos, Tile};
use crate::minefield::{Cover, Square};

const CELL_W: usize = 2;
/// Rows reserved below the maze for the HP line.
const HUD_ROWS: u16 = 2;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Glyph {
    Player,
    Monster,
    Checkpoint,
    Wall,
    Path,
}

impl Glyph {
    fn for_tile(tile: Tile) -> Glyph {
        match tile {
            Tile::Wall => Glyph::Wall,
            Tile::Path => Glyph::Path,
            Tile::Checkpoint => Glyph::Checkpoint,
            Tile::Monster => Glyph::Monster,
        }
    }

    fn style(self) -> (&'static str, Color) {
        match self {
            Glyph::Player => ("P ", Color::Yellow),
            Glyph::Monster => ("M ", Color::Green),
            Glyph::Checkpoint => ("C ", Color::Yellow),
            Glyph::Wall => ("██", Color::White),
            Glyph::Path => ("  ", Color::Reset),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum BoardGlyph {
    Hidden,
    Flag,
    Mine,
    Blank,
    Count(u8),
}

impl BoardGlyph {
    fn for_cell(cover: Cover, square: Square) -> BoardGlyph {
        match (cover, square) {
            (Cover::Hidden, _) => BoardGlyph::Hidden,
            (Cover::Flagged, _) => BoardGlyph::Flag,
            (Cover::Revealed, Square::Mine) => BoardGlyph::Mine,
            (Cover::Revealed, Square::Blank) => BoardGlyph::Blank,
            (Cover::Revealed, Square::Count(n)) => BoardGlyph::Count(n),
        }
    }

    /// (text, foreground, background)
    fn style(self) -> (char, Color, Color) {
        match self {
            BoardGlyph::Hidden => ('#', Color::White, Color::Reset),
            BoardGlyph::Flag => ('F', Color::Black, Color::White),
            BoardGlyph::Mine => ('X', Color::White, Color::Red),
            BoardGlyph::Blank => (' ', Color::Reset, Color::Reset),
            BoardGlyph::Count(n) => (char::from(b'0' + n), Color::Cyan, Color::Reset),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Maze,
    Board,
}

struct Screen {
    stdout: Stdout,
    last: Vec<Glyph>,
    last_hud: String,
    last_offset: usize,
    needs_full: bool,
    mode: Mode,
}

impl Screen {
    fn new() -> Self {
        Self {
            stdout: io::stdout(),
            last: Vec::new(),
            last_hud: String::new(),
            last_offset: 0,
            needs_full: true,
            mode: Mode::Maze,
        }
    }

    fn switch_mode(&mut self, mode: Mode) -> io::Result<()> {
        if self.mode != mode {
            self.mode = mode;
            self.needs_full = true;
            self.stdout.queue(Clear(ClearType::All))?;
        }
        Ok(())
    }
}

/// Raw-mode alternate screen. Restores the terminal when dropped.
pub struct Terminal {
    screen: Mutex<Screen>,
    pending: Mutex<VecDeque<Key>>,
}

impl Terminal {
    pub fn enter() -> io::Result<Self> {
        let mut stdout = io::stdout();
        terminal::enable_raw_mode()?;
        stdout.execute(EnterAlternateScreen)?;
        stdout.execute(Hide)?;
        Ok(Self {
            screen: Mutex::new(Screen::new()),
            pending: Mutex::new(VecDeque::new()),
        })
    }

    fn screen(&self) -> MutexGuard<'_, Screen> {
        self.screen.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn pending(&self) -> MutexGuard<'_, VecDeque<Key>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clears the screen, shows `message` centred and holds it for `hold`.
    pub fn banner(&self, message: &str, hold: Duration) -> io::Result<()> {
        {
            let mut screen = self.screen();
            screen.needs_full = true;
            let (w, h) = terminal::size()?;
            let x = w.saturating_sub(message.width() as u16) / 2;
            let out = &mut screen.stdout;
            out.queue(Clear(ClearType::All))?;
            out.queue(MoveTo(x, h / 2))?;
            out.queue(Print(message))?;
            out.flush()?;
        }
        thread::sleep(hold);
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        let _ = stdout.execute(Show);
        let _ = stdout.execute(LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

fn map_key(key: KeyEvent) -> Option<Key> {
    match key.kind {
        KeyEventKind::Press | KeyEventKind::Repeat => {}
        _ => return None,
    }
    Some(match key.code {
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('k') => Key::Up,
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('j') => Key::Down,
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('h') => Key::Left,
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('l') => Key::Right,
        KeyCode::Char(' ') | KeyCode::Enter => Key::Select,
        KeyCode::Char('f') => Key::Flag,
        KeyCode::Char('x') | KeyCode::Char('X') | KeyCode::Char('q') => Key::Quit,
        _ => Key::Other,
    })
}

impl Console for Terminal {
    fn poll_key(&self, timeout: Duration) -> io::Result<Option<Key>> {
        if let Some(key) = self.pending().pop_front() {
            return Ok(Some(key));
        }
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) => Ok(map_key(key)),
            Event::Resize(_, _) => {
                self.screen().needs_full = true;
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn read_key(&self) -> io::Result<Key> {
        if let Some(key) = self.pending().pop_front() {
            return Ok(key);
        }
        loop {
            if let Event::Key(key) = event::read()? {
                if let Some(key) = map_key(key) {
                    return Ok(key);
                }
            }
        }
    }

    fn unread(&self, key: Key) {
        self.pending().push_front(key);
    }

    fn viewport_rows(&self) -> io::Result<usize> {
        let (_, h) = terminal::size()?;
        Ok(h.saturating_sub(HUD_ROWS).max(1) as usize)
    }

    fn draw_maze(&self, view: &MazeView<'_>) -> io::Result<()> {
        let mut screen = self.screen();
        screen.switch_mode(Mode::Maze)?;
        let grid = view.grid;
        let player = view.player;

        let (term_w, term_h) = terminal::size()?;
        let needed_w = (grid.cols() * CELL_W) as u16;
        if term_w < needed_w {
            let out = &mut screen.stdout;
            out.queue(Clear(ClearType::All))?;
            out.queue(MoveTo(0, 0))?;
            out.queue(Print(format!(
                "Screen width of {} required. Current width: {}",
                needed_w, term_w
            )))?;
            out.flush()?;
            screen.needs_full = true;
            return Ok(());
        }

        let rows = (term_h.saturating_sub(HUD_ROWS).max(1) as usize).min(grid.rows());
        if screen.last.len() != rows * grid.cols() || screen.last_offset != player.offset {
            screen.last = vec![Glyph::Path; rows * grid.cols()];
            screen.last_offset = player.offset;
            screen.needs_full = true;
        }
        if screen.needs_full {
            screen.stdout.queue(Clear(ClearType::All))?;
        }

        for y in 0..rows {
            let row = player.offset + y;
            if row >= grid.rows() {
                break;
            }
            for x in 0..grid.cols() {
                let pos = Pos::new(row, x);
                let glyph = if pos == player.pos {
                    Glyph::Player
                } else {
                    grid.get(pos).map_or(Glyph::Wall, Glyph::for_tile)
                };
                let idx = y * grid.cols() + x;
                if screen.needs_full || screen.last[idx] != glyph {
                    screen.last[idx] = glyph;
                    draw_cell(&mut screen.stdout, x, y, glyph)?;
                }
            }
        }

        let hud = format!("HP: {}   (wasd/hjkl to move, x to save and quit)", player.hp);
        if screen.needs_full || hud != screen.last_hud {
            let out = &mut screen.stdout;
            out.queue(MoveTo(0, rows as u16))?;
            out.queue(Clear(ClearType::CurrentLine))?;
            out.queue(SetForegroundColor(Color::White))?;
            out.queue(Print(&hud))?;
            out.queue(ResetColor)?;
            screen.last_hud = hud;
        }
        screen.needs_full = false;
        screen.stdout.flush()
    }

    fn draw_board(&self, view: &BoardView<'_>) -> io::Result<()> {
        let mut screen = self.screen();
        screen.switch_mode(Mode::Board)?;
        let out = &mut screen.stdout;
        let size = view.board.size();
        for row in 0..size {
            out.queue(MoveTo(0, row as u16))?;
            for col in 0..size {
                let pos = Pos::new(row, col);
                let glyph = match (view.board.cover(pos), view.field.get(pos)) {
                    (Some(cover), Some(square)) => BoardGlyph::for_cell(cover, square),
                    _ => BoardGlyph::Hidden,
                };
                let (ch, mut fg, bg) = glyph.style();
                if pos == view.cursor && !matches!(glyph, BoardGlyph::Flag | BoardGlyph::Mine) {
                    fg = Color::Yellow;
                }
                out.queue(SetForegroundColor(fg))?;
                out.queue(SetBackgroundColor(bg))?;
                out.queue(Print(ch))?;
            }
            out.queue(ResetColor)?;
        }
        out.queue(MoveTo(0, size as u16))?;
        out.queue(Clear(ClearType::CurrentLine))?;
        out.queue(Print(format!(
            "Current coordinates: {} {} {}",
            view.cursor.col,
            view.cursor.row,
            if view.flag_mode { "(flag ON)" } else { "(flag OFF)" }
        )))?;
        out.queue(MoveTo(0, size as u16 + 1))?;
        out.queue(Clear(ClearType::CurrentLine))?;
        out.queue(Print(view.message))?;
        out.flush()
    }
}

fn draw_cell(out: &mut Stdout, x: usize, y: usize, glyph: Glyph) -> io::Result<()> {
    let (text, color) = glyph.style();
    out.queue(MoveTo((x * CELL_W) as u16, y as u16))?;
    out.queue(SetForegroundColor(color))?;
    out.queue(Print(text))?;
    let w = UnicodeWidthStr::width(text);
    if w < CELL_W {
        for _ in 0..(CELL_W - w) {
            out.queue(Print(' '))?;
        }
    }
    out.queue(ResetColor)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn keys_map_to_game_actions() {
        assert_eq!(map_key(press(KeyCode::Char('w'))), Some(Key::Up));
        assert_eq!(map_key(press(KeyCode::Char('j'))), Some(Key::Down));
        assert_eq!(map_key(press(KeyCode::Left)), Some(Key::Left));
        assert_eq!(map_key(press(KeyCode::Char(' '))), Some(Key::Select));
        assert_eq!(map_key(press(KeyCode::Char('f'))), Some(Key::Flag));
        assert_eq!(map_key(press(KeyCode::Char('X'))), Some(Key::Quit));
        assert_eq!(map_key(press(KeyCode::Char('z'))), Some(Key::Other));
    }

    #[test]
    fn glyphs_fill_two_columns() {
        for glyph in [Glyph::Player, Glyph::Monster, Glyph::Checkpoint, Glyph::Wall, Glyph::Path] {
            assert_eq!(UnicodeWidthStr::width(glyph.style().0), CELL_W);
        }
    }

    #[test]
    fn board_glyphs_follow_cover() {
        assert!(matches!(BoardGlyph::for_cell(Cover::Hidden, Square::Mine), BoardGlyph::Hidden));
        assert!(matches!(BoardGlyph::for_cell(Cover::Flagged, Square::Blank), BoardGlyph::Flag));
        assert_eq!(BoardGlyph::for_cell(Cover::Revealed, Square::Count(4)).style().0, '4');
    }
}
