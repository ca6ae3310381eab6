use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use maze_game::console::{BoardView, Console, Key, MazeView};
use maze_game::session::{Challenge, ChallengeOutcome};
use maze_game::{MazeError, Pos, SessionConfig, Tile};

/// Longest a scripted read waits before giving up.
const WAIT_CAP: Duration = Duration::from_secs(2);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Drew { pos: Pos, hp: u32, monsters: Vec<Pos> },
    ChallengeStarted,
    ChallengeEnded,
}

pub type Entry = (Instant, Event);
pub type Journal = Arc<Mutex<Vec<Entry>>>;

type Release = Box<dyn Fn(&[Entry]) -> bool + Send + Sync>;

fn record(journal: &Journal, event: Event) {
    journal.lock().unwrap().push((Instant::now(), event));
}

/// Entries logged after the last finished challenge.
pub fn after_challenge(entries: &[Entry]) -> &[Entry] {
    match entries.iter().rposition(|(_, e)| *e == Event::ChallengeEnded) {
        Some(idx) => &entries[idx + 1..],
        None => &[],
    }
}

/// Feeds a fixed key script and journals every maze frame.
pub struct ScriptedConsole {
    keys: Mutex<VecDeque<Key>>,
    journal: Journal,
    release: Option<Release>,
    blocking: bool,
    rows: usize,
}

impl ScriptedConsole {
    pub fn new(keys: &[Key]) -> Self {
        Self {
            keys: Mutex::new(keys.iter().copied().collect()),
            journal: Journal::default(),
            release: None,
            blocking: false,
            rows: 20,
        }
    }

    /// Withholds keys until `release` holds for the journal; polls time out
    /// with nothing meanwhile.
    pub fn release_when(mut self, release: impl Fn(&[Entry]) -> bool + Send + Sync + 'static) -> Self {
        self.release = Some(Box::new(release));
        self.blocking = false;
        self
    }

    /// Like `release_when`, but a poll blocks until then.
    pub fn hold_until(mut self, release: impl Fn(&[Entry]) -> bool + Send + Sync + 'static) -> Self {
        self.release = Some(Box::new(release));
        self.blocking = true;
        self
    }

    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }

    pub fn drawn(&self) -> Vec<Pos> {
        self.journal
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(_, e)| match e {
                Event::Drew { pos, .. } => Some(*pos),
                _ => None,
            })
            .collect()
    }

    fn released(&self) -> bool {
        match &self.release {
            Some(release) => release(&self.journal.lock().unwrap()),
            None => true,
        }
    }
}

impl Console for ScriptedConsole {
    fn poll_key(&self, timeout: Duration) -> io::Result<Option<Key>> {
        if self.blocking {
            let deadline = Instant::now() + WAIT_CAP;
            while !self.released() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(1));
            }
        }
        if self.released() {
            if let Some(key) = self.keys.lock().unwrap().pop_front() {
                return Ok(Some(key));
            }
        }
        thread::sleep(timeout);
        Ok(None)
    }

    fn read_key(&self) -> io::Result<Key> {
        let deadline = Instant::now() + WAIT_CAP;
        loop {
            if let Some(key) = self.keys.lock().unwrap().pop_front() {
                return Ok(key);
            }
            if Instant::now() >= deadline {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted"));
            }
            thread::sleep(Duration::from_millis(1));
        }
    }

    fn unread(&self, key: Key) {
        self.keys.lock().unwrap().push_front(key);
    }

    fn viewport_rows(&self) -> io::Result<usize> {
        Ok(self.rows)
    }

    fn draw_maze(&self, view: &MazeView<'_>) -> io::Result<()> {
        record(
            &self.journal,
            Event::Drew {
                pos: view.player.pos,
                hp: view.player.hp,
                monsters: view.grid.find_all(Tile::Monster),
            },
        );
        Ok(())
    }

    fn draw_board(&self, _view: &BoardView<'_>) -> io::Result<()> {
        Ok(())
    }
}

/// A challenge that always ends the same way, optionally after a pause and
/// after reading a few keys.
pub struct FixedChallenge {
    pub outcome: ChallengeOutcome,
    pub plays: usize,
    pub keys: Vec<Key>,
    reads: usize,
    hold: Duration,
    journal: Option<Journal>,
}

impl FixedChallenge {
    pub fn new(outcome: ChallengeOutcome) -> Self {
        Self {
            outcome,
            plays: 0,
            keys: Vec::new(),
            reads: 0,
            hold: Duration::ZERO,
            journal: None,
        }
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn holding(mut self, hold: Duration) -> Self {
        self.hold = hold;
        self
    }

    pub fn reading(mut self, reads: usize) -> Self {
        self.reads = reads;
        self
    }
}

impl Challenge for FixedChallenge {
    fn play(&mut self, console: &dyn Console) -> Result<ChallengeOutcome, MazeError> {
        self.plays += 1;
        if let Some(journal) = &self.journal {
            record(journal, Event::ChallengeStarted);
        }
        thread::sleep(self.hold);
        for _ in 0..self.reads {
            self.keys.push(console.read_key()?);
        }
        if let Some(journal) = &self.journal {
            record(journal, Event::ChallengeEnded);
        }
        Ok(self.outcome)
    }
}

pub fn fast_config() -> SessionConfig {
    SessionConfig {
        tick: Duration::from_millis(5),
        poll: Duration::from_millis(1),
        collision_pause: Duration::from_millis(1),
        win_cooldown: Duration::from_millis(1),
    }
}
