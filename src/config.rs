use std::path::PathBuf;
use std::time::Duration;

use crate::minefield::{DEFAULT_FIELD_SIZE, DEFAULT_MINES};
use crate::session::{SessionConfig, DEFAULT_HP, DEFAULT_POLL_MS, DEFAULT_TICK_MS};
use crate::store::DEFAULT_DIR;

pub const DEFAULT_SIZE: usize = 51;
pub const DEFAULT_DENSITY: f32 = 0.5;

#[derive(Clone, Debug)]
pub struct Settings {
    pub size: usize,
    pub density: f32,
    pub hp: u32,
    pub seed: Option<u64>,
    pub field_size: usize,
    pub mines: usize,
    pub save_dir: PathBuf,
    pub session: SessionConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            density: DEFAULT_DENSITY,
            hp: DEFAULT_HP,
            seed: None,
            field_size: DEFAULT_FIELD_SIZE,
            mines: DEFAULT_MINES,
            save_dir: PathBuf::from(DEFAULT_DIR),
            session: SessionConfig::default(),
        }
    }
}

impl Settings {
    /// Applies `MAZE_TICK_MS` and `MAZE_POLL_MS` on top of the current timings.
    pub fn with_env_speed(mut self) -> Self {
        let (tick, poll) = read_speed_settings();
        self.session.tick = tick;
        self.session.poll = poll;
        self
    }
}

/// Monster tick and input poll intervals from the environment.
pub fn read_speed_settings() -> (Duration, Duration) {
    let tick = millis_or(std::env::var("MAZE_TICK_MS").ok(), DEFAULT_TICK_MS);
    let poll = millis_or(std::env::var("MAZE_POLL_MS").ok(), DEFAULT_POLL_MS);
    (Duration::from_millis(tick), Duration::from_millis(poll))
}

fn millis_or(value: Option<String>, default: u64) -> u64 {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}
