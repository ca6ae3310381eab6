use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

use maze_game::config::{Settings, DEFAULT_DENSITY, DEFAULT_SIZE};
use maze_game::maze::{self, DEFAULT_START};
use maze_game::minefield::{DEFAULT_FIELD_SIZE, DEFAULT_MINES};
use maze_game::minigame::Minesweeper;
use maze_game::placement::{populate, recover};
use maze_game::session::DEFAULT_HP;
use maze_game::store::{SaveDir, DEFAULT_DIR, LOG_FILE};
use maze_game::terminal::Terminal;
use maze_game::{Outcome, Player, Session, World};

const BANNER_HOLD: Duration = Duration::from_secs(2);

/// Escape a generated maze without losing all your hit points to its monsters.
#[derive(Parser, Debug)]
#[command(name = "maze", version)]
struct Cli {
    /// Continue the saved session instead of generating a new maze.
    #[arg(long)]
    resume: bool,

    /// Maze side length (odd, at least 5).
    #[arg(long, default_value_t = DEFAULT_SIZE)]
    size: usize,

    /// Share of eligible dead ends that get a monster, 0.0 to 1.0.
    #[arg(long, default_value_t = DEFAULT_DENSITY)]
    density: f32,

    /// Seed for a reproducible maze.
    #[arg(long)]
    seed: Option<u64>,

    /// Starting hit points for a new game.
    #[arg(long, default_value_t = DEFAULT_HP)]
    hp: u32,

    /// Minefield side length.
    #[arg(long, default_value_t = DEFAULT_FIELD_SIZE)]
    field_size: usize,

    /// Mines per minefield.
    #[arg(long, default_value_t = DEFAULT_MINES)]
    mines: usize,

    /// Where maze, minefield, status and log files live.
    #[arg(long, default_value = DEFAULT_DIR)]
    save_dir: PathBuf,
}

impl Cli {
    fn settings(&self) -> Settings {
        Settings {
            size: self.size,
            density: self.density,
            hp: self.hp,
            seed: self.seed,
            field_size: self.field_size,
            mines: self.mines,
            save_dir: self.save_dir.clone(),
            ..Settings::default()
        }
        .with_env_speed()
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = cli.settings();
    let store = SaveDir::new(&settings.save_dir);
    let created = store.ensure(settings.hp)?;
    init_logging(&store);
    if created {
        tracing::info!(dir = %store.root().display(), "created save directory");
    }

    let mut rng = match settings.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    let world = if cli.resume {
        resume(&store, &mut rng)?
    } else {
        new_game(&store, &settings, &mut rng)?
    };

    let mut challenge = Minesweeper::new(ChaCha8Rng::seed_from_u64(rng.gen()))
        .with_field(settings.field_size, settings.mines)
        .with_store(store.clone());

    let report = {
        let term = Terminal::enter().context("failed to set up the terminal")?;
        let report = Session::new(world, settings.session).run(&term, &mut challenge)?;
        match report.outcome {
            Outcome::Won => term.banner("You Win!", BANNER_HOLD)?,
            Outcome::Lost => term.banner("Game over!", BANNER_HOLD)?,
            Outcome::Quit => {}
        }
        report
    };

    if report.outcome == Outcome::Quit {
        store.save_status(&report.player)?;
        println!("Progress saved to {}", store.root().display());
    }
    Ok(())
}

fn new_game(store: &SaveDir, settings: &Settings, rng: &mut ChaCha8Rng) -> Result<World> {
    let mut grid = maze::generate(settings.size, DEFAULT_START, rng)?;
    let placement = populate(&mut grid, settings.density, rng)?;
    store.save_grid(&grid)?;
    let player = Player::at_entrance(settings.hp);
    store.save_status(&player)?;
    tracing::info!(size = settings.size, seed = ?settings.seed, "new game");
    Ok(World::new(grid, placement.monsters, placement.checkpoints, player))
}

fn resume(store: &SaveDir, rng: &mut ChaCha8Rng) -> Result<World> {
    let player = store.load_status().context("cannot resume without a status file")?;
    let grid = store.load_grid().context("cannot resume without a saved maze")?;
    if !grid.is_open(player.pos) {
        bail!("saved position {:?} is not inside the maze", player.pos);
    }
    let placement = recover(&grid, rng);
    tracing::info!(pos = ?player.pos, hp = player.hp, "resumed game");
    Ok(World::new(grid, placement.monsters, placement.checkpoints, player))
}

/// Logs go to a file in the save directory; the terminal belongs to the game.
fn init_logging(store: &SaveDir) {
    let path = store.path(LOG_FILE);
    let file = match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("logging disabled, cannot open {}: {}", path.display(), e);
            return;
        }
    };
    let filter = EnvFilter::try_from_env("MAZE_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}
