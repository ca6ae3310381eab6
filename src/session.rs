//! The live session: an input actor and a monster actor sharing one world.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use crate::console::{Console, Key, MazeView};
use crate::error::MazeError;
use crate::grid::{Dir, Grid, Pos};
use crate::monster::Monster;

pub const DEFAULT_HP: u32 = 5;
pub const DEFAULT_TICK_MS: u64 = 500;
pub const DEFAULT_POLL_MS: u64 = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Player {
    pub pos: Pos,
    pub hp: u32,
    /// First maze row shown in the viewport.
    pub offset: usize,
}

impl Player {
    pub fn at_entrance(hp: u32) -> Self {
        Self {
            pos: Pos::new(0, 1),
            hp,
            offset: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Won,
    Lost,
    Quit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChallengeOutcome {
    Won,
    Lost,
}

/// A blocking game played when a monster catches the player.
pub trait Challenge {
    fn play(&mut self, console: &dyn Console) -> Result<ChallengeOutcome, MazeError>;
}

#[derive(Clone, Copy, Debug)]
pub struct SessionConfig {
    pub tick: Duration,
    pub poll: Duration,
    /// Pause after every challenge, before movement resumes.
    pub collision_pause: Duration,
    /// Extra grace period after a won challenge.
    pub win_cooldown: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(DEFAULT_TICK_MS),
            poll: Duration::from_millis(DEFAULT_POLL_MS),
            collision_pause: Duration::from_secs(1),
            win_cooldown: Duration::from_secs(6),
        }
    }
}

pub struct World {
    pub grid: Grid,
    pub monsters: Vec<Monster>,
    pub checkpoints: Vec<Pos>,
    pub player: Player,
    /// Viewport height last reported by the console.
    pub view_rows: usize,
}

impl World {
    pub fn new(grid: Grid, monsters: Vec<Monster>, checkpoints: Vec<Pos>, player: Player) -> Self {
        let view_rows = grid.rows();
        Self {
            grid,
            monsters,
            checkpoints,
            player,
            view_rows,
        }
    }

    /// Moves the player one cell if the target is open, scrolling the
    /// viewport when the player leaves the middle of the window.
    pub fn move_player(&mut self, dir: Dir) {
        let rows = self.view_rows;
        let p = &mut self.player;
        match dir {
            Dir::Up => {
                if p.pos.row.saturating_sub(p.offset) < rows / 2 && p.offset > 0 {
                    p.offset -= 1;
                }
            }
            Dir::Down => {
                if p.pos.row > rows / 2 + p.offset && p.offset + rows < self.grid.rows() {
                    p.offset += 1;
                }
            }
            Dir::Left | Dir::Right => {}
        }
        if let Some(target) = p.pos.step(dir) {
            if self.grid.is_open(target) {
                p.pos = target;
            }
        }
    }

    /// Player stands on the last row.
    pub fn player_escaped(&self) -> bool {
        self.player.pos.row + 1 >= self.grid.rows()
    }

    /// Advances every monster once, then reports whether any of them now
    /// shares the player's cell.
    pub fn tick_monsters(&mut self) -> bool {
        for monster in &mut self.monsters {
            monster.advance(&mut self.grid);
        }
        self.monsters.iter().any(|m| m.pos == self.player.pos)
    }

    /// Checkpoint closest to the player by Manhattan distance; the first one
    /// wins ties. Falls back to the entrance when there are none.
    pub fn nearest_checkpoint(&self) -> Pos {
        self.checkpoints
            .iter()
            .copied()
            .min_by_key(|cp| cp.manhattan(self.player.pos))
            .unwrap_or_else(|| self.grid.entrance())
    }

    /// Sends the player back to the nearest checkpoint at the cost of one hit
    /// point, keeping the new position on screen.
    pub fn respawn(&mut self) {
        let target = self.nearest_checkpoint();
        let max_offset = self.grid.rows().saturating_sub(self.view_rows);
        self.player.pos = target;
        self.player.hp = self.player.hp.saturating_sub(1);
        self.player.offset = target.row.saturating_sub(self.view_rows / 2).min(max_offset);
    }

    pub fn view(&self) -> MazeView<'_> {
        MazeView {
            grid: &self.grid,
            player: self.player,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionReport {
    pub outcome: Outcome,
    pub player: Player,
}

pub struct Session {
    world: Mutex<World>,
    running: AtomicBool,
    paused: AtomicBool,
    outcome: Mutex<Option<Outcome>>,
    config: SessionConfig,
}

impl Session {
    pub fn new(world: World, config: SessionConfig) -> Self {
        Self {
            world: Mutex::new(world),
            running: AtomicBool::new(true),
            paused: AtomicBool::new(false),
            outcome: Mutex::new(None),
            config,
        }
    }

    /// Runs both actors until one of them ends the session, then joins them.
    pub fn run<C, G>(self, console: &C, challenge: &mut G) -> Result<SessionReport, MazeError>
    where
        C: Console,
        G: Challenge + Send,
    {
        tracing::info!(monsters = self.world().monsters.len(), "session started");
        let (input, monsters) = thread::scope(|s| {
            let monsters = s.spawn(|| self.guarded(|| self.monster_actor(console, challenge)));
            let input = s.spawn(|| self.guarded(|| self.input_actor(console)));
            (join(input), join(monsters))
        });
        input?;
        monsters?;

        let outcome = self
            .outcome
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .unwrap_or(Outcome::Quit);
        let world = self.world.into_inner().unwrap_or_else(PoisonError::into_inner);
        tracing::info!(?outcome, hp = world.player.hp, "session ended");
        Ok(SessionReport {
            outcome,
            player: world.player,
        })
    }

    fn world(&self) -> MutexGuard<'_, World> {
        self.world.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Records the first outcome and stops both actors.
    fn finish(&self, outcome: Outcome) {
        let mut slot = self.outcome.lock().unwrap_or_else(PoisonError::into_inner);
        slot.get_or_insert(outcome);
        self.running.store(false, Ordering::SeqCst);
    }

    /// Stops the other actor too when this one fails.
    fn guarded(&self, actor: impl FnOnce() -> Result<(), MazeError>) -> Result<(), MazeError> {
        let result = actor();
        if result.is_err() {
            self.running.store(false, Ordering::SeqCst);
        }
        result
    }

    /// Sleeps for `total`, waking early once the session stops.
    fn sleep_while_running(&self, total: Duration) {
        let deadline = Instant::now() + total;
        let slice = self.config.poll.max(Duration::from_millis(1));
        while self.is_running() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep(slice.min(deadline - now));
        }
    }

    fn input_actor(&self, console: &dyn Console) -> Result<(), MazeError> {
        while self.is_running() {
            if self.is_paused() {
                thread::sleep(self.config.poll);
                continue;
            }
            let key = console.poll_key(self.config.poll)?;
            let rows = console.viewport_rows()?;

            let mut world = self.world();
            // A collision may have landed while we were polling. The key
            // belongs to the challenge now.
            if self.is_paused() {
                if let Some(key) = key {
                    console.unread(key);
                }
                continue;
            }
            world.view_rows = rows;
            match key {
                Some(Key::Quit) => {
                    drop(world);
                    tracing::info!("player quit");
                    self.finish(Outcome::Quit);
                    break;
                }
                Some(key) => {
                    if let Some(dir) = key.dir() {
                        world.move_player(dir);
                    }
                }
                None => {}
            }
            console.draw_maze(&world.view())?;
            if world.player_escaped() {
                drop(world);
                tracing::info!("player escaped the maze");
                self.finish(Outcome::Won);
                break;
            }
        }
        Ok(())
    }

    fn monster_actor(&self, console: &dyn Console, challenge: &mut dyn Challenge) -> Result<(), MazeError> {
        while self.is_running() {
            self.sleep_while_running(self.config.tick);
            if !self.is_running() {
                break;
            }

            let caught = {
                let mut world = self.world();
                let caught = world.tick_monsters();
                if caught {
                    self.paused.store(true, Ordering::SeqCst);
                    tracing::info!(pos = ?world.player.pos, "monster caught the player");
                }
                caught
            };
            if !caught {
                continue;
            }

            let result = challenge.play(console)?;
            let hp = {
                let mut world = self.world();
                if result == ChallengeOutcome::Lost {
                    world.respawn();
                    tracing::info!(pos = ?world.player.pos, hp = world.player.hp, "player respawned");
                } else {
                    tracing::info!("challenge won");
                }
                world.player.hp
            };

            self.sleep_while_running(self.config.collision_pause);
            if hp == 0 {
                self.finish(Outcome::Lost);
                self.paused.store(false, Ordering::SeqCst);
                break;
            }
            self.paused.store(false, Ordering::SeqCst);
            if result == ChallengeOutcome::Won {
                self.sleep_while_running(self.config.win_cooldown);
            }
        }
        Ok(())
    }
}

fn join<T>(handle: thread::ScopedJoinHandle<'_, T>) -> T {
    match handle.join() {
        Ok(value) => value,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Tile;
    use crate::store::parse_grid;

    const CORRIDOR: &str = "# ###\n#   #\n# # #\n# # #\n# # #\n# # #\n# # #\n# # #\n### #\n";

    fn world_at(text: &str, pos: Pos) -> World {
        let grid = parse_grid(text).unwrap();
        let player = Player { pos, hp: 3, offset: 0 };
        World::new(grid, Vec::new(), Vec::new(), player)
    }

    #[test]
    fn walls_block_player_moves() {
        let mut w = world_at(CORRIDOR, Pos::new(1, 1));
        w.move_player(Dir::Left);
        assert_eq!(w.player.pos, Pos::new(1, 1));
        w.move_player(Dir::Right);
        assert_eq!(w.player.pos, Pos::new(1, 2));
        w.move_player(Dir::Up);
        assert_eq!(w.player.pos, Pos::new(1, 2));
    }

    #[test]
    fn entrance_row_cannot_step_off_the_grid() {
        let mut w = world_at(CORRIDOR, Pos::new(0, 1));
        w.move_player(Dir::Up);
        assert_eq!(w.player.pos, Pos::new(0, 1));
    }

    #[test]
    fn viewport_scrolls_past_the_middle_and_back() {
        let mut w = world_at(CORRIDOR, Pos::new(1, 1));
        w.view_rows = 4;
        // Scrolling starts once the player is below row rows/2 + offset.
        for _ in 0..2 {
            w.move_player(Dir::Down);
        }
        assert_eq!(w.player.pos, Pos::new(3, 1));
        assert_eq!(w.player.offset, 0);
        w.move_player(Dir::Down);
        assert_eq!(w.player.offset, 1);
        for _ in 0..4 {
            w.move_player(Dir::Down);
        }
        assert_eq!(w.player.pos, Pos::new(7, 1));
        // offset + rows never exceeds the grid height.
        assert_eq!(w.player.offset, 5);
        for _ in 0..6 {
            w.move_player(Dir::Up);
        }
        assert_eq!(w.player.pos, Pos::new(1, 1));
        assert!(w.player.offset < 5);
    }

    #[test]
    fn escape_is_the_last_row() {
        let mut w = world_at(CORRIDOR, Pos::new(7, 3));
        assert!(!w.player_escaped());
        w.move_player(Dir::Down);
        assert!(w.player_escaped());
    }

    #[test]
    fn nearest_checkpoint_and_respawn() {
        let mut w = world_at(CORRIDOR, Pos::new(7, 1));
        assert_eq!(w.nearest_checkpoint(), Pos::new(0, 1));
        w.checkpoints = vec![Pos::new(1, 3), Pos::new(5, 3), Pos::new(6, 1)];
        assert_eq!(w.nearest_checkpoint(), Pos::new(6, 1));
        w.view_rows = 4;
        w.respawn();
        assert_eq!(w.player.pos, Pos::new(6, 1));
        assert_eq!(w.player.hp, 2);
        assert!(w.player.offset <= 6 && w.player.offset + 4 > 6);
    }

    #[test]
    fn tick_reports_monster_on_player() {
        let mut w = world_at(CORRIDOR, Pos::new(1, 1));
        w.grid.set(Pos::new(2, 1), Tile::Monster);
        w.monsters.push(Monster::new(0, Pos::new(2, 1), Dir::Up));
        assert!(w.tick_monsters());
        assert_eq!(w.monsters[0].pos, Pos::new(1, 1));
    }

    #[test]
    fn hp_never_underflows() {
        let mut w = world_at(CORRIDOR, Pos::new(1, 1));
        w.player.hp = 0;
        w.respawn();
        assert_eq!(w.player.hp, 0);
    }
}
