//! Game session: state ownership and turn orchestration.
//!
//! [`GameSession`] owns the grid, the entity store and the event
//! scheduler. Player actions mutate the state directly; everything else
//! happens inside the round pipeline that [`systems`] registers once at
//! setup. The session is a plain value with no global state: front ends
//! drive it by calling [`GameSession::frame`] from their render loop and
//! feeding player clicks into the action entry points.

pub(crate) mod chaos_seal;
mod systems;

use std::time::{Duration, Instant};

use game_core::pathfinding;
use game_core::rng::{PcgRng, RngOracle, compute_seed};
use game_core::{
    Entity, EntityKind, EntityType, GameConfig, GameData, GameFlags, Position, Treasure,
};
use tracing::{debug, error};

use crate::scheduler::{EventScheduler, Phase, TempEventSpec};
use crate::sleep::SleepTimer;

/// Mutable session state handed to event callbacks.
///
/// Deliberately excludes the scheduler itself: callbacks queue new
/// temporary events on [`GameCtx::queue_temporary`] and the scheduler
/// drains the queue between phase passes.
pub struct GameCtx {
    pub flags: GameFlags,
    pub data: GameData,
    /// Pristine copy taken at load time, for round and game resets.
    pub original: GameData,
    pub sleep: SleepTimer,
    pub(crate) pending: Vec<TempEventSpec>,
    game_seed: u64,
    rng_nonce: u64,
}

impl GameCtx {
    pub(crate) fn new(data: GameData, game_seed: u64) -> Self {
        Self {
            flags: GameFlags::session_start(),
            original: data.clone(),
            data,
            sleep: SleepTimer::new(),
            pending: Vec::new(),
            game_seed,
            rng_nonce: 0,
        }
    }

    /// Draws the next deterministic random value for `actor`.
    ///
    /// Every draw advances the session nonce, so a replay with the same
    /// seed reproduces the same sequence of dragon moves and variants.
    pub fn roll(&mut self, actor: u32, context: u32) -> u32 {
        let seed = compute_seed(self.game_seed, self.rng_nonce, actor, context);
        self.rng_nonce += 1;
        PcgRng.next_u32(seed)
    }

    /// Queues a temporary event for registration after the current
    /// phase pass.
    pub fn queue_temporary(&mut self, spec: TempEventSpec) {
        self.pending.push(spec);
    }

    /// Asks for a cooperative sleep; the session pauses the movement
    /// phases until the target elapses.
    pub fn request_sleep(&mut self, duration: Duration) {
        self.sleep.request(duration);
    }

    /// Flips the session into the adventurer-movement part of the round.
    pub fn start_moving(&mut self) {
        self.flags.insert(GameFlags::ADVENTURER_MOVING);
        self.flags.remove(GameFlags::DUNGEON_TURN);
    }

    /// True when the adventurer has no path left (or no adventurer
    /// exists at all).
    pub fn adventurer_path_empty(&self) -> bool {
        self.data
            .entities
            .adventurer()
            .and_then(Entity::as_adventurer)
            .is_none_or(|adventurer| adventurer.path.is_empty())
    }

    pub(crate) fn reset_rng(&mut self) {
        self.rng_nonce = 0;
    }
}

/// A full playable session: context plus scheduler.
pub struct GameSession {
    pub ctx: GameCtx,
    pub(crate) scheduler: EventScheduler,
}

impl GameSession {
    /// Creates a session with a random seed.
    pub fn new(data: GameData) -> Self {
        Self::with_seed(data, rand::random())
    }

    /// Creates a session with an explicit seed, replaying identically
    /// for identical inputs.
    pub fn with_seed(data: GameData, game_seed: u64) -> Self {
        let mut session = Self {
            ctx: GameCtx::new(data, game_seed),
            scheduler: EventScheduler::new(),
        };
        session.setup_systems();
        session
    }

    /// Builds a session straight from level text in the dungeon format.
    pub fn from_level_text(text: &str) -> game_content::loaders::LoadResult<Self> {
        let level = game_content::LevelLoader::parse(text)?;
        Ok(Self::new(level.into_game_data()))
    }

    /// Builds a session from a level file on disk.
    pub fn from_level_file(path: &std::path::Path) -> game_content::loaders::LoadResult<Self> {
        let level = game_content::LevelLoader::load(path)?;
        Ok(Self::new(level.into_game_data()))
    }

    pub(crate) fn setup_systems(&mut self) {
        systems::register_round_pipeline(&mut self.scheduler, self.ctx.data.mode);
    }

    pub fn scheduler(&self) -> &EventScheduler {
        &self.scheduler
    }

    // ===== frame loop =====

    /// Advances the simulation by one frame at wall-clock time `now`.
    ///
    /// Runs the per-frame tick, then the end-of-round tick when the
    /// round boundary is reached: the adventurer's path is exhausted
    /// while the moving flag is still up. The boundary can only hold
    /// once per round because the cleanup phase clears the flag.
    pub fn frame(&mut self, now: Instant) {
        if !self.ctx.flags.contains(GameFlags::HANDLE_EVENTS)
            || self.ctx.flags.contains(GameFlags::GAME_FINISHED)
        {
            return;
        }

        if self.ctx.sleep.finished(now) {
            self.scheduler.unpause_phase(Phase::Adventurer);
            self.scheduler.unpause_phase(Phase::Dragons);
        }

        self.scheduler.frame_tick(&mut self.ctx);
        self.apply_sleep_request();

        if self.should_finish_round() {
            self.scheduler.round_tick(&mut self.ctx);
            if !self.ctx.flags.contains(GameFlags::GAME_FINISHED) {
                self.ctx.data.round += 1;
                debug!(round = self.ctx.data.round, "round finished");
            }
            self.apply_sleep_request();
        }

        self.ctx.sleep.mark_handled(now);
    }

    fn should_finish_round(&self) -> bool {
        self.ctx.adventurer_path_empty() && self.ctx.flags.contains(GameFlags::ADVENTURER_MOVING)
    }

    fn apply_sleep_request(&mut self) {
        if let Some(duration) = self.ctx.sleep.take_request() {
            self.ctx.sleep.begin(duration);
            self.scheduler.pause_phase(Phase::Adventurer);
            self.scheduler.pause_phase(Phase::Dragons);
        }
    }

    // ===== player actions =====

    /// Rotates the room at `position` one clockwise step.
    ///
    /// Rejected outside the dungeon turn, once the mode has locked the
    /// layout, or out of bounds. Success schedules a path recompute.
    pub fn rotate_room_at(&mut self, position: Position) -> bool {
        if !self.ctx.flags.contains(GameFlags::DUNGEON_TURN) || self.ctx.data.layout_locked() {
            return false;
        }
        if !self.ctx.data.dungeon.rotate_room(position) {
            return false;
        }
        self.ctx.flags.insert(GameFlags::UPDATE_PATH);
        true
    }

    /// Places a treasure at `position`.
    ///
    /// Fails when no treasures are left, a treasure is already on the
    /// board, the cell is occupied by any entity, or the mode forbids
    /// edits. On success the treasure counter decrements and the path
    /// recomputes toward the new target.
    pub fn place_treasure_at(&mut self, position: Position) -> bool {
        if !self.ctx.flags.contains(GameFlags::DUNGEON_TURN) || self.ctx.data.layout_locked() {
            return false;
        }
        if self.ctx.data.treasure_remaining == 0 {
            return false;
        }
        if self.ctx.data.entities.single(EntityType::Treasure).is_some() {
            error!("cannot place treasure, one is already in the dungeon");
            return false;
        }
        if !self.ctx.data.dungeon.in_bounds(position) {
            error!(%position, "cannot place treasure outside the dungeon");
            return false;
        }
        if self.ctx.data.entities.all_positions().contains(&position) {
            error!(%position, "cannot place treasure on an occupied room");
            return false;
        }

        let variant = (self.ctx.roll(0, 0) % GameConfig::TREASURE_VARIANTS) as u8;
        self.ctx
            .data
            .entities
            .add(position, EntityKind::Treasure(Treasure::new(variant)));
        self.ctx.data.treasure_remaining -= 1;
        self.ctx.flags.insert(GameFlags::UPDATE_PATH);
        debug!(%position, variant, "placed treasure");
        true
    }

    /// Commits the dungeon turn and lets the adventurer walk its path.
    pub fn start_moving_adventurer(&mut self) {
        self.ctx.start_moving();
    }

    /// Appends `position` to the adventurer's path by hand.
    ///
    /// Legacy manual movement: the clicked room must connect to the
    /// current path tip (or to the adventurer's room for an empty path).
    pub fn extend_path_to(&mut self, position: Position) -> bool {
        if !self.ctx.data.dungeon.in_bounds(position) {
            return false;
        }
        let Some(anchor) = self
            .ctx
            .data
            .entities
            .adventurer()
            .map(|entity| {
                entity
                    .as_adventurer()
                    .and_then(|adventurer| adventurer.path.last().copied())
                    .unwrap_or(entity.position)
            })
        else {
            return false;
        };
        if !self.ctx.data.dungeon.rooms_connected(anchor, position) {
            return false;
        }
        if let Some(adventurer) = self
            .ctx
            .data
            .entities
            .adventurer_mut()
            .and_then(Entity::as_adventurer_mut)
        {
            adventurer.path.push(position);
            return true;
        }
        false
    }

    /// Immediately applies the chaos seal effect to the session.
    ///
    /// Normally triggered by consuming a picked-up seal; exposed so
    /// front ends and tests can fire the effect directly.
    pub fn activate_chaos_seal(&mut self) {
        let spec = chaos_seal::event_spec();
        self.scheduler.register_temporary(&mut self.ctx, spec);
    }

    // ===== resets =====

    /// Restores the state snapshot taken at load time and restarts the
    /// round pipeline.
    pub fn reset_round(&mut self) {
        self.ctx.data = self.ctx.original.clone();
        self.ctx.flags = GameFlags::session_start();
        self.ctx.sleep = SleepTimer::new();
        self.ctx.pending.clear();
        self.scheduler = EventScheduler::new();
        self.setup_systems();
        debug!("session reset to original state");
    }

    /// Like [`GameSession::reset_round`], but also rewinds the random
    /// sequence so the rerun replays the exact same dragon moves.
    pub fn reset_game(&mut self) {
        self.reset_round();
        self.ctx.reset_rng();
    }

    // ===== queries =====

    pub fn flags(&self) -> GameFlags {
        self.ctx.flags
    }

    pub fn data(&self) -> &GameData {
        &self.ctx.data
    }

    pub fn round(&self) -> u32 {
        self.ctx.data.round
    }

    pub fn is_finished(&self) -> bool {
        self.ctx.flags.contains(GameFlags::GAME_FINISHED)
    }

    pub fn is_won(&self) -> bool {
        self.ctx.flags.contains(GameFlags::GAME_WON)
    }

    pub fn is_lost(&self) -> bool {
        self.ctx.flags.contains(GameFlags::GAME_LOST)
    }

    /// Recomputes the adventurer path outside the scheduler, for front
    /// ends that want an immediate preview after an edit.
    pub fn recompute_path(&mut self) {
        pathfinding::compute_adventurer_path(&mut self.ctx.data);
        self.ctx.flags.remove(GameFlags::UPDATE_PATH);
    }
}
