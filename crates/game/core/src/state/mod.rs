//! Authoritative game state representation.
//!
//! This module owns the data structures that describe the dungeon grid,
//! the entity store, and per-session bookkeeping. The runtime clones the
//! [`GameData`] aggregate for snapshot/restore semantics (round resets
//! and timed effects) and mutates the live copy through the scheduler's
//! synchronous call chain only.
pub mod types;

pub use types::{
    Adventurer, Direction, Doors, Dragon, Dungeon, Entity, EntityId, EntityKind, EntityStore,
    EntityType, Inventory, ItemType, Position, Room, RoomShape, Treasure,
};

bitflags::bitflags! {
    /// Session flags forming the coarse game state machine.
    ///
    /// The bits are not mutually exclusive by construction; the session
    /// keeps them effectively exclusive per UI context.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct GameFlags: u16 {
        /// A menu screen is in front of the dungeon.
        const MENU = 1 << 0;
        /// A session is loaded and playing.
        const IN_GAME = 1 << 1;
        /// The player may rotate rooms and place treasure.
        const DUNGEON_TURN = 1 << 2;
        /// Legacy manual-movement turn; movement is automatic now.
        const PLAYER_TURN = 1 << 3;
        /// The adventurer is walking the computed path.
        const ADVENTURER_MOVING = 1 << 4;
        const GAME_FINISHED = 1 << 5;
        const GAME_WON = 1 << 6;
        const GAME_LOST = 1 << 7;
        /// The adventurer path must be recomputed before the next step.
        const UPDATE_PATH = 1 << 8;
        /// The scheduler should process events this frame.
        const HANDLE_EVENTS = 1 << 9;
        const EXIT_PROGRAM = 1 << 10;
    }
}

impl GameFlags {
    /// Flags a fresh in-game session starts with.
    pub fn session_start() -> Self {
        GameFlags::IN_GAME
            | GameFlags::DUNGEON_TURN
            | GameFlags::HANDLE_EVENTS
            | GameFlags::UPDATE_PATH
    }
}

/// Rule variants selectable per session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GameMode {
    /// Rotate and place freely every round.
    #[default]
    Normal,
    /// The layout locks after round 1; movement autoplays from round 2.
    SingleTurn,
    /// Locked layout, per-frame dragons, forced movement every round.
    Extreme,
}

impl GameMode {
    /// True when the dungeon layout can no longer be edited.
    pub fn locks_layout_after_first_round(self) -> bool {
        matches!(self, GameMode::SingleTurn | GameMode::Extreme)
    }
}

/// Everything a running session mutates: grid, entities and counters.
///
/// Snapshot/restore works by cloning the whole value; current and saved
/// copies never share mutable structure.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameData {
    pub dungeon: Dungeon,
    pub entities: EntityStore,
    /// Treasures the player may still place this session.
    pub treasure_remaining: u32,
    pub mode: GameMode,
    /// Current round number, starting at 1.
    pub round: u32,
}

impl GameData {
    pub fn new(dungeon: Dungeon, entities: EntityStore) -> Self {
        Self {
            dungeon,
            entities,
            treasure_remaining: 0,
            mode: GameMode::default(),
            round: 1,
        }
    }

    pub fn with_mode(mut self, mode: GameMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_treasure_remaining(mut self, treasure_remaining: u32) -> Self {
        self.treasure_remaining = treasure_remaining;
        self
    }

    /// True once the mode forbids rotating rooms and placing treasure.
    pub fn layout_locked(&self) -> bool {
        self.mode.locks_layout_after_first_round() && self.round > 1
    }
}
