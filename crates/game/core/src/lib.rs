//! Deterministic dungeon-puzzle logic shared across clients.
//!
//! `game-core` defines the canonical rules of the rotatable-room dungeon:
//! the grid of rooms and its door-connectivity model, the flat entity
//! store, breadth-first pathfinding, and the aggregate session data that
//! the runtime mutates. Everything here is pure and synchronous; file
//! parsing lives in `game-content` and turn orchestration in `runtime`.
pub mod config;
pub mod pathfinding;
pub mod rng;
pub mod state;

pub use config::GameConfig;
pub use state::{
    Adventurer, Direction, Doors, Dragon, Dungeon, Entity, EntityId, EntityKind, EntityStore,
    EntityType, GameData, GameFlags, GameMode, Inventory, ItemType, Position, Room, RoomShape,
    Treasure,
};
