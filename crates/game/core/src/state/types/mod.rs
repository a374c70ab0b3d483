pub mod common;
pub mod dungeon;
pub mod entities;

pub use common::{Direction, EntityId, Position};
pub use dungeon::{Doors, Dungeon, Room, RoomShape};
pub use entities::{
    Adventurer, Dragon, Entity, EntityKind, EntityStore, EntityType, Inventory, ItemType, Treasure,
};
