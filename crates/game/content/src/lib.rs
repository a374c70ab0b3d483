//! Level definitions and loaders for the dungeon text format.
//!
//! This crate converts dungeon files (a block of box-drawing glyphs
//! followed by entity and metadata lines) into `game-core` values.
//! Parsing is lenient where the format allows it: unrecognized lines are
//! logged and skipped, while a malformed glyph block fails the whole
//! load so the caller can keep its previous state.

pub mod loaders;

pub use loaders::{DungeonTextError, LevelData, LevelLoader, parse_dungeon, room_from_glyph};
