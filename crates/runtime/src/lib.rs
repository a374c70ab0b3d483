//! Runtime orchestration for the dungeon puzzle simulation.
//!
//! This crate wires the pure rules in `game-core` into a playable
//! session: the phase-ordered event scheduler that drives one round of
//! simulation, the game session with its player actions and win/loss
//! detection, the cooperative sleep timer that keeps input responsive
//! while entities animate, and the save/load snapshot.
//!
//! Modules are organized by responsibility:
//! - [`scheduler`] hosts the phase/event system and temporary events
//! - [`session`] owns the game state and registers the round pipeline
//! - [`sleep`] provides the cooperative frame-time sleep timer
//! - [`save`] implements the JSON snapshot round-trip
//! - [`generator`] builds random, solvable dungeons
//! - [`api`] exposes the render-data view consumed by front ends
pub mod api;
pub mod generator;
pub mod save;
pub mod scheduler;
pub mod session;
pub mod sleep;

pub use api::RenderView;
pub use generator::{DungeonSettings, generate_dungeon};
pub use save::SaveError;
pub use scheduler::{
    EventCallback, EventFlags, EventId, EventScheduler, GameEvent, PERPETUAL_DURATION, Phase,
    TempCallbacks, TempEventKind, TempEventSpec, TempPayload,
};
pub use session::{GameCtx, GameSession};
pub use sleep::SleepTimer;
