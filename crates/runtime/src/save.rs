//! Save/load: a JSON round-trip of the in-memory session snapshot.
//!
//! The snapshot captures the flags, the live and original game data and
//! every temporary event in flight. Callbacks are not serializable, so
//! temporary events save their subtype and payload and get their
//! callbacks re-attached by subtype on load. Grid positions keep the
//! `{"__tuple__": [x, y]}` encoding of the original save files.

use std::path::Path;

use game_core::{GameData, GameFlags};
use tracing::debug;

use crate::scheduler::{EventScheduler, Phase, TempEventKind, TempPayload};
use crate::session::GameSession;

/// Errors surfaced by the save/load round-trip.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("failed to encode or decode the save snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to access the save file: {0}")]
    Io(#[from] std::io::Error),
}

/// A temporary event as stored in the save snapshot.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SavedTempEvent {
    pub kind: TempEventKind,
    pub phase: Phase,
    /// Remaining duration at save time.
    pub duration: i32,
    pub flags: u8,
    pub payload: TempPayload,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct SessionSnapshot {
    flags: u16,
    game_data: GameData,
    original_game_data: GameData,
    saved_temporary_events: Vec<SavedTempEvent>,
}

impl GameSession {
    /// Serializes the session snapshot to JSON.
    pub fn save_to_string(&self) -> Result<String, SaveError> {
        let saved_temporary_events = self
            .scheduler
            .temporary_events()
            .filter_map(|(phase, event)| {
                event.temp.as_ref().map(|temp| SavedTempEvent {
                    kind: temp.kind,
                    phase,
                    duration: event.duration,
                    flags: event.flags.bits(),
                    payload: temp.payload.clone(),
                })
            })
            .collect();

        let snapshot = SessionSnapshot {
            flags: self.ctx.flags.bits(),
            game_data: self.ctx.data.clone(),
            original_game_data: self.ctx.original.clone(),
            saved_temporary_events,
        };
        Ok(serde_json::to_string(&snapshot)?)
    }

    /// Replaces the session state with a previously saved snapshot.
    ///
    /// The round pipeline is rebuilt for the loaded mode, then every
    /// saved temporary event is re-registered with its payload intact.
    /// `on_create` does not re-fire: the saved game data already
    /// contains the applied effect.
    pub fn load_from_string(&mut self, snapshot_json: &str) -> Result<(), SaveError> {
        let snapshot: SessionSnapshot = serde_json::from_str(snapshot_json)?;

        self.ctx.flags = GameFlags::from_bits_truncate(snapshot.flags);
        self.ctx.data = snapshot.game_data;
        self.ctx.original = snapshot.original_game_data;
        self.ctx.pending.clear();

        self.scheduler = EventScheduler::new();
        self.setup_systems();
        for saved in snapshot.saved_temporary_events {
            self.scheduler.restore_temporary(saved);
        }

        debug!(round = self.ctx.data.round, "session restored from save");
        Ok(())
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), SaveError> {
        let snapshot = self.save_to_string()?;
        std::fs::write(path, snapshot)?;
        Ok(())
    }

    /// Loads a save file; a missing file leaves the session untouched.
    pub fn load_from_file(&mut self, path: &Path) -> Result<(), SaveError> {
        if !path.exists() {
            return Ok(());
        }
        let snapshot = std::fs::read_to_string(path)?;
        self.load_from_string(&snapshot)
    }
}
