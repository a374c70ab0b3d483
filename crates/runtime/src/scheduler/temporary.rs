//! Temporary events: bounded-duration effects with create/destroy hooks.
//!
//! A temporary event is a regular scheduled event plus a subtype tag, an
//! `on_create` hook fired at registration and an `on_destroy` hook fired
//! at removal. The tag is what survives a save: callbacks are re-attached
//! by subtype on load, while the payload travels with the snapshot.

use game_core::Dungeon;

use super::{EventCallback, EventFlags, Phase};
use crate::session::chaos_seal;

/// Subtypes of temporary events the game knows how to (re)create.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, serde::Serialize, serde::Deserialize,
)]
pub enum TempEventKind {
    ChaosSeal,
}

impl TempEventKind {
    /// The callback set for this subtype; used both at registration and
    /// when re-attaching callbacks to a loaded save.
    pub(crate) fn callbacks(self) -> TempCallbacks {
        match self {
            TempEventKind::ChaosSeal => chaos_seal::callbacks(),
        }
    }
}

/// The full callback set of a temporary event.
#[derive(Clone, Copy, Debug, Default)]
pub struct TempCallbacks {
    pub on_create: Option<EventCallback>,
    pub on_frame: Option<EventCallback>,
    pub on_round_end: Option<EventCallback>,
    pub on_destroy: Option<EventCallback>,
}

/// Serializable per-effect state carried by a temporary event.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum TempPayload {
    Empty,
    /// A full-value grid snapshot, restored when the effect ends.
    Dungeon(Dungeon),
}

/// Extra state distinguishing a temporary event from a plain one.
#[derive(Debug)]
pub struct TempState {
    pub kind: TempEventKind,
    pub(crate) on_create: Option<EventCallback>,
    pub(crate) on_destroy: Option<EventCallback>,
    pub payload: TempPayload,
}

/// Registration request for a temporary event.
///
/// Also the unit queued on the session context when an effect is
/// triggered from inside a running tick.
#[derive(Clone, Debug)]
pub struct TempEventSpec {
    pub phase: Phase,
    pub duration: i32,
    pub kind: TempEventKind,
    pub flags: EventFlags,
    pub payload: TempPayload,
}
