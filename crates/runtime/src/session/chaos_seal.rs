//! The chaos seal: a one-round grid lockdown.
//!
//! On activation the seal snapshots the grid, walls in every dragon
//! except the lowest-levelled one and throws all remaining rooms wide
//! open. The end-of-round tick tears the seal down again and restores
//! the snapshot exactly. The whole effect is a temporary event; nothing
//! outside this module knows it exists.

use game_core::{Entity, GameConfig, Position, Room, RoomShape};
use tracing::debug;

use super::GameCtx;
use crate::scheduler::{
    EventFlags, GameEvent, Phase, TempCallbacks, TempEventKind, TempEventSpec, TempPayload,
};

/// Registration request for a fresh seal.
pub(crate) fn event_spec() -> TempEventSpec {
    TempEventSpec {
        phase: Phase::PostAdventurer,
        duration: GameConfig::CHAOS_SEAL_DURATION,
        kind: TempEventKind::ChaosSeal,
        flags: EventFlags::empty(),
        payload: TempPayload::Empty,
    }
}

pub(crate) fn callbacks() -> TempCallbacks {
    TempCallbacks {
        on_create: Some(activate),
        on_frame: None,
        on_round_end: Some(round_end),
        on_destroy: Some(restore),
    }
}

/// Snapshots the grid, then seals every dragon room except the lowest
/// dragon's while opening everything else up.
fn activate(ctx: &mut GameCtx, event: &mut GameEvent) {
    let Some(lowest) = ctx
        .data
        .entities
        .lowest_level_dragon()
        .map(|dragon| dragon.position)
    else {
        // No dragons left to trap; the seal fizzles.
        return;
    };

    if let Some(temp) = event.temp_mut() {
        temp.payload = TempPayload::Dungeon(ctx.data.dungeon.clone());
    }

    let mut blocked = ctx.data.entities.dragon_positions();
    blocked.remove(&lowest);

    for position in ctx.data.dungeon.positions().collect::<Vec<Position>>() {
        let room = if blocked.contains(&position) {
            Room::new(RoomShape::Solid, 0)
        } else {
            Room::new(RoomShape::Quad, 0)
        };
        ctx.data.dungeon.set_room(position, room);
    }
    debug!(trapped = blocked.len(), "chaos seal activated");
}

/// Keeps the dungeon solvable: when every remaining dragon sits in a
/// doorless room, the lowest-levelled one gets its room reopened.
fn round_end(ctx: &mut GameCtx, _event: &mut GameEvent) {
    let dragons: Vec<&Entity> = ctx.data.entities.dragons().collect();
    if dragons.is_empty() {
        return;
    }

    let all_trapped = dragons.iter().all(|dragon| {
        ctx.data
            .dungeon
            .room(dragon.position)
            .is_none_or(|room| room.connections().is_empty())
    });
    if !all_trapped {
        return;
    }

    if let Some(position) = ctx
        .data
        .entities
        .lowest_level_dragon()
        .map(|dragon| dragon.position)
    {
        ctx.data
            .dungeon
            .set_room(position, Room::new(RoomShape::Quad, 0));
        debug!(%position, "chaos seal released the lowest dragon");
    }
}

/// Puts the pre-seal grid back, cell for cell.
fn restore(ctx: &mut GameCtx, event: &mut GameEvent) {
    let Some(temp) = event.temp_mut() else {
        return;
    };
    if let TempPayload::Dungeon(snapshot) =
        std::mem::replace(&mut temp.payload, TempPayload::Empty)
    {
        ctx.data.dungeon = snapshot;
        debug!("chaos seal expired, grid restored");
    }
}
