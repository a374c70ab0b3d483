//! The round pipeline: perpetual events registered once per session.
//!
//! Phase by phase, these callbacks recompute the adventurer path, step
//! the adventurer, resolve collisions and pickups, move the dragons and
//! close the round. They are plain functions over [`GameCtx`]; the
//! scheduler sequences them and a timed effect like the chaos seal slots
//! in beside them without touching this table.

use game_core::pathfinding;
use game_core::{Entity, EntityId, GameConfig, GameFlags, GameMode, ItemType, Position};
use tracing::debug;

use super::{GameCtx, chaos_seal};
use crate::scheduler::{EventScheduler, GameEvent, PERPETUAL_DURATION, Phase};

/// Registers the whole pipeline. Dragon cadence depends on the mode:
/// every frame in extreme, once per round otherwise.
pub(crate) fn register_round_pipeline(scheduler: &mut EventScheduler, mode: GameMode) {
    scheduler.register(
        Phase::PreLogic,
        PERPETUAL_DURATION,
        Some(update_adventurer_path),
        None,
    );

    scheduler.register(
        Phase::Adventurer,
        PERPETUAL_DURATION,
        Some(autoplay_adventurer),
        None,
    );
    scheduler.register(
        Phase::Adventurer,
        PERPETUAL_DURATION,
        Some(move_adventurer),
        None,
    );

    scheduler.register(
        Phase::PostAdventurer,
        PERPETUAL_DURATION,
        Some(resolve_collisions),
        None,
    );
    scheduler.register(
        Phase::PostAdventurer,
        PERPETUAL_DURATION,
        Some(pickup_items),
        None,
    );
    scheduler.register(
        Phase::PostAdventurer,
        PERPETUAL_DURATION,
        Some(consume_instant_items),
        None,
    );

    match mode {
        GameMode::Extreme => {
            scheduler.register(Phase::Dragons, PERPETUAL_DURATION, Some(move_dragons), None);
        }
        _ => {
            scheduler.register(Phase::Dragons, PERPETUAL_DURATION, None, Some(move_dragons));
        }
    }

    scheduler.register(
        Phase::PostDragons,
        PERPETUAL_DURATION,
        None,
        Some(resolve_collisions),
    );

    scheduler.register(
        Phase::Cleanup,
        PERPETUAL_DURATION,
        Some(sleep_between_steps),
        None,
    );
    scheduler.register(
        Phase::Cleanup,
        PERPETUAL_DURATION,
        None,
        Some(sleep_between_rounds),
    );
    scheduler.register(Phase::Cleanup, PERPETUAL_DURATION, None, Some(stop_moving));
}

/// PreLogic: recompute the path when flagged, or flag an empty one.
fn update_adventurer_path(ctx: &mut GameCtx, _event: &mut GameEvent) {
    if !ctx.flags.contains(GameFlags::IN_GAME) {
        return;
    }
    if ctx.flags.contains(GameFlags::UPDATE_PATH) {
        pathfinding::compute_adventurer_path(&mut ctx.data);
        ctx.flags.remove(GameFlags::UPDATE_PATH);
    } else if ctx.adventurer_path_empty() {
        ctx.flags.insert(GameFlags::UPDATE_PATH);
    }
}

/// Adventurer: modes that lock the layout also start movement on their
/// own instead of waiting for player confirmation.
fn autoplay_adventurer(ctx: &mut GameCtx, _event: &mut GameEvent) {
    let autostart = match ctx.data.mode {
        GameMode::Normal => false,
        GameMode::SingleTurn => ctx.data.round > 1,
        GameMode::Extreme => true,
    };
    if autostart && !ctx.flags.contains(GameFlags::ADVENTURER_MOVING) {
        ctx.start_moving();
    }
}

/// Adventurer: one step along the path per unpaused frame.
fn move_adventurer(ctx: &mut GameCtx, _event: &mut GameEvent) {
    let path_empty = ctx.adventurer_path_empty();

    // An immobile adventurer in a locked mode past round 1 is caught.
    if path_empty && ctx.data.layout_locked() {
        ctx.flags
            .insert(GameFlags::GAME_FINISHED | GameFlags::GAME_LOST);
        ctx.flags.remove(GameFlags::ADVENTURER_MOVING);
        debug!("adventurer has nowhere to go, game lost");
        return;
    }

    if !ctx.flags.contains(GameFlags::ADVENTURER_MOVING) || path_empty {
        return;
    }
    pathfinding::advance_one_step(&mut ctx.data.entities);
}

/// PostAdventurer and PostDragons: dragon-fight resolution.
fn resolve_collisions(ctx: &mut GameCtx, _event: &mut GameEvent) {
    resolve_dragon_collisions(ctx);
}

/// Runs the fights in the adventurer's room.
///
/// Dragons above the adventurer's level are strong, the rest weak. A
/// weak dragon dies and levels the adventurer up; a strong one does too
/// when a strong sword is held, consuming the sword. A strong dragon
/// against a bare adventurer ends the game at once, skipping the rest.
/// With the last dragon gone the game is won; one outcome per call.
fn resolve_dragon_collisions(ctx: &mut GameCtx) {
    let Some(adventurer_pos) = ctx
        .data
        .entities
        .adventurer()
        .map(|entity| entity.position)
    else {
        return;
    };

    let colliding: Vec<(EntityId, u32)> = ctx
        .data
        .entities
        .dragons()
        .filter(|dragon| dragon.position == adventurer_pos)
        .map(|dragon| (dragon.id(), dragon.level().unwrap_or(1)))
        .collect();

    for (dragon_id, dragon_level) in colliding {
        // Re-read the hero every fight; earlier kills change the level
        // and may have consumed the sword.
        let (adventurer_level, has_sword) = match ctx
            .data
            .entities
            .adventurer()
            .and_then(Entity::as_adventurer)
        {
            Some(adventurer) => (
                adventurer.level,
                adventurer.inventory.contains(ItemType::StrongSword),
            ),
            None => return,
        };

        let strong = dragon_level > adventurer_level;
        if !strong || has_sword {
            ctx.data.entities.remove(dragon_id);
            if let Some(adventurer) = ctx
                .data
                .entities
                .adventurer_mut()
                .and_then(Entity::as_adventurer_mut)
            {
                adventurer.level += 1;
                if strong {
                    adventurer.inventory.remove_first(ItemType::StrongSword);
                }
            }
            debug!(dragon_level, "dragon slain");
        } else {
            ctx.flags
                .insert(GameFlags::GAME_FINISHED | GameFlags::GAME_LOST);
            debug!(dragon_level, "adventurer slain by a stronger dragon");
            return;
        }
    }

    if ctx.data.entities.dragons().next().is_none() {
        ctx.flags
            .insert(GameFlags::GAME_FINISHED | GameFlags::GAME_WON);
        debug!("last dragon slain, game won");
    }
}

/// PostAdventurer: sweep items under the adventurer into the inventory.
fn pickup_items(ctx: &mut GameCtx, _event: &mut GameEvent) {
    let Some(position) = ctx
        .data
        .entities
        .adventurer()
        .map(|entity| entity.position)
    else {
        return;
    };
    pathfinding::pickup_items_at(&mut ctx.data.entities, position);
}

/// PostAdventurer: treasure and chaos seals take effect the moment they
/// hit the inventory instead of being stored for later.
fn consume_instant_items(ctx: &mut GameCtx, _event: &mut GameEvent) {
    let instant: Vec<ItemType> = match ctx
        .data
        .entities
        .adventurer()
        .and_then(Entity::as_adventurer)
    {
        Some(adventurer) => adventurer
            .inventory
            .iter()
            .filter(|item| item.is_instant_consume())
            .collect(),
        None => return,
    };

    for item in instant {
        if let Some(adventurer) = ctx
            .data
            .entities
            .adventurer_mut()
            .and_then(Entity::as_adventurer_mut)
        {
            adventurer.inventory.remove_first(item);
        }
        match item {
            ItemType::ChaosSeal => ctx.queue_temporary(chaos_seal::event_spec()),
            ItemType::Treasure => debug!("treasure collected"),
            ItemType::StrongSword => {}
        }
        debug!(%item, "consumed item");
    }

    // The grid or the target may just have changed; keep the path fresh.
    ctx.flags.insert(GameFlags::UPDATE_PATH);
}

/// Dragons: each dragon takes one random step through an open door into
/// an unoccupied room, or stays put when boxed in.
fn move_dragons(ctx: &mut GameCtx, _event: &mut GameEvent) {
    if ctx.flags.contains(GameFlags::GAME_FINISHED) {
        return;
    }

    let dragon_ids: Vec<EntityId> = ctx.data.entities.dragons().map(Entity::id).collect();
    if dragon_ids.is_empty() {
        return;
    }

    // Dragons may move onto the adventurer; the fight is the point.
    let mut occupied = ctx.data.entities.all_positions();
    if let Some(adventurer) = ctx.data.entities.adventurer() {
        occupied.remove(&adventurer.position);
    }

    for (index, dragon_id) in dragon_ids.iter().enumerate() {
        let Some(dragon_pos) = ctx.data.entities.get(*dragon_id).map(|e| e.position) else {
            continue;
        };
        let moves: Vec<Position> = ctx
            .data
            .dungeon
            .valid_neighbors(dragon_pos)
            .into_iter()
            .filter(|candidate| !occupied.contains(candidate))
            .collect();
        if moves.is_empty() {
            continue;
        }

        let choice = moves[ctx.roll(dragon_id.0, index as u32) as usize % moves.len()];
        occupied.remove(&dragon_pos);
        occupied.insert(choice);
        if let Some(dragon) = ctx.data.entities.get_mut(*dragon_id) {
            dragon.position = choice;
        }
        debug!(%dragon_id, from = %dragon_pos, to = %choice, "dragon moved");
    }

    ctx.request_sleep(GameConfig::DRAGON_INTERVAL);
}

/// Cleanup: pace out the walk so steps stay visible.
fn sleep_between_steps(ctx: &mut GameCtx, _event: &mut GameEvent) {
    if !ctx.flags.contains(GameFlags::ADVENTURER_MOVING) || ctx.adventurer_path_empty() {
        return;
    }
    ctx.request_sleep(GameConfig::STEP_INTERVAL);
}

/// Cleanup: breathing room between autoplayed rounds.
fn sleep_between_rounds(ctx: &mut GameCtx, _event: &mut GameEvent) {
    if !ctx.flags.contains(GameFlags::ADVENTURER_MOVING) {
        return;
    }
    if ctx.data.mode != GameMode::SingleTurn {
        return;
    }
    ctx.request_sleep(GameConfig::ROUND_INTERVAL);
}

/// Cleanup: the round is over, hand control back to the player.
fn stop_moving(ctx: &mut GameCtx, _event: &mut GameEvent) {
    ctx.flags.remove(GameFlags::ADVENTURER_MOVING);
    if !ctx.flags.contains(GameFlags::GAME_FINISHED) {
        ctx.flags.insert(GameFlags::DUNGEON_TURN);
    }
}
