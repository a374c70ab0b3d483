//! Read-only view consumed by front ends.
//!
//! The core never draws anything; a GUI layer queries this view every
//! frame and renders rooms, entities, the planned path and the HUD from
//! it. Action entry points live on [`GameSession`] directly.

use game_core::{Dungeon, Entity, EntityStore, GameFlags, GameMode, ItemType, Position};

use crate::session::GameSession;

/// Everything a renderer needs for one frame.
pub struct RenderView<'a> {
    /// Room shape and rotation per cell.
    pub dungeon: &'a Dungeon,
    /// Positions, types and levels of every entity.
    pub entities: &'a EntityStore,
    /// The adventurer's planned route, front first.
    pub adventurer_path: &'a [Position],
    /// Inventory contents as (item, count) pairs.
    pub inventory: Vec<(ItemType, usize)>,
    pub round: u32,
    pub mode: GameMode,
    pub treasure_remaining: u32,
    pub flags: GameFlags,
}

impl GameSession {
    pub fn render_view(&self) -> RenderView<'_> {
        let adventurer = self
            .ctx
            .data
            .entities
            .adventurer()
            .and_then(Entity::as_adventurer);

        RenderView {
            dungeon: &self.ctx.data.dungeon,
            entities: &self.ctx.data.entities,
            adventurer_path: adventurer
                .map(|adventurer| adventurer.path.as_slice())
                .unwrap_or(&[]),
            inventory: adventurer
                .map(|adventurer| adventurer.inventory.counts())
                .unwrap_or_default(),
            round: self.ctx.data.round,
            mode: self.ctx.data.mode,
            treasure_remaining: self.ctx.data.treasure_remaining,
            flags: self.ctx.flags,
        }
    }
}
