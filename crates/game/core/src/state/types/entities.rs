use std::collections::HashSet;

use arrayvec::ArrayVec;
use strum::EnumDiscriminants;
use tracing::warn;

use super::{EntityId, Position};
use crate::config::GameConfig;

/// Aggregate store for every entity in the dungeon.
///
/// A flat, insertion-ordered collection with type-tagged lookup. The
/// gameplay invariant is at most one adventurer; dragons, treasure and
/// pickup items are unbounded. Removal is identity-based via [`EntityId`].
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityStore {
    entities: Vec<Entity>,
    next_id: u32,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entity at `position`, allocating a fresh id for it.
    pub fn add(&mut self, position: Position, kind: EntityKind) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.entities.push(Entity { id, position, kind });
        id
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    /// First entity of the given type in insertion order.
    pub fn first(&self, entity_type: EntityType) -> Option<&Entity> {
        self.entities
            .iter()
            .find(|entity| entity.entity_type() == entity_type)
    }

    pub fn first_mut(&mut self, entity_type: EntityType) -> Option<&mut Entity> {
        self.entities
            .iter_mut()
            .find(|entity| entity.entity_type() == entity_type)
    }

    /// Like [`EntityStore::first`], but warns when the type is duplicated.
    ///
    /// Used for types that are supposed to be unique (adventurer,
    /// unconsumed treasure); a duplicate is a broken invariant, not a
    /// reason to fail the caller.
    pub fn single(&self, entity_type: EntityType) -> Option<&Entity> {
        self.warn_on_duplicates(entity_type);
        self.first(entity_type)
    }

    pub fn single_mut(&mut self, entity_type: EntityType) -> Option<&mut Entity> {
        self.warn_on_duplicates(entity_type);
        self.first_mut(entity_type)
    }

    fn warn_on_duplicates(&self, entity_type: EntityType) {
        let count = self.of_type(entity_type).count();
        if count > 1 {
            warn!(%entity_type, count, "more than one entity of a unique type");
        }
    }

    pub fn of_type(&self, entity_type: EntityType) -> impl Iterator<Item = &Entity> {
        self.entities
            .iter()
            .filter(move |entity| entity.entity_type() == entity_type)
    }

    pub fn of_types<'a>(
        &'a self,
        entity_types: &'a [EntityType],
    ) -> impl Iterator<Item = &'a Entity> {
        self.entities
            .iter()
            .filter(move |entity| entity_types.contains(&entity.entity_type()))
    }

    pub fn of_type_where<'a>(
        &'a self,
        entity_type: EntityType,
        mut predicate: impl FnMut(&Entity) -> bool + 'a,
    ) -> impl Iterator<Item = &'a Entity> {
        self.of_type(entity_type)
            .filter(move |entity| predicate(entity))
    }

    /// Removes the entity with the given id.
    ///
    /// An unknown id is a logged no-op: the store stays untouched and the
    /// caller gets `None` back.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        match self.entities.iter().position(|entity| entity.id == id) {
            Some(index) => Some(self.entities.remove(index)),
            None => {
                warn!(%id, "tried to remove an entity that is not in the store");
                None
            }
        }
    }

    /// Removes every entity of `entity_type` matching the predicate.
    pub fn remove_where(
        &mut self,
        entity_type: EntityType,
        mut predicate: impl FnMut(&Entity) -> bool,
    ) -> usize {
        let before = self.entities.len();
        self.entities
            .retain(|entity| entity.entity_type() != entity_type || !predicate(entity));
        before - self.entities.len()
    }

    // ===== gameplay conveniences =====

    /// The adventurer entity, warning when the uniqueness invariant broke.
    pub fn adventurer(&self) -> Option<&Entity> {
        self.single(EntityType::Adventurer)
    }

    pub fn adventurer_mut(&mut self) -> Option<&mut Entity> {
        self.single_mut(EntityType::Adventurer)
    }

    pub fn dragons(&self) -> impl Iterator<Item = &Entity> {
        self.of_type(EntityType::Dragon)
    }

    /// The dragon with the lowest level, ties broken by insertion order.
    pub fn lowest_level_dragon(&self) -> Option<&Entity> {
        self.dragons()
            .min_by_key(|dragon| dragon.level().unwrap_or(u32::MAX))
    }

    /// Positions of every entity in the store.
    pub fn all_positions(&self) -> HashSet<Position> {
        self.entities.iter().map(|entity| entity.position).collect()
    }

    /// Positions that interrupt a movement path.
    ///
    /// Pickup items never truncate a path, so only non-item entities
    /// count as collisions.
    pub fn collision_positions(&self) -> HashSet<Position> {
        self.entities
            .iter()
            .filter(|entity| !entity.is_item())
            .map(|entity| entity.position)
            .collect()
    }

    pub fn dragon_positions(&self) -> HashSet<Position> {
        self.dragons().map(|dragon| dragon.position).collect()
    }
}

/// A single game entity: identity, grid position and typed payload.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Entity {
    id: EntityId,
    pub position: Position,
    pub kind: EntityKind,
}

impl Entity {
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn entity_type(&self) -> EntityType {
        EntityType::from(&self.kind)
    }

    /// Level of a levelled entity (adventurer or dragon).
    pub fn level(&self) -> Option<u32> {
        match &self.kind {
            EntityKind::Adventurer(adventurer) => Some(adventurer.level),
            EntityKind::Dragon(dragon) => Some(dragon.level),
            _ => None,
        }
    }

    /// True for entities the adventurer picks up by walking over them.
    pub fn is_item(&self) -> bool {
        self.item_type().is_some()
    }

    /// Inventory item this entity turns into when picked up.
    pub fn item_type(&self) -> Option<ItemType> {
        match self.kind {
            EntityKind::Treasure(_) => Some(ItemType::Treasure),
            EntityKind::StrongSword => Some(ItemType::StrongSword),
            EntityKind::ChaosSeal => Some(ItemType::ChaosSeal),
            EntityKind::Adventurer(_) | EntityKind::Dragon(_) => None,
        }
    }

    pub fn as_adventurer(&self) -> Option<&Adventurer> {
        match &self.kind {
            EntityKind::Adventurer(adventurer) => Some(adventurer),
            _ => None,
        }
    }

    pub fn as_adventurer_mut(&mut self) -> Option<&mut Adventurer> {
        match &mut self.kind {
            EntityKind::Adventurer(adventurer) => Some(adventurer),
            _ => None,
        }
    }

    pub fn as_dragon(&self) -> Option<&Dragon> {
        match &self.kind {
            EntityKind::Dragon(dragon) => Some(dragon),
            _ => None,
        }
    }
}

/// Typed payload of an entity.
#[derive(Clone, Debug, PartialEq, Eq, EnumDiscriminants)]
#[strum_discriminants(name(EntityType), derive(Hash, strum::Display))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntityKind {
    Adventurer(Adventurer),
    Dragon(Dragon),
    Treasure(Treasure),
    StrongSword,
    ChaosSeal,
}

/// The player-guided hero.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Adventurer {
    pub level: u32,
    /// Remaining movement path, front first. Empty means "no path".
    pub path: Vec<Position>,
    pub inventory: Inventory,
}

impl Adventurer {
    pub fn new(level: u32) -> Self {
        Self {
            level,
            path: Vec::new(),
            inventory: Inventory::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dragon {
    pub level: u32,
}

impl Dragon {
    pub fn new(level: u32) -> Self {
        Self { level }
    }
}

/// Placed treasure; the variant only selects an image and never affects
/// the rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Treasure {
    pub variant: u8,
}

impl Treasure {
    pub fn new(variant: u8) -> Self {
        Self { variant }
    }
}

/// Kinds of item the adventurer can hold in the inventory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ItemType {
    Treasure,
    StrongSword,
    ChaosSeal,
}

impl ItemType {
    /// Items consumed the moment they reach the inventory instead of
    /// being kept for later use.
    pub fn is_instant_consume(self) -> bool {
        matches!(self, ItemType::Treasure | ItemType::ChaosSeal)
    }
}

/// Bounded bag of picked-up items.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Inventory {
    items: ArrayVec<ItemType, { GameConfig::MAX_INVENTORY_SLOTS }>,
}

impl Inventory {
    /// Adds an item; returns false when every slot is taken.
    pub fn add(&mut self, item: ItemType) -> bool {
        self.items.try_push(item).is_ok()
    }

    /// Removes the first occurrence of `item`, if present.
    pub fn remove_first(&mut self, item: ItemType) -> bool {
        match self.items.iter().position(|held| *held == item) {
            Some(index) => {
                self.items.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, item: ItemType) -> bool {
        self.items.contains(&item)
    }

    pub fn iter(&self) -> impl Iterator<Item = ItemType> + '_ {
        self.items.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item counts keyed by type, for HUD-style summaries.
    pub fn counts(&self) -> Vec<(ItemType, usize)> {
        let mut counts: Vec<(ItemType, usize)> = Vec::new();
        for item in self.iter() {
            match counts.iter_mut().find(|(held, _)| *held == item) {
                Some((_, count)) => *count += 1,
                None => counts.push((item, 1)),
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_adventurer() -> EntityStore {
        let mut store = EntityStore::new();
        store.add(
            Position::ORIGIN,
            EntityKind::Adventurer(Adventurer::new(1)),
        );
        store
    }

    #[test]
    fn removal_is_identity_based() {
        let mut store = EntityStore::new();
        let first = store.add(Position::new(1, 1), EntityKind::Dragon(Dragon::new(2)));
        let second = store.add(Position::new(1, 1), EntityKind::Dragon(Dragon::new(2)));

        // Two dragons with identical fields are still distinct entities.
        assert!(store.remove(first).is_some());
        assert_eq!(store.dragons().count(), 1);
        assert_eq!(store.dragons().next().map(Entity::id), Some(second));
    }

    #[test]
    fn removing_unknown_id_is_a_noop() {
        let mut store = store_with_adventurer();
        assert!(store.remove(EntityId(42)).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn collision_positions_skip_items() {
        let mut store = store_with_adventurer();
        store.add(Position::new(1, 0), EntityKind::StrongSword);
        store.add(Position::new(2, 0), EntityKind::Dragon(Dragon::new(1)));

        let collisions = store.collision_positions();
        assert!(collisions.contains(&Position::ORIGIN));
        assert!(collisions.contains(&Position::new(2, 0)));
        assert!(!collisions.contains(&Position::new(1, 0)));
    }

    #[test]
    fn lowest_level_dragon_prefers_insertion_order_on_ties() {
        let mut store = EntityStore::new();
        let first = store.add(Position::new(0, 1), EntityKind::Dragon(Dragon::new(3)));
        store.add(Position::new(0, 2), EntityKind::Dragon(Dragon::new(3)));

        assert_eq!(store.lowest_level_dragon().map(Entity::id), Some(first));
    }

    #[test]
    fn inventory_counts_items_by_type() {
        let mut inventory = Inventory::default();
        assert!(inventory.add(ItemType::StrongSword));
        assert!(inventory.add(ItemType::StrongSword));
        assert!(inventory.add(ItemType::ChaosSeal));

        assert_eq!(
            inventory.counts(),
            vec![(ItemType::StrongSword, 2), (ItemType::ChaosSeal, 1)]
        );
    }
}
