//! Random dungeon generation.
//!
//! Layouts are carved backwards from the gameplay: first the adventurer
//! and dragons get their cells, then a wandering path from the
//! adventurer to every dragon is traced over a fully open ghost grid and
//! the doors it crosses become hard requirements. Each cell then picks a
//! random room satisfying its requirements plus whatever doors already
//! point at it, so every dragon is guaranteed reachable at round 1.

use std::collections::{HashMap, HashSet};

use game_core::pathfinding;
use game_core::rng::{PcgRng, RngOracle, compute_seed};
use game_core::{
    Adventurer, Direction, Doors, Dragon, Dungeon, EntityKind, EntityStore, GameConfig, GameData,
    Position, Room, RoomShape,
};
use strum::IntoEnumIterator;
use tracing::{debug, warn};

/// Tunable knobs for a generated dungeon.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DungeonSettings {
    /// Side length of the square grid.
    pub dungeon_size: usize,
    pub dragon_count: u32,
    pub treasure_count: u32,
    pub strong_sword_count: u32,
    pub chaos_seal_count: u32,
}

impl Default for DungeonSettings {
    fn default() -> Self {
        Self {
            dungeon_size: GameConfig::DEFAULT_DUNGEON_SIZE,
            dragon_count: GameConfig::DEFAULT_DRAGON_COUNT,
            treasure_count: 2,
            strong_sword_count: 1,
            chaos_seal_count: 1,
        }
    }
}

/// Deterministic draw sequence for one generation run.
struct SeedSequence {
    seed: u64,
    draw: u64,
}

impl SeedSequence {
    fn next(&mut self, context: u32) -> u32 {
        let value = PcgRng.next_u32(compute_seed(self.seed, self.draw, 0, context));
        self.draw += 1;
        value
    }
}

/// Builds a playable [`GameData`] from the settings; the same seed
/// yields the same dungeon.
pub fn generate_dungeon(settings: &DungeonSettings, seed: u64) -> GameData {
    let size = settings.dungeon_size.max(2);
    let mut sequence = SeedSequence { seed, draw: 0 };
    let mut entities = EntityStore::new();
    let mut occupied: HashSet<Position> = HashSet::new();

    let adventurer_pos = random_free_cell(size, &occupied, &mut sequence);
    occupied.insert(adventurer_pos);
    entities.add(adventurer_pos, EntityKind::Adventurer(Adventurer::new(1)));

    // Dragons level up from 1 so the hero always has a beatable start.
    let mut dragon_goals: Vec<Position> = Vec::new();
    for level in 1..=settings.dragon_count {
        let position = random_free_cell(size, &occupied, &mut sequence);
        occupied.insert(position);
        entities.add(position, EntityKind::Dragon(Dragon::new(level)));
        dragon_goals.push(position);
    }

    let dungeon = carve_layout(size, adventurer_pos, &dragon_goals, &mut sequence);

    for _ in 0..settings.strong_sword_count {
        let position = random_free_cell(size, &occupied, &mut sequence);
        occupied.insert(position);
        entities.add(position, EntityKind::StrongSword);
    }
    for _ in 0..settings.chaos_seal_count {
        let position = random_free_cell(size, &occupied, &mut sequence);
        occupied.insert(position);
        entities.add(position, EntityKind::ChaosSeal);
    }

    debug!(size, dragons = settings.dragon_count, "generated dungeon");
    GameData::new(dungeon, entities).with_treasure_remaining(settings.treasure_count)
}

/// Traces a wandering path to every dragon over a fully open ghost grid
/// and turns the crossed doors into per-cell requirements, then fills
/// the grid with random rooms honoring them.
fn carve_layout(
    size: usize,
    adventurer_pos: Position,
    dragon_goals: &[Position],
    sequence: &mut SeedSequence,
) -> Dungeon {
    let mut ghost = Dungeon::new(size, size);
    for position in ghost.positions().collect::<Vec<Position>>() {
        ghost.set_room(position, Room::new(RoomShape::Quad, 0));
    }

    let mut required: HashMap<Position, Doors> = HashMap::new();
    for (index, goal) in dragon_goals.iter().enumerate() {
        let path = pathfinding::random_path(
            &ghost,
            adventurer_pos,
            *goal,
            compute_seed(sequence.seed, index as u64, 0, u32::MAX),
        );
        let mut current = adventurer_pos;
        for &next in &path {
            if let Some(direction) = Direction::between(current, next) {
                *required.entry(current).or_default() |= Doors::from(direction);
                *required.entry(next).or_default() |= Doors::from(direction.opposite());
            }
            current = next;
        }
    }

    let mut dungeon = Dungeon::new(size, size);
    for position in dungeon.positions().collect::<Vec<Position>>() {
        let mut must_have = required.get(&position).copied().unwrap_or_default();

        // Doors already pointing at this cell must be reciprocated.
        if let Some(north) = dungeon.room(position.step(Direction::Up)) {
            if north.has_door(Direction::Down) {
                must_have |= Doors::UP;
            }
        }
        if let Some(west) = dungeon.room(position.step(Direction::Left)) {
            if west.has_door(Direction::Right) {
                must_have |= Doors::LEFT;
            }
        }

        let candidates = room_candidates(must_have);
        let pick = candidates[sequence.next(3) as usize % candidates.len()];
        dungeon.set_room(position, pick);
    }
    dungeon
}

/// Every (shape, rotation) whose doors cover the requirement. Never
/// empty: the quad room satisfies any requirement.
fn room_candidates(must_have: Doors) -> Vec<Room> {
    let mut candidates = Vec::new();
    for shape in RoomShape::iter() {
        for rotation in 0..Direction::COUNT as u8 {
            let room = Room::new(shape, rotation);
            if room.connections().contains(must_have) {
                candidates.push(room);
            }
        }
    }
    candidates
}

fn random_free_cell(
    size: usize,
    occupied: &HashSet<Position>,
    sequence: &mut SeedSequence,
) -> Position {
    let free: Vec<Position> = (0..size)
        .flat_map(|y| (0..size).map(move |x| Position::new(x as i32, y as i32)))
        .filter(|position| !occupied.contains(position))
        .collect();
    if free.is_empty() {
        warn!("no free cell left in the generated dungeon");
        return Position::ORIGIN;
    }
    free[sequence.next(4) as usize % free.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_core::EntityType;

    #[test]
    fn generation_is_deterministic() {
        let settings = DungeonSettings::default();
        let first = generate_dungeon(&settings, 99);
        let second = generate_dungeon(&settings, 99);
        assert_eq!(first, second);
        assert_ne!(first, generate_dungeon(&settings, 100));
    }

    #[test]
    fn every_dragon_is_reachable() {
        let settings = DungeonSettings {
            dungeon_size: 6,
            dragon_count: 4,
            ..DungeonSettings::default()
        };
        for seed in 0..10 {
            let data = generate_dungeon(&settings, seed);
            let adventurer_pos = data.entities.adventurer().unwrap().position;
            for dragon in data.entities.dragons() {
                assert!(
                    pathfinding::is_reachable(&data.dungeon, adventurer_pos, dragon.position),
                    "dragon at {} unreachable with seed {seed}",
                    dragon.position
                );
            }
        }
    }

    #[test]
    fn entity_counts_match_settings() {
        let settings = DungeonSettings {
            dungeon_size: 8,
            dragon_count: 3,
            treasure_count: 5,
            strong_sword_count: 2,
            chaos_seal_count: 2,
        };
        let data = generate_dungeon(&settings, 1);

        assert_eq!(data.entities.of_type(EntityType::Adventurer).count(), 1);
        assert_eq!(data.entities.dragons().count(), 3);
        assert_eq!(data.entities.of_type(EntityType::StrongSword).count(), 2);
        assert_eq!(data.entities.of_type(EntityType::ChaosSeal).count(), 2);
        assert_eq!(data.treasure_remaining, 5);

        // Entities never stack at generation time.
        assert_eq!(data.entities.all_positions().len(), data.entities.len());

        // Dragon levels run 1..=count.
        let mut levels: Vec<u32> = data
            .entities
            .dragons()
            .filter_map(|dragon| dragon.level())
            .collect();
        levels.sort_unstable();
        assert_eq!(levels, vec![1, 2, 3]);
    }
}
