//! Breadth-first pathfinding over the dungeon connectivity graph.
//!
//! Paths are sequences of positions starting at the step *after* the
//! start room and ending at the goal; an empty path means either "no
//! route" or "already there" (callers distinguish by comparing the two
//! positions). All search is deterministic: neighbors are visited in the
//! fixed Up, Right, Down, Left order.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::debug;

use crate::rng::{PcgRng, RngOracle, compute_seed};
use crate::state::{
    Dungeon, Entity, EntityId, EntityStore, EntityType, GameData, ItemType, Position,
};

/// Shortest path from `start` to `goal` in edge count.
///
/// Returns an empty path when `start == goal`, when either end lies out
/// of bounds, or when no connected route exists.
pub fn shortest_path(dungeon: &Dungeon, start: Position, goal: Position) -> Vec<Position> {
    if start == goal || !dungeon.in_bounds(start) || !dungeon.in_bounds(goal) {
        return Vec::new();
    }

    let mut visited = HashSet::from([start]);
    let mut parents: HashMap<Position, Position> = HashMap::new();
    let mut queue = VecDeque::from([start]);

    while let Some(current) = queue.pop_front() {
        if current == goal {
            return reconstruct(&parents, start, goal);
        }
        for neighbor in dungeon.valid_neighbors(current) {
            if visited.insert(neighbor) {
                parents.insert(neighbor, current);
                queue.push_back(neighbor);
            }
        }
    }

    Vec::new()
}

fn reconstruct(parents: &HashMap<Position, Position>, start: Position, goal: Position) -> Vec<Position> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(&parent) = parents.get(&current) {
        if parent == start {
            break;
        }
        path.push(parent);
        current = parent;
    }
    path.reverse();
    path
}

pub fn is_reachable(dungeon: &Dungeon, start: Position, goal: Position) -> bool {
    start == goal || !shortest_path(dungeon, start, goal).is_empty()
}

/// Checks a path step by step against the current connectivity.
pub fn is_valid_path(dungeon: &Dungeon, start: Position, path: &[Position]) -> bool {
    let mut current = start;
    for &step in path {
        if !dungeon.rooms_connected(current, step) {
            return false;
        }
        current = step;
    }
    true
}

/// A wandering (not necessarily shortest) path from `start` to `goal`.
///
/// Depth-first search with a seed-shuffled neighbor order; used by the
/// dungeon generator to carve varied corridors. Deterministic for a
/// given seed. Empty when `start == goal` or the goal is unreachable.
pub fn random_path(dungeon: &Dungeon, start: Position, goal: Position, seed: u64) -> Vec<Position> {
    if start == goal || !dungeon.in_bounds(start) || !dungeon.in_bounds(goal) {
        return Vec::new();
    }

    let mut visited = HashSet::from([start]);
    let mut salt = 0u64;
    let mut stack = vec![(start, shuffled_neighbors(dungeon, start, seed, salt))];

    while let Some((_, candidates)) = stack.last_mut() {
        match candidates.pop() {
            Some(next) if visited.insert(next) => {
                if next == goal {
                    let mut path: Vec<Position> =
                        stack[1..].iter().map(|(position, _)| *position).collect();
                    path.push(next);
                    return path;
                }
                salt += 1;
                let neighbors = shuffled_neighbors(dungeon, next, seed, salt);
                stack.push((next, neighbors));
            }
            Some(_) => {}
            None => {
                stack.pop();
            }
        }
    }

    Vec::new()
}

fn shuffled_neighbors(dungeon: &Dungeon, position: Position, seed: u64, salt: u64) -> Vec<Position> {
    let rng = PcgRng;
    let mut neighbors: Vec<Position> = dungeon.valid_neighbors(position).to_vec();
    let mut i = neighbors.len();
    while i > 1 {
        let roll = rng.next_u32(compute_seed(seed, salt, i as u32, 0)) as usize;
        i -= 1;
        neighbors.swap(i, roll % (i + 1));
    }
    neighbors
}

/// Chooses where the adventurer should head next.
///
/// A reachable treasure always wins; otherwise the strongest reachable
/// dragon (ties broken by insertion order). `None` when nothing is
/// reachable.
pub fn pick_target(
    dungeon: &Dungeon,
    adventurer_pos: Position,
    entities: &EntityStore,
) -> Option<Position> {
    if let Some(treasure) = entities.first(EntityType::Treasure) {
        if is_reachable(dungeon, adventurer_pos, treasure.position) {
            return Some(treasure.position);
        }
    }

    let mut best: Option<&Entity> = None;
    for dragon in entities.dragons() {
        if !is_reachable(dungeon, adventurer_pos, dragon.position) {
            continue;
        }
        if best.is_none_or(|current| dragon.level() > current.level()) {
            best = Some(dragon);
        }
    }
    best.map(|dragon| dragon.position)
}

/// Cuts a path at the first occupied position, keeping that position as
/// the final step so the mover walks into the collision.
pub fn truncate_at_collision(path: &[Position], occupied: &HashSet<Position>) -> Vec<Position> {
    let mut truncated = Vec::with_capacity(path.len());
    for &step in path {
        truncated.push(step);
        if occupied.contains(&step) {
            break;
        }
    }
    truncated
}

/// Recomputes the adventurer's path toward the current target.
///
/// The path becomes empty when there is no adventurer, no target, or no
/// route; otherwise it is the shortest route truncated at the first
/// entity collision.
pub fn compute_adventurer_path(data: &mut GameData) {
    let Some(start) = data.entities.adventurer().map(|entity| entity.position) else {
        return;
    };

    let path = match pick_target(&data.dungeon, start, &data.entities) {
        Some(goal) => {
            let route = shortest_path(&data.dungeon, start, goal);
            truncate_at_collision(&route, &data.entities.collision_positions())
        }
        None => Vec::new(),
    };

    debug!(?start, steps = path.len(), "recomputed adventurer path");
    if let Some(adventurer) = data
        .entities
        .adventurer_mut()
        .and_then(Entity::as_adventurer_mut)
    {
        adventurer.path = path;
    }
}

/// Moves the adventurer one step along its path and picks up whatever
/// item waits in the entered room. Returns true when the path is now
/// exhausted, i.e. movement for this round is complete.
pub fn advance_one_step(entities: &mut EntityStore) -> bool {
    let next = {
        let Some(entity) = entities.adventurer_mut() else {
            return true;
        };
        let Some(adventurer) = entity.as_adventurer_mut() else {
            return true;
        };
        if adventurer.path.is_empty() {
            return true;
        }
        let next = adventurer.path.remove(0);
        entity.position = next;
        next
    };

    pickup_items_at(entities, next);

    entities
        .adventurer()
        .and_then(Entity::as_adventurer)
        .is_none_or(|adventurer| adventurer.path.is_empty())
}

/// Moves every item entity at `position` into the adventurer inventory.
pub fn pickup_items_at(entities: &mut EntityStore, position: Position) {
    let found: Vec<(EntityId, ItemType)> = entities
        .iter()
        .filter(|entity| entity.position == position)
        .filter_map(|entity| entity.item_type().map(|item| (entity.id(), item)))
        .collect();

    for (id, item) in found {
        let added = entities
            .adventurer_mut()
            .and_then(Entity::as_adventurer_mut)
            .is_some_and(|adventurer| adventurer.inventory.add(item));
        if added {
            debug!(%item, ?position, "picked up item");
            entities.remove(id);
        } else {
            tracing::warn!(%item, ?position, "inventory full, item left on the floor");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Adventurer, Dragon, EntityKind, Room, RoomShape};

    fn open_dungeon(rows: usize, cols: usize) -> Dungeon {
        let mut dungeon = Dungeon::new(rows, cols);
        for position in dungeon.positions().collect::<Vec<_>>() {
            dungeon.set_room(position, Room::new(RoomShape::Quad, 0));
        }
        dungeon
    }

    /// Edge-count distance computed by plain flood fill, as an
    /// independent oracle for the BFS result.
    fn flood_distance(dungeon: &Dungeon, start: Position, goal: Position) -> Option<usize> {
        let mut distances = HashMap::from([(start, 0usize)]);
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            let distance = distances[&current];
            for neighbor in dungeon.valid_neighbors(current) {
                distances.entry(neighbor).or_insert_with(|| {
                    queue.push_back(neighbor);
                    distance + 1
                });
            }
        }
        distances.get(&goal).copied()
    }

    #[test]
    fn shortest_path_matches_graph_distance() {
        let mut dungeon = open_dungeon(4, 4);
        // Knock a few rooms down to force detours.
        dungeon.set_room(Position::new(1, 1), Room::new(RoomShape::Solid, 0));
        dungeon.set_room(Position::new(2, 2), Room::new(RoomShape::DoubleOpposite, 0));

        for start in dungeon.positions().collect::<Vec<_>>() {
            for goal in dungeon.positions().collect::<Vec<_>>() {
                let path = shortest_path(&dungeon, start, goal);
                match flood_distance(&dungeon, start, goal) {
                    Some(distance) if start != goal => {
                        assert_eq!(path.len(), distance, "wrong length {start} -> {goal}");
                        assert!(is_valid_path(&dungeon, start, &path));
                        assert_eq!(path.last(), Some(&goal));
                    }
                    _ => assert!(path.is_empty()),
                }
            }
        }
    }

    #[test]
    fn unreachable_goal_yields_empty_path() {
        let mut dungeon = open_dungeon(3, 3);
        // Wall off the bottom-right corner entirely.
        let corner = Position::new(2, 2);
        dungeon.set_room(corner, Room::new(RoomShape::Solid, 0));

        assert!(shortest_path(&dungeon, Position::ORIGIN, corner).is_empty());
        assert!(!is_reachable(&dungeon, Position::ORIGIN, corner));
        // Distinct from the zero-length "already there" case.
        assert!(is_reachable(&dungeon, corner, corner));
    }

    #[test]
    fn truncation_keeps_at_most_one_occupied_position() {
        let path = vec![
            Position::new(1, 0),
            Position::new(2, 0),
            Position::new(3, 0),
            Position::new(4, 0),
        ];
        let occupied = HashSet::from([Position::new(2, 0), Position::new(4, 0)]);

        let truncated = truncate_at_collision(&path, &occupied);
        assert_eq!(truncated, vec![Position::new(1, 0), Position::new(2, 0)]);

        let occupied_in_prefix = truncated
            .iter()
            .filter(|step| occupied.contains(step))
            .count();
        assert_eq!(occupied_in_prefix, 1);
        assert!(occupied.contains(truncated.last().unwrap()));
    }

    #[test]
    fn pick_target_prefers_reachable_treasure() {
        let dungeon = open_dungeon(3, 3);
        let mut entities = EntityStore::new();
        entities.add(Position::ORIGIN, EntityKind::Adventurer(Adventurer::new(1)));
        entities.add(Position::new(2, 2), EntityKind::Dragon(Dragon::new(5)));
        entities.add(
            Position::new(0, 2),
            EntityKind::Treasure(crate::state::Treasure::new(0)),
        );

        assert_eq!(
            pick_target(&dungeon, Position::ORIGIN, &entities),
            Some(Position::new(0, 2))
        );
    }

    #[test]
    fn pick_target_falls_back_to_strongest_dragon() {
        let dungeon = open_dungeon(3, 3);
        let mut entities = EntityStore::new();
        entities.add(Position::ORIGIN, EntityKind::Adventurer(Adventurer::new(1)));
        entities.add(Position::new(1, 0), EntityKind::Dragon(Dragon::new(2)));
        entities.add(Position::new(2, 2), EntityKind::Dragon(Dragon::new(4)));

        assert_eq!(
            pick_target(&dungeon, Position::ORIGIN, &entities),
            Some(Position::new(2, 2))
        );
    }

    #[test]
    fn advance_one_step_picks_up_items() {
        let mut entities = EntityStore::new();
        let adventurer =
            entities.add(Position::ORIGIN, EntityKind::Adventurer(Adventurer::new(1)));
        entities.add(Position::new(1, 0), EntityKind::StrongSword);

        if let Some(hero) = entities
            .get_mut(adventurer)
            .and_then(Entity::as_adventurer_mut)
        {
            hero.path = vec![Position::new(1, 0), Position::new(2, 0)];
        }

        assert!(!advance_one_step(&mut entities));
        let hero = entities.adventurer().unwrap();
        assert_eq!(hero.position, Position::new(1, 0));
        assert!(
            hero.as_adventurer()
                .unwrap()
                .inventory
                .contains(ItemType::StrongSword)
        );
        assert!(entities.first(EntityType::StrongSword).is_none());

        assert!(advance_one_step(&mut entities));
        assert_eq!(
            entities.adventurer().unwrap().position,
            Position::new(2, 0)
        );
    }

    #[test]
    fn random_path_is_connected_and_deterministic() {
        let dungeon = open_dungeon(5, 5);
        let start = Position::ORIGIN;
        let goal = Position::new(4, 4);

        let first = random_path(&dungeon, start, goal, 7);
        let second = random_path(&dungeon, start, goal, 7);
        assert_eq!(first, second);
        assert!(!first.is_empty());
        assert_eq!(first.last(), Some(&goal));
        assert!(is_valid_path(&dungeon, start, &first));
    }
}
