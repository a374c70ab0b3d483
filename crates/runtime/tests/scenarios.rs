//! End-to-end scenarios driven through the public session API.

use std::time::{Duration, Instant};

use game_core::{
    Adventurer, Dragon, Dungeon, Entity, EntityKind, EntityStore, EntityType, GameData, GameMode,
    ItemType, Position, Room, RoomShape,
};
use runtime::GameSession;

fn open_dungeon(size: usize) -> Dungeon {
    let mut dungeon = Dungeon::new(size, size);
    for position in dungeon.positions().collect::<Vec<_>>() {
        dungeon.set_room(position, Room::new(RoomShape::Quad, 0));
    }
    dungeon
}

fn sealed_dungeon(size: usize) -> Dungeon {
    // All solid: nobody can move anywhere.
    Dungeon::new(size, size)
}

/// Drives frames 600ms apart so every pacing sleep elapses in between.
fn run_frames(session: &mut GameSession, frames: usize) {
    let mut now = Instant::now();
    for _ in 0..frames {
        session.frame(now);
        now += Duration::from_millis(600);
        if session.is_finished() {
            break;
        }
    }
}

fn adventurer(session: &GameSession) -> &Entity {
    session.data().entities.adventurer().unwrap()
}

#[test]
fn simple_win_against_equal_dragon() {
    let mut entities = EntityStore::new();
    entities.add(Position::new(0, 0), EntityKind::Adventurer(Adventurer::new(1)));
    entities.add(Position::new(2, 2), EntityKind::Dragon(Dragon::new(1)));

    let mut session = GameSession::with_seed(GameData::new(open_dungeon(3), entities), 7);
    session.start_moving_adventurer();
    run_frames(&mut session, 40);

    assert!(session.is_finished());
    assert!(session.is_won());
    assert!(!session.is_lost());

    let hero = adventurer(&session);
    assert_eq!(hero.position, Position::new(2, 2));
    assert_eq!(hero.level(), Some(2));
    assert_eq!(session.data().entities.dragons().count(), 0);
}

#[test]
fn stronger_dragon_without_sword_loses_the_game() {
    let mut entities = EntityStore::new();
    entities.add(Position::new(1, 1), EntityKind::Adventurer(Adventurer::new(1)));
    // Forced onto the adventurer's cell.
    entities.add(Position::new(1, 1), EntityKind::Dragon(Dragon::new(3)));

    let mut session = GameSession::with_seed(GameData::new(open_dungeon(3), entities), 7);
    run_frames(&mut session, 1);

    assert!(session.is_finished());
    assert!(session.is_lost());
    assert!(!session.is_won());
    // The dragon survives and the hero never levelled.
    assert_eq!(session.data().entities.dragons().count(), 1);
    assert_eq!(adventurer(&session).level(), Some(1));
}

#[test]
fn strong_sword_beats_a_stronger_dragon() {
    let mut entities = EntityStore::new();
    entities.add(Position::new(1, 1), EntityKind::Adventurer(Adventurer::new(1)));
    entities.add(Position::new(1, 1), EntityKind::Dragon(Dragon::new(3)));
    // Far-away second dragon keeps the game going after the fight.
    entities.add(Position::new(2, 2), EntityKind::Dragon(Dragon::new(5)));

    entities
        .adventurer_mut()
        .unwrap()
        .as_adventurer_mut()
        .unwrap()
        .inventory
        .add(ItemType::StrongSword);

    let mut session = GameSession::with_seed(GameData::new(open_dungeon(3), entities), 7);
    run_frames(&mut session, 1);

    assert!(!session.is_finished());
    assert_eq!(session.data().entities.dragons().count(), 1);

    let hero = adventurer(&session);
    assert_eq!(hero.level(), Some(2));
    // The sword was consumed by the kill.
    assert!(
        !hero
            .as_adventurer()
            .unwrap()
            .inventory
            .contains(ItemType::StrongSword)
    );
}

#[test]
fn chaos_seal_traps_dragons_then_restores_the_grid() {
    let mut entities = EntityStore::new();
    entities.add(Position::new(0, 0), EntityKind::Adventurer(Adventurer::new(1)));
    entities.add(Position::new(1, 0), EntityKind::Dragon(Dragon::new(1)));
    entities.add(Position::new(2, 2), EntityKind::Dragon(Dragon::new(2)));

    let data = GameData::new(open_dungeon(3), entities);
    let original_dungeon = data.dungeon.clone();

    let mut session = GameSession::with_seed(data, 7);
    session.activate_chaos_seal();

    // Every room holding a dragon except the lowest-levelled one is
    // walled in; everything else is thrown wide open.
    for position in session.data().dungeon.positions().collect::<Vec<_>>() {
        let expected = if position == Position::new(2, 2) {
            RoomShape::Solid
        } else {
            RoomShape::Quad
        };
        assert_eq!(
            session.data().dungeon.room(position).unwrap().shape,
            expected,
            "wrong shape at {position}"
        );
    }

    // Walk into the level-1 dragon; the round that ends tears the seal
    // down again.
    session.start_moving_adventurer();
    run_frames(&mut session, 10);

    assert_eq!(session.round(), 2);
    for position in original_dungeon.positions().collect::<Vec<_>>() {
        assert_eq!(
            session.data().dungeon.room(position),
            original_dungeon.room(position),
            "grid not restored at {position}"
        );
    }
    assert!(!session.is_finished());
    assert_eq!(session.data().entities.dragons().count(), 1);
    assert_eq!(adventurer(&session).level(), Some(2));
}

#[test]
fn treasure_placement_rejected_on_occupied_cell() {
    let mut entities = EntityStore::new();
    entities.add(Position::new(1, 1), EntityKind::Adventurer(Adventurer::new(1)));

    let data = GameData::new(open_dungeon(3), entities).with_treasure_remaining(2);
    let mut session = GameSession::with_seed(data, 7);

    // On the adventurer: rejected, nothing changes.
    assert!(!session.place_treasure_at(Position::new(1, 1)));
    assert_eq!(session.data().treasure_remaining, 2);
    assert!(session.data().entities.first(EntityType::Treasure).is_none());

    // Free cell: accepted.
    assert!(session.place_treasure_at(Position::new(0, 0)));
    assert_eq!(session.data().treasure_remaining, 1);
    assert!(session.data().entities.first(EntityType::Treasure).is_some());

    // Only one unconsumed treasure at a time.
    assert!(!session.place_treasure_at(Position::new(2, 2)));
    assert_eq!(session.data().treasure_remaining, 1);

    // Out of bounds is a plain failure.
    assert!(!session.place_treasure_at(Position::new(9, 9)));
}

#[test]
fn rotation_rejected_once_layout_locks() {
    let mut entities = EntityStore::new();
    entities.add(Position::new(0, 0), EntityKind::Adventurer(Adventurer::new(1)));
    entities.add(Position::new(2, 2), EntityKind::Dragon(Dragon::new(1)));

    let mut data = GameData::new(open_dungeon(3), entities)
        .with_mode(GameMode::SingleTurn)
        .with_treasure_remaining(1);
    data.round = 2;

    let mut session = GameSession::with_seed(data, 7);
    assert!(!session.rotate_room_at(Position::new(0, 0)));
    assert!(!session.place_treasure_at(Position::new(0, 1)));

    // Normal mode keeps both available at any round.
    let mut entities = EntityStore::new();
    entities.add(Position::new(0, 0), EntityKind::Adventurer(Adventurer::new(1)));
    let mut data = GameData::new(open_dungeon(3), entities).with_treasure_remaining(1);
    data.round = 5;
    let mut session = GameSession::with_seed(data, 7);
    assert!(session.rotate_room_at(Position::new(0, 0)));
    assert!(session.place_treasure_at(Position::new(0, 1)));
}

#[test]
fn extreme_mode_loses_when_the_adventurer_cannot_move() {
    let mut entities = EntityStore::new();
    entities.add(Position::new(0, 0), EntityKind::Adventurer(Adventurer::new(1)));
    entities.add(Position::new(2, 2), EntityKind::Dragon(Dragon::new(1)));

    let mut data = GameData::new(sealed_dungeon(3), entities).with_mode(GameMode::Extreme);
    data.round = 2;

    let mut session = GameSession::with_seed(data, 7);
    run_frames(&mut session, 2);

    assert!(session.is_finished());
    assert!(session.is_lost());
}

#[test]
fn extreme_mode_moves_dragons_every_frame() {
    let mut entities = EntityStore::new();
    entities.add(Position::new(0, 0), EntityKind::Adventurer(Adventurer::new(1)));
    entities.add(Position::new(4, 4), EntityKind::Dragon(Dragon::new(1)));

    let data = GameData::new(open_dungeon(5), entities).with_mode(GameMode::Extreme);
    let mut session = GameSession::with_seed(data, 7);
    run_frames(&mut session, 1);

    let dragon = session.data().entities.dragons().next().unwrap();
    assert_ne!(dragon.position, Position::new(4, 4));
}

#[test]
fn normal_mode_moves_dragons_once_per_round() {
    let mut entities = EntityStore::new();
    entities.add(Position::new(0, 0), EntityKind::Adventurer(Adventurer::new(1)));
    entities.add(Position::new(4, 4), EntityKind::Dragon(Dragon::new(5)));

    let data = GameData::new(open_dungeon(5), entities).with_treasure_remaining(1);
    let mut session = GameSession::with_seed(data, 7);

    // Frames without a finished round leave the dragon in place.
    run_frames(&mut session, 3);
    assert_eq!(
        session.data().entities.dragons().next().unwrap().position,
        Position::new(4, 4)
    );

    // Walk one step to a treasure to finish a round.
    assert!(session.place_treasure_at(Position::new(0, 1)));
    session.start_moving_adventurer();
    run_frames(&mut session, 10);

    assert_eq!(session.round(), 2);
    assert!(!session.is_finished());
    assert_ne!(
        session.data().entities.dragons().next().unwrap().position,
        Position::new(4, 4)
    );
}

#[test]
fn treasure_attracts_the_path_and_is_collected() {
    let mut entities = EntityStore::new();
    entities.add(Position::new(0, 0), EntityKind::Adventurer(Adventurer::new(1)));
    entities.add(Position::new(4, 0), EntityKind::Dragon(Dragon::new(9)));

    let data = GameData::new(open_dungeon(5), entities).with_treasure_remaining(1);
    let mut session = GameSession::with_seed(data, 7);

    assert!(session.place_treasure_at(Position::new(0, 2)));
    session.start_moving_adventurer();
    run_frames(&mut session, 20);

    // The hero went for the treasure, not the deadly dragon.
    assert_eq!(adventurer(&session).position, Position::new(0, 2));
    assert!(session.data().entities.first(EntityType::Treasure).is_none());
    assert!(!session.is_finished());
    assert_eq!(session.round(), 2);
}

#[test]
fn manual_path_extension_requires_connected_rooms() {
    let mut entities = EntityStore::new();
    entities.add(Position::new(0, 0), EntityKind::Adventurer(Adventurer::new(1)));

    let mut dungeon = open_dungeon(3);
    // Wall off the bottom-left corner.
    dungeon.set_room(Position::new(0, 2), Room::new(RoomShape::Solid, 0));

    let mut session = GameSession::with_seed(GameData::new(dungeon, entities), 7);
    assert!(session.extend_path_to(Position::new(0, 1)));
    assert!(session.extend_path_to(Position::new(1, 1)));
    // Not adjacent to the current tip.
    assert!(!session.extend_path_to(Position::new(1, 0)));
    // Adjacent but solid.
    assert!(!session.extend_path_to(Position::new(0, 2)));

    let hero = adventurer(&session);
    assert_eq!(
        hero.as_adventurer().unwrap().path,
        vec![Position::new(0, 1), Position::new(1, 1)]
    );
}

#[test]
fn session_resets_restore_the_original_state() {
    let mut entities = EntityStore::new();
    entities.add(Position::new(0, 0), EntityKind::Adventurer(Adventurer::new(1)));
    entities.add(Position::new(2, 2), EntityKind::Dragon(Dragon::new(1)));

    let data = GameData::new(open_dungeon(3), entities).with_treasure_remaining(1);
    let pristine = data.clone();

    let mut session = GameSession::with_seed(data, 7);
    session.rotate_room_at(Position::new(1, 1));
    session.place_treasure_at(Position::new(0, 2));
    session.start_moving_adventurer();
    run_frames(&mut session, 5);

    session.reset_game();
    assert_eq!(session.data(), &pristine);
    assert!(!session.is_finished());
}

#[test]
fn level_text_plays_to_a_win() {
    // A 2x2 loop with a weak dragon in the far corner.
    let level = "\
╔╗
╚╝

A 0 0
D 1 1 1
T 1
";
    let mut session = GameSession::from_level_text(level).unwrap();
    assert_eq!(session.data().treasure_remaining, 1);

    session.start_moving_adventurer();
    run_frames(&mut session, 20);

    assert!(session.is_won());
    assert_eq!(adventurer(&session).level(), Some(2));
}
