//! Dungeon grid parser.
//!
//! A dungeon layout is a block of box-drawing glyphs, one line per grid
//! row and one glyph per column. Each glyph names a (shape, rotation)
//! pair; anything else becomes a solid room.

use game_core::{Dungeon, Room, RoomShape};

/// Glyphs for the four rotations of each open shape, rotation 0 first.
const QUAD_GLYPHS: [char; 1] = ['╬'];
const TRIPLE_GLYPHS: [char; 4] = ['╠', '╦', '╣', '╩'];
const DOUBLE_ADJACENT_GLYPHS: [char; 4] = ['╚', '╔', '╗', '╝'];
const DOUBLE_OPPOSITE_GLYPHS: [char; 2] = ['║', '═'];
const SINGLE_GLYPHS: [char; 4] = ['╨', '╞', '╥', '╡'];

/// Errors that fail a whole dungeon-block parse.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DungeonTextError {
    #[error("dungeon block has no rows")]
    NoRows,
    #[error("row {row} has {found} columns, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// True when `glyph` denotes a dungeon room in the level format.
pub fn is_room_glyph(glyph: char) -> bool {
    QUAD_GLYPHS.contains(&glyph)
        || TRIPLE_GLYPHS.contains(&glyph)
        || DOUBLE_ADJACENT_GLYPHS.contains(&glyph)
        || DOUBLE_OPPOSITE_GLYPHS.contains(&glyph)
        || SINGLE_GLYPHS.contains(&glyph)
}

/// Maps one glyph to its room. Unrecognized glyphs become solid rooms.
pub fn room_from_glyph(glyph: char) -> Room {
    let lookup = |glyphs: &[char], shape: RoomShape| {
        glyphs
            .iter()
            .position(|candidate| *candidate == glyph)
            .map(|rotation| Room::new(shape, rotation as u8))
    };

    lookup(&QUAD_GLYPHS, RoomShape::Quad)
        .or_else(|| lookup(&TRIPLE_GLYPHS, RoomShape::Triple))
        .or_else(|| lookup(&DOUBLE_ADJACENT_GLYPHS, RoomShape::DoubleAdjacent))
        .or_else(|| lookup(&DOUBLE_OPPOSITE_GLYPHS, RoomShape::DoubleOpposite))
        .or_else(|| lookup(&SINGLE_GLYPHS, RoomShape::Single))
        .unwrap_or_default()
}

/// Parses a glyph block into a dungeon.
///
/// Fails when the block has zero rows or rows of unequal length; the
/// returned grid otherwise matches the block cell for cell.
pub fn parse_dungeon(lines: &[&str]) -> Result<Dungeon, DungeonTextError> {
    if lines.is_empty() {
        return Err(DungeonTextError::NoRows);
    }

    let rows: Vec<Vec<char>> = lines.iter().map(|line| line.chars().collect()).collect();
    let expected = rows[0].len();
    if expected == 0 {
        return Err(DungeonTextError::NoRows);
    }
    for (row, glyphs) in rows.iter().enumerate() {
        if glyphs.len() != expected {
            return Err(DungeonTextError::RaggedRow {
                row,
                expected,
                found: glyphs.len(),
            });
        }
    }

    let mut dungeon = Dungeon::new(rows.len(), expected);
    for (y, glyphs) in rows.iter().enumerate() {
        for (x, glyph) in glyphs.iter().enumerate() {
            dungeon.set_room(
                game_core::Position::new(x as i32, y as i32),
                room_from_glyph(*glyph),
            );
        }
    }
    Ok(dungeon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_core::{Direction, Position};

    #[test]
    fn glyphs_map_to_expected_shapes() {
        assert_eq!(room_from_glyph('╬'), Room::new(RoomShape::Quad, 0));
        assert_eq!(room_from_glyph('╦'), Room::new(RoomShape::Triple, 1));
        assert_eq!(room_from_glyph('╝'), Room::new(RoomShape::DoubleAdjacent, 3));
        assert_eq!(room_from_glyph('═'), Room::new(RoomShape::DoubleOpposite, 1));
        assert_eq!(room_from_glyph('╡'), Room::new(RoomShape::Single, 3));
        // Anything else is a solid filler room.
        assert_eq!(room_from_glyph('#'), Room::new(RoomShape::Solid, 0));
        assert_eq!(room_from_glyph(' '), Room::new(RoomShape::Solid, 0));
    }

    #[test]
    fn glyph_doors_match_their_pictures() {
        // The picture of each glyph is its door pattern; spot-check a few.
        assert!(room_from_glyph('╞').has_door(Direction::Right));
        assert!(!room_from_glyph('╞').has_door(Direction::Left));
        assert!(room_from_glyph('╣').has_door(Direction::Left));
        assert!(!room_from_glyph('╣').has_door(Direction::Right));
        assert!(room_from_glyph('╔').has_door(Direction::Down));
        assert!(room_from_glyph('╔').has_door(Direction::Right));
    }

    #[test]
    fn parses_rectangular_block() {
        let dungeon = parse_dungeon(&["╬╬╬", "╬═╬"]).unwrap();
        assert_eq!(dungeon.rows(), 2);
        assert_eq!(dungeon.cols(), 3);
        assert_eq!(
            dungeon.room(Position::new(1, 1)),
            Some(&Room::new(RoomShape::DoubleOpposite, 1))
        );
    }

    #[test]
    fn rejects_empty_and_ragged_blocks() {
        assert_eq!(parse_dungeon(&[]), Err(DungeonTextError::NoRows));
        assert_eq!(
            parse_dungeon(&["╬╬╬", "╬╬"]),
            Err(DungeonTextError::RaggedRow {
                row: 1,
                expected: 3,
                found: 2
            })
        );
    }
}
