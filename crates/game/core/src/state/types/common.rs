use std::fmt;

use strum::EnumIter;

/// Unique identifier for any entity tracked in the store.
///
/// Identity, not value, is what removal operates on: two entities with
/// identical fields are still distinct entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Discrete grid position expressed in room coordinates.
///
/// `x` is the column and `y` the row, both zero-based; row 0 is the top
/// of the dungeon so `Direction::Up` decrements `y`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Number of orthogonal steps between two positions.
    pub fn manhattan_distance(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// The adjacent position one step in `direction`.
    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.offset();
        Self::new(self.x + dx, self.y + dy)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::ORIGIN
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(feature = "serde")]
mod position_serde {
    //! Positions serialize as `{"__tuple__": [x, y]}`.
    //!
    //! The original save files encoded every coordinate pair this way to
    //! survive JSON's lack of a tuple type; keeping the shape preserves
    //! save-file compatibility.
    use serde::de::Error as _;
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::Position;

    impl Serialize for Position {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut map = serializer.serialize_map(Some(1))?;
            map.serialize_entry("__tuple__", &[self.x, self.y])?;
            map.end()
        }
    }

    impl<'de> Deserialize<'de> for Position {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            #[derive(Deserialize)]
            struct Tagged {
                #[serde(rename = "__tuple__")]
                fields: Vec<i32>,
            }

            let tagged = Tagged::deserialize(deserializer)?;
            match tagged.fields[..] {
                [x, y] => Ok(Position::new(x, y)),
                _ => Err(D::Error::custom("position tuple must have two fields")),
            }
        }
    }
}

/// One of the four cardinal door directions, in fixed clockwise order.
///
/// The declaration order doubles as the deterministic neighbor-visit
/// order used by connectivity queries and pathfinding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub const COUNT: usize = 4;

    /// Index of this direction in clockwise order starting at `Up`.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The direction `steps` clockwise 90° turns away from this one.
    pub const fn rotated(self, steps: u8) -> Self {
        Self::from_index(self.index() + steps as usize)
    }

    pub const fn opposite(self) -> Self {
        self.rotated(2)
    }

    /// Grid offset of one step in this direction (`x` right, `y` down).
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }

    /// Direction from `from` to an orthogonally adjacent `to`, if any.
    pub fn between(from: Position, to: Position) -> Option<Self> {
        match (to.x - from.x, to.y - from.y) {
            (0, -1) => Some(Direction::Up),
            (1, 0) => Some(Direction::Right),
            (0, 1) => Some(Direction::Down),
            (-1, 0) => Some(Direction::Left),
            _ => None,
        }
    }

    const fn from_index(index: usize) -> Self {
        match index % Self::COUNT {
            0 => Direction::Up,
            1 => Direction::Right,
            2 => Direction::Down,
            _ => Direction::Left,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotating_four_times_is_identity() {
        for direction in [
            Direction::Up,
            Direction::Right,
            Direction::Down,
            Direction::Left,
        ] {
            assert_eq!(direction.rotated(4), direction);
            assert_eq!(direction.opposite().opposite(), direction);
        }
    }

    #[test]
    fn between_only_matches_adjacent_positions() {
        let center = Position::new(2, 2);
        assert_eq!(
            Direction::between(center, Position::new(2, 1)),
            Some(Direction::Up)
        );
        assert_eq!(
            Direction::between(center, Position::new(3, 2)),
            Some(Direction::Right)
        );
        assert_eq!(Direction::between(center, Position::new(3, 3)), None);
        assert_eq!(Direction::between(center, center), None);
    }
}
