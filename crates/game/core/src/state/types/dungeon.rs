use strum::{EnumIter, IntoEnumIterator};

use super::{Direction, Position};

bitflags::bitflags! {
    /// Mask of open doors on a room, one bit per cardinal direction.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Doors: u8 {
        const UP = 1 << 0;
        const RIGHT = 1 << 1;
        const DOWN = 1 << 2;
        const LEFT = 1 << 3;
    }
}

impl Default for Doors {
    fn default() -> Self {
        Doors::empty()
    }
}

impl From<Direction> for Doors {
    fn from(direction: Direction) -> Self {
        Doors::from_bits_truncate(1 << direction.index())
    }
}

/// Door layout class of a room before rotation is applied.
///
/// Each shape has a canonical door pattern at rotation 0; the four
/// rotations of a shape are the cyclic shifts of that pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RoomShape {
    /// No doors at all; impassable filler.
    #[default]
    Solid,
    /// Dead end with a single door (canonically up).
    Single,
    /// Corner with two adjacent doors (canonically up and right).
    DoubleAdjacent,
    /// Corridor with two opposite doors (canonically up and down).
    DoubleOpposite,
    /// Three-way junction (canonically everything but left).
    Triple,
    /// Four-way junction.
    Quad,
}

impl RoomShape {
    /// Canonical door pattern at rotation 0.
    pub const fn canonical_doors(self) -> Doors {
        match self {
            RoomShape::Solid => Doors::empty(),
            RoomShape::Single => Doors::UP,
            RoomShape::DoubleAdjacent => Doors::UP.union(Doors::RIGHT),
            RoomShape::DoubleOpposite => Doors::UP.union(Doors::DOWN),
            RoomShape::Triple => Doors::UP.union(Doors::RIGHT).union(Doors::DOWN),
            RoomShape::Quad => Doors::all(),
        }
    }
}

/// One dungeon cell: a shape class plus a clockwise rotation count.
///
/// Connectivity is always derived from the pair, never stored, so a room
/// cannot drift out of sync with its doors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Room {
    pub shape: RoomShape,
    rotation: u8,
}

impl Room {
    pub fn new(shape: RoomShape, rotation: u8) -> Self {
        Self {
            shape,
            rotation: rotation % Direction::COUNT as u8,
        }
    }

    pub fn rotation(&self) -> u8 {
        self.rotation
    }

    /// Rotates the room one clockwise 90° step.
    pub fn rotate(&mut self) {
        self.rotation = (self.rotation + 1) % Direction::COUNT as u8;
    }

    /// Doors currently open on this room: the canonical pattern of the
    /// shape cyclically shifted by the rotation count.
    pub fn connections(&self) -> Doors {
        let canonical = self.shape.canonical_doors();
        let mut doors = Doors::empty();
        for direction in Direction::iter() {
            if canonical.contains(direction.into()) {
                doors |= direction.rotated(self.rotation).into();
            }
        }
        doors
    }

    pub fn has_door(&self, direction: Direction) -> bool {
        self.connections().contains(direction.into())
    }
}

/// The full rows × cols matrix of rooms, fixed in size after creation.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dungeon {
    rows: usize,
    cols: usize,
    rooms: Vec<Room>,
}

impl Dungeon {
    /// Creates a dungeon filled with solid rooms at rotation 0.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            rooms: vec![Room::default(); rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn in_bounds(&self, position: Position) -> bool {
        position.x >= 0
            && position.y >= 0
            && (position.x as usize) < self.cols
            && (position.y as usize) < self.rows
    }

    pub fn room(&self, position: Position) -> Option<&Room> {
        self.in_bounds(position)
            .then(|| &self.rooms[position.y as usize * self.cols + position.x as usize])
    }

    pub fn room_mut(&mut self, position: Position) -> Option<&mut Room> {
        self.in_bounds(position)
            .then(|| &mut self.rooms[position.y as usize * self.cols + position.x as usize])
    }

    /// Replaces the room at `position`. Returns false out of bounds.
    pub fn set_room(&mut self, position: Position, room: Room) -> bool {
        match self.room_mut(position) {
            Some(slot) => {
                *slot = room;
                true
            }
            None => false,
        }
    }

    /// Rotates the room at `position` one clockwise step.
    ///
    /// This is the only in-game mutation of the grid. Returns false (and
    /// leaves the grid untouched) when `position` is out of bounds.
    pub fn rotate_room(&mut self, position: Position) -> bool {
        match self.room_mut(position) {
            Some(room) => {
                room.rotate();
                true
            }
            None => false,
        }
    }

    /// True when the rooms at `a` and `b` are orthogonal neighbors and
    /// the doors facing each other are open on both sides.
    pub fn rooms_connected(&self, a: Position, b: Position) -> bool {
        if a.manhattan_distance(b) != 1 {
            return false;
        }
        let Some(direction) = Direction::between(a, b) else {
            return false;
        };
        match (self.room(a), self.room(b)) {
            (Some(room_a), Some(room_b)) => {
                room_a.has_door(direction) && room_b.has_door(direction.opposite())
            }
            _ => false,
        }
    }

    /// In-bounds neighbors connected to `position`, in the fixed
    /// Up, Right, Down, Left order.
    pub fn valid_neighbors(&self, position: Position) -> arrayvec::ArrayVec<Position, 4> {
        let mut neighbors = arrayvec::ArrayVec::new();
        for direction in Direction::iter() {
            let next = position.step(direction);
            if self.rooms_connected(position, next) {
                neighbors.push(next);
            }
        }
        neighbors
    }

    /// Iterates every cell position in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + use<> {
        let cols = self.cols;
        let rows = self.rows;
        (0..rows).flat_map(move |y| (0..cols).map(move |x| Position::new(x as i32, y as i32)))
    }
}
