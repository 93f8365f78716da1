//! Probe directions and their wire encoding.

use std::fmt;

/// One of the four cardinal probe directions.
///
/// Slot order (north, east, south, west) is the order used for position
/// record slots and for the probe sequence on a fresh position. The hint
/// endpoint encodes directions differently, see [`Direction::from_wire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// All directions in slot order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Slot index in a position record.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::East => 1,
            Direction::South => 2,
            Direction::West => 3,
        }
    }

    /// Decode the endpoint's direction parameter.
    ///
    /// The wire values are non-sequential and must be preserved exactly:
    /// 0 is east, 2 is south, 4 is west, 6 is north.
    #[inline]
    #[must_use]
    pub fn from_wire(value: u8) -> Option<Direction> {
        match value {
            0 => Some(Direction::East),
            2 => Some(Direction::South),
            4 => Some(Direction::West),
            6 => Some(Direction::North),
            _ => None,
        }
    }

    /// Encode back to the endpoint's direction parameter.
    #[inline]
    #[must_use]
    pub fn wire(self) -> u8 {
        match self {
            Direction::East => 0,
            Direction::South => 2,
            Direction::West => 4,
            Direction::North => 6,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::North => "north",
            Direction::East => "east",
            Direction::South => "south",
            Direction::West => "west",
        };
        f.write_str(name)
    }
}
