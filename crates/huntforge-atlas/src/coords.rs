//! Grid coordinates and sweep bounds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Integer grid position in the hunt map's addressable space.
///
/// The canonical identity of a position is its [`key`](Coordinates::key),
/// the `"x,y"` string used across save files and lookup tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: i32,
    pub y: i32,
}

impl Coordinates {
    #[inline]
    #[must_use]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Canonical map key, `"x,y"`.
    #[inline]
    #[must_use]
    pub fn key(&self) -> String {
        format!("{},{}", self.x, self.y)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Errors when parsing a coordinate key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoordinatesError {
    /// Not of the `"x,y"` form with two integers.
    #[error("malformed coordinate key: {0:?}")]
    MalformedKey(String),
}

impl FromStr for Coordinates {
    type Err = CoordinatesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || CoordinatesError::MalformedKey(s.to_string());
        let (x, y) = s.split_once(',').ok_or_else(malformed)?;
        Ok(Self {
            x: x.trim().parse().map_err(|_| malformed())?,
            y: y.trim().parse().map_err(|_| malformed())?,
        })
    }
}

/// The full addressable map. Custom bounds must stay inside this envelope.
pub const DEFAULT_BOUNDS: MapBounds = MapBounds {
    min_x: -88,
    min_y: -70,
    max_x: 36,
    max_y: 48,
};

/// Inclusive rectangular sweep bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapBounds {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

/// Rejected sweep bounds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoundsError {
    /// Minimum must be strictly below maximum on both axes.
    #[error("inverted {axis} bounds: {min} is not below {max}")]
    Inverted {
        axis: &'static str,
        min: i32,
        max: i32,
    },
    /// Requested rectangle leaves the addressable map.
    #[error("bounds {requested} exceed the map envelope {envelope}")]
    OutsideEnvelope {
        requested: MapBounds,
        envelope: MapBounds,
    },
}

impl MapBounds {
    /// Validate a rectangle: strictly ordered on both axes and contained in
    /// the default envelope.
    pub fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Result<Self, BoundsError> {
        if min_x >= max_x {
            return Err(BoundsError::Inverted {
                axis: "x",
                min: min_x,
                max: max_x,
            });
        }
        if min_y >= max_y {
            return Err(BoundsError::Inverted {
                axis: "y",
                min: min_y,
                max: max_y,
            });
        }
        let requested = Self {
            min_x,
            min_y,
            max_x,
            max_y,
        };
        if min_x < DEFAULT_BOUNDS.min_x
            || min_y < DEFAULT_BOUNDS.min_y
            || max_x > DEFAULT_BOUNDS.max_x
            || max_y > DEFAULT_BOUNDS.max_y
        {
            return Err(BoundsError::OutsideEnvelope {
                requested,
                envelope: DEFAULT_BOUNDS,
            });
        }
        Ok(requested)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, coordinates: Coordinates) -> bool {
        (self.min_x..=self.max_x).contains(&coordinates.x)
            && (self.min_y..=self.max_y).contains(&coordinates.y)
    }

    /// Number of positions in the rectangle.
    #[inline]
    #[must_use]
    pub fn position_count(&self) -> usize {
        let width = (self.max_x - self.min_x + 1) as usize;
        let height = (self.max_y - self.min_y + 1) as usize;
        width * height
    }

    /// Enumerate every position in deterministic row-major order, starting at
    /// `(min_x, min_y)` and exhausting each column of y before moving east.
    pub fn iter(&self) -> impl Iterator<Item = Coordinates> {
        let Self {
            min_x,
            min_y,
            max_x,
            max_y,
        } = *self;
        (min_x..=max_x).flat_map(move |x| (min_y..=max_y).map(move |y| Coordinates::new(x, y)))
    }
}

impl fmt::Display for MapBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{})..({},{})",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn key_and_parse_round_trip() {
        let c = Coordinates::new(-12, 7);
        assert_eq!(c.key(), "-12,7");
        assert_eq!("-12,7".parse::<Coordinates>().unwrap(), c);
    }

    #[test]
    fn parse_rejects_garbage() {
        for bad in ["", "12", "a,b", "1,2,3"] {
            assert!(bad.parse::<Coordinates>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn display_uses_parentheses() {
        assert_eq!(Coordinates::new(3, -4).to_string(), "(3,-4)");
    }

    #[test]
    fn bounds_reject_inverted_axes() {
        assert!(matches!(
            MapBounds::new(5, 0, 5, 10),
            Err(BoundsError::Inverted { axis: "x", .. })
        ));
        assert!(matches!(
            MapBounds::new(0, 10, 5, 2),
            Err(BoundsError::Inverted { axis: "y", .. })
        ));
    }

    #[test]
    fn bounds_reject_outside_envelope() {
        assert!(matches!(
            MapBounds::new(-100, 0, 5, 10),
            Err(BoundsError::OutsideEnvelope { .. })
        ));
        assert!(matches!(
            MapBounds::new(0, 0, 50, 10),
            Err(BoundsError::OutsideEnvelope { .. })
        ));
    }

    #[test]
    fn envelope_itself_is_valid() {
        let b = MapBounds::new(
            DEFAULT_BOUNDS.min_x,
            DEFAULT_BOUNDS.min_y,
            DEFAULT_BOUNDS.max_x,
            DEFAULT_BOUNDS.max_y,
        )
        .unwrap();
        assert_eq!(b, DEFAULT_BOUNDS);
    }

    #[test]
    fn iteration_is_row_major_from_the_min_corner() {
        let bounds = MapBounds::new(-1, -1, 0, 1).unwrap();
        let order: Vec<_> = bounds.iter().collect();
        assert_eq!(
            order,
            vec![
                Coordinates::new(-1, -1),
                Coordinates::new(-1, 0),
                Coordinates::new(-1, 1),
                Coordinates::new(0, -1),
                Coordinates::new(0, 0),
                Coordinates::new(0, 1),
            ]
        );
    }

    proptest! {
        /// The enumerated set is exactly the inclusive rectangle: every
        /// produced position is inside, the count matches the area, and
        /// nothing repeats.
        #[test]
        fn enumeration_covers_the_exact_rectangle(
            min_x in -88i32..30,
            min_y in -70i32..40,
            width in 1i32..6,
            height in 1i32..6,
        ) {
            let bounds = MapBounds::new(min_x, min_y, min_x + width, min_y + height).unwrap();
            let all: Vec<_> = bounds.iter().collect();
            prop_assert_eq!(all.len(), bounds.position_count());
            for c in &all {
                prop_assert!(bounds.contains(*c));
            }
            let unique: std::collections::HashSet<_> = all.iter().collect();
            prop_assert_eq!(unique.len(), all.len());
        }
    }
}
