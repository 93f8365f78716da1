//! Hunt atlas data model.
//!
//! Everything a collection run learns about the map lives here:
//!
//! - [`Coordinates`] and [`MapBounds`]: the addressable grid and its sweep order
//! - [`Direction`]: the four probe directions and their wire encoding
//! - [`Hint`] / [`PositionRecord`]: per-position hint data, one slot per direction
//! - [`NameRegistry`]: localized display names, first writer wins
//! - [`Atlas`]: the aggregate knowledge base owned by the orchestrator
//! - [`snapshot`]: the three-file JSON save format shared with other tools
//!
//! The atlas is plain data: it is mutated by exactly one consumer at a time and
//! carries no synchronization of its own.

mod atlas;
mod coords;
mod direction;
mod hint;
mod registry;

pub mod snapshot;

pub use atlas::{Atlas, PositionTally};
pub use coords::{BoundsError, Coordinates, CoordinatesError, MapBounds, DEFAULT_BOUNDS};
pub use direction::Direction;
pub use hint::{Hint, PositionRecord};
pub use registry::{HintName, NameRegistry};
