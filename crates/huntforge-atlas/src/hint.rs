//! Per-position hint data.

use crate::Direction;
use serde::{Deserialize, Serialize};

/// One collected hint line: everything reachable at a fixed travel distance
/// in one direction from a position.
///
/// Two batches reporting the same distance for the same (position, direction)
/// describe the same line; their id lists are concatenated in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hint {
    /// Travel distance in map cells.
    pub dist: u32,
    /// Target position of the line.
    pub x: i32,
    pub y: i32,
    /// Name references, insertion order preserved.
    pub ids: Vec<String>,
}

/// Hint slots for one position, indexed by [`Direction`].
///
/// `None` means the direction has not been resolved yet; `Some(vec![])` means
/// it resolved with nothing there. The distinction is what makes resumption
/// cheap: only positions with a `None` slot are worth probing again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRecord([Option<Vec<Hint>>; 4]);

impl PositionRecord {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn slot(&self, direction: Direction) -> Option<&[Hint]> {
        self.0[direction.index()].as_deref()
    }

    /// Replace one direction slot with freshly merged hints.
    #[inline]
    pub fn set_slot(&mut self, direction: Direction, hints: Vec<Hint>) {
        self.0[direction.index()] = Some(hints);
    }

    #[inline]
    #[must_use]
    pub fn is_resolved(&self, direction: Direction) -> bool {
        self.0[direction.index()].is_some()
    }

    /// All four directions resolved.
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.0.iter().all(Option::is_some)
    }

    /// Number of hint lines across resolved slots.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.0
            .iter()
            .flatten()
            .map(|hints| hints.len())
            .sum()
    }

    /// Total referenced ids across resolved slots.
    #[must_use]
    pub fn id_count(&self) -> usize {
        self.0
            .iter()
            .flatten()
            .flat_map(|hints| hints.iter())
            .map(|hint| hint.ids.len())
            .sum()
    }
}
