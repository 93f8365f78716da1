//! The aggregate knowledge base for one collection run.

use crate::{Coordinates, Direction, Hint, HintName, NameRegistry, PositionRecord};
use indexmap::IndexMap;
use std::collections::BTreeSet;

/// Everything learned about the map so far.
///
/// A coordinate key lives in exactly one of three states: present in the
/// position map (some hint data collected), present in the excluded set
/// (fully probed, nothing found anywhere), or absent (not finished yet).
/// The atlas is owned by the orchestrator and mutated only by the response
/// collector; workers never see it.
#[derive(Debug, Clone, Default)]
pub struct Atlas {
    positions: IndexMap<String, PositionRecord>,
    names: NameRegistry,
    excluded: BTreeSet<String>,
    dirty: bool,
}

/// Counts for one fully probed position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionTally {
    /// Hint lines across all four directions.
    pub records: usize,
    /// Name references across all four directions.
    pub ids: usize,
    /// The position ended up in the excluded set.
    pub excluded: bool,
}

impl Atlas {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild an atlas from previously saved parts. The result is clean:
    /// loading a save is not new data.
    #[must_use]
    pub fn from_parts(
        positions: IndexMap<String, PositionRecord>,
        names: NameRegistry,
        excluded: BTreeSet<String>,
    ) -> Self {
        Self {
            positions,
            names,
            excluded,
            dirty: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn position(&self, key: &str) -> Option<&PositionRecord> {
        self.positions.get(key)
    }

    #[inline]
    #[must_use]
    pub fn positions(&self) -> &IndexMap<String, PositionRecord> {
        &self.positions
    }

    #[inline]
    #[must_use]
    pub fn names(&self) -> &NameRegistry {
        &self.names
    }

    #[inline]
    #[must_use]
    pub fn excluded(&self) -> &BTreeSet<String> {
        &self.excluded
    }

    #[inline]
    #[must_use]
    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    #[must_use]
    pub fn name_count(&self) -> usize {
        self.names.len()
    }

    #[inline]
    #[must_use]
    pub fn excluded_count(&self) -> usize {
        self.excluded.len()
    }

    /// Whether a position needs no further probing: excluded, or present
    /// with all four directions resolved.
    #[must_use]
    pub fn is_settled(&self, coordinates: Coordinates) -> bool {
        let key = coordinates.key();
        self.excluded.contains(&key)
            || self
                .positions
                .get(&key)
                .is_some_and(PositionRecord::is_complete)
    }

    /// Replace one direction slot of a position with freshly merged hints.
    ///
    /// Re-probing an excluded position moves it back into the position map;
    /// a key never lives in both places.
    pub fn write_direction(
        &mut self,
        coordinates: Coordinates,
        direction: Direction,
        hints: Vec<Hint>,
    ) {
        let key = coordinates.key();
        self.excluded.remove(&key);
        self.positions
            .entry(key)
            .or_default()
            .set_slot(direction, hints);
        self.dirty = true;
    }

    /// First-writer-wins registration, see [`NameRegistry::register`].
    pub fn register_name(&mut self, id: &str, name: HintName) -> bool {
        self.names.register(id, name)
    }

    /// Final bookkeeping once all four directions of a position resolved:
    /// a position with zero hint lines is dropped from the position map and
    /// recorded as excluded.
    pub fn settle_position(&mut self, coordinates: Coordinates) -> PositionTally {
        let key = coordinates.key();
        let (records, ids) = self
            .positions
            .get(&key)
            .map(|record| (record.record_count(), record.id_count()))
            .unwrap_or((0, 0));
        let excluded = records == 0;
        if excluded {
            self.positions.shift_remove(&key);
            self.excluded.insert(key);
        }
        PositionTally {
            records,
            ids,
            excluded,
        }
    }

    /// True once anything was written since creation or the last load.
    #[inline]
    #[must_use]
    pub fn has_new_data(&self) -> bool {
        self.dirty
    }
}
