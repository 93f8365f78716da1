//! Pending work and resume filtering.

use huntforge_atlas::{Atlas, Coordinates, Direction, MapBounds};
use std::collections::VecDeque;

/// Unit of dispatch: one position, optionally narrowed to a single direction.
///
/// A full item probes all four directions; single-direction items only arise
/// from blocked probes coming back through the retry path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkItem {
    pub coordinates: Coordinates,
    pub direction: Option<Direction>,
}

impl WorkItem {
    #[inline]
    #[must_use]
    pub fn full(coordinates: Coordinates) -> Self {
        Self {
            coordinates,
            direction: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn single(coordinates: Coordinates, direction: Direction) -> Self {
        Self {
            coordinates,
            direction: Some(direction),
        }
    }
}

/// Ordered pending work. Retries are always served before fresh positions so
/// blocked probes cannot pile up behind a long sweep.
#[derive(Debug, Default)]
pub struct WorkQueue {
    retries: VecDeque<WorkItem>,
    fresh: VecDeque<WorkItem>,
}

impl WorkQueue {
    /// Enumerate `bounds` in row-major order and keep exactly the positions
    /// `atlas` has not settled yet. Contiguous settled runs are reported as
    /// one line instead of one per position.
    #[must_use]
    pub fn build(bounds: &MapBounds, atlas: &Atlas) -> Self {
        let mut fresh = VecDeque::new();
        let mut skipped: Option<(Coordinates, Coordinates, usize)> = None;

        for coordinates in bounds.iter() {
            if atlas.is_settled(coordinates) {
                skipped = Some(match skipped {
                    None => (coordinates, coordinates, 1),
                    Some((first, _, count)) => (first, coordinates, count + 1),
                });
                continue;
            }
            flush_skipped(&mut skipped);
            fresh.push_back(WorkItem::full(coordinates));
        }
        flush_skipped(&mut skipped);

        tracing::info!(
            pending = fresh.len(),
            settled = bounds.position_count() - fresh.len(),
            "work queue ready"
        );
        Self {
            retries: VecDeque::new(),
            fresh,
        }
    }

    /// Queue a blocked probe for another attempt.
    #[inline]
    pub fn push_retry(&mut self, item: WorkItem) {
        self.retries.push_back(item);
    }

    /// Next item, retries first.
    #[inline]
    pub fn pop(&mut self) -> Option<WorkItem> {
        self.retries.pop_front().or_else(|| self.fresh.pop_front())
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.retries.len() + self.fresh.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.retries.is_empty() && self.fresh.is_empty()
    }
}

fn flush_skipped(skipped: &mut Option<(Coordinates, Coordinates, usize)>) {
    if let Some((first, last, count)) = skipped.take() {
        tracing::debug!(%first, %last, count, "skipping settled positions");
    }
}
